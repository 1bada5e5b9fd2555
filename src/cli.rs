use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "book-analysis")]
#[command(about = "書籍マッチング・LLM解析ジョブのクライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// サーバURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 書名検索から解析結果の表示まで一括実行
    Run {
        /// 既存の書名検索ジョブID
        #[arg(short, long, conflicts_with_all = ["title", "titles_file"])]
        job_id: Option<String>,

        /// 検索する書名（複数指定可）
        #[arg(short, long)]
        title: Vec<String>,

        /// 書名を1行1件で書いたファイル
        #[arg(long)]
        titles_file: Option<PathBuf>,

        /// 対話せず既定の候補で確定する
        #[arg(short, long)]
        yes: bool,

        /// 解析結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 検索ジョブのポーリング間隔（ミリ秒）
        #[arg(long)]
        match_interval_ms: Option<u64>,

        /// 解析ジョブのポーリング間隔（ミリ秒）
        #[arg(long)]
        analysis_interval_ms: Option<u64>,
    },

    /// 1つのジョブを終了までポーリングして結果を表示
    Poll {
        /// ジョブID
        #[arg(required = true)]
        job_id: String,

        /// ジョブの種類
        #[arg(short, long, value_enum, default_value = "analysis")]
        phase: Phase,

        /// 解析結果JSONの出力先（analysis のみ）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// サーバURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    /// 書名検索ジョブ
    Matching,
    /// LLM解析ジョブ
    Analysis,
}

/// `--title` と `--titles-file` から書名リストを作る（空行は除く）
pub fn collect_titles(titles: &[String], titles_file: Option<&str>) -> Vec<String> {
    titles
        .iter()
        .map(|t| t.as_str())
        .chain(titles_file.into_iter().flat_map(|content| content.lines()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
