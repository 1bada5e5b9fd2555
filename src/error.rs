use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("HTTPリクエスト失敗: {0}")]
    Request(#[from] reqwest::Error),

    /// サーバが2xx以外を返した（`message` はサーバの `error` か `HTTP error {status}`）
    #[error("APIエラー ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] book_analysis_common::Error),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("書名が指定されていません。--job-id か --title を指定してください")]
    NoTitles,

    /// 処理チェーンが途中で止まった（メッセージは画面に表示済みの内容）
    #[error("{0}")]
    Stopped(String),

    #[error("キャンセルされました")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ClientError>;
