//! ジョブ・書籍データの型定義
//!
//! CLIとライブラリで共有される型:
//! - JobStatus: `/results/{job_id}` のレスポンス
//! - TitleMatchSet: 書名検索ジョブ（マッチングフェーズ）の結果
//! - BookRecord: `/fetch_book_data` とLLM解析ジョブの結果

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// サーバ側非同期ジョブのハンドル（不透明な文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ジョブの状態
///
/// `finished` / `failed` 以外（未知の値・欠落を含む）はすべて pending 扱い。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Finished,
    Failed,
    #[default]
    #[serde(other)]
    Pending,
}

/// `/results/{job_id}` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub status: JobState,

    /// フェーズごとに形が異なる結果ペイロード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn finished(result: Value) -> Self {
        Self {
            status: JobState::Finished,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobState::Failed,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// 書名検索の候補1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookCandidate {
    pub title: String,
    pub authors: Vec<String>,
    pub isbn: String,
}

impl BookCandidate {
    /// 表示ラベル: `{title} by {authors} (ISBN: {isbn})`
    pub fn label(&self) -> String {
        format!("{} by {} (ISBN: {})", self.title, self.authors.join(", "), self.isbn)
    }
}

/// `possible_matches` の要素（候補は `match` キーの下にある）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PossibleMatch {
    #[serde(rename = "match")]
    pub candidate: BookCandidate,
}

/// ユーザーが入力した書名1件に対する候補リスト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleMatchSet {
    #[serde(default)]
    pub user_title: String,
    #[serde(default)]
    pub possible_matches: Vec<PossibleMatch>,
}

impl TitleMatchSet {
    pub fn candidates(&self) -> impl Iterator<Item = &BookCandidate> {
        self.possible_matches.iter().map(|m| &m.candidate)
    }
}

/// マッチングフェーズの結果ペイロード
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MatchPayload {
    results_per_title: Vec<TitleMatchSet>,
}

/// マッチングジョブの結果から書名ごとの候補リストを取り出す
pub fn parse_match_results(result: Option<&Value>) -> Result<Vec<TitleMatchSet>> {
    let value = result.ok_or_else(|| Error::Parse("result がありません".into()))?;
    let payload: MatchPayload = serde_json::from_value(value.clone())
        .map_err(|e| Error::Parse(format!("results_per_title のパースに失敗: {}", e)))?;
    Ok(payload.results_per_title)
}

/// 書籍レコード
///
/// フィールドごとに型を緩く読む。想定と違う型の値（JSON文字列のままの
/// `authors` など）は型付きフィールドを `None` にし、元の値を `extra` に残す。
/// 未知のフィールドも `extra` に保持し、`/enqueue_llm_analysis` へそのまま転送する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Map<String, Value>")]
pub struct BookRecord {
    pub isbn: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_sentiment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_themes: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl From<serde_json::Map<String, Value>> for BookRecord {
    fn from(mut fields: serde_json::Map<String, Value>) -> Self {
        Self {
            isbn: take_field(&mut fields, "isbn", scalar_string).unwrap_or_default(),
            title: take_field(&mut fields, "title", |v| v.as_str().map(str::to_string)),
            authors: take_field(&mut fields, "authors", string_list),
            llm_sentiment: take_field(&mut fields, "llm_sentiment", |v| {
                v.as_str().map(str::to_string)
            }),
            llm_themes: take_field(&mut fields, "llm_themes", string_list),
            extra: fields,
        }
    }
}

/// 変換できたときだけ `fields` から取り出す
fn take_field<T>(
    fields: &mut serde_json::Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key)?;
    match convert(value) {
        Some(converted) => {
            fields.remove(key);
            Some(converted)
        }
        None => {
            if !value.is_null() {
                tracing::debug!(field = key, value = %value, "unexpected field type; keeping raw value");
            }
            None
        }
    }
}

/// 文字列・数値・真偽値を文字列にする
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 配列なら要素を文字列にして返す（文字列化できない要素は捨てる）
fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(scalar_string).collect())
}

/// ISBN → 書籍レコード
pub type BookDataMap = BTreeMap<String, BookRecord>;

/// 書籍データのマップを取り出す
///
/// オブジェクトでないエントリはスキップする。
/// 結果自体が無い・オブジェクトでない場合は空マップ。
pub fn parse_book_data(result: Option<&Value>) -> BookDataMap {
    let mut books = BookDataMap::new();
    let Some(Value::Object(entries)) = result else {
        return books;
    };

    for (isbn, entry) in entries {
        match entry {
            Value::Object(fields) => {
                books.insert(isbn.clone(), BookRecord::from(fields.clone()));
            }
            _ => tracing::warn!(isbn = %isbn, "skipping non-object book entry"),
        }
    }

    books
}
