//! ジョブサーバAPIクライアント
//!
//! バックエンドのHTTPエンドポイント（書名検索の投入、ジョブ状態の取得、
//! 書籍詳細の取得、LLM解析の投入）を [`JobBackend`] として抽象化し、
//! [`reqwest`] による実装 [`HttpBackend`] を提供する。

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use book_analysis_common::{parse_book_data, BookDataMap, JobHandle, JobStatus};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// バックエンドとのやり取り
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// `GET /results/{job_id}`。ボディが `null` なら `None`
    async fn job_status(&self, job: &JobHandle) -> Result<Option<JobStatus>>;

    /// `POST /fetch_book_data`
    async fn fetch_book_data(&self, isbn_list: &[String]) -> Result<BookDataMap>;

    /// `POST /enqueue_llm_analysis`
    ///
    /// 2xx以外は [`ClientError::Api`]。2xxでも `job_id` が無ければ `None`。
    async fn enqueue_analysis(&self, books: &BookDataMap) -> Result<Option<JobHandle>>;

    /// `POST /` に書名（改行区切り）を送り、返ってきたページからジョブIDを取り出す
    async fn start_title_search(&self, titles: &str) -> Result<JobHandle>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchBookDataRequest<'a> {
    isbn_list: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct EnqueueResponse {
    #[serde(default)]
    job_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP実装
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// * `base_url` - 例: `http://127.0.0.1:5000`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 2xx以外を [`ClientError::Api`] に変換
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl JobBackend for HttpBackend {
    async fn job_status(&self, job: &JobHandle) -> Result<Option<JobStatus>> {
        let response = self
            .client
            .get(self.url(&format!("/results/{}", job)))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let status: Option<JobStatus> = response.json().await?;
        Ok(status)
    }

    async fn fetch_book_data(&self, isbn_list: &[String]) -> Result<BookDataMap> {
        let response = self
            .client
            .post(self.url("/fetch_book_data"))
            .json(&FetchBookDataRequest { isbn_list })
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let value: serde_json::Value = response.json().await?;
        Ok(parse_book_data(Some(&value)))
    }

    async fn enqueue_analysis(&self, books: &BookDataMap) -> Result<Option<JobHandle>> {
        let response = self
            .client
            .post(self.url("/enqueue_llm_analysis"))
            .json(books)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body: EnqueueResponse = response
            .json()
            .await
            .map_err(|e| ClientError::ApiParse(e.to_string()))?;
        Ok(body
            .job_id
            .filter(|id| !id.is_empty())
            .map(JobHandle::new))
    }

    async fn start_title_search(&self, titles: &str) -> Result<JobHandle> {
        let response = self
            .client
            .post(self.url("/"))
            .form(&[("review_text", titles)])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let html = response.text().await?;
        extract_job_id(&html)
            .ok_or_else(|| ClientError::ApiParse("レスポンスに job_id が見つかりません".into()))
    }
}

/// ページ内の `<input id="job_id" value="...">` からジョブIDを取り出す
pub fn extract_job_id(html: &str) -> Option<JobHandle> {
    lazy_static::lazy_static! {
        static ref INPUT_RE: Regex = Regex::new(r"(?is)<input\b[^>]*>").unwrap();
        static ref ID_RE: Regex = Regex::new(r#"(?i)\bid\s*=\s*["']job_id["']"#).unwrap();
        static ref VALUE_RE: Regex = Regex::new(r#"(?i)\bvalue\s*=\s*["']([^"']*)["']"#).unwrap();
    }

    INPUT_RE
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| ID_RE.is_match(tag))
        .find_map(|tag| {
            VALUE_RE
                .captures(tag)
                .map(|c| c[1].trim().to_string())
                .filter(|id| !id.is_empty())
        })
        .map(JobHandle::new)
}
