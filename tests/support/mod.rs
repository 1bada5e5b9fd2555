//! テスト用のバックエンド・時計・描画先

#![allow(dead_code)]

use async_trait::async_trait;
use book_analysis::api::JobBackend;
use book_analysis::clock::Clock;
use book_analysis::error::{ClientError, Result};
use book_analysis::prompt::SelectionPrompt;
use book_analysis::state::AppState;
use book_analysis::view::Renderer;
use book_analysis_common::{
    BookCandidate, BookDataMap, BookRecord, JobHandle, JobStatus, PossibleMatch, SelectionForm,
    TitleMatchSet,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// ジョブ状態の応答
#[derive(Debug, Clone)]
pub enum StatusReply {
    Status(JobStatus),
    Null,
    TransportError,
}

/// 投入応答
#[derive(Debug, Clone)]
pub enum EnqueueReply {
    Job(String),
    MissingJobId,
    ApiError(u16, String),
}

/// 応答を台本どおりに返すバックエンド
///
/// ジョブごとの応答キューは最後の1件になるとそれを返し続ける。
#[derive(Default)]
pub struct FakeBackend {
    statuses: Mutex<HashMap<String, VecDeque<StatusReply>>>,
    book_data: Mutex<Option<BookDataMap>>,
    enqueue_replies: Mutex<VecDeque<EnqueueReply>>,
    search_job: Mutex<Option<String>>,
    pub status_calls: Mutex<Vec<String>>,
    pub fetch_calls: Mutex<Vec<Vec<String>>>,
    pub enqueue_calls: Mutex<Vec<BookDataMap>>,
    pub search_calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, job: &str, replies: Vec<StatusReply>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(job.to_string(), replies.into_iter().collect());
        self
    }

    pub fn with_book_data(self, books: BookDataMap) -> Self {
        *self.book_data.lock().unwrap() = Some(books);
        self
    }

    pub fn with_enqueue(self, replies: Vec<EnqueueReply>) -> Self {
        *self.enqueue_replies.lock().unwrap() = replies.into_iter().collect();
        self
    }

    pub fn with_search_job(self, job: &str) -> Self {
        *self.search_job.lock().unwrap() = Some(job.to_string());
        self
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.lock().unwrap().len()
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.lock().unwrap().len()
    }
}

fn transport_error() -> ClientError {
    ClientError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

#[async_trait]
impl JobBackend for FakeBackend {
    async fn job_status(&self, job: &JobHandle) -> Result<Option<JobStatus>> {
        self.status_calls.lock().unwrap().push(job.to_string());

        let reply = {
            let mut statuses = self.statuses.lock().unwrap();
            let queue = statuses.get_mut(job.as_str());
            match queue {
                Some(q) if q.len() > 1 => q.pop_front(),
                Some(q) => q.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(StatusReply::Status(status)) => Ok(Some(status)),
            Some(StatusReply::Null) => Ok(None),
            Some(StatusReply::TransportError) | None => Err(transport_error()),
        }
    }

    async fn fetch_book_data(&self, isbn_list: &[String]) -> Result<BookDataMap> {
        self.fetch_calls.lock().unwrap().push(isbn_list.to_vec());
        self.book_data.lock().unwrap().clone().ok_or_else(transport_error)
    }

    async fn enqueue_analysis(&self, books: &BookDataMap) -> Result<Option<JobHandle>> {
        self.enqueue_calls.lock().unwrap().push(books.clone());

        let reply = {
            let mut replies = self.enqueue_replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply {
            Some(EnqueueReply::Job(id)) => Ok(Some(JobHandle::new(id))),
            Some(EnqueueReply::MissingJobId) => Ok(None),
            Some(EnqueueReply::ApiError(status, message)) => Err(ClientError::Api { status, message }),
            None => Err(transport_error()),
        }
    }

    async fn start_title_search(&self, titles: &str) -> Result<JobHandle> {
        self.search_calls.lock().unwrap().push(titles.to_string());
        self.search_job
            .lock()
            .unwrap()
            .clone()
            .map(JobHandle::new)
            .ok_or_else(transport_error)
    }
}

/// 待たずに遅延だけ記録する時計
#[derive(Default)]
pub struct RecordingClock {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// 待機に入った瞬間にキャンセルし、そのまま戻らない時計
pub struct CancellingClock {
    pub token: CancellationToken,
}

#[async_trait]
impl Clock for CancellingClock {
    async fn sleep(&self, _duration: Duration) {
        self.token.cancel();
        std::future::pending::<()>().await;
    }
}

/// 描画された状態を記録する
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub frames: Arc<Mutex<Vec<AppState>>>,
}

impl RecordingRenderer {
    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, state: &AppState) {
        self.frames.lock().unwrap().push(state.clone());
    }
}

/// 選択入力1回分の操作
pub type PromptStep = Box<dyn FnMut(&mut SelectionForm) + Send>;

/// 呼ばれるたびに順に操作を適用する選択入力
pub struct ScriptedPrompt {
    steps: VecDeque<PromptStep>,
    pub calls: usize,
}

impl ScriptedPrompt {
    pub fn new(steps: Vec<PromptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            calls: 0,
        }
    }
}

impl SelectionPrompt for ScriptedPrompt {
    fn choose(&mut self, form: &mut SelectionForm) -> Result<()> {
        self.calls += 1;
        if let Some(mut step) = self.steps.pop_front() {
            step(form);
        }
        Ok(())
    }

    fn can_retry(&self) -> bool {
        !self.steps.is_empty()
    }
}

pub fn candidate(title: &str, authors: &[&str], isbn: &str) -> BookCandidate {
    BookCandidate {
        title: title.to_string(),
        authors: authors.iter().map(|a| a.to_string()).collect(),
        isbn: isbn.to_string(),
    }
}

pub fn match_set(user_title: &str, candidates: Vec<BookCandidate>) -> TitleMatchSet {
    TitleMatchSet {
        user_title: user_title.to_string(),
        possible_matches: candidates
            .into_iter()
            .map(|c| PossibleMatch { candidate: c })
            .collect(),
    }
}

/// マッチングジョブの完了応答
pub fn match_result(sets: &[TitleMatchSet]) -> Value {
    json!({ "results_per_title": sets })
}

pub fn book(isbn: &str, title: &str, themes: &[&str], sentiment: Option<&str>) -> BookRecord {
    BookRecord {
        isbn: isbn.to_string(),
        title: Some(title.to_string()),
        authors: Some(vec!["Author".to_string()]),
        llm_sentiment: sentiment.map(str::to_string),
        llm_themes: Some(themes.iter().map(|t| t.to_string()).collect()),
        ..Default::default()
    }
}

pub fn pending() -> StatusReply {
    StatusReply::Status(JobStatus::pending())
}

pub fn finished(result: Value) -> StatusReply {
    StatusReply::Status(JobStatus::finished(result))
}

pub fn failed(error: &str) -> StatusReply {
    StatusReply::Status(JobStatus::failed(error))
}
