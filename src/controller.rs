//! ポーリング結果コントローラ
//!
//! 4つのフェーズを順に進める:
//! 1. 書名検索ジョブのポーリング（1秒間隔）
//! 2. 候補選択フォームの表示
//! 3. 選択の送信 → 書籍詳細の取得 → LLM解析ジョブの投入
//! 4. 解析ジョブのポーリング（5秒間隔）と結果の集計表示
//!
//! 状態はすべて [`AppState`] に持ち、遷移のたびに [`Renderer`] へ渡す。
//! どのエラーもその処理チェーンを止めるだけで、状態は再操作できる形で残る。

use crate::api::JobBackend;
use crate::clock::Clock;
use crate::error::{ClientError, Result};
use crate::messages;
use crate::poller::{JobPoller, PollOutcome};
use crate::prompt::SelectionPrompt;
use crate::state::{AppState, ConfirmButton, ListPanel, ResultPanel};
use crate::view::Renderer;
use book_analysis_common::{
    collect_confirmed, parse_book_data, parse_match_results, top_themes, BookDataMap, BookRecord,
    JobHandle, SelectionForm, TOP_THEMES_LIMIT,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// フェーズごとのポーリング間隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub match_interval: Duration,
    pub analysis_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            match_interval: Duration::from_secs(1),
            analysis_interval: Duration::from_secs(5),
        }
    }
}

/// フェーズの終わり方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Done,
    /// 表示済みのメッセージで停止
    Stopped(String),
    Cancelled,
}

/// 選択送信の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// ISBNが1件もなく送信しなかった
    Blocked,
    FetchFailed,
    EnqueueFailed,
    Enqueued(JobHandle),
    Cancelled,
}

pub struct PollingResultController {
    backend: Arc<dyn JobBackend>,
    clock: Arc<dyn Clock>,
    renderer: Box<dyn Renderer>,
    settings: PollSettings,
    cancel: CancellationToken,
    state: AppState,
}

impl PollingResultController {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        clock: Arc<dyn Clock>,
        renderer: Box<dyn Renderer>,
        settings: PollSettings,
    ) -> Self {
        Self {
            backend,
            clock,
            renderer,
            settings,
            cancel: CancellationToken::new(),
            state: AppState::default(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn commit(&mut self) {
        self.renderer.render(&self.state);
    }

    /// キャンセルされたら `None`
    async fn cancellable<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            value = fut => Some(value),
        }
    }

    /// 書名を送って検索ジョブを開始する
    pub async fn start_title_search(&mut self, titles: &[String]) -> Result<JobHandle> {
        let text = titles.join("\n");
        if text.trim().is_empty() {
            return Err(ClientError::NoTitles);
        }

        let backend = Arc::clone(&self.backend);
        let job = self
            .cancellable(backend.start_title_search(&text))
            .await
            .ok_or(ClientError::Cancelled)??;
        tracing::info!(job_id = %job, titles = titles.len(), "title search enqueued");

        self.load_job(job.clone());
        Ok(job)
    }

    /// 既存の検索ジョブを読み込む
    pub fn load_job(&mut self, job: JobHandle) {
        self.state = AppState::with_job(job);
        self.state.set_result_message(messages::MATCH_PENDING);
        self.commit();
    }

    /// フェーズ1: 検索ジョブをポーリングし、完了したら選択フォームを表示する
    pub async fn poll_matches(&mut self, job: &JobHandle) -> PhaseOutcome {
        let backend = Arc::clone(&self.backend);
        let clock = Arc::clone(&self.clock);
        let poller = JobPoller::new(backend.as_ref(), clock.as_ref(), self.cancel.clone());
        let interval = self.settings.match_interval;

        let outcome = poller
            .poll_until_terminal(job, interval, |_| {
                if self.state.result != ResultPanel::Message(messages::MATCH_PENDING.to_string()) {
                    self.state.set_result_message(messages::MATCH_PENDING);
                    self.renderer.render(&self.state);
                }
            })
            .await;

        let stopped = match outcome {
            PollOutcome::Finished(result) => return self.show_match_form(result.as_ref()),
            PollOutcome::Failed(error) => format!("{}{}", messages::MATCH_FAILED_PREFIX, error),
            PollOutcome::NoData => messages::FETCH_RESULTS_ERROR.to_string(),
            PollOutcome::Transport(_) => messages::COMMUNICATION_ERROR.to_string(),
            PollOutcome::Cancelled => return PhaseOutcome::Cancelled,
        };

        self.state.set_result_message(stopped.clone());
        self.commit();
        PhaseOutcome::Stopped(stopped)
    }

    /// 検索結果から選択フォームを組み立てて表示する
    pub fn show_match_form(&mut self, result: Option<&Value>) -> PhaseOutcome {
        let form = match parse_match_results(result).and_then(|sets| SelectionForm::build(&sets)) {
            Ok(form) => form,
            Err(e) => {
                tracing::error!(error = %e, "invalid match results");
                self.state.set_result_message(messages::COMMUNICATION_ERROR);
                self.commit();
                return PhaseOutcome::Stopped(messages::COMMUNICATION_ERROR.to_string());
            }
        };

        tracing::info!(groups = form.groups.len(), "match results received");
        self.state.job_id = None;
        self.state.result = ResultPanel::Form(form);
        self.state.confirm = ConfirmButton::Enabled;
        self.commit();
        PhaseOutcome::Done
    }

    /// フェーズ3: 選択を確定し、書籍詳細を取得して解析ジョブを投入する
    pub async fn submit_selections(&mut self) -> SubmitOutcome {
        self.state.alert = None;

        let Some(form) = self.state.form() else {
            tracing::warn!("no selection form to submit");
            return SubmitOutcome::Blocked;
        };
        let confirmed = collect_confirmed(&form.selection());

        let mut panel = ListPanel::new(messages::CONFIRMED_HEADING);
        panel.items = confirmed
            .books
            .iter()
            .map(|book| book_line(book, &book.isbn))
            .collect();
        self.state.confirmed_books = Some(panel);

        tracing::info!(isbn_list = ?confirmed.isbn_list, "final ISBN list");

        if confirmed.isbn_list.is_empty() {
            self.state.alert = Some(messages::NO_BOOKS_ALERT.to_string());
            self.state.status = messages::NO_BOOKS_STATUS.to_string();
            self.state.set_confirm_enabled(true);
            self.commit();
            return SubmitOutcome::Blocked;
        }

        self.state.set_confirm_enabled(false);
        self.commit();

        let backend = Arc::clone(&self.backend);
        let books = match self.cancellable(backend.fetch_book_data(&confirmed.isbn_list)).await {
            None => return SubmitOutcome::Cancelled,
            Some(Ok(books)) => books,
            Some(Err(e)) => {
                tracing::error!(error = %e, "error fetching book data");
                self.state.status = messages::FETCH_BOOK_DATA_ERROR.to_string();
                self.state.set_confirm_enabled(true);
                self.commit();
                return SubmitOutcome::FetchFailed;
            }
        };

        tracing::info!(books = books.len(), "book data fetched");
        self.state.status = messages::DETAILS_RECEIVED.to_string();
        self.commit();

        self.enqueue_analysis(&books).await
    }

    /// 書籍詳細を送ってLLM解析ジョブを投入する
    ///
    /// 失敗時は確定ボタンを再度有効にする。
    pub async fn enqueue_analysis(&mut self, books: &BookDataMap) -> SubmitOutcome {
        tracing::info!(books = books.len(), "sending data to enqueue LLM analysis");
        self.state.status = messages::REQUESTING_ANALYSIS.to_string();
        self.state.set_confirm_enabled(false);
        self.commit();

        let backend = Arc::clone(&self.backend);
        let response = match self.cancellable(backend.enqueue_analysis(books)).await {
            None => return SubmitOutcome::Cancelled,
            Some(response) => response,
        };

        match response {
            Ok(Some(job)) => {
                tracing::info!(job_id = %job, "LLM analysis job enqueued");
                self.state.status = messages::ANALYSIS_STARTED.to_string();
                self.commit();
                SubmitOutcome::Enqueued(job)
            }
            Ok(None) => {
                tracing::error!("no job ID received for LLM task");
                self.state.status = messages::NO_ANALYSIS_JOB_ID.to_string();
                self.state.set_confirm_enabled(true);
                self.commit();
                SubmitOutcome::EnqueueFailed
            }
            Err(e) => {
                tracing::error!(error = %e, "error enqueueing LLM task");
                self.state.status =
                    format!("{}{}", messages::START_ANALYSIS_ERROR_PREFIX, error_detail(e));
                self.state.set_confirm_enabled(true);
                self.commit();
                SubmitOutcome::EnqueueFailed
            }
        }
    }

    /// フェーズ4: 解析ジョブをポーリングし、完了したら結果を集計表示する
    pub async fn poll_analysis(&mut self, job: &JobHandle) -> PhaseOutcome {
        let backend = Arc::clone(&self.backend);
        let clock = Arc::clone(&self.clock);
        let poller = JobPoller::new(backend.as_ref(), clock.as_ref(), self.cancel.clone());
        let interval = self.settings.analysis_interval;

        let outcome = poller
            .poll_until_terminal(job, interval, |_| {
                if self.state.status != messages::ANALYSIS_PENDING {
                    self.state.status = messages::ANALYSIS_PENDING.to_string();
                    self.renderer.render(&self.state);
                }
            })
            .await;

        let stopped = match outcome {
            PollOutcome::Finished(result) => {
                self.state.status = messages::ANALYSIS_COMPLETE.to_string();
                self.display_final_results(result.as_ref());
                return PhaseOutcome::Done;
            }
            PollOutcome::Failed(error) => {
                self.state.status = format!("{}{}", messages::ANALYSIS_FAILED_PREFIX, error);
                self.state.set_result_message(messages::ANALYSIS_FAILED_RESULT);
                self.state.confirm = ConfirmButton::Absent;
                self.state.status.clone()
            }
            PollOutcome::NoData | PollOutcome::Transport(_) => {
                self.state.status = messages::ANALYSIS_STATUS_ERROR.to_string();
                self.state.status.clone()
            }
            PollOutcome::Cancelled => return PhaseOutcome::Cancelled,
        };

        self.commit();
        PhaseOutcome::Stopped(stopped)
    }

    /// 解析済み書籍の一覧と共通テーマを表示する
    pub fn display_final_results(&mut self, result: Option<&Value>) {
        let books = parse_book_data(result);

        let mut list = ListPanel::new(messages::ANALYSED_HEADING);
        if books.is_empty() {
            list.items.push(messages::NO_ANALYSIS_RESULTS.to_string());
        } else {
            list.items = books
                .iter()
                .map(|(isbn, book)| {
                    let sentiment = match book.llm_sentiment.as_deref() {
                        Some(s) if !s.is_empty() => format!(" LLM Sentiment: {}", s),
                        _ => " (LLM Sentiment N/A)".to_string(),
                    };
                    format!("{}{}", book_line(book, isbn), sentiment)
                })
                .collect();
        }
        self.state.confirmed_books = Some(list);

        let themes = top_themes(&books, TOP_THEMES_LIMIT);
        let mut keywords = ListPanel::new(messages::THEMES_HEADING);
        if themes.is_empty() {
            keywords.items.push(messages::NO_COMMON_THEMES.to_string());
        } else {
            keywords.items = themes
                .iter()
                .map(|t| format!("{} (Appears for {} books)", t.display_theme(), t.count))
                .collect();
        }
        self.state.common_keywords = Some(keywords);

        self.state.result = ResultPanel::Empty;
        self.state.confirm = ConfirmButton::Absent;
        self.state.top_themes = themes;
        self.state.final_books = Some(books);
        self.commit();
    }

    /// 全フェーズを通して実行する
    ///
    /// 送信が止まった場合、`prompt` が選び直せるならフォームに戻る。
    pub async fn run(&mut self, job: &JobHandle, prompt: &mut dyn SelectionPrompt) -> Result<()> {
        phase_result(self.poll_matches(job).await)?;

        let analysis_job = loop {
            let form = self
                .state
                .form_mut()
                .ok_or_else(|| ClientError::Stopped(messages::COMMUNICATION_ERROR.to_string()))?;
            prompt.choose(form)?;
            let selectable = form.groups.iter().any(|g| g.has_matches());
            self.commit();

            match self.submit_selections().await {
                SubmitOutcome::Enqueued(job) => break job,
                SubmitOutcome::Cancelled => return Err(ClientError::Cancelled),
                _ if prompt.can_retry() && selectable => {
                    tracing::info!("selection submit stopped; prompting again");
                }
                _ => return Err(ClientError::Stopped(self.state.status.clone())),
            }
        };

        phase_result(self.poll_analysis(&analysis_job).await)
    }
}

fn phase_result(outcome: PhaseOutcome) -> Result<()> {
    match outcome {
        PhaseOutcome::Done => Ok(()),
        PhaseOutcome::Stopped(message) => Err(ClientError::Stopped(message)),
        PhaseOutcome::Cancelled => Err(ClientError::Cancelled),
    }
}

/// ステータス行に出す失敗内容
///
/// サーバの `error`、HTTPステータス、または下層ライブラリのメッセージ。
fn error_detail(error: ClientError) -> String {
    match error {
        ClientError::Api { message, .. } => message,
        ClientError::Request(e) => match e.status() {
            Some(status) => format!("HTTP error {}", status.as_u16()),
            None => e.to_string(),
        },
        ClientError::ApiParse(message) | ClientError::Stopped(message) => message,
        ClientError::JsonParse(e) => e.to_string(),
        ClientError::Io(e) => e.to_string(),
        ClientError::Common(e) => e.to_string(),
        other => other.to_string(),
    }
}

/// `{title} by {authors} (ISBN: {isbn})`。欠けている値は Unknown 表記
fn book_line(book: &BookRecord, isbn: &str) -> String {
    let title = book
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("Unknown Title");
    let authors = book
        .authors
        .as_ref()
        .map(|a| a.join(", "))
        .unwrap_or_else(|| "Unknown Author".to_string());
    format!("{} by {} (ISBN: {})", title, authors, isbn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_line_fallbacks() {
        let book = BookRecord::default();
        assert_eq!(book_line(&book, "9"), "Unknown Title by Unknown Author (ISBN: 9)");

        let book = BookRecord {
            title: Some("Beloved".into()),
            authors: Some(vec!["Toni Morrison".into()]),
            ..Default::default()
        };
        assert_eq!(book_line(&book, "1"), "Beloved by Toni Morrison (ISBN: 1)");
    }

    #[test]
    fn test_error_detail_uses_underlying_message() {
        assert_eq!(
            error_detail(ClientError::Api { status: 500, message: "HTTP error 500".into() }),
            "HTTP error 500"
        );
        assert_eq!(
            error_detail(ClientError::ApiParse("expected value at line 1 column 1".into())),
            "expected value at line 1 column 1"
        );

        let json_error = serde_json::from_str::<Value>("{").unwrap_err();
        let expected = json_error.to_string();
        assert_eq!(error_detail(ClientError::JsonParse(json_error)), expected);

        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        assert_eq!(error_detail(ClientError::Io(io_error)), "connection reset");
    }

    #[test]
    fn test_phase_result() {
        assert!(phase_result(PhaseOutcome::Done).is_ok());
        assert!(matches!(phase_result(PhaseOutcome::Cancelled), Err(ClientError::Cancelled)));
        assert!(matches!(
            phase_result(PhaseOutcome::Stopped("x".into())),
            Err(ClientError::Stopped(m)) if m == "x"
        ));
    }
}
