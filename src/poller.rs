//! ジョブポーリング
//!
//! ジョブが終了状態（finished / failed）になるまで一定間隔で状態を問い合わせる。
//! 前回の問い合わせが pending で返ってきてから次を予約するので、同じジョブへの
//! 問い合わせが重なることはない。通信エラーでは再試行せずに止まる。
//! [`CancellationToken`] が発火すると問い合わせ中・待機中のどちらでも即座に終わる。

use crate::api::JobBackend;
use crate::clock::Clock;
use crate::error::ClientError;
use book_analysis_common::{JobHandle, JobState};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// ポーリングの終わり方
#[derive(Debug)]
pub enum PollOutcome {
    /// 完了。結果ペイロード付き
    Finished(Option<Value>),
    /// ジョブ失敗。サーバのエラーメッセージ
    Failed(String),
    /// レスポンスボディが空（`null`）
    NoData,
    /// 通信エラー
    Transport(ClientError),
    Cancelled,
}

pub struct JobPoller<'a> {
    backend: &'a dyn JobBackend,
    clock: &'a dyn Clock,
    cancel: CancellationToken,
}

impl<'a> JobPoller<'a> {
    pub fn new(backend: &'a dyn JobBackend, clock: &'a dyn Clock, cancel: CancellationToken) -> Self {
        Self {
            backend,
            clock,
            cancel,
        }
    }

    /// 終了状態になるまでポーリングする
    ///
    /// pending を受け取るたびに `on_pending(attempt)` を呼び、`interval` だけ待ってから
    /// 次を問い合わせる。`attempt` は1始まり。
    pub async fn poll_until_terminal<F>(
        &self,
        job: &JobHandle,
        interval: Duration,
        mut on_pending: F,
    ) -> PollOutcome
    where
        F: FnMut(u32),
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!(job_id = %job, "polling cancelled");
                    return PollOutcome::Cancelled;
                }
                response = self.backend.job_status(job) => response,
            };

            let status = match response {
                Ok(Some(status)) => status,
                Ok(None) => {
                    tracing::warn!(job_id = %job, attempt, "empty job status response");
                    return PollOutcome::NoData;
                }
                Err(e) => {
                    tracing::error!(job_id = %job, attempt, error = %e, "error checking job status");
                    return PollOutcome::Transport(e);
                }
            };

            match status.status {
                JobState::Finished => {
                    tracing::info!(job_id = %job, attempt, "job finished");
                    return PollOutcome::Finished(status.result);
                }
                JobState::Failed => {
                    let error = status.error.unwrap_or_else(|| "unknown error".to_string());
                    tracing::error!(job_id = %job, attempt, error = %error, "job failed");
                    return PollOutcome::Failed(error);
                }
                JobState::Pending => {
                    tracing::debug!(job_id = %job, attempt, delay_ms = interval.as_millis() as u64, "job pending");
                    on_pending(attempt);
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!(job_id = %job, "polling cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = self.clock.sleep(interval) => {}
            }
        }
    }
}
