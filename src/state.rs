//! アプリケーション状態
//!
//! 画面の各領域（ジョブID、結果、ステータス、確定書籍、共通テーマ、確定ボタン）を
//! 1つの値として持ち、フェーズ遷移のたびに書き換える。表示は
//! [`crate::view::render`] がこの値だけから組み立てる。

use book_analysis_common::{BookDataMap, JobHandle, SelectionForm, ThemeCount};

/// 結果領域の中身
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultPanel {
    #[default]
    Empty,
    Message(String),
    Form(SelectionForm),
}

/// 見出し付きの箇条書き
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPanel {
    pub heading: String,
    pub items: Vec<String>,
}

impl ListPanel {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            items: Vec::new(),
        }
    }
}

/// 確定ボタン（`confirmBtn`）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmButton {
    #[default]
    Absent,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub job_id: Option<JobHandle>,
    pub result: ResultPanel,
    pub status: String,
    pub confirmed_books: Option<ListPanel>,
    pub common_keywords: Option<ListPanel>,
    pub confirm: ConfirmButton,
    /// ブロッキング警告（次の遷移で消える）
    pub alert: Option<String>,
    /// 解析完了後の書籍データ
    pub final_books: Option<BookDataMap>,
    pub top_themes: Vec<ThemeCount>,
}

impl AppState {
    pub fn with_job(job: JobHandle) -> Self {
        Self {
            job_id: Some(job),
            ..Default::default()
        }
    }

    pub fn form(&self) -> Option<&SelectionForm> {
        match &self.result {
            ResultPanel::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut SelectionForm> {
        match &mut self.result {
            ResultPanel::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn set_result_message(&mut self, message: impl Into<String>) {
        self.result = ResultPanel::Message(message.into());
    }

    /// ボタンが存在する場合のみ有効/無効を切り替える
    pub fn set_confirm_enabled(&mut self, enabled: bool) {
        if self.confirm != ConfirmButton::Absent {
            self.confirm = if enabled {
                ConfirmButton::Enabled
            } else {
                ConfirmButton::Disabled
            };
        }
    }
}
