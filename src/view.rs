//! 状態の表示
//!
//! [`render`] は [`AppState`] だけから表示文字列を作る純粋関数。
//! 実際の出力先は [`Renderer`] の実装が決める。

use crate::state::{AppState, ConfirmButton, ListPanel, ResultPanel};
use book_analysis_common::{SelectionForm, NO_MATCHES_NOTICE};
use std::fmt::Write;

pub const CONFIRM_BUTTON_LABEL: &str = "Confirm Selections and Get Details";

/// 状態が変わるたびに呼ばれる出力先
pub trait Renderer: Send {
    fn render(&mut self, state: &AppState);
}

/// 何も出力しない
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _state: &AppState) {}
}

/// 状態全体を文字列にする
pub fn render(state: &AppState) -> String {
    let mut out = render_body(state);
    if !state.status.is_empty() {
        let _ = writeln!(out, "Status: {}", state.status);
    }
    out
}

/// ステータス行以外
pub fn render_body(state: &AppState) -> String {
    let mut out = String::new();

    if let Some(alert) = &state.alert {
        let _ = writeln!(out, "! {}", alert);
    }

    if let Some(job) = &state.job_id {
        let _ = writeln!(out, "Job: {}", job);
    }

    match &state.result {
        ResultPanel::Empty => {}
        ResultPanel::Message(message) => {
            let _ = writeln!(out, "{}", message);
        }
        ResultPanel::Form(form) => out.push_str(&render_form(form)),
    }

    match state.confirm {
        ConfirmButton::Absent => {}
        ConfirmButton::Enabled => {
            let _ = writeln!(out, "[{}]", CONFIRM_BUTTON_LABEL);
        }
        ConfirmButton::Disabled => {
            let _ = writeln!(out, "[{}] (disabled)", CONFIRM_BUTTON_LABEL);
        }
    }

    if let Some(panel) = &state.confirmed_books {
        out.push_str(&render_list(panel));
    }
    if let Some(panel) = &state.common_keywords {
        out.push_str(&render_list(panel));
    }

    out
}

/// 選択フォームを文字列にする
///
/// 選択中の項目は `(*)`、それ以外は `( )`。
pub fn render_form(form: &SelectionForm) -> String {
    let mut out = String::new();

    for group in &form.groups {
        let _ = writeln!(out, "\"{}\"", group.user_title);
        for (index, option) in group.options.iter().enumerate() {
            let mark = if index == group.selected_index() { "(*)" } else { "( )" };
            let _ = writeln!(out, "  {} {}", mark, option.label);
            if index == 0 && !group.has_matches() {
                let _ = writeln!(out, "  {}", NO_MATCHES_NOTICE);
            }
        }
    }

    out
}

fn render_list(panel: &ListPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", panel.heading);
    for item in &panel.items {
        let _ = writeln!(out, "  - {}", item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_analysis_common::{BookCandidate, JobHandle, PossibleMatch, TitleMatchSet};

    fn form() -> SelectionForm {
        SelectionForm::build(&[
            TitleMatchSet {
                user_title: "Dune".into(),
                possible_matches: vec![PossibleMatch {
                    candidate: BookCandidate {
                        title: "Dune".into(),
                        authors: vec!["Frank Herbert".into()],
                        isbn: "1".into(),
                    },
                }],
            },
            TitleMatchSet {
                user_title: "Zzz".into(),
                possible_matches: vec![],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_render_form_marks_selection() {
        let text = render_form(&form());
        assert!(text.contains("\"Dune\"\n  ( ) None of these / Exclude this title\n  (*) Dune by Frank Herbert (ISBN: 1)"));
        assert!(text.contains("\"Zzz\"\n  (*) None of these / Exclude this title\n  No matches found by Google Search"));
    }

    #[test]
    fn test_render_state_sections() {
        let mut state = AppState::with_job(JobHandle::new("abc"));
        state.set_result_message("Book search pending...");
        let text = render(&state);
        assert_eq!(text, "Job: abc\nBook search pending...\n");

        state.job_id = None;
        state.result = ResultPanel::Form(form());
        state.confirm = ConfirmButton::Disabled;
        state.status = "Requesting background LLM analysis...".into();
        let mut panel = ListPanel::new("Confirmed Books for analysis:");
        panel.items.push("Dune by Frank Herbert (ISBN: 1)".into());
        state.confirmed_books = Some(panel);

        let text = render(&state);
        assert!(text.contains("[Confirm Selections and Get Details] (disabled)"));
        assert!(text.contains("Status: Requesting background LLM analysis..."));
        assert!(text.contains("Confirmed Books for analysis:\n  - Dune by Frank Herbert (ISBN: 1)\n"));
        assert!(!text.contains("Job:"));
    }

    #[test]
    fn test_render_alert_first() {
        let state = AppState {
            alert: Some("No books selected.".into()),
            ..Default::default()
        };
        assert!(render(&state).starts_with("! No books selected."));
    }
}
