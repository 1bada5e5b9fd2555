//! 端末への表示
//!
//! 本文（結果・フォーム・一覧）は変化したときだけ出力し、
//! ステータスはスピナー行に表示する。スピナーは描画のたびに1コマ進めるだけで、
//! 自動では再描画しない。
//!
//! 出力先が端末でなくスピナーが非表示のときは、ステータス行を含む
//! 画面全体（[`view::render`]）を変化のたびに出力する。

use crate::state::AppState;
use crate::view::{self, Renderer};
use indicatif::{ProgressBar, ProgressStyle};

pub struct TerminalRenderer {
    spinner: ProgressBar,
    last_body: String,
    last_status: String,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        Self {
            spinner,
            last_body: String::new(),
            last_status: String::new(),
        }
    }

    fn render_plain(&mut self, state: &AppState) {
        let frame = view::render(state);
        if frame != self.last_body {
            println!("\n{}", frame.trim_end());
            self.last_body = frame;
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, state: &AppState) {
        if self.spinner.is_hidden() {
            self.render_plain(state);
            return;
        }

        let body = view::render_body(state);
        if body != self.last_body {
            self.spinner.suspend(|| {
                println!("\n{}", body.trim_end());
            });
            self.last_body = body;
        }

        if state.status != self.last_status {
            self.spinner.set_message(state.status.clone());
            self.last_status = state.status.clone();
        }
        self.spinner.tick();
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        self.spinner.finish();
    }
}
