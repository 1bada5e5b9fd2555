//! 解析結果の保存

use crate::error::Result;
use crate::state::AppState;
use book_analysis_common::{BookDataMap, ThemeCount};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub books: BookDataMap,
    pub common_themes: Vec<ThemeCount>,
}

impl AnalysisReport {
    /// 解析完了後の状態から作る。未完了なら `None`
    pub fn from_state(state: &AppState) -> Option<Self> {
        let books = state.final_books.clone()?;
        Some(Self {
            generated_at: Utc::now(),
            books,
            common_themes: state.top_themes.clone(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
