//! テーマ頻度集計モジュール
//!
//! LLM解析で付与されたテーマを書籍横断で集計する。
//! 大文字小文字は区別せず、1冊の中で重複したテーマは1回として数える。

use crate::types::BookDataMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// 表示するテーマの上限
pub const TOP_THEMES_LIMIT: usize = 10;

/// テーマと、そのテーマを持つ書籍数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeCount {
    /// 小文字化済みのテーマ
    pub theme: String,
    pub count: usize,
}

impl ThemeCount {
    /// 先頭文字だけ大文字にした表示用テーマ
    pub fn display_theme(&self) -> String {
        capitalize_first(&self.theme)
    }
}

/// 先頭文字を大文字にする
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// テーマごとの出現書籍数（初出順）
pub fn theme_frequencies(books: &BookDataMap) -> Vec<ThemeCount> {
    let mut counts: Vec<ThemeCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for book in books.values() {
        let Some(themes) = &book.llm_themes else {
            continue;
        };

        let mut seen_in_book = HashSet::new();
        for theme in themes {
            let theme = theme.to_lowercase();
            if theme.is_empty() || !seen_in_book.insert(theme.clone()) {
                continue;
            }
            match index.get(&theme) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(theme.clone(), counts.len());
                    counts.push(ThemeCount { theme, count: 1 });
                }
            }
        }
    }

    counts
}

/// 2冊以上に現れるテーマを件数の多い順に最大 `limit` 件
///
/// 同数の場合は初出順を保つ。
pub fn top_themes(books: &BookDataMap, limit: usize) -> Vec<ThemeCount> {
    let mut common: Vec<ThemeCount> = theme_frequencies(books)
        .into_iter()
        .filter(|t| t.count > 1)
        .collect();
    common.sort_by(|a, b| b.count.cmp(&a.count));
    common.truncate(limit);
    common
}
