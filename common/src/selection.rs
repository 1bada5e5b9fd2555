//! 候補選択フォームモジュール
//!
//! 書名ごとに「候補のいずれか」または「除外」を1つだけ選ぶ排他グループを作り、
//! 確定した選択から解析対象の書籍とISBNリストを取り出す。
//!
//! グループは生成順のインデックスで識別する。書名から作るスラッグ
//! （空白の連続を `_` に置換）は表示用の名前としてのみ保持し、
//! 異なる書名が同じスラッグになってもグループは混ざらない。

use crate::error::Result;
use crate::types::{BookRecord, TitleMatchSet};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// 除外オプションの値
pub const EXCLUDE_VALUE: &str = "NONE";

/// 除外オプションのラベル
pub const EXCLUDE_LABEL: &str = "None of these / Exclude this title";

/// 候補が0件のときの表示
pub const NO_MATCHES_NOTICE: &str = "No matches found by Google Search";

/// 選択グループの識別子（生成順インデックス）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// 書名から表示用のグループ名を作る
pub fn group_slug(user_title: &str) -> String {
    lazy_static::lazy_static! {
        static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    }
    format!("select_{}", WHITESPACE_RE.replace_all(user_title, "_"))
}

/// 選択肢1件
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    /// 除外なら [`EXCLUDE_VALUE`]、候補ならそのJSON表現
    pub value: String,
}

impl ChoiceOption {
    pub fn is_exclude(&self) -> bool {
        self.value == EXCLUDE_VALUE
    }
}

/// 書名1件分の排他選択グループ
///
/// `options[0]` は常に除外オプション。
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionGroup {
    pub id: GroupId,
    pub name: String,
    pub user_title: String,
    pub options: Vec<ChoiceOption>,
    selected: usize,
}

impl SelectionGroup {
    fn from_match_set(index: usize, set: &TitleMatchSet) -> Result<Self> {
        let mut options = vec![ChoiceOption {
            label: EXCLUDE_LABEL.to_string(),
            value: EXCLUDE_VALUE.to_string(),
        }];

        for candidate in set.candidates() {
            options.push(ChoiceOption {
                label: candidate.label(),
                value: serde_json::to_string(candidate)?,
            });
        }

        // 候補があれば先頭候補、なければ除外を選択
        let selected = if options.len() > 1 { 1 } else { 0 };

        Ok(Self {
            id: GroupId(index),
            name: group_slug(&set.user_title),
            user_title: set.user_title.clone(),
            options,
            selected,
        })
    }

    /// 候補が1件以上あるか（なければ [`NO_MATCHES_NOTICE`] を表示する）
    pub fn has_matches(&self) -> bool {
        self.options.len() > 1
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_option(&self) -> &ChoiceOption {
        &self.options[self.selected]
    }

    pub fn is_excluded(&self) -> bool {
        self.selected_option().is_exclude()
    }

    /// 選択を変更する。範囲外のインデックスは無視して false を返す
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.options.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    pub fn exclude(&mut self) {
        self.selected = 0;
    }

    /// 選択値を直接書き換える（フォーム外から値を受け取る場合）
    pub fn set_raw_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self.options.iter().position(|o| o.value == value) {
            Some(index) => self.selected = index,
            None => {
                self.options.push(ChoiceOption {
                    label: value.clone(),
                    value,
                });
                self.selected = self.options.len() - 1;
            }
        }
    }
}

/// 選択フォーム全体
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionForm {
    pub groups: Vec<SelectionGroup>,
}

impl SelectionForm {
    /// 書名ごとの候補リストからフォームを組み立てる
    pub fn build(sets: &[TitleMatchSet]) -> Result<Self> {
        let groups = sets
            .iter()
            .enumerate()
            .map(|(i, set)| SelectionGroup::from_match_set(i, set))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { groups })
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut SelectionGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// 現在の選択状態を読み出す
    pub fn selection(&self) -> Selection {
        self.groups
            .iter()
            .map(|g| {
                let option = g.selected_option();
                let value = if option.is_exclude() {
                    SelectedValue::Exclude
                } else {
                    SelectedValue::Candidate(option.value.clone())
                };
                (g.id, value)
            })
            .collect()
    }
}

/// グループごとの選択値
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedValue {
    Exclude,
    /// 候補のJSON表現
    Candidate(String),
}

/// グループ → 選択値
pub type Selection = BTreeMap<GroupId, SelectedValue>;

/// 確定した選択
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfirmedSelection {
    /// 解析対象として確定した書籍（ISBNが空のものも含む）
    pub books: Vec<BookRecord>,
    /// 空でないISBNのみ
    pub isbn_list: Vec<String>,
    /// 候補データが壊れていてスキップしたグループ
    pub skipped: Vec<GroupId>,
}

/// 選択状態から確定リストとISBNリストを作る
///
/// 除外は読み飛ばし、候補データのパースに失敗したグループはログを出してスキップする。
pub fn collect_confirmed(selection: &Selection) -> ConfirmedSelection {
    let mut confirmed = ConfirmedSelection::default();

    for (group, value) in selection {
        let raw = match value {
            SelectedValue::Exclude => {
                tracing::info!(group = %group, "user excluded selection");
                continue;
            }
            SelectedValue::Candidate(raw) => raw,
        };

        let book: BookRecord = match serde_json::from_str(raw) {
            Ok(book) => book,
            Err(e) => {
                tracing::error!(group = %group, value = %raw, error = %e, "failed to parse selected book data");
                confirmed.skipped.push(*group);
                continue;
            }
        };

        if book.isbn.is_empty() {
            tracing::warn!(group = %group, title = ?book.title, "selected book is missing an ISBN");
        } else {
            confirmed.isbn_list.push(book.isbn.clone());
        }
        confirmed.books.push(book);
    }

    confirmed
}
