//! Book Analysis Common Library
//!
//! ジョブ結果の型、候補選択フォーム、テーマ集計など、
//! HTTPやUIに依存しないロジック

pub mod error;
pub mod selection;
pub mod themes;
pub mod types;

pub use error::{Error, Result};
pub use selection::{
    collect_confirmed, group_slug, ChoiceOption, ConfirmedSelection, GroupId, SelectedValue,
    Selection, SelectionForm, SelectionGroup, EXCLUDE_LABEL, EXCLUDE_VALUE, NO_MATCHES_NOTICE,
};
pub use themes::{capitalize_first, theme_frequencies, top_themes, ThemeCount, TOP_THEMES_LIMIT};
pub use types::{
    parse_book_data, parse_match_results, BookCandidate, BookDataMap, BookRecord, JobHandle,
    JobState, JobStatus, PossibleMatch, TitleMatchSet,
};
