//! 候補の選択入力
//!
//! 対話式（[`DialoguerPrompt`]）と、既定の選択をそのまま使う非対話式
//! （[`AcceptDefaults`]）の2種類。

use crate::error::{ClientError, Result};
use book_analysis_common::{SelectionForm, NO_MATCHES_NOTICE};
use dialoguer::Select;

pub trait SelectionPrompt: Send {
    /// フォームの選択を更新する
    fn choose(&mut self, form: &mut SelectionForm) -> Result<()>;

    /// 送信が止まったときにもう一度選び直せるか
    fn can_retry(&self) -> bool;
}

/// 既定の選択（先頭候補、候補なしなら除外）をそのまま送る
#[derive(Debug, Default)]
pub struct AcceptDefaults;

impl SelectionPrompt for AcceptDefaults {
    fn choose(&mut self, _form: &mut SelectionForm) -> Result<()> {
        Ok(())
    }

    fn can_retry(&self) -> bool {
        false
    }
}

/// 書名ごとに候補を選ばせる
#[derive(Debug, Default)]
pub struct DialoguerPrompt;

impl SelectionPrompt for DialoguerPrompt {
    fn choose(&mut self, form: &mut SelectionForm) -> Result<()> {
        let total = form.groups.len();

        for (count, group) in form.groups.iter_mut().enumerate() {
            if !group.has_matches() {
                println!("[{}/{}] \"{}\": {}", count + 1, total, group.user_title, NO_MATCHES_NOTICE);
                continue;
            }

            let labels: Vec<&str> = group.options.iter().map(|o| o.label.as_str()).collect();
            let index = Select::new()
                .with_prompt(format!("[{}/{}] \"{}\"", count + 1, total, group.user_title))
                .items(&labels)
                .default(group.selected_index())
                .interact()
                .map_err(|e| ClientError::Prompt(e.to_string()))?;

            group.select(index);
        }

        Ok(())
    }

    fn can_retry(&self) -> bool {
        true
    }
}
