use crate::controller::PollSettings;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `base_url` より優先される環境変数
pub const BASE_URL_ENV: &str = "BOOK_ANALYSIS_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub match_poll_interval_ms: u64,
    pub analysis_poll_interval_ms: u64,
    pub request_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            match_poll_interval_ms: 1000,
            analysis_poll_interval_ms: 5000,
            request_timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("book-analysis").join("config.json"))
    }

    /// 接続先URL（CLI指定 > 環境変数 > 設定ファイル）
    pub fn resolve_base_url(&self, cli: Option<&str>) -> String {
        if let Some(url) = cli.filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                return url;
            }
        }
        self.base_url.clone()
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!("URLは http:// か https:// で始めてください: {}", url)));
        }
        self.base_url = url;
        self.save()
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            match_interval: Duration::from_millis(self.match_poll_interval_ms),
            analysis_interval: Duration::from_millis(self.analysis_poll_interval_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_intervals() {
        let settings = Config::default().poll_settings();
        assert_eq!(settings, PollSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            base_url: "http://books.local:8080".into(),
            analysis_poll_interval_ms: 2500,
            ..Default::default()
        };
        config.save_to(&path).expect("設定保存失敗");

        let loaded = Config::load_from(&path).expect("設定読み込み失敗");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let loaded = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://x:1"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, "http://x:1");
        assert_eq!(loaded.match_poll_interval_ms, 1000);
    }

    #[test]
    fn test_cli_base_url_wins() {
        let config = Config::default();
        assert_eq!(config.resolve_base_url(Some("http://cli:1")), "http://cli:1");
    }
}
