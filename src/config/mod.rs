pub mod theme;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::DeskResult;

pub use theme::{Theme, ThemeStore};

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// 仪表盘统计窗口（天）
    pub default_days: u32,
    /// `dashboard --watch` 未指定间隔时的刷新周期
    pub refresh_secs: u64,
    /// `news` 每次拉取的条数上限（后端最多 100）
    pub news_limit: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub theme_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            user_agent: "newsdesk/0.1".to_string(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_days: 30,
            refresh_secs: 60,
            news_limit: 50,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            theme_path: "config/theme".to_string(),
        }
    }
}

impl AppConfig {
    /// 文件可以不存在；环境变量 `NEWSDESK__API__BASE_URL` 这类写法覆盖文件中的值
    pub fn load_from(path: impl AsRef<Path>) -> DeskResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("NEWSDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DeskResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
