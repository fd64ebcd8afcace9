use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::UnknownLabel;
use crate::utils::DeskResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::models::parse_label(s, &[("light", Theme::Light), ("dark", Theme::Dark)])
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 主题偏好。唯一持久化的本地状态，文件内容只有 `dark` 或 `light`。
///
/// 展示层通过 [`ThemeStore::subscribe`] 拿到变更通知，而不是自己去读文件。
pub struct ThemeStore {
    path: PathBuf,
    sender: watch::Sender<Theme>,
}

impl ThemeStore {
    /// 文件缺失或内容无法识别时按 light 处理
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let theme = match std::fs::read_to_string(&path) {
            Ok(content) => content.trim().parse().unwrap_or_else(|e| {
                warn!("主题文件内容无效 {}: {}", path.display(), e);
                Theme::Light
            }),
            Err(_) => Theme::Light,
        };
        debug!("主题: {} ({})", theme, path.display());
        let (sender, _) = watch::channel(theme);
        Self { path, sender }
    }

    pub fn get(&self) -> Theme {
        *self.sender.borrow()
    }

    /// 先落盘再通知订阅者；写文件失败时内存中的值不变
    pub fn set(&self, theme: Theme) -> DeskResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, theme.as_str())?;
        self.sender.send_replace(theme);
        Ok(())
    }

    pub fn toggle(&self) -> DeskResult<Theme> {
        let next = self.get().toggled();
        self.set(next)?;
        Ok(next)
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.sender.subscribe()
    }
}
