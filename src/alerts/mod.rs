use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::engine::fields::AlertField;
use crate::engine::{self, FilterSet, SortSpec};
use crate::models::{Alert, AlertStatus, Severity};
use crate::utils::{DeskError, DeskResult};

/// 告警概况
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub total: usize,
    pub critical: usize,
    pub active: usize,
    pub resolved: usize,
}

/// 本地告警面板。
///
/// 后端没有告警列表接口，告警从本地 JSON 文件读入；状态变更只改本地副本，不回写服务端。
#[derive(Debug, Clone, Default)]
pub struct AlertBoard {
    alerts: Vec<Alert>,
}

impl AlertBoard {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }

    pub fn load(path: impl AsRef<Path>) -> DeskResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let alerts: Vec<Alert> = serde_json::from_str(&content)
            .map_err(|e| DeskError::DecodeError(format!("告警文件格式错误 {}: {}", path.display(), e)))?;
        info!("从 {} 加载了 {} 条告警", path.display(), alerts.len());
        Ok(Self { alerts })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DeskResult<()> {
        let content = serde_json::to_string_pretty(&self.alerts)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn filtered(
        &self,
        filters: &FilterSet<AlertField>,
        sort: Option<&SortSpec<AlertField>>,
    ) -> Vec<&Alert> {
        engine::apply(&self.alerts, filters, sort)
    }

    /// 修改单条告警的状态，id 不存在时返回 false
    pub fn update_status(&mut self, id: i64, status: AlertStatus) -> bool {
        match self.alerts.iter_mut().find(|alert| alert.id == id) {
            Some(alert) => {
                info!("告警 {} 状态: {} -> {}", id, alert.status, status);
                alert.status = status;
                warn!("告警状态只在本地修改，未同步到服务端");
                true
            }
            None => {
                warn!("找不到告警: {}", id);
                false
            }
        }
    }

    pub fn counts(&self) -> AlertCounts {
        counts_of(self.alerts.iter())
    }
}

pub fn counts_of<'a>(alerts: impl Iterator<Item = &'a Alert>) -> AlertCounts {
    alerts.fold(AlertCounts::default(), |mut acc, alert| {
        acc.total += 1;
        if alert.severity == Severity::Critical {
            acc.critical += 1;
        }
        match alert.status {
            AlertStatus::Active => acc.active += 1,
            AlertStatus::Resolved => acc.resolved += 1,
            AlertStatus::Acknowledged => {}
        }
        acc
    })
}

/// 解析 `ID=STATUS`
pub fn parse_status_update(raw: &str) -> DeskResult<(i64, AlertStatus)> {
    let (id, status) = raw
        .split_once('=')
        .ok_or_else(|| DeskError::ConfigError(format!("格式应为 ID=STATUS: {}", raw)))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| DeskError::ConfigError(format!("无效的告警 id {}: {}", id, e)))?;
    let status = status
        .parse::<AlertStatus>()
        .map_err(|e| DeskError::ConfigError(e.to_string()))?;
    Ok((id, status))
}
