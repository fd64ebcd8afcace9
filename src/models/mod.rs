pub mod alert;
pub mod article;

pub use alert::{Alert, AlertStatus, Severity};
pub use article::{Analytics, Article, Sentiment};

use std::fmt;
use std::str::FromStr;

/// 标签解析失败（情感、严重程度、状态等枚举）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知标签: {}", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

/// 按小写匹配解析标签，供各枚举的 FromStr 复用
pub(crate) fn parse_label<T: Copy>(raw: &str, table: &[(&str, T)]) -> Result<T, UnknownLabel> {
    let folded = raw.trim().to_lowercase();
    table
        .iter()
        .find(|(label, _)| *label == folded)
        .map(|(_, value)| *value)
        .ok_or_else(|| UnknownLabel(raw.to_string()))
}

/// 宽松解析：失败时返回 None（读取后端数据时用）
pub(crate) fn parse_optional<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.parse().ok())
}
