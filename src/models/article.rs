use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{parse_label, UnknownLabel};

/// 情感极性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// 加权得分中的权重
    pub fn weight(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Neutral => 0.5,
            Sentiment::Negative => 0.0,
        }
    }
}

impl FromStr for Sentiment {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(
            s,
            &[
                ("positive", Sentiment::Positive),
                ("neutral", Sentiment::Neutral),
                ("negative", Sentiment::Negative),
            ],
        )
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 规范化后的新闻记录。后端字段别名在 gateway 边界统一处理，这里只有一种形状。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: i64,
    pub title: Option<String>,
    pub content: String,
    pub translated_content: Option<String>,
    pub department: Option<String>,
    pub department_score: Option<f64>,
    pub language: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
    pub source_type: Option<String>,
    pub source_url: Option<String>,
    pub region: Option<String>,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub alert_triggered: bool,
    pub published_date: Option<String>,
    pub crawled_date: Option<String>,
    pub created_at: Option<String>,
}

impl Article {
    /// 搜索用的正文：有译文时用译文
    pub fn body(&self) -> &str {
        self.translated_content.as_deref().unwrap_or(&self.content)
    }

    /// 置信度百分比，没有分数时为 None
    pub fn confidence_percent(&self) -> Option<u32> {
        self.sentiment_score
            .filter(|s| *s > 0.0)
            .map(|s| (s * 100.0).round() as u32)
    }
}

/// `/api/analytics` 聚合结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub sentiment_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub department_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub language_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub recent_alerts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_parse_is_case_insensitive() {
        assert_eq!("Positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!(" NEGATIVE ".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert!("unknown".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_analytics_missing_fields_default() {
        let analytics: Analytics = serde_json::from_str(r#"{"total_articles": 4}"#).unwrap();
        assert_eq!(analytics.total_articles, 4);
        assert!(analytics.sentiment_distribution.is_empty());
        assert_eq!(analytics.recent_alerts, 0);
    }
}
