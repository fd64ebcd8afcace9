use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{parse_optional, Article};
use crate::utils::{DeskError, DeskResult};

/// 后端记录的原始形状。
///
/// 不同来源字段名不一致（`sentiment_score` / `sentimentScore`，`detected_language` / `language`），
/// 每种写法单独接收，在 [`WireArticle::normalize`] 里合并成一种。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireArticle {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub translated_content: Option<String>,
    pub department: Option<String>,
    pub department_score: Option<f64>,
    pub detected_language: Option<String>,
    pub language: Option<String>,
    pub original_language: Option<String>,
    pub sentiment: Option<String>,
    pub sentiment_score: Option<f64>,
    #[serde(rename = "sentimentScore")]
    pub sentiment_score_camel: Option<f64>,
    pub source_type: Option<String>,
    pub source_url: Option<String>,
    pub region: Option<String>,
    pub authors: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub alert_triggered: Option<bool>,
    pub published_date: Option<String>,
    #[serde(rename = "publishedDate")]
    pub published_date_camel: Option<String>,
    pub crawled_date: Option<String>,
    #[serde(rename = "crawledDate")]
    pub crawled_date_camel: Option<String>,
    pub created_at: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at_camel: Option<String>,
}

impl WireArticle {
    pub fn normalize(self) -> DeskResult<Article> {
        let id = self
            .id
            .ok_or_else(|| DeskError::DecodeError("文章缺少 id 字段".to_string()))?;

        let sentiment = parse_optional(self.sentiment.as_deref());
        if sentiment.is_none() {
            if let Some(ref raw) = self.sentiment {
                debug!("文章 {} 的情感标签无法识别: {}", id, raw);
            }
        }

        Ok(Article {
            id,
            title: self.title,
            content: self.content.or(self.summary).unwrap_or_default(),
            translated_content: self.translated_content.filter(|t| !t.is_empty()),
            department: self.department,
            department_score: self.department_score,
            language: self
                .detected_language
                .or(self.language)
                .or(self.original_language),
            sentiment,
            sentiment_score: self.sentiment_score.or(self.sentiment_score_camel),
            source_type: self.source_type,
            source_url: self.source_url,
            region: self.region,
            authors: self.authors.unwrap_or_default(),
            keywords: self.keywords.unwrap_or_default(),
            alert_triggered: self.alert_triggered.unwrap_or(false),
            published_date: self.published_date.or(self.published_date_camel),
            crawled_date: self.crawled_date.or(self.crawled_date_camel),
            created_at: self.created_at.or(self.created_at_camel),
        })
    }
}

/// 解析单条记录
pub fn decode_article(body: &str) -> DeskResult<Article> {
    let wire: WireArticle = serde_json::from_str(body)
        .map_err(|e| DeskError::DecodeError(format!("文章格式错误: {}", e)))?;
    wire.normalize()
}

/// 解析记录列表。单条格式错误只跳过该条，不影响其余记录。
pub fn decode_articles(body: &str) -> DeskResult<Vec<Article>> {
    let values: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| DeskError::DecodeError(format!("文章列表格式错误: {}", e)))?;

    let total = values.len();
    let articles: Vec<Article> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            match serde_json::from_value::<WireArticle>(value)
                .map_err(DeskError::from)
                .and_then(WireArticle::normalize)
            {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!("跳过第 {} 条记录: {}", index, e);
                    None
                }
            }
        })
        .collect();

    if articles.len() < total {
        warn!("{} 条记录中有 {} 条无法解析", total, total - articles.len());
    }
    Ok(articles)
}
