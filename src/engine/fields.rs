use std::str::FromStr;

use super::{parse_instant, Filterable, SortKey};
use crate::models::{Alert, Article};

/// 统一字段名写法：`publishedDate` / `published-date` / `published_date` 都认
fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn instant(raw: Option<&str>) -> SortKey<'static> {
    SortKey::Instant(raw.and_then(parse_instant))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleField {
    Title,
    Department,
    Language,
    Sentiment,
    SentimentScore,
    PublishedDate,
    CrawledDate,
    CreatedAt,
}

impl FromStr for ArticleField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "title" => Ok(ArticleField::Title),
            "department" => Ok(ArticleField::Department),
            "language" | "detectedlanguage" => Ok(ArticleField::Language),
            "sentiment" => Ok(ArticleField::Sentiment),
            "sentimentscore" | "confidence" => Ok(ArticleField::SentimentScore),
            "publisheddate" | "published" => Ok(ArticleField::PublishedDate),
            "crawleddate" | "crawled" => Ok(ArticleField::CrawledDate),
            "createdat" | "created" => Ok(ArticleField::CreatedAt),
            _ => Err(format!("不支持的文章排序字段: {}", s)),
        }
    }
}

impl Filterable for Article {
    type Field = ArticleField;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(2);
        if let Some(title) = self.title.as_deref() {
            fields.push(title);
        }
        fields.push(self.body());
        fields
    }

    fn category(&self, field: ArticleField) -> Option<&str> {
        match field {
            ArticleField::Title => self.title.as_deref(),
            ArticleField::Department => self.department.as_deref(),
            ArticleField::Language => self.language.as_deref(),
            ArticleField::Sentiment => self.sentiment.as_ref().map(|s| s.as_str()),
            ArticleField::PublishedDate => self.published_date.as_deref(),
            ArticleField::CrawledDate => self.crawled_date.as_deref(),
            ArticleField::CreatedAt => self.created_at.as_deref(),
            ArticleField::SentimentScore => None,
        }
    }

    fn sort_key(&self, field: ArticleField) -> SortKey<'_> {
        match field {
            ArticleField::SentimentScore => SortKey::Number(self.sentiment_score.unwrap_or(0.0)),
            ArticleField::PublishedDate => instant(self.published_date.as_deref()),
            ArticleField::CrawledDate => instant(self.crawled_date.as_deref()),
            ArticleField::CreatedAt => instant(self.created_at.as_deref()),
            other => SortKey::Text(self.category(other).unwrap_or("")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertField {
    Title,
    Severity,
    Status,
    Department,
    CreatedAt,
}

impl FromStr for AlertField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "title" => Ok(AlertField::Title),
            "severity" => Ok(AlertField::Severity),
            "status" => Ok(AlertField::Status),
            "department" => Ok(AlertField::Department),
            "createdat" | "created" => Ok(AlertField::CreatedAt),
            _ => Err(format!("不支持的告警排序字段: {}", s)),
        }
    }
}

impl Filterable for Alert {
    type Field = AlertField;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str(), self.department.as_str()]
    }

    fn category(&self, field: AlertField) -> Option<&str> {
        match field {
            AlertField::Title => Some(self.title.as_str()),
            AlertField::Severity => Some(self.severity.as_str()),
            AlertField::Status => Some(self.status.as_str()),
            AlertField::Department => Some(self.department.as_str()),
            AlertField::CreatedAt => self.created_at.as_deref(),
        }
    }

    fn sort_key(&self, field: AlertField) -> SortKey<'_> {
        match field {
            AlertField::CreatedAt => instant(self.created_at.as_deref()),
            other => SortKey::Text(self.category(other).unwrap_or("")),
        }
    }
}
