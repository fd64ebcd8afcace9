//! 终端输出
//!
//! 所有函数只拼字符串，不做 I/O；由命令层决定打印到哪里。

use chrono::{DateTime, Utc};

use crate::alerts::AlertCounts;
use crate::engine::parse_instant;
use crate::models::{Alert, Analytics, Article, Sentiment};
use crate::sentiment::{self, capitalize, verbatim, SentimentSummary, Share};
use crate::state::LoadState;

pub const EMPTY_ARTICLES: &str = "没有找到文章 (No articles found)";
pub const EMPTY_ALERTS: &str = "没有符合条件的告警";
const UNKNOWN: &str = "未知";
const TITLE_WIDTH: usize = 60;

/// `15 Jan 2024, 14:30`，缺失显示 `-`，无法解析的原样返回
pub fn format_date(raw: Option<&str>) -> String {
    match raw {
        None => "-".to_string(),
        Some(raw) => match parse_instant(raw) {
            Some(instant) => instant.format("%d %b %Y, %H:%M").to_string(),
            None => raw.to_string(),
        },
    }
}

/// 相对时间：不足 1 小时为 `Just now`，不足 24 小时为 `Nh ago`，否则 `Nd ago`
pub fn time_ago(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(instant) = raw.and_then(parse_instant) else {
        return "-".to_string();
    };
    let hours = (now - instant).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        format!("{}d ago", hours / 24)
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

pub fn sentiment_label(sentiment: Option<Sentiment>) -> String {
    sentiment
        .map(|s| capitalize(s.as_str()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn confidence(article: &Article) -> String {
    article
        .confidence_percent()
        .map(|p| format!("{}%", p))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn article_line(article: &Article) -> String {
    format!(
        "[{:>5}] {:<60} | {} | {} | {} ({}) | {}",
        article.id,
        truncate(article.title.as_deref().unwrap_or("(无标题)"), TITLE_WIDTH),
        article.department.as_deref().unwrap_or(UNKNOWN),
        article.language.as_deref().unwrap_or(UNKNOWN),
        sentiment_label(article.sentiment),
        confidence(article),
        format_date(article.published_date.as_deref().or(article.created_at.as_deref())),
    )
}

pub fn article_list(articles: &[&Article]) -> String {
    if articles.is_empty() {
        return EMPTY_ARTICLES.to_string();
    }
    let mut out = String::new();
    for article in articles {
        out.push_str(&article_line(article));
        out.push('\n');
    }
    out.push_str(&format!("共 {} 篇", articles.len()));
    out
}

pub fn article_detail(article: &Article) -> String {
    let mut out = format!(
        "# {}\n\nID: {}\n部门: {}{}\n语言: {}\n情感: {} (置信度 {})\n",
        article.title.as_deref().unwrap_or("(无标题)"),
        article.id,
        article.department.as_deref().unwrap_or(UNKNOWN),
        article
            .department_score
            .map(|s| format!(" ({}%)", (s * 100.0).round() as u32))
            .unwrap_or_default(),
        article.language.as_deref().unwrap_or(UNKNOWN),
        sentiment_label(article.sentiment),
        confidence(article),
    );

    if let Some(ref url) = article.source_url {
        out.push_str(&format!("来源: {}\n", url));
    }
    if !article.authors.is_empty() {
        out.push_str(&format!("作者: {}\n", article.authors.join(", ")));
    }
    if let Some(ref region) = article.region {
        out.push_str(&format!("地区: {}\n", region));
    }
    out.push_str(&format!("发布: {}\n", format_date(article.published_date.as_deref())));
    out.push_str(&format!("入库: {}\n", format_date(article.created_at.as_deref())));
    if !article.keywords.is_empty() {
        out.push_str(&format!("关键词: {}\n", article.keywords.join(", ")));
    }
    if article.alert_triggered {
        out.push_str("⚠️ 已触发告警\n");
    }

    out.push('\n');
    out.push_str(article.body());
    if article.translated_content.is_some() && !article.content.is_empty() {
        out.push_str("\n\n--- 原文 ---\n");
        out.push_str(&article.content);
    }
    out
}

/// 提交成功后的回执
pub fn receipt(article: &Article) -> String {
    let mut out = format!(
        "✅ 分析完成\n\n📊 分析结果:\n• 情感: {}\n• 置信度: {}\n• 部门: {}\n• 语言: {}\n• 文章ID: {}\n",
        sentiment_label(article.sentiment),
        confidence(article),
        article.department.as_deref().unwrap_or(UNKNOWN),
        article.language.as_deref().unwrap_or(UNKNOWN),
        article.id,
    );
    if article.translated_content.is_some() {
        out.push_str("\n✓ 翻译完成");
    }
    out
}

fn share_block(heading: &str, shares: &[Share]) -> String {
    let mut out = format!("{}:\n", heading);
    if shares.is_empty() {
        out.push_str("  No Data 100%\n");
        return out;
    }
    for share in shares {
        out.push_str(&format!(
            "  {:<28} {:>6}  {:>3}%\n",
            share.label, share.count, share.percent
        ));
    }
    out
}

pub fn analytics_report(analytics: &Analytics, days: u32) -> String {
    let mut out = format!(
        "统计范围: 最近 {} 天\n文章总数: {}\n近期告警: {}\n\n",
        days, analytics.total_articles, analytics.recent_alerts
    );
    out.push_str(&share_block(
        "情感分布",
        &sentiment::shares(
            &sentiment::fold_labels(&analytics.sentiment_distribution),
            capitalize,
        ),
    ));
    out.push_str(&share_block(
        "部门分布",
        &sentiment::shares(&analytics.department_distribution, verbatim),
    ));
    out.push_str(&share_block(
        "语言分布",
        &sentiment::shares(&analytics.language_distribution, verbatim),
    ));
    out
}

pub fn dashboard(analytics: &Analytics, summary: &SentimentSummary, days: u32) -> String {
    let mut out = format!(
        "== 仪表盘 (最近 {} 天) ==\n文章总数: {}\n近期告警: {}\n情感得分: {}%\n\n",
        days, analytics.total_articles, analytics.recent_alerts, summary.score
    );
    out.push_str(&share_block("情感分布", &summary.shares));

    out.push_str("部门:\n");
    if analytics.department_distribution.is_empty() {
        out.push_str("  (无数据)\n");
    }
    for (department, count) in &analytics.department_distribution {
        out.push_str(&format!("  {:<28} {:>6}\n", department, count));
    }

    out.push_str(&share_block(
        "语言",
        &sentiment::shares(&analytics.language_distribution, verbatim),
    ));
    out
}

pub fn alert_line(alert: &Alert, now: DateTime<Utc>) -> String {
    format!(
        "[{:>4}] {:<8} {:<12} {:<50} | {} | {}",
        alert.id,
        alert.severity.as_str().to_uppercase(),
        alert.status,
        truncate(&alert.title, 50),
        alert.department,
        time_ago(alert.created_at.as_deref(), now),
    )
}

pub fn alert_report(alerts: &[&Alert], counts: AlertCounts, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "严重: {}  待处理: {}  已解决: {}  总计: {}\n\n",
        counts.critical, counts.active, counts.resolved, counts.total
    );
    if alerts.is_empty() {
        out.push_str(EMPTY_ALERTS);
        return out;
    }
    for alert in alerts {
        out.push_str(&alert_line(alert, now));
        out.push('\n');
    }
    out
}

/// 非 Loaded 状态的提示语；失败和“还没有数据”分开提示
pub fn status_line<T>(view: &str, state: &LoadState<T>) -> Option<String> {
    match state {
        LoadState::Idle => Some(format!("{}: 尚未加载", view)),
        LoadState::Loading => Some(format!("{}: 加载中...", view)),
        LoadState::Failed(error) => Some(format!("❌ {}: 加载失败: {}", view, error)),
        LoadState::Loaded(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn article() -> Article {
        Article {
            id: 42,
            title: Some("Rail safety review".to_string()),
            content: "मूल पाठ".to_string(),
            translated_content: Some("Translated body".to_string()),
            department: Some("Ministry of Railways".to_string()),
            department_score: Some(0.8),
            language: Some("hi".to_string()),
            sentiment: Some(Sentiment::Negative),
            sentiment_score: Some(0.914),
            source_type: Some("url".to_string()),
            source_url: None,
            region: None,
            authors: Vec::new(),
            keywords: Vec::new(),
            alert_triggered: false,
            published_date: Some("2024-01-15T14:30:00Z".to_string()),
            crawled_date: None,
            created_at: None,
        }
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2024-01-15T14:30:00Z")), "15 Jan 2024, 14:30");
        assert_eq!(format_date(Some("garbage")), "garbage");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(time_ago(Some("2024-01-15T11:30:00Z"), now), "Just now");
        assert_eq!(time_ago(Some("2024-01-15T07:00:00Z"), now), "5h ago");
        assert_eq!(time_ago(Some("2024-01-12T12:00:00Z"), now), "3d ago");
        assert_eq!(time_ago(None, now), "-");
    }

    #[test]
    fn test_receipt() {
        let text = receipt(&article());
        assert!(text.contains("情感: Negative"));
        assert!(text.contains("置信度: 91%"));
        assert!(text.contains("文章ID: 42"));
        assert!(text.contains("翻译完成"));

        let mut bare = article();
        bare.sentiment = None;
        bare.sentiment_score = Some(0.0);
        bare.translated_content = None;
        let text = receipt(&bare);
        assert!(text.contains("情感: 未知"));
        assert!(text.contains("置信度: N/A"));
        assert!(!text.contains("翻译完成"));
    }

    #[test]
    fn test_article_list_empty_state() {
        assert_eq!(article_list(&[]), EMPTY_ARTICLES);
        let a = article();
        let text = article_list(&[&a]);
        assert!(text.contains("Rail safety review"));
        assert!(text.contains("共 1 篇"));
    }

    #[test]
    fn test_detail_shows_translation_and_original() {
        let text = article_detail(&article());
        assert!(text.contains("Translated body"));
        assert!(text.contains("--- 原文 ---"));
        assert!(text.contains("部门: Ministry of Railways (80%)"));
    }

    #[test]
    fn test_dashboard_renders_score_and_no_data() {
        let analytics = Analytics {
            total_articles: 10,
            sentiment_distribution: BTreeMap::from([
                ("positive".to_string(), 3),
                ("neutral".to_string(), 2),
                ("negative".to_string(), 5),
            ]),
            ..Analytics::default()
        };
        let summary = SentimentSummary::from_distribution(&analytics.sentiment_distribution);
        let text = dashboard(&analytics, &summary, 30);
        assert!(text.contains("情感得分: 40%"));
        assert!(text.contains("Negative"));
        assert!(text.contains("(无数据)"));

        let empty = Analytics::default();
        let summary = SentimentSummary::from_distribution(&empty.sentiment_distribution);
        assert!(dashboard(&empty, &summary, 7).contains("No Data 100%"));
    }

    #[test]
    fn test_failed_state_differs_from_empty() {
        let failed: LoadState<Vec<Article>> = LoadState::Failed("HTTP 500".to_string());
        let idle: LoadState<Vec<Article>> = LoadState::Idle;
        let failed_text = status_line("新闻", &failed).unwrap();
        assert!(failed_text.contains("加载失败"));
        assert_ne!(Some(failed_text), status_line("新闻", &idle));
        assert_eq!(status_line("新闻", &LoadState::Loaded(Vec::<Article>::new())), None);
    }
}
