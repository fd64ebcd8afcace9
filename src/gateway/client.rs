use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::language::ocr_code;
use super::wire::{decode_article, decode_articles};
use crate::config::ApiConfig;
use crate::models::{Analytics, Article};
use crate::utils::{DeskError, DeskResult};

/// `GET /api/news` 的查询参数，未设置的参数不发送
#[derive(Debug, Clone, Default)]
pub struct NewsQuery {
    pub language: Option<String>,
    pub sentiment: Option<String>,
    pub department: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl NewsQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let text = [
            ("language", &self.language),
            ("sentiment", &self.sentiment),
            ("department", &self.department),
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
        ];
        for (key, value) in text {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

/// 上传类型，文件扩展名校验与后端一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Image,
}

impl UploadKind {
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Pdf => &[".pdf"],
            UploadKind::Image => &[".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif"],
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            UploadKind::Pdf => "/api/submit/pdf",
            UploadKind::Image => "/api/submit/image",
        }
    }

    /// 请求发出前拒绝后端一定不会接受的文件
    pub fn validate(&self, file_name: &str) -> DeskResult<()> {
        let lower = file_name.to_lowercase();
        if self.allowed_extensions().iter().any(|ext| lower.ends_with(ext)) {
            Ok(())
        } else {
            Err(DeskError::InvalidUpload(format!(
                "{} 不是允许的文件类型 ({})",
                file_name,
                self.allowed_extensions().join(", ")
            )))
        }
    }

    fn mime_for(&self, file_name: &str) -> &'static str {
        let lower = file_name.to_lowercase();
        match self {
            UploadKind::Pdf => "application/pdf",
            UploadKind::Image if lower.ends_with(".png") => "image/png",
            UploadKind::Image if lower.ends_with(".bmp") => "image/bmp",
            UploadKind::Image if lower.ends_with(".tif") || lower.ends_with(".tiff") => "image/tiff",
            UploadKind::Image => "image/jpeg",
        }
    }
}

#[derive(Serialize)]
struct UrlSubmission<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct TextSubmission<'a> {
    title: Option<&'a str>,
    text: &'a str,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    message: String,
}

/// 后端 REST API 客户端。
///
/// 所有失败（网络错误、非 2xx、响应格式错误）都作为错误返回，由调用方决定如何提示；
/// 不做任何自动重试。
pub struct NewsGateway {
    client: Client,
    base_url: String,
}

impl NewsGateway {
    pub fn new(config: &ApiConfig) -> DeskResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 非 2xx 一律视为失败，不尝试解析部分结果
    async fn read_success(response: Response) -> DeskResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DeskError::StatusError { status, body });
        }
        debug!("响应 {}，{} 字节", status, body.len());
        Ok(body)
    }

    pub async fn list_news(&self, query: &NewsQuery) -> DeskResult<Vec<Article>> {
        let url = self.endpoint("/api/news");
        let pairs = query.to_pairs();
        info!("获取新闻列表: {} {:?}", url, pairs);

        let response = self.client.get(&url).query(&pairs).send().await?;
        let body = Self::read_success(response).await?;
        let articles = decode_articles(&body)?;
        info!("获取到 {} 篇文章", articles.len());
        Ok(articles)
    }

    pub async fn get_article(&self, id: i64) -> DeskResult<Article> {
        let url = self.endpoint(&format!("/api/news/{}", id));
        info!("获取文章: {}", url);

        let response = self.client.get(&url).send().await?;
        let body = Self::read_success(response).await?;
        decode_article(&body)
    }

    pub async fn delete_article(&self, id: i64) -> DeskResult<String> {
        let url = self.endpoint(&format!("/api/news/{}", id));
        info!("删除文章: {}", url);

        let response = self.client.delete(&url).send().await?;
        let body = Self::read_success(response).await?;
        let parsed: DeleteResponse = serde_json::from_str(&body)
            .map_err(|e| DeskError::DecodeError(format!("删除响应格式错误: {}", e)))?;
        Ok(parsed.message)
    }

    pub async fn analytics(&self, days: u32) -> DeskResult<Analytics> {
        let url = self.endpoint("/api/analytics");
        info!("获取统计数据: {} (days={})", url, days);

        let response = self
            .client
            .get(&url)
            .query(&[("days", days)])
            .send()
            .await?;
        let body = Self::read_success(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| DeskError::DecodeError(format!("统计数据格式错误: {}", e)))
    }

    pub async fn submit_url(&self, article_url: &str) -> DeskResult<Article> {
        let url = self.endpoint("/api/submit/url");
        info!("提交URL: {}", article_url);

        let response = self
            .client
            .post(&url)
            .json(&UrlSubmission { url: article_url })
            .send()
            .await?;
        let body = Self::read_success(response).await?;
        decode_article(&body)
    }

    /// 空白标题按 `null` 发送
    pub async fn submit_text(&self, title: Option<&str>, text: &str) -> DeskResult<Article> {
        let url = self.endpoint("/api/submit/text");
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        info!("提交文本: {} 字符, 标题={:?}", text.len(), title);

        let response = self
            .client
            .post(&url)
            .json(&TextSubmission { title, text })
            .send()
            .await?;
        let body = Self::read_success(response).await?;
        decode_article(&body)
    }

    pub async fn submit_pdf(&self, path: &Path, language: &str) -> DeskResult<Article> {
        self.submit_file(UploadKind::Pdf, path, language).await
    }

    pub async fn submit_image(&self, path: &Path, language: &str) -> DeskResult<Article> {
        self.submit_file(UploadKind::Image, path, language).await
    }

    /// 上传本地 PDF / 图片，`language` 可以是展示名或三字母代码
    pub async fn submit_file(&self, kind: UploadKind, path: &Path, language: &str) -> DeskResult<Article> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| DeskError::InvalidUpload(format!("无效路径: {}", path.display())))?;
        kind.validate(&file_name)?;

        let bytes = tokio::fs::read(path).await?;
        self.submit_bytes(kind, &file_name, bytes, language).await
    }

    pub async fn submit_bytes(
        &self,
        kind: UploadKind,
        file_name: &str,
        bytes: Vec<u8>,
        language: &str,
    ) -> DeskResult<Article> {
        kind.validate(file_name)?;
        let code = ocr_code(language);
        let url = self.endpoint(kind.endpoint());
        info!("上传文件: {} ({} 字节, OCR语言={})", file_name, bytes.len(), code);

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(kind.mime_for(file_name))?;
        let form = Form::new().part("file", part).text("language", code);

        let response = self.client.post(&url).multipart(form).send().await?;
        let body = Self::read_success(response).await?;
        decode_article(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Path as UrlPath, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn list_news(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let department = params.get("department").cloned().unwrap_or_default();
        let language = params.get("language").cloned().unwrap_or_default();
        Json(json!([
            {
                "id": 1,
                "title": format!("dept={} lang={}", department, language),
                "content": "c",
                "sentiment": "positive",
                "created_at": "2024-01-01T00:00:00"
            },
            { "title": "missing id" }
        ]))
    }

    async fn get_article(UrlPath(id): UrlPath<i64>) -> Result<Json<Value>, StatusCode> {
        if id == 404 {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(Json(json!({ "id": id, "content": "x", "sentimentScore": 0.5 })))
    }

    async fn delete_article(UrlPath(_id): UrlPath<i64>) -> Json<Value> {
        Json(json!({ "message": "Article deleted successfully" }))
    }

    async fn analytics(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let days: u64 = params.get("days").and_then(|d| d.parse().ok()).unwrap_or(0);
        Json(json!({
            "total_articles": days,
            "sentiment_distribution": { "positive": 3, "neutral": 2, "negative": 5 },
            "department_distribution": { "Ministry of Defence": 10 },
            "language_distribution": { "en": 6, "hi": 4 },
            "recent_alerts": 1
        }))
    }

    async fn submit_url_fails() -> (StatusCode, Json<Value>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Failed to process URL: timeout" })),
        )
    }

    async fn submit_text(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({
            "id": 77,
            "title": body["title"],
            "content": body["text"],
            "sentiment": "Neutral",
            "sentiment_score": 0.64,
            "detected_language": "en"
        }))
    }

    async fn submit_pdf(mut multipart: Multipart) -> Json<Value> {
        let mut file_name = String::new();
        let mut language = String::new();
        let mut size = 0usize;
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    file_name = field.file_name().unwrap_or_default().to_string();
                    size = field.bytes().await.unwrap().len();
                }
                "language" => language = field.text().await.unwrap(),
                _ => {}
            }
        }
        Json(json!({
            "id": 9,
            "title": file_name,
            "content": format!("{} bytes", size),
            "detected_language": language
        }))
    }

    async fn spawn_backend() -> NewsGateway {
        let app = Router::new()
            .route("/api/news", get(list_news))
            .route("/api/news/:id", get(get_article).delete(delete_article))
            .route("/api/analytics", get(analytics))
            .route("/api/submit/url", post(submit_url_fails))
            .route("/api/submit/text", post(submit_text))
            .route("/api/submit/pdf", post(submit_pdf));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ApiConfig {
            base_url: format!("http://{}/", addr),
            ..ApiConfig::default()
        };
        NewsGateway::new(&config).unwrap()
    }

    #[test]
    fn test_query_omits_unset_params() {
        let query = NewsQuery {
            department: Some("Ministry of Defence".to_string()),
            sentiment: Some(String::new()),
            limit: Some(50),
            ..NewsQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("department", "Ministry of Defence".to_string()),
                ("limit", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_upload_validation() {
        assert!(UploadKind::Pdf.validate("Report.PDF").is_ok());
        assert!(UploadKind::Pdf.validate("report.docx").is_err());
        assert!(UploadKind::Image.validate("scan.TIF").is_ok());
        assert!(UploadKind::Image.validate("scan.gif").is_err());
        assert_eq!(UploadKind::Image.mime_for("a.png"), "image/png");
        assert_eq!(UploadKind::Image.mime_for("a.jpeg"), "image/jpeg");
    }

    #[tokio::test]
    async fn test_list_news_sends_filters_and_skips_bad_records() {
        let gateway = spawn_backend().await;
        let query = NewsQuery {
            department: Some("Ministry of Defence".to_string()),
            language: Some("hi".to_string()),
            ..NewsQuery::default()
        };
        let articles = gateway.list_news(&query).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(
            articles[0].title.as_deref(),
            Some("dept=Ministry of Defence lang=hi")
        );
    }

    #[tokio::test]
    async fn test_get_article_and_not_found() {
        let gateway = spawn_backend().await;
        let article = gateway.get_article(5).await.unwrap();
        assert_eq!(article.id, 5);
        assert_eq!(article.sentiment_score, Some(0.5));

        let err = gateway.get_article(404).await.unwrap_err();
        match err {
            DeskError::StatusError { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_article() {
        let gateway = spawn_backend().await;
        let message = gateway.delete_article(3).await.unwrap();
        assert_eq!(message, "Article deleted successfully");
    }

    #[tokio::test]
    async fn test_analytics_passes_days() {
        let gateway = spawn_backend().await;
        let analytics = gateway.analytics(7).await.unwrap();
        assert_eq!(analytics.total_articles, 7);
        assert_eq!(analytics.sentiment_distribution.get("negative"), Some(&5));
        assert_eq!(analytics.recent_alerts, 1);
    }

    #[tokio::test]
    async fn test_failed_url_submission_is_status_error() {
        let gateway = spawn_backend().await;
        let err = gateway.submit_url("https://example.org/x").await.unwrap_err();
        match err {
            DeskError::StatusError { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("Failed to process URL"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_text_blank_title_is_null() {
        let gateway = spawn_backend().await;
        let receipt = gateway.submit_text(Some("   "), "some text").await.unwrap();
        assert_eq!(receipt.id, 77);
        assert_eq!(receipt.title, None);
        assert_eq!(receipt.content, "some text");
        assert_eq!(receipt.confidence_percent(), Some(64));
    }

    #[tokio::test]
    async fn test_submit_pdf_sends_ocr_code() {
        let gateway = spawn_backend().await;
        let receipt = gateway
            .submit_bytes(UploadKind::Pdf, "notice.pdf", b"%PDF-1.4".to_vec(), "Telugu")
            .await
            .unwrap();
        assert_eq!(receipt.title.as_deref(), Some("notice.pdf"));
        assert_eq!(receipt.language.as_deref(), Some("tel"));
        assert_eq!(receipt.content, "8 bytes");
    }

    #[tokio::test]
    async fn test_invalid_upload_never_reaches_backend() {
        let config = ApiConfig {
            // 不可达地址：如果真的发出请求会得到网络错误而不是 InvalidUpload
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        };
        let gateway = NewsGateway::new(&config).unwrap();
        let err = gateway
            .submit_bytes(UploadKind::Image, "scan.gif", vec![1, 2, 3], "english")
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let gateway = NewsGateway::new(&config).unwrap();
        let err = gateway.analytics(30).await.unwrap_err();
        assert!(matches!(err, DeskError::NetworkError(_)));
    }
}
