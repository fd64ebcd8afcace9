mod alerts;
mod config;
mod engine;
mod gateway;
mod models;
mod render;
mod sentiment;
mod state;
mod utils;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use alerts::AlertBoard;
use config::{AppConfig, Theme, ThemeStore, DEFAULT_CONFIG_PATH};
use engine::fields::{AlertField, ArticleField};
use engine::{Direction, FilterSet, Selection, SortSpec};
use gateway::language::{list_code, range_days};
use gateway::{NewsGateway, NewsQuery};
use models::{Analytics, Article, Sentiment};
use sentiment::SentimentSummary;
use state::{LoadState, ViewSlot};
use utils::logger;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "政府部门新闻舆情监测客户端", long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成默认配置文件
    Init,
    /// 获取、过滤并排序新闻列表
    News {
        /// 在标题和正文中搜索（不区分大小写）
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        department: Option<String>,
        /// 语言名（如 Hindi）或代码（如 hi）
        #[arg(long)]
        language: Option<String>,
        /// positive / neutral / negative
        #[arg(long)]
        sentiment: Option<String>,
        /// 排序字段
        #[arg(long, default_value = "published_date")]
        sort: ArticleField,
        /// asc / desc
        #[arg(long, default_value = "desc")]
        order: Direction,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// 查看单篇文章
    Article {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// 删除文章
    Delete { id: i64 },
    /// 统计分布
    Analytics {
        /// 1d / 7d / 30d / 90d
        #[arg(short, long, default_value = "7d")]
        range: String,
        #[arg(long)]
        json: bool,
    },
    /// 仪表盘概览
    Dashboard {
        /// 统计天数，默认取配置
        #[arg(short, long)]
        days: Option<u32>,
        /// 定时刷新（秒），不带值时使用配置中的周期
        #[arg(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "0")]
        watch: Option<u64>,
    },
    /// 提交新闻进行分析
    Submit {
        #[command(subcommand)]
        kind: SubmitKind,
    },
    /// 本地告警处理
    Alerts {
        /// 告警 JSON 文件
        file: PathBuf,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        department: Option<String>,
        /// 排序字段
        #[arg(long, default_value = "created_at")]
        sort: AlertField,
        #[arg(long, default_value = "desc")]
        order: Direction,
        /// 修改状态，格式 ID=STATUS，可重复
        #[arg(long = "set-status", value_name = "ID=STATUS")]
        set_status: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// 界面主题
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand)]
enum SubmitKind {
    /// 提交新闻链接
    Url { url: String },
    /// 提交文本
    Text {
        #[arg(short, long)]
        title: Option<String>,
        text: String,
    },
    /// 上传 PDF
    Pdf {
        path: PathBuf,
        /// OCR 语言
        #[arg(short, long, default_value = "english")]
        language: String,
    },
    /// 上传图片
    Image {
        path: PathBuf,
        #[arg(short, long, default_value = "english")]
        language: String,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    Get,
    Set { theme: Theme },
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init_logger();
    debug!("newsdesk 启动");

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_command(&cli.config).await?;
        }
        Commands::News {
            search,
            department,
            language,
            sentiment,
            sort,
            order,
            limit,
            offset,
            json,
        } => {
            let app_config = AppConfig::load_from(&cli.config)?;
            let filters = NewsFilters { search, department, language, sentiment };
            let page = Page { limit, offset };
            news_command(&app_config, filters, SortSpec::new(sort, order), page, json).await?;
        }
        Commands::Article { id, json } => {
            let app_config = AppConfig::load_from(&cli.config)?;
            article_command(&app_config, id, json).await?;
        }
        Commands::Delete { id } => {
            let app_config = AppConfig::load_from(&cli.config)?;
            delete_command(&app_config, id).await?;
        }
        Commands::Analytics { range, json } => {
            let app_config = AppConfig::load_from(&cli.config)?;
            analytics_command(&app_config, &range, json).await?;
        }
        Commands::Dashboard { days, watch } => {
            let app_config = AppConfig::load_from(&cli.config)?;
            dashboard_command(&app_config, days, watch).await?;
        }
        Commands::Submit { kind } => {
            let app_config = AppConfig::load_from(&cli.config)?;
            submit_command(&app_config, kind).await?;
        }
        Commands::Alerts {
            file,
            search,
            severity,
            status,
            department,
            sort,
            order,
            set_status,
            json,
        } => {
            let filters = FilterSet::new()
                .search(search.unwrap_or_default())
                .select(AlertField::Severity, lowercase_selection(severity))
                .select(AlertField::Status, lowercase_selection(status))
                .select(AlertField::Department, Selection::from(department));
            alerts_command(&file, &filters, SortSpec::new(sort, order), &set_status, json)?;
        }
        Commands::Theme { action } => {
            let app_config = AppConfig::load_from(&cli.config)?;
            theme_command(&app_config, action.unwrap_or(ThemeAction::Get))?;
        }
    }

    Ok(())
}

struct NewsFilters {
    search: Option<String>,
    department: Option<String>,
    language: Option<String>,
    sentiment: Option<String>,
}

struct Page {
    limit: Option<u32>,
    offset: Option<u32>,
}

/// 告警的严重级别和状态以小写存储
fn lowercase_selection(raw: Option<String>) -> Selection {
    match Selection::from(raw) {
        Selection::Exactly(value) => Selection::Exactly(value.to_lowercase()),
        Selection::All => Selection::All,
    }
}

fn selection_value(selection: &Selection) -> Option<String> {
    match selection {
        Selection::All => None,
        Selection::Exactly(value) => Some(value.clone()),
    }
}

/// 情感过滤条件：后端按原样比较，查询参数保留输入值；本地过滤用规范化后的小写标签
fn sentiment_filter(raw: Option<String>) -> Result<(Option<String>, Selection)> {
    let param = selection_value(&Selection::from(raw));
    let local = match param.as_deref() {
        Some(label) => {
            let parsed: Sentiment = label.parse().map_err(anyhow::Error::msg)?;
            Selection::exactly(parsed.as_str())
        }
        None => Selection::All,
    };
    Ok((param, local))
}

async fn init_command(config_path: &Path) -> Result<()> {
    info!("初始化配置...");

    if config_path.exists() {
        info!("配置文件已存在，跳过: {}", config_path.display());
    } else {
        let app_config = AppConfig::default();
        app_config.save(config_path)?;
        info!("已生成配置文件: {}", config_path.display());
    }

    info!("✅ 初始化完成！");
    info!("下一步:");
    info!("  1. 编辑 {} 设置后端地址 [api] base_url", config_path.display());
    info!("  2. 运行 'newsdesk dashboard' 查看概览");
    Ok(())
}

async fn news_command(
    app_config: &AppConfig,
    filters: NewsFilters,
    sort: SortSpec<ArticleField>,
    page: Page,
    json: bool,
) -> Result<()> {
    let department = Selection::from(filters.department);
    let language = match Selection::from(filters.language) {
        Selection::Exactly(name) => Selection::Exactly(list_code(&name)),
        Selection::All => Selection::All,
    };
    let (sentiment_param, sentiment) = sentiment_filter(filters.sentiment)?;

    let query = NewsQuery {
        language: selection_value(&language),
        sentiment: sentiment_param,
        department: selection_value(&department),
        limit: Some(page.limit.unwrap_or(app_config.dashboard.news_limit).min(100)),
        offset: page.offset,
        ..NewsQuery::default()
    };

    let gateway = NewsGateway::new(&app_config.api)?;
    let slot: ViewSlot<Vec<Article>> = ViewSlot::new();
    let ticket = slot.begin();
    let result = gateway.list_news(&query).await;
    if let Err(ref e) = result {
        error!("获取新闻失败: {}", e);
    }
    slot.resolve(ticket, result);

    let articles = match slot.state() {
        LoadState::Loaded(articles) => articles,
        other => bail!(render::status_line("新闻", &other).unwrap_or_default()),
    };

    let filter_set = FilterSet::new()
        .search(filters.search.unwrap_or_default())
        .select(ArticleField::Department, department)
        .select(ArticleField::Language, language)
        .select(ArticleField::Sentiment, sentiment);
    let visible = engine::apply(&articles, &filter_set, Some(&sort));
    info!("显示 {} / {} 篇文章", visible.len(), articles.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
    } else {
        println!("{}", render::article_list(&visible));
    }
    Ok(())
}

async fn article_command(app_config: &AppConfig, id: i64, json: bool) -> Result<()> {
    let gateway = NewsGateway::new(&app_config.api)?;
    let article = gateway
        .get_article(id)
        .await
        .with_context(|| format!("文章 {} 加载失败", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&article)?);
    } else {
        println!("{}", render::article_detail(&article));
    }
    Ok(())
}

async fn delete_command(app_config: &AppConfig, id: i64) -> Result<()> {
    let gateway = NewsGateway::new(&app_config.api)?;
    let message = gateway
        .delete_article(id)
        .await
        .with_context(|| format!("删除文章 {} 失败", id))?;
    info!("✅ {}", message);
    Ok(())
}

async fn analytics_command(app_config: &AppConfig, range: &str, json: bool) -> Result<()> {
    let days = range_days(range);
    let gateway = NewsGateway::new(&app_config.api)?;
    let analytics = gateway
        .analytics(days)
        .await
        .context("统计数据加载失败")?;

    if json {
        let summary = SentimentSummary::from_distribution(&analytics.sentiment_distribution);
        let output = json!({
            "days": days,
            "analytics": analytics,
            "sentiment": summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render::analytics_report(&analytics, days));
    }
    Ok(())
}

fn print_dashboard(slot: &ViewSlot<Analytics>, days: u32) {
    match slot.state() {
        LoadState::Loaded(analytics) => {
            let summary = SentimentSummary::from_distribution(&analytics.sentiment_distribution);
            println!("{}", render::dashboard(&analytics, &summary, days));
        }
        other => {
            if let Some(line) = render::status_line("仪表盘", &other) {
                println!("{}", line);
            }
        }
    }
}

async fn dashboard_command(app_config: &AppConfig, days: Option<u32>, watch: Option<u64>) -> Result<()> {
    let days = days.unwrap_or(app_config.dashboard.default_days);
    let gateway = Arc::new(NewsGateway::new(&app_config.api)?);
    let slot: ViewSlot<Analytics> = ViewSlot::new();

    let Some(period) = watch else {
        let ticket = slot.begin();
        let result = gateway.analytics(days).await;
        if let Err(ref e) = result {
            error!("仪表盘加载失败: {}", e);
        }
        slot.resolve(ticket, result);
        print_dashboard(&slot, days);
        return match slot.state() {
            LoadState::Failed(e) => bail!("仪表盘加载失败: {}", e),
            _ => Ok(()),
        };
    };

    let period = if period == 0 { app_config.dashboard.refresh_secs } else { period };
    info!("每 {} 秒刷新一次，按 Ctrl+C 停止", period);

    let fetch = move || {
        let gateway = Arc::clone(&gateway);
        async move { gateway.analytics(days).await }
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("无法监听停止信号: {}", e);
            std::future::pending::<()>().await;
        }
        info!("收到停止信号");
    };
    state::refresh_every(
        &slot,
        Duration::from_secs(period.max(1)),
        fetch,
        |slot| print_dashboard(slot, days),
        shutdown,
    )
    .await;
    Ok(())
}

async fn submit_command(app_config: &AppConfig, kind: SubmitKind) -> Result<()> {
    let gateway = NewsGateway::new(&app_config.api)?;

    let (what, result) = match kind {
        SubmitKind::Url { url } => ("URL", gateway.submit_url(&url).await),
        SubmitKind::Text { title, text } => {
            if text.trim().is_empty() {
                bail!("文本内容不能为空");
            }
            ("文本", gateway.submit_text(title.as_deref(), &text).await)
        }
        SubmitKind::Pdf { path, language } => ("PDF", gateway.submit_pdf(&path, &language).await),
        SubmitKind::Image { path, language } => ("图片", gateway.submit_image(&path, &language).await),
    };

    match result {
        Ok(article) => {
            info!("{} 提交成功，文章ID: {}", what, article.id);
            println!("{}", render::receipt(&article));
            Ok(())
        }
        Err(e) => {
            error!("{} 提交失败: {}", what, e);
            Err(anyhow::Error::new(e).context(format!("{} 提交失败", what)))
        }
    }
}

fn alerts_command(
    file: &Path,
    filters: &FilterSet<AlertField>,
    sort: SortSpec<AlertField>,
    set_status: &[String],
    json: bool,
) -> Result<()> {
    let mut board = AlertBoard::load(file)?;

    if !set_status.is_empty() {
        for raw in set_status {
            let (id, status) = alerts::parse_status_update(raw)?;
            if !board.update_status(id, status) {
                bail!("找不到告警: {}", id);
            }
        }
        board.save(file)?;
        info!("已更新 {} 条告警状态: {}", set_status.len(), file.display());
    }

    let visible = board.filtered(filters, Some(&sort));
    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
    } else {
        println!(
            "{}",
            render::alert_report(&visible, board.counts(), chrono::Utc::now())
        );
    }
    Ok(())
}

fn theme_command(app_config: &AppConfig, action: ThemeAction) -> Result<()> {
    let store = ThemeStore::open(&app_config.storage.theme_path);
    let mut changes = store.subscribe();

    match action {
        ThemeAction::Get => {}
        ThemeAction::Set { theme } => store.set(theme)?,
        ThemeAction::Toggle => {
            store.toggle()?;
        }
    }

    if changes.has_changed().unwrap_or(false) {
        info!("主题已切换为 {}", *changes.borrow_and_update());
    }
    println!("{}", store.get());
    Ok(())
}
