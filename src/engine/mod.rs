//! 客户端过滤与排序
//!
//! 输入是已经拉取到内存里的一组记录，输出是要展示的有序子集（借用原记录，不复制、不修改）。
//! 过滤条件之间是 AND 关系；排序是稳定排序，相等的记录保持过滤后的原有顺序。

pub mod fields;

pub use fields::{AlertField, ArticleField};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::debug;

/// 可被过滤排序的记录
pub trait Filterable {
    type Field: Copy + Eq + Debug;

    /// 参与文本搜索的字段（缺失字段不返回）
    fn search_fields(&self) -> Vec<&str>;

    /// 分类字段的当前值，缺失时为 None
    fn category(&self, field: Self::Field) -> Option<&str>;

    /// 排序键
    fn sort_key(&self, field: Self::Field) -> SortKey<'_>;
}

/// 分类过滤的取值：`All` 表示不限制
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Exactly(String),
}

/// 界面下拉框里表示“不限”的固定选项
const ALL_LABELS: [&str; 6] = [
    "All Departments",
    "All Languages",
    "All Sentiments",
    "All Severities",
    "All Status",
    "All Statuses",
];

impl Selection {
    /// 解析界面上的选项。`all`（不区分大小写）和固定的 "All Departments" 这类标签视为不限制；
    /// 其余以 "All " 开头的值（如 "All India Radio"）是真实取值。
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") || ALL_LABELS.contains(&trimmed) {
            Selection::All
        } else {
            Selection::Exactly(trimmed.to_string())
        }
    }

    pub fn exactly(value: impl Into<String>) -> Self {
        Selection::Exactly(value.into())
    }

    fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Exactly(expected) => value == Some(expected.as_str()),
        }
    }
}

impl From<Option<String>> for Selection {
    fn from(value: Option<String>) -> Self {
        value.map(|v| Selection::parse(&v)).unwrap_or(Selection::All)
    }
}

/// 过滤条件集合
#[derive(Debug, Clone)]
pub struct FilterSet<F> {
    search: String,
    selections: Vec<(F, Selection)>,
}

impl<F> Default for FilterSet<F> {
    fn default() -> Self {
        Self {
            search: String::new(),
            selections: Vec::new(),
        }
    }
}

impl<F: Copy + Eq + Debug> FilterSet<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    pub fn select(mut self, field: F, selection: Selection) -> Self {
        if selection != Selection::All {
            self.selections.push((field, selection));
        }
        self
    }

    fn admits<R: Filterable<Field = F>>(&self, record: &R, needle: &str) -> bool {
        if !needle.is_empty()
            && !record
                .search_fields()
                .iter()
                .any(|text| text.to_lowercase().contains(needle))
        {
            return false;
        }

        self.selections
            .iter()
            .all(|(field, selection)| selection.admits(record.category(*field)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Asc),
            "desc" | "descending" => Ok(Direction::Desc),
            other => Err(format!("未知排序方向: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<F> {
    pub field: F,
    pub direction: Direction,
}

impl<F> SortSpec<F> {
    pub fn new(field: F, direction: Direction) -> Self {
        Self { field, direction }
    }
}

/// 排序键。缺失的文本当作空串，缺失的数字当作 0；时间戳解析失败或缺失记为 `Instant(None)`。
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
    Instant(Option<DateTime<Utc>>),
}

impl SortKey<'_> {
    /// 无效时间戳不受方向影响，始终排在有效时间之前
    fn compare(&self, other: &Self, direction: Direction) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => direction.apply(a.cmp(b)),
            (SortKey::Number(a), SortKey::Number(b)) => direction.apply(a.total_cmp(b)),
            (SortKey::Instant(a), SortKey::Instant(b)) => match (a, b) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => direction.apply(a.cmp(b)),
            },
            _ => Ordering::Equal,
        }
    }
}

/// 解析 ISO-8601 时间戳。不带时区的按 UTC 处理，纯日期取当天零点。
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 过滤并排序。返回原集合的有序子集。
pub fn apply<'a, R: Filterable>(
    collection: &'a [R],
    filters: &FilterSet<R::Field>,
    sort: Option<&SortSpec<R::Field>>,
) -> Vec<&'a R> {
    let needle = filters.search.to_lowercase();
    let mut selected: Vec<&R> = collection
        .iter()
        .filter(|record| filters.admits(*record, &needle))
        .collect();

    if let Some(spec) = sort {
        // sort_by 是稳定排序
        selected.sort_by(|a, b| {
            a.sort_key(spec.field)
                .compare(&b.sort_key(spec.field), spec.direction)
        });
    }

    debug!(
        "过滤排序: {} -> {} 条记录 (sort={:?})",
        collection.len(),
        selected.len(),
        sort
    );
    selected
}
