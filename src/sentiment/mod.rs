//! 情感分布聚合
//!
//! 后端 `/api/analytics` 返回 `label -> count` 的分布，标签大小写不固定（`positive` / `Positive`）。
//! 这里把分布折算成一个加权百分比：positive=1.0，neutral=0.5，negative=0.0。

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Sentiment;

/// 分布中的一项，用于展示占比
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share {
    pub label: String,
    pub count: u64,
    pub percent: u32,
}

/// 仪表盘上的情感概览
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentimentSummary {
    pub score: u8,
    pub total: u64,
    pub shares: Vec<Share>,
}

impl SentimentSummary {
    /// 大小写不同的同一标签合并成一行，与得分的口径一致
    pub fn from_distribution(distribution: &BTreeMap<String, u64>) -> Self {
        let folded = fold_labels(distribution);
        Self {
            score: weighted_score(distribution),
            total: total_of(distribution),
            shares: shares(&folded, capitalize),
        }
    }
}

/// 按小写合并标签计数
pub fn fold_labels(distribution: &BTreeMap<String, u64>) -> BTreeMap<String, u64> {
    let mut folded: BTreeMap<String, u64> = BTreeMap::new();
    for (label, count) in distribution {
        let slot = folded.entry(label.to_lowercase()).or_insert(0);
        *slot = slot.saturating_add(*count);
    }
    folded
}

/// 计数之和，溢出时饱和到 `u64::MAX`
pub fn total_of<K>(distribution: &BTreeMap<K, u64>) -> u64 {
    distribution
        .values()
        .fold(0u64, |acc, count| acc.saturating_add(*count))
}

/// 加权情感得分（0–100）。
///
/// 分母是所有标签的计数之和，包括无法识别的标签（如 `unknown`）；分子只计入三个已知标签。
/// 所以未知标签会拉低得分。这是否是有意为之尚不确定，这里保持现有行为。
pub fn weighted_score<K: AsRef<str>>(distribution: &BTreeMap<K, u64>) -> u8 {
    // 按 f64 累加，超大计数也不会溢出
    let total: f64 = distribution.values().map(|count| *count as f64).sum();
    if total <= 0.0 {
        return 0;
    }

    let numerator: f64 = distribution
        .iter()
        .filter_map(|(label, count)| {
            label
                .as_ref()
                .parse::<Sentiment>()
                .ok()
                .map(|sentiment| *count as f64 * sentiment.weight())
        })
        .sum();

    let score = (numerator / total).clamp(0.0, 1.0);
    (score * 100.0).round() as u8
}

/// 各标签的占比，百分比四舍五入到整数
pub fn shares(distribution: &BTreeMap<String, u64>, display: fn(&str) -> String) -> Vec<Share> {
    let total = total_of(distribution);
    distribution
        .iter()
        .map(|(label, count)| Share {
            label: display(label),
            count: *count,
            percent: percent_of(*count, total),
        })
        .collect()
}

pub fn percent_of(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round().min(100.0) as u32
}

/// 首字母大写，其余小写（情感标签展示用）
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// 原样展示（部门、语言）
pub fn verbatim(label: &str) -> String {
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_weighted_score_basic() {
        let d = dist(&[("positive", 3), ("neutral", 2), ("negative", 5)]);
        assert_eq!(weighted_score(&d), 40);
    }

    #[test]
    fn test_weighted_score_empty() {
        assert_eq!(weighted_score(&dist(&[])), 0);
        assert_eq!(weighted_score(&dist(&[("positive", 0), ("negative", 0)])), 0);
    }

    #[test]
    fn test_weighted_score_mixed_case() {
        assert_eq!(weighted_score(&dist(&[("Positive", 10)])), 100);
        assert_eq!(weighted_score(&dist(&[("NEUTRAL", 4)])), 50);
    }

    #[test]
    fn test_keys_folding_to_same_label_are_summed() {
        let d = dist(&[("positive", 1), ("Positive", 1), ("negative", 2)]);
        assert_eq!(weighted_score(&d), 50);
    }

    // 未知标签只进分母：{positive:1, unknown:1} 得 50 而不是 100。
    // 这一行为可能并非有意，改动前需要确认语义。
    #[test]
    fn test_unknown_labels_depress_score() {
        let d = dist(&[("positive", 1), ("unknown", 1)]);
        assert_eq!(weighted_score(&d), 50);
        let d = dist(&[("null", 3)]);
        assert_eq!(weighted_score(&d), 0);
    }

    #[test]
    fn test_rounding() {
        // 2/3 = 66.67 -> 67
        let d = dist(&[("positive", 2), ("negative", 1)]);
        assert_eq!(weighted_score(&d), 67);
        // 1/8 = 12.5 -> 13
        let d = dist(&[("positive", 1), ("negative", 7)]);
        assert_eq!(weighted_score(&d), 13);
    }

    #[test]
    fn test_summary_shares() {
        let d = dist(&[("negative", 1), ("positive", 3)]);
        let summary = SentimentSummary::from_distribution(&d);
        assert_eq!(summary.score, 75);
        assert_eq!(summary.total, 4);
        assert_eq!(
            summary.shares,
            vec![
                Share { label: "Negative".to_string(), count: 1, percent: 25 },
                Share { label: "Positive".to_string(), count: 3, percent: 75 },
            ]
        );
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let d = dist(&[("positive", u64::MAX), ("negative", 1)]);
        assert_eq!(weighted_score(&d), 100);

        let d = dist(&[("negative", u64::MAX), ("neutral", u64::MAX)]);
        assert_eq!(weighted_score(&d), 25);

        let summary = SentimentSummary::from_distribution(&d);
        assert_eq!(summary.total, u64::MAX);
        assert!(summary.shares.iter().all(|share| share.percent <= 100));
    }

    #[test]
    fn test_summary_folds_case_variants() {
        let d = dist(&[("positive", 1), ("Positive", 1), ("NEGATIVE", 2)]);
        let summary = SentimentSummary::from_distribution(&d);
        assert_eq!(summary.score, 50);
        assert_eq!(
            summary.shares,
            vec![
                Share { label: "Negative".to_string(), count: 2, percent: 50 },
                Share { label: "Positive".to_string(), count: 2, percent: 50 },
            ]
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("pOSITIVE"), "Positive");
        assert_eq!(capitalize(""), "");
        assert_eq!(verbatim("Ministry of Defence"), "Ministry of Defence");
    }

    #[test]
    fn test_percent_of_zero_total() {
        assert_eq!(percent_of(5, 0), 0);
        assert_eq!(percent_of(1, 3), 33);
    }
}
