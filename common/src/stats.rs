//! 特徴の割合集計

use crate::store::TagStore;
use crate::types::{AttributeRecord, Field};
use std::collections::HashMap;

/// 集計1行分
#[derive(Debug, Clone, PartialEq)]
pub struct RatioRow {
    pub value: String,
    pub count: usize,
    /// 割合（%、小数第1位で丸め）
    pub ratio: f64,
}

/// 項目ごとの値の件数と割合（空欄は集計しない）
///
/// 件数の降順、同数なら値の昇順。
pub fn ratio_table(records: &[&AttributeRecord], field: Field) -> Vec<RatioRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let value = record.get(field);
        if !value.is_empty() {
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut rows: Vec<RatioRow> = counts
        .into_iter()
        .map(|(value, count)| RatioRow {
            value: value.to_string(),
            count,
            ratio: (count as f64 / total as f64 * 1000.0).round() / 10.0,
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    rows
}

/// 作品名で絞り込む（空なら全件）
pub fn records_for_work<'a>(store: &'a TagStore, work: &str) -> Vec<&'a AttributeRecord> {
    store
        .iter()
        .map(|(_, record)| record)
        .filter(|record| work.is_empty() || record.work == work)
        .collect()
}
