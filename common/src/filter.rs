//! キャラ検索フィルタ
//!
//! 指定した項目がすべて一致するキャラだけを残す。未指定の項目は条件にしない。

use crate::store::TagStore;
use crate::types::{AttributeRecord, Field};
use std::collections::BTreeMap;

/// 検索条件（項目 → 一致させる値）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    constraints: BTreeMap<Field, String>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 条件を追加する（空の値は条件なし扱い）
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.constraints.remove(&field);
        } else {
            self.constraints.insert(field, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (Field, &str)> {
        self.constraints.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn matches(&self, record: &AttributeRecord) -> bool {
        self.constraints
            .iter()
            .all(|(field, value)| record.get(*field) == value)
    }
}

/// 条件に一致するファイル名を昇順で返す
pub fn filter_store(store: &TagStore, filter: &TagFilter) -> Vec<String> {
    store
        .iter()
        .filter(|(_, record)| filter.matches(record))
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TagStore {
        let make = |name: &str, work: &str, color: &str| AttributeRecord {
            name: name.to_string(),
            work: work.to_string(),
            hair_color_main: color.to_string(),
            ..Default::default()
        };
        [
            ("001.png".to_string(), make("A", "作品1", "blonde")),
            ("002.png".to_string(), make("B", "作品1", "black")),
            ("003.png".to_string(), make("C", "作品2", "blonde")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let ids = filter_store(&store(), &TagFilter::new());
        assert_eq!(ids, vec!["001.png", "002.png", "003.png"]);
    }

    #[test]
    fn test_all_constraints_must_match() {
        let filter = TagFilter::new()
            .with(Field::Work, "作品1")
            .with(Field::HairColorMain, "blonde");
        assert_eq!(filter_store(&store(), &filter), vec!["001.png"]);
    }

    #[test]
    fn test_empty_value_removes_constraint() {
        let mut filter = TagFilter::new().with(Field::HairColorMain, "blonde");
        filter.set(Field::HairColorMain, "");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_no_match() {
        let filter = TagFilter::new().with(Field::Name, "Z");
        assert!(filter_store(&store(), &filter).is_empty());
    }
}
