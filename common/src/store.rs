//! タグストア（画像ファイル名 → 特徴データ）
//!
//! キーはファイル名の昇順で保持するため、同じ内容なら常に同じJSONになる。

use crate::error::{Error, Result};
use crate::types::{AttributeRecord, Field};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSONを4スペースインデントで整形する（非ASCII文字はそのまま）
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| Error::Parse(e.to_string()))
}

/// 全画像の特徴データ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagStore {
    records: BTreeMap<String, AttributeRecord>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON文字列から読み込み
    ///
    /// 表記ゆれは正規化し、定義域外の値や親子の不整合は警告のみ出して保持する。
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// バイト列から読み込み（UTF-8でない場合もパースエラー）
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut store: TagStore = serde_json::from_slice(bytes)?;

        for (id, record) in store.records.iter_mut() {
            let changed = record.canonicalize();
            if changed > 0 {
                tracing::debug!(id = %id, changed, "表記ゆれを正規化");
            }
            for issue in record.issues() {
                tracing::warn!(id = %id, "特徴データの不整合: {}", issue);
            }
        }

        Ok(store)
    }

    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    pub fn get(&self, id: &str) -> Option<&AttributeRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut AttributeRecord> {
        self.records.get_mut(id)
    }

    pub fn insert(&mut self, id: String, record: AttributeRecord) {
        self.records.insert(id, record);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// ファイル名一覧（昇順）
    pub fn ids(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeRecord)> {
        self.records.iter()
    }

    /// 指定したファイル名の特徴データを順に取得
    ///
    /// ストアにないファイル名は2つ目の戻り値で返す。
    pub fn records_for<'a>(&'a self, ids: &[String]) -> (Vec<&'a AttributeRecord>, Vec<String>) {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.records.get(id) {
                Some(record) => found.push(record),
                None => missing.push(id.clone()),
            }
        }

        (found, missing)
    }

    /// 項目の値一覧（空を除きソート・重複除去）
    pub fn distinct_values(&self, field: Field) -> Vec<String> {
        let mut values: Vec<String> = self
            .records
            .values()
            .map(|r| r.get(field))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

impl FromIterator<(String, AttributeRecord)> for TagStore {
    fn from_iter<I: IntoIterator<Item = (String, AttributeRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, work: &str) -> AttributeRecord {
        AttributeRecord {
            name: name.to_string(),
            work: work.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_json_uses_four_space_indent() {
        let store: TagStore = [("001.png".to_string(), record("", ""))].into_iter().collect();
        let json = store.to_json().unwrap();
        assert!(json.starts_with("{\n    \"001.png\": {\n        \"name\": \"\""));
        assert!(!json.ends_with('\n'));
    }

    #[test]
    fn test_json_round_trip_preserves_non_ascii() {
        let store: TagStore = [("001.png".to_string(), record("レム", "リゼロ"))].into_iter().collect();
        let json = store.to_json().unwrap();
        assert!(json.contains("レム"));
        assert!(!json.contains("\\u"));

        let loaded = TagStore::from_json(&json).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_keys_are_sorted() {
        let store: TagStore = [
            ("003.png".to_string(), record("", "")),
            ("001.png".to_string(), record("", "")),
            ("002.jpg".to_string(), record("", "")),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.ids(), vec!["001.png", "002.jpg", "003.png"]);
    }

    #[test]
    fn test_from_json_canonicalizes_legacy_values() {
        let json = r#"{"001.png": {"hair_length": "short"}}"#;
        let store = TagStore::from_json(json).unwrap();
        assert_eq!(store.get("001.png").unwrap().hair_length, "short hair");
    }

    #[test]
    fn test_from_json_keeps_inconsistent_values() {
        let json = r#"{"001.png": {"hairstyle_type": "high ponytail", "eye_color": "rainbow eyes"}}"#;
        let store = TagStore::from_json(json).unwrap();
        let r = store.get("001.png").unwrap();
        assert_eq!(r.hairstyle_type, "high ponytail");
        assert_eq!(r.eye_color, "rainbow eyes");
    }

    #[test]
    fn test_from_json_rejects_broken_json() {
        assert!(matches!(TagStore::from_json("{ invalid json }"), Err(Error::Json(_))));
    }

    #[test]
    fn test_records_for_reports_missing() {
        let store: TagStore = [("001.png".to_string(), record("a", ""))].into_iter().collect();
        let ids = vec!["001.png".to_string(), "009.png".to_string()];
        let (found, missing) = store.records_for(&ids);
        assert_eq!(found.len(), 1);
        assert_eq!(missing, vec!["009.png".to_string()]);
    }

    #[test]
    fn test_distinct_values() {
        let store: TagStore = [
            ("001.png".to_string(), record("", "作品B")),
            ("002.png".to_string(), record("", "作品A")),
            ("003.png".to_string(), record("", "作品B")),
            ("004.png".to_string(), record("", "")),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.distinct_values(Field::Work), vec!["作品A", "作品B"]);
    }
}
