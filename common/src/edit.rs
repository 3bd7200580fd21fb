//! 特徴データの手動編集
//!
//! 編集フォームと同じ連動ルールで1項目ずつ更新する。
//! 大分類を変えると、新しい大分類に属さなくなったサブ分類は空に戻す。

use crate::error::{Error, Result};
use crate::taxonomy;
use crate::types::{AttributeRecord, Field};

/// 1項目を更新し、連動して空にした項目を返す
///
/// - 自由入力項目は前後の空白を除いてそのまま設定
/// - 選択式の項目は空文字（未設定）か選択肢の値のみ
/// - サブ分類は大分類が設定済みで、その大分類の選択肢に含まれる値のみ
pub fn apply_edit(record: &mut AttributeRecord, field: Field, value: &str) -> Result<Vec<Field>> {
    let value = value.trim();

    if field.is_free_text() {
        *record.get_mut(field) = value.to_string();
        return Ok(Vec::new());
    }

    let value = taxonomy::canonicalize(field, value).unwrap_or(value);

    if !value.is_empty() {
        if let Some(parent_field) = field.parent() {
            let parent = record.get(parent_field);
            if parent.is_empty() {
                return Err(Error::MissingParent {
                    field: field.key().to_string(),
                    parent: parent_field.key().to_string(),
                });
            }
            if !taxonomy::is_valid(field, value, parent) {
                return Err(Error::InvalidValue {
                    field: field.key().to_string(),
                    value: value.to_string(),
                });
            }
        } else if !taxonomy::is_valid(field, value, "") {
            return Err(Error::InvalidValue {
                field: field.key().to_string(),
                value: value.to_string(),
            });
        }
    }

    *record.get_mut(field) = value.to_string();

    let mut cleared = Vec::new();
    for child in field.children() {
        let current = record.get(*child);
        if current.is_empty() {
            continue;
        }
        if value.is_empty() || !taxonomy::is_valid(*child, current, value) {
            record.get_mut(*child).clear();
            cleared.push(*child);
        }
    }

    Ok(cleared)
}
