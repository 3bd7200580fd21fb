//! タグストアのマージ処理（CLI/バッチ共通）
//!
//! - merge_record: 保存済みデータとAI推定結果のマージ（空欄だけ補完）
//! - plan_renumber: ファイル名昇順で 001 からの連番を割り当てる
//! - merge_store: 連番に付け替えながらストア全体をマージ

use crate::store::TagStore;
use crate::taxonomy;
use crate::types::{AttributeRecord, Field};
use std::collections::HashMap;
use std::path::Path;

/// 保存済みデータとAI推定結果をマージ
///
/// - 保存済みの値が空でなければ常にそれを残す（ユーザー編集を優先）
/// - AI推定で埋めるのは推定対象の7項目の空欄のみ
/// - 名前・作品名・その他・サブ分類は保存済みの値のまま
/// - 大分類が空でサブ分類だけ残っている場合は、分類体系から大分類を復元する
///   （候補が複数ならAI推定の大分類を候補内でのみ採用し、なければ先頭の候補）
pub fn merge_record(stored: Option<&AttributeRecord>, classified: &AttributeRecord) -> AttributeRecord {
    let empty = AttributeRecord::default();
    let stored = stored.unwrap_or(&empty);
    let mut merged = AttributeRecord::default();

    for field in Field::ALL {
        let kept = stored.get(field);
        let value = if !kept.is_empty() {
            kept
        } else if field.is_classified() {
            classified.get(field)
        } else {
            ""
        };
        *merged.get_mut(field) = value.to_string();
    }

    for major in [Field::HairColorMain, Field::HairstyleMain] {
        if !stored.get(major).is_empty() {
            continue;
        }
        if let Some(parent) = restore_major(stored, major, classified.get(major)) {
            *merged.get_mut(major) = parent.to_string();
        }
    }

    merged
}

/// サブ分類から大分類を決める
///
/// 設定済みのサブ分類すべてを子に持つ大分類が候補。候補がなければ `None`。
fn restore_major(stored: &AttributeRecord, major: Field, classified_major: &str) -> Option<&'static str> {
    let mut candidates: Option<Vec<&'static str>> = None;
    for child in major.children() {
        let value = stored.get(*child);
        if value.is_empty() {
            continue;
        }
        let parents = taxonomy::parents_of(*child, value);
        candidates = Some(match candidates {
            Some(prev) => prev.into_iter().filter(|p| parents.contains(p)).collect(),
            None => parents,
        });
    }

    let candidates = candidates?;
    candidates
        .iter()
        .copied()
        .find(|main| *main == classified_major)
        .or_else(|| candidates.first().copied())
}

/// 旧ファイル名 → 新ファイル名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub old_name: String,
    pub new_name: String,
}

impl Rename {
    pub fn is_noop(&self) -> bool {
        self.old_name == self.new_name
    }
}

/// 連番の桁数（最低3桁）
///
/// 全ファイルを同じ桁数にそろえることで、再実行時も辞書順と連番順が一致する。
pub fn identifier_width(count: usize) -> usize {
    count.to_string().len().max(3)
}

/// ファイル名昇順で 1 からの連番を割り当てる（拡張子は元のまま）
pub fn plan_renumber(file_names: &[String]) -> Vec<Rename> {
    let mut sorted: Vec<&String> = file_names.iter().collect();
    sorted.sort();

    let width = identifier_width(sorted.len());

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, old_name)| {
            let ext = Path::new(old_name)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            Rename {
                old_name: old_name.clone(),
                new_name: format!("{:0width$}{}", i + 1, ext, width = width),
            }
        })
        .collect()
}

/// ストア全体を連番に付け替えてマージする
///
/// `classified` は旧ファイル名をキーにしたAI推定結果。
/// 推定結果がない画像は保存済みデータだけで組み立てる。
/// 画像が存在しなくなったエントリは出力に含めない。
pub fn merge_store(
    stored: &TagStore,
    renames: &[Rename],
    classified: &HashMap<String, AttributeRecord>,
) -> TagStore {
    let empty = AttributeRecord::default();

    renames
        .iter()
        .map(|rename| {
            let ai = classified.get(&rename.old_name).unwrap_or(&empty);
            let merged = merge_record(stored.get(&rename.old_name), ai);
            (rename.new_name.clone(), merged)
        })
        .collect()
}
