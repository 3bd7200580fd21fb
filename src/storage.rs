//! タグストア・選択結果ファイルの読み書き
//!
//! 書き込みは同じフォルダの一時ファイルに書いてからリネームする。
//! 途中で失敗しても既存のファイルは壊れない。

use crate::error::Result;
use chara_ai_common::{to_pretty_json, Rename, TagStore};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "data".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// 一時ファイル経由で書き込む
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = written {
        fs::remove_file(&tmp).ok();
        return Err(e.into());
    }
    Ok(())
}

/// タグストアを読み込む
///
/// ファイルがなければ空。壊れている場合は警告を出して空として扱う。
pub fn load_store(path: &Path) -> Result<TagStore> {
    if !path.exists() {
        return Ok(TagStore::new());
    }

    let bytes = fs::read(path)?;
    match TagStore::from_slice(&bytes) {
        Ok(store) => Ok(store),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "タグストアを読み込めません。空として扱います");
            Ok(TagStore::new())
        }
    }
}

pub fn save_store(path: &Path, store: &TagStore) -> Result<()> {
    write_atomic(path, &store.to_json()?)
}

/// 選択結果を読み込む（ファイルがなければ `None`）
///
/// 壊れている場合も警告を出して `None` を返す。
pub fn load_selections(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    match serde_json::from_slice::<Vec<String>>(&bytes) {
        Ok(selections) => Ok(Some(selections)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "選択結果を読み込めません。無視します");
            Ok(None)
        }
    }
}

pub fn save_selections(path: &Path, selections: &[String]) -> Result<()> {
    write_atomic(path, &to_pretty_json(selections)?)
}

/// 連番の付け替えに合わせて選択結果のファイル名を置き換える
///
/// `renames` は現在の全画像分。含まれないファイル名は画像がなくなったものとして外す。
/// 選択結果ファイルがない、または変更がなければ書き込まず false。
pub fn rekey_selections(path: &Path, renames: &[Rename]) -> Result<bool> {
    let Some(selections) = load_selections(path)? else {
        return Ok(false);
    };

    let mapping: HashMap<&str, &str> = renames
        .iter()
        .map(|r| (r.old_name.as_str(), r.new_name.as_str()))
        .collect();

    let rekeyed: Vec<String> = selections
        .iter()
        .filter_map(|id| match mapping.get(id.as_str()) {
            Some(new_name) => Some(new_name.to_string()),
            None => {
                tracing::warn!(id = %id, "画像がなくなったため選択結果から外します");
                None
            }
        })
        .collect();

    if rekeyed == selections {
        return Ok(false);
    }
    save_selections(path, &rekeyed)?;
    Ok(true)
}

/// 選択結果を削除（削除した場合は true）
pub fn clear_selections(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
