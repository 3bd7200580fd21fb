//! 一括タグ付け
//!
//! 1. 前回中断したリネームがあれば完了させる
//! 2. フォルダ直下の画像を列挙
//! 3. タグストアを読み込み（壊れていれば空として扱う）
//! 4. 全画像を並列に推定（旧ファイル名のまま）
//! 5. リネーム内容とマージ後のストアをジャーナルに書いてから、
//!    ファイル名順に 001 からの連番へリネームし、ストアを書き込む
//!
//! 推定に失敗した場合はファイルもストアも変更しない。
//! ストアの書き込みに失敗した場合はリネームを元に戻す。

use crate::classifier::{classify_record, AttributeClassifier};
use crate::error::{CharaAiError, Result};
use crate::scanner::{self, ImageInfo};
use crate::storage;
use chara_ai_common::{merge_store, plan_renumber, AttributeRecord, Rename, TagStore};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// リネーム中に置くジャーナル（画像フォルダ内）
pub const JOURNAL_FILE: &str = ".chara-ai-renames.json";

/// 一括タグ付けの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReport {
    /// 対象画像数
    pub images: usize,
    /// リネームした画像数
    pub renamed: usize,
    /// 新しくストアに追加した画像数
    pub added: usize,
    /// 全画像の旧ファイル名 → 新ファイル名（変更なしも含む）
    pub renames: Vec<Rename>,
}

/// 一括タグ付けを実行
pub fn run_tagging(
    image_dir: &Path,
    store_path: &Path,
    classifier: &dyn AttributeClassifier,
    show_progress: bool,
) -> Result<TagReport> {
    recover_interrupted(image_dir, store_path)?;

    let images = scanner::scan_folder(image_dir)?;
    if images.is_empty() {
        return Err(CharaAiError::NoImagesFound(image_dir.display().to_string()));
    }

    let stored = storage::load_store(store_path)?;
    let file_names: Vec<String> = images.iter().map(|img| img.file_name.clone()).collect();
    let renames = plan_renumber(&file_names);

    let classified = classify_all(&images, classifier, show_progress)?;
    let merged = merge_store(&stored, &renames, &classified);

    let entries = journal_entries(&renames);
    if entries.is_empty() {
        storage::save_store(store_path, &merged)?;
    } else {
        commit(image_dir, store_path, entries, merged)?;
    }

    let added = renames.iter().filter(|r| !stored.contains(&r.old_name)).count();
    let renamed = renames.iter().filter(|r| !r.is_noop()).count();
    tracing::info!(images = images.len(), renamed, added, "タグストアを更新");

    Ok(TagReport {
        images: images.len(),
        renamed,
        added,
        renames,
    })
}

/// 全画像を並列に推定（キーは旧ファイル名）
fn classify_all(
    images: &[ImageInfo],
    classifier: &dyn AttributeClassifier,
    show_progress: bool,
) -> Result<HashMap<String, AttributeRecord>> {
    let pb = if show_progress {
        let pb = ProgressBar::new(images.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}") {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let result = images
        .par_iter()
        .map(|img| -> Result<(String, AttributeRecord)> {
            let bytes = fs::read(&img.path)?;
            let record = classify_record(classifier, &bytes).map_err(|e| {
                tracing::warn!(file = %img.file_name, error = %e, "推定に失敗");
                e
            })?;
            pb.inc(1);
            Ok((img.file_name.clone(), record))
        })
        .collect::<Result<HashMap<_, _>>>();

    pb.finish_and_clear();
    result
}

/// ジャーナルの進行段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Phase {
    /// 旧ファイル名 → 一時名
    Staging,
    /// 一時名 → 新ファイル名
    Placing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalEntry {
    old_name: String,
    temp_name: String,
    new_name: String,
}

/// 中断しても次回の実行で完了できるだけの情報
#[derive(Debug, Serialize, Deserialize)]
struct Journal {
    phase: Phase,
    entries: Vec<JournalEntry>,
    store: TagStore,
}

impl Journal {
    fn write(&self, dir: &Path) -> Result<()> {
        storage::write_atomic(&dir.join(JOURNAL_FILE), &serde_json::to_string(self)?)
    }

    fn remove(dir: &Path) -> Result<()> {
        fs::remove_file(dir.join(JOURNAL_FILE))?;
        Ok(())
    }
}

fn journal_entries(renames: &[Rename]) -> Vec<JournalEntry> {
    let pid = std::process::id();
    renames
        .iter()
        .filter(|r| !r.is_noop())
        .enumerate()
        .map(|(i, r)| JournalEntry {
            old_name: r.old_name.clone(),
            temp_name: format!(".chara-ai-{}-{}.tmp", pid, i),
            new_name: r.new_name.clone(),
        })
        .collect()
}

/// 2段階でリネームしてからストアを書き込む（一時名 → 連番）
///
/// `b.png → 001.png` と `001.png → 002.png` のように新旧の名前が重なっても上書きしない。
/// 途中で失敗した場合は元のファイル名に戻し、戻せなかった場合はジャーナルを残す。
fn commit(dir: &Path, store_path: &Path, entries: Vec<JournalEntry>, store: TagStore) -> Result<()> {
    let mut journal = Journal {
        phase: Phase::Staging,
        entries,
        store,
    };
    journal.write(dir)?;

    let mut staged = 0;
    let mut placed = 0;
    let outcome = (|| -> Result<()> {
        for entry in &journal.entries {
            fs::rename(dir.join(&entry.old_name), dir.join(&entry.temp_name))?;
            staged += 1;
        }

        journal.phase = Phase::Placing;
        journal.write(dir)?;

        for entry in &journal.entries {
            fs::rename(dir.join(&entry.temp_name), dir.join(&entry.new_name))?;
            placed += 1;
            tracing::debug!(from = %entry.old_name, to = %entry.new_name, "リネーム");
        }

        storage::save_store(store_path, &journal.store)
    })();

    if let Err(e) = outcome {
        match rollback(dir, &mut journal, staged, placed) {
            Ok(()) => {
                Journal::remove(dir)?;
                tracing::warn!(error = %e, "保存に失敗したためリネームを元に戻しました");
            }
            Err(rollback_err) => {
                tracing::error!(error = %rollback_err, "リネームを元に戻せません。次回の実行で復元します");
            }
        }
        return Err(e);
    }

    Journal::remove(dir)
}

/// 実行済みのリネームを逆順に戻す
///
/// 新ファイル名 → 一時名を済ませた後、ジャーナルを Staging に戻してから一時名 → 旧ファイル名。
fn rollback(dir: &Path, journal: &mut Journal, staged: usize, placed: usize) -> Result<()> {
    for entry in &journal.entries[..placed] {
        fs::rename(dir.join(&entry.new_name), dir.join(&entry.temp_name))?;
    }

    journal.phase = Phase::Staging;
    journal.write(dir)?;

    for entry in &journal.entries[..staged] {
        fs::rename(dir.join(&entry.temp_name), dir.join(&entry.old_name))?;
    }
    Ok(())
}

/// 前回中断したリネームを最後まで進め、ジャーナルのストアを書き込む
///
/// 中断がなければ何もしない。復元した場合は true。
pub fn recover_interrupted(dir: &Path, store_path: &Path) -> Result<bool> {
    let path = dir.join(JOURNAL_FILE);
    if !path.exists() {
        return Ok(false);
    }

    let mut journal: Journal = serde_json::from_slice(&fs::read(&path)?)?;
    tracing::warn!(path = %path.display(), "前回中断したリネームを完了させます");

    if journal.phase == Phase::Staging {
        for entry in &journal.entries {
            let temp = dir.join(&entry.temp_name);
            let old = dir.join(&entry.old_name);
            if !temp.exists() && old.exists() {
                fs::rename(&old, &temp)?;
            }
        }
        journal.phase = Phase::Placing;
        journal.write(dir)?;
    }

    for entry in &journal.entries {
        let temp = dir.join(&entry.temp_name);
        if temp.exists() {
            fs::rename(&temp, dir.join(&entry.new_name))?;
        }
    }

    storage::save_store(store_path, &journal.store)?;
    Journal::remove(dir)?;
    tracing::warn!(renamed = journal.entries.len(), "リネームを復元しました。選択結果のファイル名は確認してください");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_of(ids: &[&str]) -> TagStore {
        ids.iter()
            .map(|id| {
                let record = AttributeRecord {
                    name: format!("name-{}", id),
                    ..Default::default()
                };
                (id.to_string(), record)
            })
            .collect()
    }

    fn entry(old: &str, temp: &str, new: &str) -> JournalEntry {
        JournalEntry {
            old_name: old.to_string(),
            temp_name: temp.to_string(),
            new_name: new.to_string(),
        }
    }

    #[test]
    fn test_commit_handles_overlapping_names() {
        let dir = tempdir().expect("Failed to create temp dir");
        let data = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let store_path = data.path().join("character_features.json");
        fs::write(root.join("001.png"), "was-001").unwrap();
        fs::write(root.join("000.png"), "was-000").unwrap();

        // 000 → 001, 001 → 002
        let renames = plan_renumber(&["001.png".to_string(), "000.png".to_string()]);
        commit(root, &store_path, journal_entries(&renames), store_of(&["001.png", "002.png"])).unwrap();

        assert_eq!(fs::read_to_string(root.join("001.png")).unwrap(), "was-000");
        assert_eq!(fs::read_to_string(root.join("002.png")).unwrap(), "was-001");
        assert!(!root.join("000.png").exists());
        assert!(!root.join(JOURNAL_FILE).exists());
        assert_eq!(storage::load_store(&store_path).unwrap().ids(), vec!["001.png", "002.png"]);
    }

    #[test]
    fn test_journal_entries_skip_noops() {
        let renames = plan_renumber(&["001.png".to_string(), "b.png".to_string()]);
        let entries = journal_entries(&renames);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_name, "b.png");
        assert_eq!(entries[0].new_name, "002.png");
    }

    #[test]
    fn test_commit_rolls_back_when_store_write_fails() {
        let dir = tempdir().expect("Failed to create temp dir");
        let data = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let store_path = data.path().join("character_features.json");
        fs::write(root.join("b.png"), "b").unwrap();
        fs::write(root.join("a.png"), "a").unwrap();
        // 一時ファイルの位置をフォルダでふさいで書き込みを失敗させる
        fs::create_dir(data.path().join(".character_features.json.tmp")).unwrap();

        let renames = plan_renumber(&["a.png".to_string(), "b.png".to_string()]);
        let result = commit(root, &store_path, journal_entries(&renames), store_of(&["001.png", "002.png"]));

        assert!(matches!(result, Err(CharaAiError::Io(_))));
        assert_eq!(fs::read_to_string(root.join("a.png")).unwrap(), "a");
        assert_eq!(fs::read_to_string(root.join("b.png")).unwrap(), "b");
        assert_eq!(fs::read_dir(root).unwrap().count(), 2);
        assert!(!store_path.exists());
    }

    #[test]
    fn test_recover_without_journal_does_nothing() {
        let dir = tempdir().expect("Failed to create temp dir");
        let store_path = dir.path().join("character_features.json");
        assert!(!recover_interrupted(dir.path(), &store_path).unwrap());
        assert!(!store_path.exists());
    }

    #[test]
    fn test_recover_interrupted_while_placing() {
        let dir = tempdir().expect("Failed to create temp dir");
        let data = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let store_path = data.path().join("character_features.json");

        // 000 → 001 は完了、001 → 002 は一時名のまま中断
        fs::write(root.join("001.png"), "was-000").unwrap();
        fs::write(root.join(".t1.tmp"), "was-001").unwrap();
        let journal = Journal {
            phase: Phase::Placing,
            entries: vec![entry("000.png", ".t0.tmp", "001.png"), entry("001.png", ".t1.tmp", "002.png")],
            store: store_of(&["001.png", "002.png"]),
        };
        journal.write(root).unwrap();

        assert!(recover_interrupted(root, &store_path).unwrap());
        assert_eq!(fs::read_to_string(root.join("001.png")).unwrap(), "was-000");
        assert_eq!(fs::read_to_string(root.join("002.png")).unwrap(), "was-001");
        assert!(!root.join(JOURNAL_FILE).exists());
        assert_eq!(storage::load_store(&store_path).unwrap(), store_of(&["001.png", "002.png"]));
    }

    #[test]
    fn test_recover_interrupted_while_staging() {
        let dir = tempdir().expect("Failed to create temp dir");
        let data = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let store_path = data.path().join("character_features.json");

        // a.png だけ一時名に移した状態で中断
        fs::write(root.join(".t0.tmp"), "a").unwrap();
        fs::write(root.join("b.png"), "b").unwrap();
        let journal = Journal {
            phase: Phase::Staging,
            entries: vec![entry("a.png", ".t0.tmp", "001.png"), entry("b.png", ".t1.tmp", "002.png")],
            store: store_of(&["001.png", "002.png"]),
        };
        journal.write(root).unwrap();

        assert!(recover_interrupted(root, &store_path).unwrap());
        let mut names: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["001.png", "002.png"]);
        assert_eq!(fs::read_to_string(root.join("001.png")).unwrap(), "a");
        assert_eq!(storage::load_store(&store_path).unwrap().get("002.png").unwrap().name, "name-002.png");
    }
}
