//! 好みの選択セッション
//!
//! 2枚ずつ提示された画像から好きな方を選び、10回分の勝者を記録する。
//! 選択のたびに選択結果ファイルへ書き込むため、途中で終了しても再開できる。

use crate::error::{CharaAiError, Result};
use crate::storage;
use chara_ai_common::{Pair, PairSampler, SamplerState, TagStore};
use dialoguer::Select;
use rand::Rng;
use std::path::{Path, PathBuf};

/// 選択セッション（状態機械 + 選択結果ファイル）
#[derive(Debug)]
pub struct SelectionSession {
    sampler: PairSampler,
    log_path: PathBuf,
}

impl SelectionSession {
    /// セッションを開く
    ///
    /// 選択結果ファイルがあれば続きから再開する。なければ未開始。
    pub fn open(candidates: Vec<String>, log_path: &Path) -> Result<Self> {
        let mut sampler = PairSampler::new(candidates);
        if let Some(selections) = storage::load_selections(log_path)? {
            tracing::info!(count = selections.len(), "前回の選択結果から再開");
            sampler.resume(selections);
        }
        Ok(Self {
            sampler,
            log_path: log_path.to_path_buf(),
        })
    }

    pub fn state(&self) -> SamplerState {
        self.sampler.state()
    }

    pub fn selections(&self) -> &[String] {
        self.sampler.selections()
    }

    pub fn quota(&self) -> usize {
        self.sampler.quota()
    }

    /// 新しく始める（選択結果ファイルは空になる）
    pub fn start(&mut self) -> Result<()> {
        storage::save_selections(&self.log_path, &[])?;
        self.sampler.start();
        Ok(())
    }

    pub fn next_pair<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Pair> {
        Ok(self.sampler.next_pair(rng)?)
    }

    /// 選択を確定する
    ///
    /// 検証 → ファイル書き込み → 状態更新の順に行う。
    /// 書き込みに失敗した場合は状態を変更しない。
    pub fn choose(&mut self, pair: &Pair, winner: &str) -> Result<SamplerState> {
        self.sampler.check_choice(pair, winner)?;

        let mut selections = self.sampler.selections().to_vec();
        selections.push(winner.to_string());
        storage::save_selections(&self.log_path, &selections)?;

        Ok(self.sampler.choose(pair, winner)?)
    }

    /// 初期状態に戻し、選択結果ファイルを削除する
    pub fn reset(&mut self) -> Result<bool> {
        self.sampler.reset();
        storage::clear_selections(&self.log_path)
    }
}

/// 対話式で好みを選ぶ
pub fn run_interactive_selection(store: &TagStore, log_path: &Path, restart: bool) -> Result<()> {
    let mut session = SelectionSession::open(store.ids(), log_path)?;

    if restart || session.state() == SamplerState::NotStarted {
        session.start()?;
    }

    if session.state() == SamplerState::Completed {
        println!("✔ 選択は完了しています（{}枚）。やり直す場合は --restart", session.selections().len());
        return Ok(());
    }

    let mut rng = rand::thread_rng();
    let label = |id: &str| {
        store
            .get(id)
            .map(|record| record.display_label(id))
            .unwrap_or_else(|| id.to_string())
    };

    while session.state() == SamplerState::InProgress {
        let pair = session.next_pair(&mut rng)?;
        let round = session.selections().len() + 1;

        let items = vec![label(&pair.left), label(&pair.right), "中断".to_string()];
        let picked = Select::new()
            .with_prompt(format!("[{}/{}] 好きな方を選んでください", round, session.quota()))
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| CharaAiError::CliExecution(e.to_string()))?;

        let winner = match picked {
            0 => pair.left.clone(),
            1 => pair.right.clone(),
            _ => {
                println!("中断しました。次回は続きから再開します");
                return Ok(());
            }
        };

        session.choose(&pair, &winner)?;
        println!("  → {}\n", label(&winner));
    }

    println!("✔ {}枚選びました: {}", session.selections().len(), log_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chara_ai_common::Error;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn candidates(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{:03}.png", i)).collect()
    }

    #[test]
    fn test_open_without_log_is_not_started() {
        let dir = tempdir().expect("Failed to create temp dir");
        let session = SelectionSession::open(candidates(4), &dir.path().join("selected.json")).unwrap();
        assert_eq!(session.state(), SamplerState::NotStarted);
    }

    #[test]
    fn test_start_writes_empty_log() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("selected.json");
        let mut session = SelectionSession::open(candidates(4), &path).unwrap();
        session.start().unwrap();
        assert_eq!(storage::load_selections(&path).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_rejected_choice_is_not_persisted() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("selected.json");
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = SelectionSession::open(candidates(6), &path).unwrap();
        session.start().unwrap();
        let pair = session.next_pair(&mut rng).unwrap();

        let result = session.choose(&pair, "999.png");
        assert!(matches!(result, Err(CharaAiError::Common(Error::InvalidWinner(_)))));
        assert_eq!(storage::load_selections(&path).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_reset_removes_log() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("selected.json");
        let mut session = SelectionSession::open(candidates(4), &path).unwrap();
        session.start().unwrap();
        assert!(session.reset().unwrap());
        assert!(!path.exists());
        assert_eq!(session.state(), SamplerState::NotStarted);
    }
}
