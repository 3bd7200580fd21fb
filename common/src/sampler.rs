//! ランダム2枚選択（勝ち抜き方式）
//!
//! 未使用の候補から2枚を提示し、選ばれた方を記録する。
//! 提示した2枚は選択結果に関係なく使用済みになり、同じセッションで再提示されない。
//! 規定回数（10回）選ぶと完了し、それ以上の選択は受け付けない。
//!
//! 乱数生成器は呼び出し側から渡す（テストではシード固定）。

use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// 1セッションで選ぶ回数
pub const SELECTION_QUOTA: usize = 10;

/// セッション状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    NotStarted,
    InProgress,
    Completed,
}

/// 提示中の2枚
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub left: String,
    pub right: String,
}

impl Pair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.left == id || self.right == id
    }

    /// 左右を区別せずに比較
    pub fn same_as(&self, other: &Pair) -> bool {
        (self.left == other.left && self.right == other.right)
            || (self.left == other.right && self.right == other.left)
    }
}

/// 2枚選択の状態機械
#[derive(Debug, Clone)]
pub struct PairSampler {
    candidates: Vec<String>,
    retired: HashSet<String>,
    selections: Vec<String>,
    pending: Option<Pair>,
    state: SamplerState,
    quota: usize,
}

impl PairSampler {
    pub fn new(candidates: Vec<String>) -> Self {
        Self::with_quota(candidates, SELECTION_QUOTA)
    }

    pub fn with_quota(candidates: Vec<String>, quota: usize) -> Self {
        Self {
            candidates,
            retired: HashSet::new(),
            selections: Vec::new(),
            pending: None,
            state: SamplerState::NotStarted,
            quota,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    pub fn pending(&self) -> Option<&Pair> {
        self.pending.as_ref()
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// 未使用の候補数
    pub fn remaining(&self) -> usize {
        self.candidates
            .iter()
            .filter(|id| !self.retired.contains(*id))
            .count()
    }

    /// 新しいセッションを開始する（以前の選択・使用済みは破棄）
    pub fn start(&mut self) {
        self.clear();
        self.state = SamplerState::InProgress;
    }

    /// 保存済みの選択結果からセッションを再開する
    ///
    /// 使用済みの記録は保存されないため、過去の勝者のみを使用済みとする。
    pub fn resume(&mut self, selections: Vec<String>) {
        self.clear();
        self.retired = selections.iter().cloned().collect();
        self.selections = selections;
        self.state = if self.selections.len() >= self.quota {
            SamplerState::Completed
        } else {
            SamplerState::InProgress
        };
    }

    /// 初期状態に戻す
    pub fn reset(&mut self) {
        self.clear();
        self.state = SamplerState::NotStarted;
    }

    fn clear(&mut self) {
        self.retired.clear();
        self.selections.clear();
        self.pending = None;
    }

    fn ensure_in_progress(&self) -> Result<()> {
        match self.state {
            SamplerState::NotStarted => Err(Error::SessionNotStarted),
            SamplerState::Completed => Err(Error::SessionCompleted),
            SamplerState::InProgress => Ok(()),
        }
    }

    /// 次の2枚を取得する
    ///
    /// 提示中のペアがあればそれをそのまま返す。
    pub fn next_pair<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Pair> {
        self.ensure_in_progress()?;

        if let Some(pair) = &self.pending {
            return Ok(pair.clone());
        }

        let remaining: Vec<&String> = self
            .candidates
            .iter()
            .filter(|id| !self.retired.contains(*id))
            .collect();

        if remaining.len() < 2 {
            return Err(Error::ExhaustedPool { remaining: remaining.len() });
        }

        let picked: Vec<&String> = remaining.choose_multiple(rng, 2).copied().collect();
        let pair = Pair::new(picked[0].clone(), picked[1].clone());
        self.pending = Some(pair.clone());
        Ok(pair)
    }

    /// 選択を検証する（状態は変更しない）
    pub fn check_choice(&self, pair: &Pair, winner: &str) -> Result<()> {
        self.ensure_in_progress()?;

        match &self.pending {
            Some(pending) if pending.same_as(pair) => {}
            _ => return Err(Error::StaleChoice(pair.left.clone(), pair.right.clone())),
        }

        if !pair.contains(winner) {
            return Err(Error::InvalidWinner(winner.to_string()));
        }

        Ok(())
    }

    /// 提示中のペアから1枚選ぶ
    ///
    /// 検証に失敗した場合は状態を一切変更しない。
    pub fn choose(&mut self, pair: &Pair, winner: &str) -> Result<SamplerState> {
        self.check_choice(pair, winner)?;

        self.selections.push(winner.to_string());
        self.retired.insert(pair.left.clone());
        self.retired.insert(pair.right.clone());
        self.pending = None;

        if self.selections.len() >= self.quota {
            self.state = SamplerState::Completed;
        }

        Ok(self.state)
    }
}
