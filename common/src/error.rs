//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    /// 未使用の候補が2枚未満
    #[error("選べる画像がもうありません（残り{remaining}枚）")]
    ExhaustedPool { remaining: usize },

    /// 提示中のペアと異なるペアへの選択
    #[error("提示中のペアではありません: {0} / {1}")]
    StaleChoice(String, String),

    /// 勝者がペアに含まれていない
    #[error("選択された画像はペアに含まれていません: {0}")]
    InvalidWinner(String),

    #[error("選択セッションが開始されていません")]
    SessionNotStarted,

    #[error("選択はすでに完了しています")]
    SessionCompleted,

    #[error("不明な項目です: {0}")]
    UnknownField(String),

    #[error("{field} に \"{value}\" は指定できません")]
    InvalidValue { field: String, value: String },

    #[error("{field} を設定するには先に {parent} を設定してください")]
    MissingParent { field: String, parent: String },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
