use thiserror::Error;

#[derive(Error, Debug)]
pub enum CharaAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("タグストアに存在しない画像です: {0}")]
    UnknownImage(String),

    #[error("特徴推定エラー: {0}")]
    Classifier(String),

    #[error("特徴推定の結果を解釈できません: {0}")]
    ClassifierParse(String),

    #[error("画像生成APIエラー: {0}")]
    GenerationService(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] chara_ai_common::Error),
}

pub type Result<T> = std::result::Result<T, CharaAiError>;
