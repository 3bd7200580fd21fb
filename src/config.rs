use crate::error::{CharaAiError, Result};
use chara_ai_common::GenerationParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 画像生成APIのURLを上書きする環境変数
pub const API_URL_ENV: &str = "CHARA_AI_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// キャラ画像フォルダ
    pub image_dir: PathBuf,
    /// タグストア（特徴データJSON）
    pub feature_file: PathBuf,
    /// 選択結果JSON
    pub selected_file: PathBuf,
    /// 特徴推定コマンド（先頭がプログラム、残りが引数）
    pub classifier_command: Vec<String>,
    /// txt2img API のURL
    pub api_url: String,
    /// 生成画像の保存先
    pub output_dir: PathBuf,
    pub generation: GenerationParams,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("characters"),
            feature_file: PathBuf::from("character_features.json"),
            selected_file: PathBuf::from("selected.json"),
            classifier_command: vec!["python".into(), "clip_classify.py".into()],
            api_url: "http://127.0.0.1:7860/sdapi/v1/txt2img".into(),
            output_dir: PathBuf::from("outputs"),
            generation: GenerationParams::default(),
            timeout_seconds: 300,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込む（なければデフォルト）
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CharaAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("chara-ai").join("config.json"))
    }

    /// 環境変数を優先
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        self.api_url = url;
        self.save()
    }

    /// 特徴推定コマンドを設定（空白区切り）
    pub fn set_classifier(&mut self, command: &str) -> Result<()> {
        let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            return Err(CharaAiError::Config("特徴推定コマンドが空です".into()));
        }
        self.classifier_command = parts;
        self.save()
    }
}
