use crate::error::{CharaAiError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

lazy_static::lazy_static! {
    static ref IMAGE_RE: Regex = Regex::new(r"(?i)\.(png|jpe?g)$").unwrap();
}

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

/// 対応する画像ファイル名か（大文字小文字は区別しない）
pub fn is_image_file(file_name: &str) -> bool {
    IMAGE_RE.is_match(file_name)
}

/// フォルダ直下の画像をファイル名順に列挙する
pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(CharaAiError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let Some(file_name) = e.file_name().to_str() else {
                tracing::warn!(path = %e.path().display(), "UTF-8でないファイル名はスキップします");
                return None;
            };
            is_image_file(file_name).then(|| ImageInfo {
                path: e.path().to_path_buf(),
                file_name: file_name.to_string(),
            })
        })
        .collect();

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}
