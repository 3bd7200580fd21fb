//! chara-ai-rust
//!
//! キャラ画像の特徴タグ付け（外部分類器）、好みの選択、連関分析、画像生成。
//! I/Oを伴わないロジックは chara_ai_common にある。

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod preference;
pub mod scanner;
pub mod session;
pub mod storage;
pub mod tagger;
