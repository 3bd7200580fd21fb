//! 特徴推定モジュール
//!
//! 画像1枚につきカテゴリごとに候補ラベルを渡し、最も近いラベルを1つ選ばせる。
//! 推定器の実体は外部コマンド（CLIPなど）で、差し替えられるようトレイトにしている。

pub mod command;

use crate::error::{CharaAiError, Result};
use chara_ai_common::{AttributeRecord, ClassifierCategory};

pub use command::CommandClassifier;

/// ゼロショット分類器
pub trait AttributeClassifier: Send + Sync {
    /// 候補ラベルの中から画像に最も合うものを返す
    fn classify(&self, image: &[u8], labels: &[&str]) -> Result<String>;
}

/// 推定対象の7項目を埋めた特徴データを作る
///
/// 名前・作品名・サブ分類などは空のまま。
pub fn classify_record(classifier: &dyn AttributeClassifier, image: &[u8]) -> Result<AttributeRecord> {
    let mut record = AttributeRecord::default();

    for category in ClassifierCategory::ALL {
        let labels = category.labels();
        let label = classifier.classify(image, &labels)?;
        let value = category.to_value(label.trim()).ok_or_else(|| {
            CharaAiError::ClassifierParse(format!("{:?}: 候補にないラベル \"{}\"", category, label))
        })?;
        *record.get_mut(category.field()) = value.to_string();
    }

    Ok(record)
}
