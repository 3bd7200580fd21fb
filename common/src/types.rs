//! キャラ特徴データの型定義
//!
//! - Field: 特徴項目（13項目）
//! - AttributeRecord: 画像1枚分の特徴
//! - RecordIssue: 読み込み時の検証で見つかった不整合
//!
//! 未設定は空文字で表す。JSONの `null` や欠けたキーも空文字として読み込む。

use crate::error::Error;
use crate::taxonomy;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// 特徴項目
///
/// 宣言順はJSONの出力順・ワンホット列の並び順を兼ねる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Work,
    HairLength,
    HairColorMain,
    HairColorSub,
    HairstyleMain,
    HairstyleType,
    HairstyleDetail,
    EyeColor,
    EyeShape,
    Expression,
    Vibe,
    Other,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Name,
        Field::Work,
        Field::HairLength,
        Field::HairColorMain,
        Field::HairColorSub,
        Field::HairstyleMain,
        Field::HairstyleType,
        Field::HairstyleDetail,
        Field::EyeColor,
        Field::EyeShape,
        Field::Expression,
        Field::Vibe,
        Field::Other,
    ];

    /// JSONキー
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Work => "work",
            Field::HairLength => "hair_length",
            Field::HairColorMain => "hair_color_main",
            Field::HairColorSub => "hair_color_sub",
            Field::HairstyleMain => "hairstyle_main",
            Field::HairstyleType => "hairstyle_type",
            Field::HairstyleDetail => "hairstyle_detail",
            Field::EyeColor => "eye_color",
            Field::EyeShape => "eye_shape",
            Field::Expression => "expression",
            Field::Vibe => "vibe",
            Field::Other => "other",
        }
    }

    /// 表示名
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "名前",
            Field::Work => "作品名",
            Field::HairLength => "髪の長さ",
            Field::HairColorMain => "髪色（大分類）",
            Field::HairColorSub => "髪色（中分類）",
            Field::HairstyleMain => "髪型（大分類）",
            Field::HairstyleType => "髪型（中分類）",
            Field::HairstyleDetail => "髪型（細分類）",
            Field::EyeColor => "目の色",
            Field::EyeShape => "目の形",
            Field::Expression => "表情",
            Field::Vibe => "雰囲気",
            Field::Other => "その他",
        }
    }

    /// 自由入力項目（名前・作品名・その他）
    pub fn is_free_text(&self) -> bool {
        matches!(self, Field::Name | Field::Work | Field::Other)
    }

    /// AI推定で埋められる項目
    pub fn is_classified(&self) -> bool {
        matches!(
            self,
            Field::HairLength
                | Field::HairColorMain
                | Field::HairstyleMain
                | Field::EyeColor
                | Field::EyeShape
                | Field::Expression
                | Field::Vibe
        )
    }

    /// サブ分類の親となる大分類
    pub fn parent(&self) -> Option<Field> {
        match self {
            Field::HairColorSub => Some(Field::HairColorMain),
            Field::HairstyleType | Field::HairstyleDetail => Some(Field::HairstyleMain),
            _ => None,
        }
    }

    /// 大分類に従属するサブ分類
    pub fn children(&self) -> &'static [Field] {
        match self {
            Field::HairColorMain => &[Field::HairColorSub],
            Field::HairstyleMain => &[Field::HairstyleType, Field::HairstyleDetail],
            _ => &[],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        Field::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// `null` を空文字として読み込む
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 画像1枚分の特徴データ
///
/// 13項目すべてを常に出力する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub work: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub hair_length: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub hair_color_main: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub hair_color_sub: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub hairstyle_main: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub hairstyle_type: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub hairstyle_detail: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub eye_color: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub eye_shape: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub expression: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub vibe: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub other: String,
}

impl AttributeRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Work => &self.work,
            Field::HairLength => &self.hair_length,
            Field::HairColorMain => &self.hair_color_main,
            Field::HairColorSub => &self.hair_color_sub,
            Field::HairstyleMain => &self.hairstyle_main,
            Field::HairstyleType => &self.hairstyle_type,
            Field::HairstyleDetail => &self.hairstyle_detail,
            Field::EyeColor => &self.eye_color,
            Field::EyeShape => &self.eye_shape,
            Field::Expression => &self.expression,
            Field::Vibe => &self.vibe,
            Field::Other => &self.other,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Work => &mut self.work,
            Field::HairLength => &mut self.hair_length,
            Field::HairColorMain => &mut self.hair_color_main,
            Field::HairColorSub => &mut self.hair_color_sub,
            Field::HairstyleMain => &mut self.hairstyle_main,
            Field::HairstyleType => &mut self.hairstyle_type,
            Field::HairstyleDetail => &mut self.hairstyle_detail,
            Field::EyeColor => &mut self.eye_color,
            Field::EyeShape => &mut self.eye_shape,
            Field::Expression => &mut self.expression,
            Field::Vibe => &mut self.vibe,
            Field::Other => &mut self.other,
        }
    }

    /// 全項目が未設定か
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    /// 一覧表示用ラベル（名前があれば `名前_ファイル名`）
    pub fn display_label(&self, id: &str) -> String {
        if self.name.is_empty() {
            id.to_string()
        } else {
            format!("{}_{}", self.name, id)
        }
    }

    /// 表記ゆれを正規化する。変換した項目数を返す
    pub fn canonicalize(&mut self) -> usize {
        let mut changed = 0;
        for field in Field::ALL {
            if let Some(canonical) = taxonomy::canonicalize(field, self.get(field)) {
                *self.get_mut(field) = canonical.to_string();
                changed += 1;
            }
        }
        changed
    }

    /// 定義域・親子関係の不整合を列挙する
    pub fn issues(&self) -> Vec<RecordIssue> {
        let mut issues = Vec::new();

        for field in Field::ALL {
            let value = self.get(field);
            if value.is_empty() || field.is_free_text() {
                continue;
            }

            let Some(parent_field) = field.parent() else {
                if !taxonomy::is_valid(field, value, "") {
                    issues.push(RecordIssue::UnknownValue { field, value: value.to_string() });
                }
                continue;
            };

            let parent = self.get(parent_field);
            if !taxonomy::is_valid(field, value, "") {
                issues.push(RecordIssue::UnknownValue { field, value: value.to_string() });
            } else if parent.is_empty() {
                issues.push(RecordIssue::OrphanSubclass { field, value: value.to_string() });
            } else if !taxonomy::is_valid(field, value, parent) {
                issues.push(RecordIssue::ParentMismatch {
                    field,
                    value: value.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        issues
    }
}

/// 特徴データの不整合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIssue {
    /// 定義域にない値
    UnknownValue { field: Field, value: String },
    /// 大分類が空のサブ分類
    OrphanSubclass { field: Field, value: String },
    /// 大分類に属さないサブ分類
    ParentMismatch { field: Field, value: String, parent: String },
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIssue::UnknownValue { field, value } => {
                write!(f, "{}: 未定義の値 \"{}\"", field, value)
            }
            RecordIssue::OrphanSubclass { field, value } => {
                write!(f, "{}: 大分類が未設定のまま \"{}\" が設定されています", field, value)
            }
            RecordIssue::ParentMismatch { field, value, parent } => {
                write!(f, "{}: \"{}\" は大分類 \"{}\" に属しません", field, value, parent)
            }
        }
    }
}
