//! キャラ特徴の分類体系
//!
//! 髪色（大分類→中分類）と髪型（大分類→中分類→細分類）の階層、
//! 目・表情・雰囲気の選択肢、およびAI推定で使う候補ラベルを定義する。
//! 編集フォームの連動選択肢、検索フィルタ、読み込み時の検証で共有する。

use crate::types::Field;

/// 髪色分類体系（大分類→中分類）
pub const HAIR_COLOR_MAP: &[(&str, &[&str])] = &[
    ("black", &["jet black", "soft black"]),
    ("brown", &["dark brown", "light brown", "chestnut"]),
    ("blonde", &["golden blonde", "ash blonde", "platinum blonde"]),
    ("blue", &["dark blue", "light blue", "sky blue"]),
    ("red", &["dark red", "light red"]),
    ("pink", &["vivid pink", "pastel pink"]),
    ("green", &["dark green", "mint green"]),
    ("purple", &["dark purple", "lavender"]),
    ("white", &["pure white", "off white"]),
    ("silver", &["silver", "metallic silver"]),
];

/// 髪型の大分類1件分
#[derive(Debug, Clone, Copy)]
pub struct HairstyleEntry {
    pub main: &'static str,
    /// 中分類
    pub types: &'static [&'static str],
    /// 細分類
    pub details: &'static [&'static str],
}

/// 髪型分類体系（大分類→中分類→細分類）
pub const HAIRSTYLE_MAP: &[HairstyleEntry] = &[
    HairstyleEntry {
        main: "straight",
        types: &["long straight", "medium straight", "short straight", "pigtails", "one-length"],
        details: &["center parted", "side parted", "see-through bangs", "straight bangs", "himecut"],
    },
    HairstyleEntry {
        main: "wavy",
        types: &["loose wave", "medium wave", "strong wave"],
        details: &["fluffy wave", "beach wave"],
    },
    HairstyleEntry {
        main: "curly",
        types: &["loose curls", "tight curls", "perm curls"],
        details: &["ringlet curls", "afro curls"],
    },
    HairstyleEntry {
        main: "ponytail",
        types: &["high ponytail", "low ponytail", "side ponytail"],
        details: &["straight ponytail", "messy ponytail", "ribbon ponytail"],
    },
    HairstyleEntry {
        main: "twintail",
        types: &["high twintails", "low twintails", "side twintails", "half-up twintails"],
        details: &["straight twintail", "drill twintails", "curly twintails"],
    },
    HairstyleEntry {
        main: "bob",
        types: &["short bob", "medium bob", "layered bob", "inner curl bob"],
        details: &["straight bob", "wavy bob"],
    },
    HairstyleEntry {
        main: "braid",
        types: &["single braid", "double braids", "side braid", "half braid", "french braid"],
        details: &["braided ponytail", "braided bun"],
    },
    HairstyleEntry {
        main: "bun",
        types: &["single bun", "twin buns"],
        details: &["messy bun", "braided bun"],
    },
];

pub const HAIR_LENGTHS: &[&str] = &["short hair", "medium hair", "long hair"];

pub const EYE_COLORS: &[&str] = &[
    "black eyes",
    "brown eyes",
    "blue eyes",
    "green eyes",
    "red eyes",
    "yellow eyes",
    "purple eyes",
    "pink eyes",
    "grey eyes",
];

pub const EYE_SHAPES: &[&str] = &["big eyes", "sharp eyes", "round eyes", "narrow eyes", "droopy eyes"];

pub const EXPRESSIONS: &[&str] = &["smiling", "serious expression", "angry", "shy", "sad", "surprised"];

pub const VIBES: &[&str] = &["cute girl", "cool girl", "elegant girl", "energetic girl", "mysterious girl"];

/// 髪型推定用ラベル → 髪型大分類
///
/// 推定モデルには大分類名より説明的な語彙のほうが当たりやすいため、
/// 推定用の語彙と保存用の値を分けている。
pub const HAIRSTYLE_LABELS: &[(&str, &str)] = &[
    ("straight hair", "straight"),
    ("wavy hair", "wavy"),
    ("curly hair", "curly"),
    ("ponytail", "ponytail"),
    ("twin tails", "twintail"),
    ("bob cut", "bob"),
    ("braid hair", "braid"),
    ("bun hair", "bun"),
];

/// 髪色大分類の一覧（定義順）
pub fn hair_color_mains() -> Vec<&'static str> {
    HAIR_COLOR_MAP.iter().map(|(main, _)| *main).collect()
}

/// 髪色大分類に対応する中分類（未知の大分類は空）
pub fn hair_color_subs(main: &str) -> &'static [&'static str] {
    HAIR_COLOR_MAP
        .iter()
        .find(|(m, _)| *m == main)
        .map(|(_, subs)| *subs)
        .unwrap_or(&[])
}

/// 髪型大分類の一覧（定義順）
pub fn hairstyle_mains() -> Vec<&'static str> {
    HAIRSTYLE_MAP.iter().map(|e| e.main).collect()
}

pub fn hairstyle_entry(main: &str) -> Option<&'static HairstyleEntry> {
    HAIRSTYLE_MAP.iter().find(|e| e.main == main)
}

/// 大分類に紐づく選択肢一覧を返す（サブ分類用）
fn children_of(field: Field, main: &str) -> &'static [&'static str] {
    match field {
        Field::HairColorSub => hair_color_subs(main),
        Field::HairstyleType => hairstyle_entry(main).map(|e| e.types).unwrap_or(&[]),
        Field::HairstyleDetail => hairstyle_entry(main).map(|e| e.details).unwrap_or(&[]),
        _ => &[],
    }
}

/// 全大分類の選択肢を集めてソート・重複除去
fn all_children(field: Field) -> Vec<&'static str> {
    let mains = match field {
        Field::HairColorSub => hair_color_mains(),
        Field::HairstyleType | Field::HairstyleDetail => hairstyle_mains(),
        _ => return Vec::new(),
    };

    let mut all: Vec<&'static str> = mains
        .iter()
        .flat_map(|main| children_of(field, main).iter().copied())
        .collect();
    all.sort();
    all.dedup();
    all
}

/// 項目の選択肢（空文字は含まない）
///
/// サブ分類では `parent` に大分類を渡す。`parent` が空のときは
/// 全大分類の選択肢をソート・重複除去して返す（検索フィルタ用）。
/// 自由入力項目は空を返す。
pub fn options(field: Field, parent: &str) -> Vec<&'static str> {
    match field {
        Field::HairLength => HAIR_LENGTHS.to_vec(),
        Field::HairColorMain => hair_color_mains(),
        Field::HairstyleMain => hairstyle_mains(),
        Field::EyeColor => EYE_COLORS.to_vec(),
        Field::EyeShape => EYE_SHAPES.to_vec(),
        Field::Expression => EXPRESSIONS.to_vec(),
        Field::Vibe => VIBES.to_vec(),
        Field::HairColorSub | Field::HairstyleType | Field::HairstyleDetail => {
            if parent.is_empty() {
                all_children(field)
            } else {
                children_of(field, parent).to_vec()
            }
        }
        Field::Name | Field::Work | Field::Other => Vec::new(),
    }
}

/// 値がその項目の定義域に含まれるか
///
/// 空文字と自由入力項目は常に有効。サブ分類は `parent` が空なら
/// いずれかの大分類に属していれば有効とする。
pub fn is_valid(field: Field, value: &str, parent: &str) -> bool {
    if value.is_empty() || field.is_free_text() {
        return true;
    }
    options(field, parent).contains(&value)
}

/// サブ分類の値から大分類を逆引きする
///
/// 複数の大分類に属する値（例: "braided bun"）は一意に決まらないため `None`。
pub fn parent_of(field: Field, value: &str) -> Option<&'static str> {
    match parents_of(field, value).as_slice() {
        [main] => Some(main),
        _ => None,
    }
}

/// サブ分類の値が属する大分類をすべて返す（分類体系の順）
pub fn parents_of(field: Field, value: &str) -> Vec<&'static str> {
    if value.is_empty() {
        return Vec::new();
    }

    let mains = match field {
        Field::HairColorSub => hair_color_mains(),
        Field::HairstyleType | Field::HairstyleDetail => hairstyle_mains(),
        _ => return Vec::new(),
    };

    mains
        .into_iter()
        .filter(|main| children_of(field, main).contains(&value))
        .collect()
}

/// 旧データの表記ゆれを正規の値に変換する
///
/// 変換不要または未知の値は `None`。
pub fn canonicalize(field: Field, value: &str) -> Option<&'static str> {
    match (field, value.trim()) {
        (Field::HairLength, "short") => Some("short hair"),
        (Field::HairLength, "medium") => Some("medium hair"),
        (Field::HairLength, "long") => Some("long hair"),
        _ => None,
    }
}

/// AI推定の対象カテゴリ
///
/// 画像1枚につきカテゴリごとに1回、推定器を呼び出す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierCategory {
    HairLength,
    HairColor,
    Hairstyle,
    EyeColor,
    EyeShape,
    Expression,
    Vibe,
}

impl ClassifierCategory {
    pub const ALL: [ClassifierCategory; 7] = [
        ClassifierCategory::HairLength,
        ClassifierCategory::HairColor,
        ClassifierCategory::Hairstyle,
        ClassifierCategory::EyeColor,
        ClassifierCategory::EyeShape,
        ClassifierCategory::Expression,
        ClassifierCategory::Vibe,
    ];

    /// 推定結果を書き込む項目
    pub fn field(&self) -> Field {
        match self {
            ClassifierCategory::HairLength => Field::HairLength,
            ClassifierCategory::HairColor => Field::HairColorMain,
            ClassifierCategory::Hairstyle => Field::HairstyleMain,
            ClassifierCategory::EyeColor => Field::EyeColor,
            ClassifierCategory::EyeShape => Field::EyeShape,
            ClassifierCategory::Expression => Field::Expression,
            ClassifierCategory::Vibe => Field::Vibe,
        }
    }

    /// 推定器に渡す候補ラベル（髪色は大分類のみ）
    pub fn labels(&self) -> Vec<&'static str> {
        match self {
            ClassifierCategory::Hairstyle => HAIRSTYLE_LABELS.iter().map(|(label, _)| *label).collect(),
            other => options(other.field(), ""),
        }
    }

    /// 推定ラベルを保存用の値に変換する
    pub fn to_value(&self, label: &str) -> Option<&'static str> {
        match self {
            ClassifierCategory::Hairstyle => HAIRSTYLE_LABELS
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, main)| *main),
            other => options(other.field(), "").into_iter().find(|v| *v == label),
        }
    }
}
