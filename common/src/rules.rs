//! 連関分析（アソシエーション分析）
//!
//! 選ばれたキャラの特徴から好みの組み合わせを抽出する。
//!
//! ## 処理フロー
//! 1. 自由入力項目（名前・作品名・その他）を除外
//! 2. 空でない値を `項目=値` の列にワンホット化（空欄は列を作らない）
//! 3. 項目ごとの重みを掛ける（髪型 > 髪の長さ > 髪色 > 目 > 表情・雰囲気）
//! 4. 行列全体の最大値で割って正規化
//! 5. apriori で頻出アイテムセットを抽出（最小支持度 0.25）
//! 6. リフト値 1.1 以上のルールを抽出し、リフト降順に並べる
//!
//! 支持度は重み付き値で計算する。単独アイテムは列の平均、
//! 2つ以上の組み合わせは全アイテムが存在する行の割合になる。
//! 重みの大きい項目ほど単独で頻出と判定されやすくなる。

use crate::types::{AttributeRecord, Field};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

pub const MIN_SUPPORT: f64 = 0.25;
pub const MIN_LIFT: f64 = 1.1;

/// 項目ごとの重み
pub fn field_weight(field: Field) -> f64 {
    match field {
        Field::HairstyleDetail => 3.0,
        Field::HairstyleType => 2.5,
        Field::HairstyleMain => 2.0,
        Field::HairLength => 2.0,
        Field::HairColorMain => 1.8,
        Field::HairColorSub => 1.5,
        Field::EyeColor => 1.0,
        Field::EyeShape => 0.8,
        Field::Expression => 0.5,
        Field::Vibe => 0.5,
        _ => 1.0,
    }
}

/// 分析の閾値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub min_support: f64,
    pub min_lift: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_support: MIN_SUPPORT,
            min_lift: MIN_LIFT,
        }
    }
}

/// ワンホット列（`項目=値`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub field: Field,
    pub value: String,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

/// 重み付き・正規化済みのワンホット行列
#[derive(Debug, Clone, Default)]
pub struct WeightedMatrix {
    columns: Vec<Item>,
    /// rows[行][列]
    rows: Vec<Vec<f64>>,
}

impl WeightedMatrix {
    pub fn from_records(records: &[&AttributeRecord]) -> Self {
        let mut columns: Vec<Item> = records
            .iter()
            .flat_map(|record| {
                Field::ALL
                    .into_iter()
                    .filter(|field| !field.is_free_text())
                    .filter(move |field| !record.get(*field).is_empty())
                    .map(move |field| Item {
                        field,
                        value: record.get(field).to_string(),
                    })
            })
            .collect();
        columns.sort();
        columns.dedup();

        let index: HashMap<&Item, usize> = columns.iter().enumerate().map(|(i, item)| (item, i)).collect();

        let mut rows: Vec<Vec<f64>> = records
            .iter()
            .map(|record| {
                let mut row = vec![0.0; columns.len()];
                for field in Field::ALL.into_iter().filter(|f| !f.is_free_text()) {
                    let value = record.get(field);
                    if value.is_empty() {
                        continue;
                    }
                    let item = Item { field, value: value.to_string() };
                    if let Some(&col) = index.get(&item) {
                        row[col] = field_weight(field);
                    }
                }
                row
            })
            .collect();

        let max = rows
            .iter()
            .flat_map(|row| row.iter().copied())
            .fold(0.0_f64, f64::max);

        if max > 0.0 {
            for row in rows.iter_mut() {
                for cell in row.iter_mut() {
                    *cell /= max;
                }
            }
        }

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Item] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// 支持度
    ///
    /// 単独アイテムは重み付き値の平均、複数アイテムは全て存在する行の割合。
    pub fn support(&self, itemset: &[usize]) -> f64 {
        if self.rows.is_empty() || itemset.is_empty() {
            return 0.0;
        }
        let n = self.rows.len() as f64;

        if let [col] = itemset {
            return self.rows.iter().map(|row| row[*col]).sum::<f64>() / n;
        }

        let hits = self
            .rows
            .iter()
            .filter(|row| itemset.iter().all(|&col| row[col] > 0.0))
            .count();
        hits as f64 / n
    }
}

/// 頻出アイテムセット（列番号は昇順）
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemset {
    pub items: Vec<usize>,
    pub support: f64,
}

/// apriori で頻出アイテムセットを抽出する
///
/// サイズ k の候補は、先頭 k-2 個が一致する (k-1) 頻出セット同士を結合し、
/// 全ての (k-1) 部分集合が頻出のものだけを残す。
pub fn frequent_itemsets(matrix: &WeightedMatrix, min_support: f64) -> Vec<FrequentItemset> {
    let mut result = Vec::new();

    let mut level: Vec<Vec<usize>> = (0..matrix.columns().len())
        .map(|col| vec![col])
        .filter(|set| matrix.support(set) >= min_support)
        .collect();

    while !level.is_empty() {
        for set in &level {
            result.push(FrequentItemset {
                items: set.clone(),
                support: matrix.support(set),
            });
        }

        level = next_level(matrix, &level, min_support);
    }

    result
}

/// (k-1) 頻出セットから k 頻出セットを作る
fn next_level(matrix: &WeightedMatrix, level: &[Vec<usize>], min_support: f64) -> Vec<Vec<usize>> {
    let known: HashSet<&Vec<usize>> = level.iter().collect();
    let mut next = Vec::new();

    for (i, a) in level.iter().enumerate() {
        for b in &level[i + 1..] {
            let k = a.len();
            if a[..k - 1] != b[..k - 1] {
                continue;
            }
            let mut candidate = a.clone();
            candidate.push(b[k - 1]);
            candidate.sort_unstable();

            let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                let subset: Vec<usize> = candidate
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != skip)
                    .map(|(_, &c)| c)
                    .collect();
                known.contains(&subset)
            });

            if all_subsets_frequent && matrix.support(&candidate) >= min_support {
                next.push(candidate);
            }
        }
    }

    next
}

/// 相関ルール
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    pub antecedents: Vec<Item>,
    pub consequents: Vec<Item>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: &[Item]| {
            items
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{{{}}} -> {{{}}} (support={:.3}, confidence={:.3}, lift={:.3})",
            join(&self.antecedents),
            join(&self.consequents),
            self.support,
            self.confidence,
            self.lift
        )
    }
}

/// 分析結果（ルールはリフト降順）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<AssociationRule>,
    /// 頻出アイテムセット数
    pub itemset_count: usize,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// 頻出アイテムセットから相関ルールを導出する（リフト値で絞り込み）
pub fn association_rules(
    matrix: &WeightedMatrix,
    itemsets: &[FrequentItemset],
    min_lift: f64,
) -> Vec<AssociationRule> {
    let supports: HashMap<&[usize], f64> = itemsets
        .iter()
        .map(|set| (set.items.as_slice(), set.support))
        .collect();

    let to_items = |cols: &[usize]| -> Vec<Item> {
        cols.iter().map(|&c| matrix.columns()[c].clone()).collect()
    };

    let mut rules = Vec::new();

    for set in itemsets.iter().filter(|s| s.items.len() >= 2) {
        let n = set.items.len();
        // 空集合と全体を除く全ての部分集合を前件とする
        for mask in 1..(1u32 << n) - 1 {
            let (antecedent, consequent): (Vec<usize>, Vec<usize>) = {
                let mut a = Vec::new();
                let mut c = Vec::new();
                for (bit, &col) in set.items.iter().enumerate() {
                    if mask & (1 << bit) != 0 {
                        a.push(col);
                    } else {
                        c.push(col);
                    }
                }
                (a, c)
            };

            let (Some(&sa), Some(&sc)) = (
                supports.get(antecedent.as_slice()),
                supports.get(consequent.as_slice()),
            ) else {
                continue;
            };

            if sa <= 0.0 || sc <= 0.0 {
                continue;
            }

            let confidence = set.support / sa;
            let lift = confidence / sc;
            if lift < min_lift {
                continue;
            }

            rules.push(AssociationRule {
                antecedents: to_items(&antecedent),
                consequents: to_items(&consequent),
                antecedent_support: sa,
                consequent_support: sc,
                support: set.support,
                confidence,
                lift,
                leverage: set.support - sa * sc,
            });
        }
    }

    rules.sort_by(|a, b| b.lift.partial_cmp(&a.lift).unwrap_or(Ordering::Equal));
    rules
}

/// 選ばれたキャラの特徴を分析する
///
/// 選択が空、または頻出アイテムセットがない場合は空の結果を返す。
pub fn analyze(records: &[&AttributeRecord], options: &AnalysisOptions) -> RuleSet {
    if records.is_empty() {
        return RuleSet::default();
    }

    let matrix = WeightedMatrix::from_records(records);
    let itemsets = frequent_itemsets(&matrix, options.min_support);
    tracing::debug!(
        columns = matrix.columns().len(),
        itemsets = itemsets.len(),
        "頻出アイテムセット抽出"
    );

    if itemsets.is_empty() {
        return RuleSet::default();
    }

    RuleSet {
        rules: association_rules(&matrix, &itemsets, options.min_lift),
        itemset_count: itemsets.len(),
    }
}

/// ルールに含まれる特徴の値を重複なしで抽出する（出現順）
pub fn extract_features(rule_set: &RuleSet) -> Vec<String> {
    let mut seen = HashSet::new();
    rule_set
        .rules
        .iter()
        .flat_map(|rule| rule.antecedents.iter().chain(rule.consequents.iter()))
        .filter_map(|item| {
            if seen.insert(item.value.clone()) {
                Some(item.value.clone())
            } else {
                None
            }
        })
        .collect()
}
