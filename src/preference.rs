//! 選択結果から好みの特徴を分析し、プロンプトを組み立てる

use chara_ai_common::{
    analyze, extract_features, synthesize, AnalysisOptions, RuleSet, TagStore, BASE_PROMPT,
};

/// 分析結果
#[derive(Debug, Clone)]
pub struct PreferenceReport {
    pub rules: RuleSet,
    /// 好みの特徴（出現順・重複なし）
    pub features: Vec<String>,
    /// ベースプロンプト + 特徴
    pub prompt: String,
    /// タグストアに見つからなかった選択結果
    pub missing: Vec<String>,
}

/// 選ばれた画像の特徴を分析する
///
/// タグストアにない画像は警告を出して除外する。
/// ルールが1つも出なければベースプロンプトのみを返す。
pub fn analyze_selections(
    store: &TagStore,
    selections: &[String],
    options: &AnalysisOptions,
) -> PreferenceReport {
    let (records, missing) = store.records_for(selections);
    for id in &missing {
        tracing::warn!(id = %id, "選択結果の画像がタグストアにありません");
    }

    let rules = analyze(&records, options);
    let features = extract_features(&rules);
    let prompt = synthesize(BASE_PROMPT, &features);

    PreferenceReport {
        rules,
        features,
        prompt,
        missing,
    }
}
