//! 連関分析テスト
//!
//! タグストアと選択結果ファイルから好みの特徴とプロンプトを得るまでを検証

use chara_ai_common::{synthesize, AnalysisOptions, AttributeRecord, TagStore, BASE_PROMPT};
use chara_ai_rust::{preference, storage};
use tempfile::tempdir;

fn store() -> TagStore {
    let make = |color: &str, style: &str| AttributeRecord {
        hair_color_main: color.to_string(),
        hairstyle_main: style.to_string(),
        ..Default::default()
    };
    [
        ("001.png".to_string(), make("blonde", "ponytail")),
        ("002.png".to_string(), make("blonde", "ponytail")),
        ("003.png".to_string(), make("black", "bob")),
    ]
    .into_iter()
    .collect()
}

/// 同じ特徴の画像を2回選ぶと、その特徴がプロンプトに入る
#[test]
fn test_repeated_preference_reaches_prompt() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store_path = dir.path().join("character_features.json");
    let selected_path = dir.path().join("selected.json");

    storage::save_store(&store_path, &store()).unwrap();
    storage::save_selections(&selected_path, &["001.png".to_string(), "002.png".to_string()]).unwrap();

    let store = storage::load_store(&store_path).unwrap();
    let selections = storage::load_selections(&selected_path).unwrap().unwrap();
    let report = preference::analyze_selections(&store, &selections, &AnalysisOptions::default());

    assert!(!report.rules.is_empty());
    assert!(report.features.contains(&"blonde".to_string()));
    assert!(report.features.contains(&"ponytail".to_string()));
    assert!(!report.features.contains(&"bob".to_string()));
    assert_eq!(report.prompt, synthesize(BASE_PROMPT, &report.features));
    assert!(report.prompt.starts_with(BASE_PROMPT));
    assert!(report.prompt.ends_with("blonde, ponytail") || report.prompt.ends_with("ponytail, blonde"));
}

/// 選択結果がなければベースプロンプトのみ
#[test]
fn test_no_selection_uses_base_prompt() {
    let report = preference::analyze_selections(&store(), &[], &AnalysisOptions::default());
    assert!(report.features.is_empty());
    assert_eq!(report.prompt, BASE_PROMPT);
}

/// タグストアにない画像は除外して分析する
#[test]
fn test_unknown_selection_is_skipped() {
    let selections = vec!["001.png".to_string(), "002.png".to_string(), "404.png".to_string()];
    let report = preference::analyze_selections(&store(), &selections, &AnalysisOptions::default());
    assert_eq!(report.missing, vec!["404.png".to_string()]);
    assert!(report.features.contains(&"blonde".to_string()));
}

/// 同じ入力なら同じ結果
#[test]
fn test_analysis_is_deterministic() {
    let selections = vec!["001.png".to_string(), "003.png".to_string(), "002.png".to_string()];
    let a = preference::analyze_selections(&store(), &selections, &AnalysisOptions::default());
    let b = preference::analyze_selections(&store(), &selections, &AnalysisOptions::default());

    assert_eq!(a.features, b.features);
    assert_eq!(a.rules.len(), b.rules.len());
    for (x, y) in a.rules.rules.iter().zip(b.rules.rules.iter()) {
        assert_eq!(x.antecedents, y.antecedents);
        assert!((x.lift - y.lift).abs() < 1e-9);
        assert!((x.support - y.support).abs() < 1e-9);
    }
}
