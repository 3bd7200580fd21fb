//! Chara AI Common Library
//!
//! CLIとバッチ処理で共有される型とロジック（I/Oなし）

pub mod edit;
pub mod error;
pub mod filter;
pub mod merge;
pub mod prompt;
pub mod rules;
pub mod sampler;
pub mod stats;
pub mod store;
pub mod taxonomy;
pub mod types;

pub use edit::apply_edit;
pub use error::{Error, Result};
pub use filter::{filter_store, TagFilter};
pub use merge::{merge_record, merge_store, plan_renumber, Rename};
pub use prompt::{synthesize, GenerationParams, GenerationRequest, BASE_PROMPT, NEGATIVE_PROMPT};
pub use rules::{analyze, extract_features, AnalysisOptions, AssociationRule, RuleSet};
pub use sampler::{Pair, PairSampler, SamplerState, SELECTION_QUOTA};
pub use stats::{ratio_table, records_for_work, RatioRow};
pub use store::{to_pretty_json, TagStore};
pub use taxonomy::ClassifierCategory;
pub use types::{AttributeRecord, Field, RecordIssue};
