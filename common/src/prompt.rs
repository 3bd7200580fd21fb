//! 画像生成プロンプト
//!
//! - BASE_PROMPT / NEGATIVE_PROMPT: 固定のベース・ネガティブプロンプト
//! - synthesize: 連関分析で抽出した特徴をベースプロンプトに連結
//! - GenerationRequest: txt2img API に送るリクエスト本体

use serde::{Deserialize, Serialize};

/// ベースプロンプト
pub const BASE_PROMPT: &str = "masterpiece, best quality, amazing quality, 4k, very aesthetic, high resolution, ultra-detailed, absurdres, newest, anime, anime coloring, 1girl, solo, wearing clothes,eyes that feel natural, pupil, cute eyes";

/// ネガティブプロンプト
pub const NEGATIVE_PROMPT: &str = "photorealistic, realistic, 3d, Two-toned hair, multiple views, multiple angle, split view, grid view, two shot, outside border, picture frame, framed, border, letterboxed, pillarboxed, 2koma, old, oldest, cartoon, graphic, text, painting, crayon, graphite, abstract, glitch, deformed, mutated, ugly, disfigured, long body, lowres, bad anatomy, bad hands, missing fingers, extra fingers, extra digits, fewer digits, cropped, very displeasing, (worst quality, bad quality:1.2), sketch, jpeg artifacts, signature, watermark, username, (censored, bar_censor, mosaic_censor:1.2), conjoined, bad ai-generated, Steps: 20, Sampler: Euler a, CFG scale: 4.5, Global Seed: 428649103, Seed: 3282307999, Size: 768x1344,Clip skip: 2, Model hash: 6a2e0c8dd7, Model: NovaAnimeILV15, Hires steps: 40, Hires upscale: 1.5, DPM++ 2M, Schedule type: Karras, CFG scale: 7, Seed: 2147104563, Size: 512x640, Model hash: 6a2e0c8dd7, Model: novaAnimeXL_ilV150, Denoising strength: 0.7, Hires Module 1: Use same choices, Hires CFG Scale: 7, Hires upscale: 2, Hires upscaler: Latent, Version: f2.0.1v1.10.1-1.10.1, nsfw, sheer clothing";

/// 特徴をベースプロンプトに連結する
///
/// 特徴が空ならベースプロンプトそのものを返す。
pub fn synthesize(base: &str, features: &[String]) -> String {
    if features.is_empty() {
        return base.to_string();
    }
    format!("{}, {}", base, features.join(", "))
}

/// 生成パラメータ（プロンプト以外）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub steps: u32,
    pub sampler_name: String,
    pub width: u32,
    pub height: u32,
    pub checkpoint: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            steps: 20,
            sampler_name: "DPM++ 2M Karras".to_string(),
            width: 832,
            height: 1216,
            checkpoint: "AnythingXL_inkBase.safetensors".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSettings {
    pub sd_model_checkpoint: String,
}

/// txt2img リクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub sampler_name: String,
    pub width: u32,
    pub height: u32,
    pub override_settings: OverrideSettings,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, params: &GenerationParams) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: NEGATIVE_PROMPT.to_string(),
            steps: params.steps,
            sampler_name: params.sampler_name.clone(),
            width: params.width,
            height: params.height,
            override_settings: OverrideSettings {
                sd_model_checkpoint: params.checkpoint.clone(),
            },
        }
    }
}

/// txt2img レスポンス（base64 画像の配列）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_without_features_returns_base() {
        assert_eq!(synthesize(BASE_PROMPT, &[]), BASE_PROMPT);
    }

    #[test]
    fn test_synthesize_appends_features_in_order() {
        let features = vec!["blonde".to_string(), "ponytail".to_string()];
        assert_eq!(synthesize("base", &features), "base, blonde, ponytail");
    }

    #[test]
    fn test_synthesize_does_not_escape_or_dedupe() {
        let features = vec!["(tag:1.2)".to_string(), "(tag:1.2)".to_string()];
        assert_eq!(synthesize("base", &features), "base, (tag:1.2), (tag:1.2)");
    }

    #[test]
    fn test_request_payload_shape() {
        let request = GenerationRequest::new("base, blonde", &GenerationParams::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["prompt"], "base, blonde");
        assert_eq!(json["steps"], 20);
        assert_eq!(json["sampler_name"], "DPM++ 2M Karras");
        assert_eq!(json["width"], 832);
        assert_eq!(json["height"], 1216);
        assert_eq!(
            json["override_settings"]["sd_model_checkpoint"],
            "AnythingXL_inkBase.safetensors"
        );
        assert_eq!(json["negative_prompt"], NEGATIVE_PROMPT);
    }

    #[test]
    fn test_response_without_images_is_empty() {
        let response: GenerationResponse = serde_json::from_str(r#"{"info": "x"}"#).unwrap();
        assert!(response.images.is_empty());
    }
}
