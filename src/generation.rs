//! 画像生成API（Stable Diffusion WebUI の txt2img）連携

use crate::error::{CharaAiError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chara_ai_common::{GenerationParams, GenerationRequest};
use chara_ai_common::prompt::GenerationResponse;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct GenerationClient {
    client: reqwest::Client,
    url: String,
    params: GenerationParams,
}

impl GenerationClient {
    pub fn new(url: impl Into<String>, params: GenerationParams, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CharaAiError::GenerationService(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            params,
        })
    }

    /// プロンプトから画像を1枚生成し、PNGのバイト列を返す
    pub async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let request = GenerationRequest::new(prompt, &self.params);
        tracing::debug!(url = %self.url, prompt_len = prompt.len(), "画像生成リクエスト");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CharaAiError::GenerationService(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CharaAiError::GenerationService(e.to_string()))?;

        if !status.is_success() {
            return Err(CharaAiError::GenerationService(format!("HTTP {}: {}", status, body)));
        }

        decode_response(&body)
    }
}

/// レスポンス本文から先頭の画像を取り出す
pub fn decode_response(body: &str) -> Result<Vec<u8>> {
    let parsed: GenerationResponse = serde_json::from_str(body)
        .map_err(|e| CharaAiError::GenerationService(format!("レスポンスを解析できません: {}: {}", e, body)))?;

    let first = parsed
        .images
        .first()
        .ok_or_else(|| CharaAiError::GenerationService(format!("画像が含まれていません: {}", body)))?;

    // "data:image/png;base64," 付きで返す実装もある
    let encoded = first.split_once(',').map(|(_, data)| data).unwrap_or(first);

    STANDARD
        .decode(encoded.trim())
        .map_err(|e| CharaAiError::GenerationService(format!("base64デコードエラー: {}", e)))
}

/// `<output_dir>/generated_<UNIX秒>.png` に保存する
pub fn save_image(output_dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("generated_{}.png", chrono::Utc::now().timestamp()));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_decode_response_first_image() {
        let body = format!(r#"{{"images": ["{}", "{}"]}}"#, STANDARD.encode(b"first"), STANDARD.encode(b"second"));
        assert_eq!(decode_response(&body).unwrap(), b"first");
    }

    #[test]
    fn test_decode_response_with_data_url_prefix() {
        let body = format!(r#"{{"images": ["data:image/png;base64,{}"]}}"#, STANDARD.encode(b"png"));
        assert_eq!(decode_response(&body).unwrap(), b"png");
    }

    #[test]
    fn test_decode_response_errors_keep_detail() {
        match decode_response(r#"{"images": []}"#) {
            Err(CharaAiError::GenerationService(msg)) => assert!(msg.contains("images")),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(decode_response("not json"), Err(CharaAiError::GenerationService(_))));
        assert!(matches!(
            decode_response(r#"{"images": ["@@@"]}"#),
            Err(CharaAiError::GenerationService(_))
        ));
    }

    /// 1回だけ応答するHTTPサーバーを立ててURLを返す
    async fn serve_once(status_line: &'static str, body: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // リクエストを読み切ってから応答する
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/sdapi/v1/txt2img", addr)
    }

    #[tokio::test]
    async fn test_generate_server_error_keeps_status_and_body() {
        let body = r#"{"error": "OutOfMemoryError", "detail": "CUDA out of memory"}"#.to_string();
        let url = serve_once("HTTP/1.1 500 Internal Server Error", body.clone()).await;

        let client = GenerationClient::new(url, GenerationParams::default(), 10).unwrap();
        match client.generate("1girl").await {
            Err(CharaAiError::GenerationService(msg)) => {
                assert!(msg.contains("500"), "{}", msg);
                assert!(msg.contains(&body), "{}", msg);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_decodes_first_image() {
        let body = format!(r#"{{"images": ["{}"]}}"#, STANDARD.encode(b"\x89PNG"));
        let url = serve_once("HTTP/1.1 200 OK", body).await;

        let client = GenerationClient::new(url, GenerationParams::default(), 10).unwrap();
        assert_eq!(client.generate("1girl").await.unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_save_image_naming() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = save_image(&dir.path().join("outputs"), b"png").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("generated_"));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
    }
}
