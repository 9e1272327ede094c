use crate::ContentError;
use crate::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use reqwest::Client;
use serde_json::json;
use url::Url;

/// 音声合成に送る最大文字数
pub const MAX_SPEECH_INPUT_CHARS: usize = 4096;

/// 音声合成クライアント
pub struct SpeechClient {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl SpeechClient {
    /// 新しい音声合成クライアントを作成
    pub fn new(base_url: &str, api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            http_client,
        }
    }

    /// テキストを音声に変換
    ///
    /// Input longer than `MAX_SPEECH_INPUT_CHARS` is truncated on a
    /// character boundary before sending. The decoded audio bytes are
    /// returned as-is.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let input = truncate_chars(text, MAX_SPEECH_INPUT_CHARS);
        if input.len() < text.len() {
            debug!(
                "Speech input truncated from {} to {} bytes",
                text.len(),
                input.len()
            );
        }

        let base = Url::parse(&self.base_url)?;
        let url = format!("{}/v1/text:synthesize", base.as_str().trim_end_matches('/'));

        let payload = json!({
            "input": { "text": input },
            "voice": { "languageCode": "en-US" },
            "audioConfig": { "audioEncoding": "MP3" }
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ContentError::ApiError(error_text));
        }

        let body = response.json::<serde_json::Value>().await?;
        let encoded = body
            .get("audioContent")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ContentError::UnexpectedShape("response has no audioContent".to_string())
            })?;

        Ok(STANDARD.decode(encoded)?)
    }
}

/// 文字境界で切り詰める
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn long_input_is_cut_at_char_boundary() {
        let input = "あいうえお".repeat(1000);
        let cut = truncate_chars(&input, MAX_SPEECH_INPUT_CHARS);
        assert_eq!(cut.chars().count(), MAX_SPEECH_INPUT_CHARS);
        // マルチバイト文字の途中で切れない
        assert!(input.is_char_boundary(cut.len()));
    }
}
