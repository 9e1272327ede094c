use crate::generate::extract_candidate_text;
use crate::Result;
use crate::ContentError;
use reqwest::Client;
use serde_json::json;
use url::Url;

/// チャットの固定システム指示
///
/// Replies are capped in length server-side through this instruction;
/// the client never sends prior turns.
pub const CHAT_SYSTEM_INSTRUCTION: &str =
    "You are a friendly career advisor for learners on the skillpath platform. \
     Answer the single question you are given. Keep every reply under 120 words.";

/// キャリアチャットクライアント
pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    http_client: Client,
}

impl ChatClient {
    /// 新しいチャットクライアントを作成
    pub fn new(base_url: &str, api_key: &str, model: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            http_client,
        }
    }

    /// 単発のメッセージを送信して回答テキストを受け取る
    pub async fn send_message(&self, message: &str) -> Result<String> {
        let base = Url::parse(&self.base_url)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            self.model
        );

        let payload = json!({
            "system_instruction": {
                "parts": [{ "text": CHAT_SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": message }]
            }]
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
        let text = extract_candidate_text(&body)?;
        Ok(text.trim().to_string())
    }
}
