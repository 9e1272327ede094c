use crate::error::ContentError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

/// モジュールコンテンツ生成リクエスト
#[derive(Debug, Clone, Serialize)]
pub struct ModuleContentRequest {
    pub course_title: String,
    pub module_title: String,
    pub module_description: String,
    pub visual_points: i64,
    pub textual_points: i64,
}

/// 生成されたモジュールコンテンツ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleContent {
    pub content: String,
    #[serde(default)]
    pub visual_content: Vec<VisualItem>,
    #[serde(default)]
    pub textual_content: String,
}

/// ビジュアルコンテンツ項目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisualItem {
    Mermaid { code: String },
    Url { url: String },
}

/// コンテンツ生成クライアント
pub struct ContentClient {
    base_url: String,
    api_key: String,
    model: String,
    http_client: Client,
}

impl ContentClient {
    /// 新しいコンテンツ生成クライアントを作成
    pub fn new(base_url: &str, api_key: &str, model: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            http_client,
        }
    }

    /// モジュールコンテンツを生成
    ///
    /// The model is asked for a strict JSON object; a response that does
    /// not parse into the expected shape is a hard failure for this
    /// request, with no retry.
    pub async fn generate_module_content(
        &self,
        request: &ModuleContentRequest,
    ) -> Result<ModuleContent> {
        let prompt = build_module_prompt(request);
        let text = self.generate_text(&prompt).await?;
        let cleaned = strip_code_fence(&text);

        serde_json::from_str::<ModuleContent>(cleaned)
            .map_err(|e| ContentError::UnexpectedShape(format!("module content payload: {}", e)))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let base = Url::parse(&self.base_url)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            self.model
        );

        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
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
        extract_candidate_text(&body)
    }
}

fn build_module_prompt(request: &ModuleContentRequest) -> String {
    format!(
        "Generate learning content for the module \"{}\" of the course \"{}\".\n\
         Module description: {}\n\
         The learner prefers visual material at level {} and textual material at level {}.\n\
         Respond with a single JSON object with exactly these fields:\n\
         \"content\" (markdown text), \"visualContent\" (array of items, each either\n\
         {{\"type\": \"mermaid\", \"code\": \"...\"}} or {{\"type\": \"url\", \"url\": \"...\"}})\n\
         and \"textualContent\" (plain text summary). Do not wrap the JSON in prose.",
        request.module_title,
        request.course_title,
        request.module_description,
        request.visual_points,
        request.textual_points,
    )
}

/// レスポンスから最初の候補テキストを取り出す
pub(crate) fn extract_candidate_text(body: &serde_json::Value) -> Result<String> {
    body.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| ContentError::UnexpectedShape("response has no candidate text".to_string()))
}

/// モデルが付けがちなコードフェンスを剥がす
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
