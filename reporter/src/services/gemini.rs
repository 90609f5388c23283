//! Gemini REST backend implementation
//!
//! One `generateContent` request per call, with HTTP status and payload
//! classification into the shared failure taxonomy. JSON mode declares the
//! segmentation object schema so the backend constrains its output.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{ApiFailure, GenerationConfig, SectionKey};
use tracing::debug;

use crate::traits::GenerationBackend;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Candidate finish reasons that indicate a content-policy block
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST"];

pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the backend at a different endpoint (test servers)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn request(
        &self,
        instructions: &str,
        content: &str,
        config: &GenerationConfig,
        structured: bool,
    ) -> Result<String, ApiFailure> {
        let url = format!("{}/models/{}:generateContent", self.base_url, config.model);

        let mut generation_config = json!({
            "temperature": config.temperature,
            "maxOutputTokens": config.max_output_tokens,
        });
        if structured {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = segmentation_schema();
        }

        let request_body = json!({
            "system_instruction": { "parts": [{ "text": instructions }] },
            "contents": [{ "role": "user", "parts": [{ "text": content }] }],
            "generationConfig": generation_config,
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ApiFailure::Connectivity(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiFailure::MalformedOutput(e.to_string()))?;

        debug!("gemini call returned HTTP {status}");
        extract_text(&payload)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        instructions: &str,
        content: &str,
        config: &GenerationConfig,
    ) -> Result<String, ApiFailure> {
        self.request(instructions, content, config, false).await
    }

    async fn generate_structured(
        &self,
        instructions: &str,
        content: &str,
        config: &GenerationConfig,
    ) -> Result<String, ApiFailure> {
        self.request(instructions, content, config, true).await
    }
}

/// Map non-success HTTP statuses onto the failure taxonomy
fn classify_status(status: u16, body: &str) -> ApiFailure {
    match status {
        429 => ApiFailure::RateLimited,
        500..=599 => ApiFailure::Connectivity(format!("HTTP {status}")),
        _ => ApiFailure::Other(format!("HTTP {status}: {}", truncate(body, 200))),
    }
}

/// Pull the generated text out of a successful payload
///
/// A prompt-feedback block or a blocked finish reason is a content-policy
/// failure; anything without candidate text is malformed.
fn extract_text(payload: &Value) -> Result<String, ApiFailure> {
    if payload
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
        .is_some()
    {
        return Err(ApiFailure::ContentBlocked);
    }

    let candidate = payload
        .pointer("/candidates/0")
        .ok_or_else(|| ApiFailure::MalformedOutput("no candidates in payload".to_string()))?;

    if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
        if BLOCKED_FINISH_REASONS.contains(&reason) {
            return Err(ApiFailure::ContentBlocked);
        }
    }

    let text = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .concat()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ApiFailure::MalformedOutput(
            "candidate carried no text".to_string(),
        ));
    }
    Ok(text)
}

/// Declared response schema for the segmentation call
fn segmentation_schema() -> Value {
    let mut properties = serde_json::Map::new();
    for key in SectionKey::ALL {
        properties.insert(key.field_name().to_string(), json!({ "type": "STRING" }));
    }
    properties.insert(
        "others".to_string(),
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "organ": { "type": "STRING" },
                    "findings": { "type": "STRING" }
                },
                "required": ["organ", "findings"]
            }
        }),
    );
    properties.insert("comment".to_string(), json!({ "type": "STRING" }));

    let required: Vec<String> = properties.keys().cloned().collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
