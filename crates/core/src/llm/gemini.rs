//! Google Gemini chat client.
//!
//! Speaks the `generateContent` REST endpoint with the full history on
//! every call; the API is stateless so the `Conversation` carries context.

use super::{ChatMessage, ChatModel, LlmError, ModelReply, Role, TokenUsage};
use crate::models::ModelConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiChat {
    config: ModelConfig,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiChat {
    /// Create a new Gemini client
    pub fn new(config: ModelConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model
        )
    }

    fn build_request<'a>(&self, history: &'a [ChatMessage]) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: history
                .iter()
                .map(|m| Content {
                    role: match m.role {
                        Role::User => "user",
                        Role::Model => "model",
                    },
                    parts: [Part { text: &m.text }],
                })
                .collect(),
            generation_config: self
                .config
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }
}

fn parse_reply(body: GenerateResponse) -> Result<ModelReply, LlmError> {
    let candidate = body.candidates.into_iter().next().ok_or(LlmError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            warn!(finish_reason = %reason, "Model stopped early");
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let usage = body.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
        estimated: false,
    });

    Ok(ModelReply { text, usage })
}

#[async_trait]
impl ChatModel for GeminiChat {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, history: &[ChatMessage]) -> Result<ModelReply, LlmError> {
        let request = self.build_request(history);
        debug!(url = %self.url(), turns = history.len(), "Sending request to Gemini API");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|b| b.error.message)
                .unwrap_or(raw);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        parse_reply(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiChat {
        GeminiChat::new(ModelConfig::new("gemini-2.0-flash").with_api_key("k")).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let history = vec![ChatMessage::user("system"), ChatMessage::model("ok")];
        let chat = client();
        let json = serde_json::to_value(chat.build_request(&history)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "ok");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_url_uses_model() {
        assert_eq!(
            client().url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_parse_reply_with_usage() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{"content": {"parts": [{"text": "Hello"}, {"text": " there"}]}, "finishReason": "STOP"}],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2, "totalTokenCount": 12}
            }"#,
        )
        .unwrap();

        let reply = parse_reply(body).unwrap();
        assert_eq!(reply.text, "Hello there");
        let usage = reply.usage.unwrap();
        assert_eq!(usage.total_tokens, Some(12));
        assert!(!usage.estimated);
    }

    #[test]
    fn test_parse_reply_without_candidates() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(parse_reply(body), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_blank_key_rejected() {
        let result = GeminiChat::new(ModelConfig::default().with_api_key("  "));
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }
}
