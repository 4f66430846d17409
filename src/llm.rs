use crate::config::{Credential, LlmConfig};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::reply::ChatReply;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("tripwright/", env!("CARGO_PKG_VERSION"));

/// LLM provider — determines API format and endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    OpenRouter,
    Anthropic,
}

impl Provider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Candidate list used when the config names no models.
    pub fn default_models(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"],
            Self::OpenRouter => &["openai/gpt-4o", "openai/gpt-4o-mini", "openai/gpt-4-turbo"],
            Self::Anthropic => &["claude-sonnet-4-5", "claude-haiku-4-5"],
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "openrouter" => Some(Self::OpenRouter),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// One request against one model identifier.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    /// Empty means no system message is sent.
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    /// `None` leaves sampling at the provider default.
    pub temperature: Option<f32>,
}

/// Anything that can answer a [`ChatRequest`] with a raw reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatReply>;
}

pub struct LlmClient {
    provider: Provider,
    api_key: Credential,
    base_url: String,
    http: HttpClient,
}

// -- Anthropic format --

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

// -- OpenAI-compatible format --

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Msg<'a>>,
}

// -- Shared --

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

impl LlmClient {
    pub fn new(
        provider: Provider,
        api_key: Credential,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::new(USER_AGENT, timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| provider.default_base_url().into())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            provider,
            api_key,
            base_url,
            http,
        })
    }

    /// Build from config, reading the API key from the configured env var.
    /// A missing key fails here, before any model call.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.credential()?;
        Self::new(
            config.provider,
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn complete_anthropic(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        let body = AnthropicRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: vec![Msg {
                role: "user",
                content: request.user,
            }],
        };

        let body = serde_json::to_string(&body)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/messages", self.base_url);
        let response_text = self
            .http
            .post_json_raw(
                &url,
                &body,
                &[
                    ("x-api-key", self.api_key.expose()),
                    ("anthropic-version", "2023-06-01"),
                ],
            )
            .await
            .inspect_err(|e| warn!(model = request.model, "Anthropic API error: {e}"))?;

        serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse Anthropic response: {e}")))
    }

    async fn complete_openai(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(Msg {
                role: "system",
                content: request.system,
            });
        }
        messages.push(Msg {
            role: "user",
            content: request.user,
        });

        let body = OpenAiRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages,
        };

        let body = serde_json::to_string(&body)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/chat/completions", self.base_url);
        let auth = format!("Bearer {}", self.api_key.expose());
        let response_text = self
            .http
            .post_json_raw(&url, &body, &[("Authorization", &auth)])
            .await
            .inspect_err(|e| warn!(model = request.model, "LLM API error: {e}"))?;

        serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse LLM response: {e}")))
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        debug!(provider = ?self.provider, model = %request.model, "sending LLM request");

        match self.provider {
            Provider::Anthropic => self.complete_anthropic(request).await,
            Provider::OpenRouter | Provider::OpenAi => self.complete_openai(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!(Provider::parse("OpenAI"), Some(Provider::OpenAi));
        assert_eq!(Provider::parse("anthropic"), Some(Provider::Anthropic));
        assert_eq!(Provider::parse("openrouter"), Some(Provider::OpenRouter));
        assert_eq!(Provider::parse("groq"), None);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = LlmClient::new(
            Provider::OpenAi,
            Credential::new("sk-test"),
            Some("http://localhost:1/v1/".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:1/v1");
    }

    #[test]
    fn openai_request_body_carries_sampling_parameters() {
        let body = OpenAiRequest {
            model: "gpt-4o",
            max_tokens: 2500,
            temperature: Some(0.7),
            messages: vec![Msg {
                role: "user",
                content: "hi",
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["max_tokens"], 2500);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn anthropic_request_omits_empty_system() {
        let body = AnthropicRequest {
            model: "claude-sonnet-4-5",
            max_tokens: 10,
            temperature: Some(0.7),
            system: "",
            messages: vec![],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn unset_temperature_is_left_out_of_both_formats() {
        let openai = serde_json::to_value(OpenAiRequest {
            model: "gpt-4o",
            max_tokens: 10,
            temperature: None,
            messages: vec![],
        })
        .unwrap();
        let anthropic = serde_json::to_value(AnthropicRequest {
            model: "claude-sonnet-4-5",
            max_tokens: 10,
            temperature: None,
            system: "",
            messages: vec![],
        })
        .unwrap();
        assert!(openai.get("temperature").is_none());
        assert!(anthropic.get("temperature").is_none());
        assert_eq!(openai["max_tokens"], 10);
    }
}
