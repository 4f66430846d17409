#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tripwright::error::{Error, Result};
use tripwright::fallback::FallbackClient;
use tripwright::llm::{ChatBackend, ChatRequest};
use tripwright::planner::Planner;
use tripwright::reply::ChatReply;

/// What a scripted model does when asked.
#[derive(Clone)]
pub enum Outcome {
    Text(String),
    Raw(Value),
    ApiError(u16, String),
    Network(String),
    RateLimited,
}

/// Backend answering from a per-model script and recording every call.
#[derive(Default)]
pub struct ScriptedBackend {
    script: HashMap<String, Outcome>,
    requests: Mutex<Vec<Recorded>>,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, model: &str, outcome: Outcome) -> Self {
        self.script.insert(model.into(), outcome);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.model.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        self.requests.lock().unwrap().push(Recorded {
            model: request.model.to_string(),
            system: request.system.to_string(),
            user: request.user.to_string(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        });
        match self.script.get(request.model) {
            Some(Outcome::Text(text)) => Ok(openai_reply(text)),
            Some(Outcome::Raw(value)) => {
                serde_json::from_value(value.clone()).map_err(|e| Error::parse(e.to_string()))
            }
            Some(Outcome::ApiError(status, body)) => {
                Err(Error::api_with_status("api.test", body.clone(), *status))
            }
            Some(Outcome::Network(msg)) => Err(Error::http(msg.clone())),
            Some(Outcome::RateLimited) => Err(Error::RateLimit {
                platform: "api.test".into(),
                retry_after_secs: Some(30),
            }),
            None => Err(Error::api_with_status("api.test", "model not found", 404)),
        }
    }
}

pub fn openai_reply(text: &str) -> ChatReply {
    serde_json::from_value(json!({
        "choices": [{"message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 120, "completion_tokens": 900, "total_tokens": 1020}
    }))
    .unwrap()
}

pub fn client(backend: Arc<ScriptedBackend>, models: &[&str]) -> FallbackClient {
    FallbackClient::new(
        backend,
        models.iter().map(|m| m.to_string()).collect(),
        2500,
        0.7,
    )
    .unwrap()
}

pub fn planner(backend: Arc<ScriptedBackend>, models: &[&str]) -> Planner {
    Planner::new(client(backend, models))
}

/// A well-formed itinerary with `days` day sections.
pub fn itinerary(destination: &str, days: u32) -> String {
    let mut md = format!("## Trip Overview\nA trip to {destination}.\n\n## Day-by-Day Itinerary\n");
    for day in 1..=days {
        md.push_str(&format!("### Day {day}\n"));
        md.push_str("- Morning: temple visit\n");
        md.push_str("- Afternoon: market walk\n");
        md.push_str("- Evening: vegetarian dinner\n\n");
    }
    md.push_str("## Travel Tips & Recommendations\n- Get a transit card\n\n");
    md.push_str("## Estimated Budget Overview\n- Mid-range: 150 USD/day\n\n");
    md.push_str("## Important Notes & Reminders\n- Carry cash\n");
    md
}
