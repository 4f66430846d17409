use crate::error::{Error, Result};
use crate::llm::{ChatBackend, ChatRequest};
use crate::reply::{TokenUsage, extract_text};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SELF_TEST_PROMPT: &str = "Reply with the single word: READY";
const SELF_TEST_MAX_TOKENS: u32 = 10;

/// One slot in the ordered candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    /// 1-based position in the fallback sequence.
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    RateLimited,
    Api,
    Malformed,
    EmptyContent,
}

impl From<&Error> for FailureKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::Http(_) => Self::Network,
            Error::RateLimit { .. } => Self::RateLimited,
            Error::Parse(_) => Self::Malformed,
            Error::EmptyContent => Self::EmptyContent,
            _ => Self::Api,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::RateLimited => "rate limited",
            Self::Api => "api",
            Self::Malformed => "malformed reply",
            Self::EmptyContent => "empty content",
        };
        f.write_str(s)
    }
}

/// Why a single candidate was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFailure {
    pub model: String,
    pub position: usize,
    pub kind: FailureKind,
    pub reason: String,
}

impl CandidateFailure {
    pub fn new(
        model: impl Into<String>,
        position: usize,
        kind: FailureKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            position,
            kind,
            reason: reason.into(),
        }
    }

    fn from_error(attempt: &ModelAttempt, err: &Error) -> Self {
        Self::new(
            attempt.model.clone(),
            attempt.position,
            FailureKind::from(err),
            err.to_string(),
        )
    }
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}): {}",
            self.position, self.model, self.kind, self.reason
        )
    }
}

/// Text produced by the winning candidate.
#[derive(Debug, Clone)]
pub struct Completion {
    pub model: String,
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// Number of candidates tried, including the winner.
    pub attempts: usize,
}

/// Sequential model fallback: each candidate gets exactly one request, the
/// first non-empty reply wins.
pub struct FallbackClient {
    backend: Arc<dyn ChatBackend>,
    candidates: Vec<String>,
    max_tokens: u32,
    temperature: f32,
}

impl FallbackClient {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        candidates: Vec<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self> {
        if candidates.is_empty() {
            return Err(Error::config("at least one model candidate is required"));
        }
        Ok(Self {
            backend,
            candidates,
            max_tokens,
            temperature,
        })
    }

    pub fn attempts(&self) -> impl Iterator<Item = ModelAttempt> + '_ {
        self.candidates
            .iter()
            .enumerate()
            .map(|(i, model)| ModelAttempt {
                model: model.clone(),
                position: i + 1,
            })
    }

    pub async fn complete(&self, system: &str, user: &str) -> Result<Completion> {
        let mut failures = Vec::with_capacity(self.candidates.len());

        for attempt in self.attempts() {
            debug!(model = %attempt.model, position = attempt.position, "trying candidate");
            let request = ChatRequest {
                model: &attempt.model,
                system,
                user,
                max_tokens: self.max_tokens,
                temperature: Some(self.temperature),
            };
            match self.try_candidate(&request).await {
                Ok((text, usage)) => {
                    info!(
                        model = %attempt.model,
                        attempts = attempt.position,
                        "candidate succeeded"
                    );
                    return Ok(Completion {
                        model: attempt.model,
                        text,
                        usage,
                        attempts: attempt.position,
                    });
                }
                Err(e) => {
                    let failure = CandidateFailure::from_error(&attempt, &e);
                    warn!(
                        model = %failure.model,
                        kind = %failure.kind,
                        "candidate failed: {}",
                        failure.reason
                    );
                    failures.push(failure);
                }
            }
        }

        Err(Error::AllModelsUnavailable { failures })
    }

    /// Ask the first candidate for a one-word reply. No fallback, no system
    /// message, and no temperature: only the token ceiling is set.
    pub async fn self_test(&self) -> Result<Completion> {
        let attempt = self
            .attempts()
            .next()
            .ok_or_else(|| Error::config("no model candidates configured"))?;
        let request = ChatRequest {
            model: &attempt.model,
            system: "",
            user: SELF_TEST_PROMPT,
            max_tokens: SELF_TEST_MAX_TOKENS,
            temperature: None,
        };
        let (text, usage) = self.try_candidate(&request).await?;
        Ok(Completion {
            model: attempt.model,
            text,
            usage,
            attempts: 1,
        })
    }

    async fn try_candidate(
        &self,
        request: &ChatRequest<'_>,
    ) -> Result<(String, Option<TokenUsage>)> {
        let reply = self.backend.complete(request).await?;
        let text = extract_text(&reply).ok_or(Error::EmptyContent)?;
        Ok((text, reply.usage))
    }
}
