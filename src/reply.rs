//! Normalizing model replies into a single markdown string.
//!
//! Providers disagree on where the generated text lives. OpenAI chat
//! completions put it in `choices[0].message.content`, as either a string or a
//! list of typed parts; Anthropic returns a top-level `content` block list;
//! the Responses API adds a flattened `output_text`. All of them deserialize
//! into [`ChatReply`], and [`extract_text`] picks out the text.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Separator placed between consecutive text blocks.
pub const BLOCK_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub content: Option<ReplyContent>,
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_usage")]
    pub usage: Option<TokenUsage>,
}

/// Usage is bookkeeping: a malformed block yields `None` instead of failing
/// a reply that carries good text.
fn lenient_usage<'de, D>(deserializer: D) -> Result<Option<TokenUsage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(TokenUsage::from_value))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<ReplyContent>,
}

/// The two shapes a reply body can take.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplyContent {
    PlainText(String),
    BlockList(Vec<ContentPart>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Bare(String),
    Block(ContentBlock),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<BlockText>,
    /// Some providers spell the text field `value`.
    #[serde(default)]
    pub value: Option<BlockText>,
}

/// Assistants-style blocks nest the string one level deeper: `{"value": "..."}`.
/// Anything else is kept so one odd field cannot reject the whole block.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BlockText {
    Plain(String),
    Nested { value: String },
    Other(serde_json::Value),
}

impl BlockText {
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::Plain(s) => Some(s),
            Self::Nested { value } => Some(value),
            Self::Other(_) => None,
        }
    }
}

impl ContentPart {
    fn text(&self) -> Option<&str> {
        match self {
            Self::Bare(s) => Some(s),
            Self::Block(block) => block.text(),
            Self::Other(_) => None,
        }
    }
}

impl ContentBlock {
    /// Text of a block that declares itself textual. Untyped blocks count when
    /// they carry a `text` field.
    fn text(&self) -> Option<&str> {
        let textual = match self.kind.as_deref() {
            None => true,
            Some(kind) => matches!(kind, "text" | "output_text"),
        };
        if !textual {
            return None;
        }
        self.text
            .as_ref()
            .and_then(BlockText::as_str)
            .or_else(|| self.value.as_ref().and_then(BlockText::as_str))
    }
}

impl ReplyContent {
    /// Plain text is returned unchanged. Block lists are joined with
    /// [`BLOCK_SEPARATOR`] and trimmed.
    pub fn text(&self) -> String {
        match self {
            Self::PlainText(s) => s.clone(),
            Self::BlockList(parts) => parts
                .iter()
                .filter_map(ContentPart::text)
                .collect::<Vec<_>>()
                .join(BLOCK_SEPARATOR)
                .trim()
                .to_string(),
        }
    }
}

/// Pull the generated text out of a reply. `None` means no usable text was
/// found, which the fallback loop treats as a failed attempt.
pub fn extract_text(reply: &ChatReply) -> Option<String> {
    let from_choice = reply
        .choices
        .first()
        .and_then(|c| c.message.content.as_ref())
        .map(ReplyContent::text);
    let from_blocks = reply.content.as_ref().map(ReplyContent::text);

    [from_choice, from_blocks, reply.output_text.clone()]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

/// Token accounting as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

impl TokenUsage {
    /// Read OpenAI (`prompt_tokens`/`completion_tokens`) or Anthropic
    /// (`input_tokens`/`output_tokens`) counters. Nulls and non-numbers are
    /// skipped; `None` when no counter is present at all.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let fields = value.as_object()?;
        let count = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| fields.get(*k).and_then(serde_json::Value::as_u64))
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        };
        let prompt = count(&["prompt_tokens", "input_tokens"]);
        let completion = count(&["completion_tokens", "output_tokens"]);
        let total = count(&["total_tokens"]);
        if prompt.is_none() && completion.is_none() && total.is_none() {
            return None;
        }
        Some(Self {
            prompt_tokens: prompt.unwrap_or(0),
            completion_tokens: completion.unwrap_or(0),
            total_tokens: total,
        })
    }

    pub fn total(&self) -> u32 {
        self.total_tokens
            .unwrap_or(self.prompt_tokens + self.completion_tokens)
    }
}

impl fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prompt={} completion={} total={}",
            self.prompt_tokens,
            self.completion_tokens,
            self.total()
        )
    }
}
