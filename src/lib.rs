pub mod config;
pub mod error;
pub mod fallback;
pub mod http;
pub mod llm;
pub mod output;
pub mod planner;
pub mod prompt;
pub mod reply;
pub mod trip;
pub mod web;

/// CLI override for LLM provider/models.
pub struct LlmOverride {
    pub provider: Option<llm::Provider>,
    pub models: Vec<String>,
}

impl LlmOverride {
    /// Apply on top of the loaded config. Empty fields leave config untouched,
    /// except that switching provider drops models named for the old one.
    pub fn apply(self, config: &mut config::LlmConfig) {
        if let Some(provider) = self.provider.filter(|p| *p != config.provider) {
            config.provider = provider;
            config.models.clear();
        }
        if !self.models.is_empty() {
            config.models = self.models;
        }
    }
}

/// Build the planner from config: resolves the credential (failing fast when
/// it is missing) and wires the HTTP client into the fallback loop.
pub fn build_planner(config: &config::Config) -> error::Result<planner::Planner> {
    config.validate()?;
    let backend = llm::LlmClient::from_config(&config.llm)?;
    let client = fallback::FallbackClient::new(
        std::sync::Arc::new(backend),
        config.llm.candidates(),
        config.llm.max_tokens,
        config.llm.temperature,
    )?;
    Ok(planner::Planner::new(client))
}
