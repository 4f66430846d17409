// Trip request → prompt → model fallback → itinerary.

use crate::error::Result;
use crate::fallback::{Completion, FallbackClient};
use crate::prompt;
use crate::reply::TokenUsage;
use crate::trip::TripRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// A generated itinerary and where it came from. Lives only as long as the
/// caller keeps it.
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryResult {
    pub request: TripRequest,
    pub markdown: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub generated_at: DateTime<Utc>,
}

impl ItineraryResult {
    /// `### Day N` headers in the markdown, in order.
    pub fn day_sections(&self) -> Vec<&str> {
        day_sections(&self.markdown)
    }
}

pub fn day_sections(markdown: &str) -> Vec<&str> {
    markdown
        .lines()
        .map(str::trim_start)
        .filter(|line| {
            line.strip_prefix("### ")
                .is_some_and(|rest| rest.trim_start().starts_with("Day "))
        })
        .collect()
}

pub struct Planner {
    client: FallbackClient,
}

impl Planner {
    pub fn new(client: FallbackClient) -> Self {
        Self { client }
    }

    pub async fn plan(&self, request: TripRequest) -> Result<ItineraryResult> {
        info!(
            destination = request.destination(),
            days = request.days(),
            "generating itinerary"
        );
        let prompt = prompt::build(&request);
        let completion = self.client.complete(&prompt.system, &prompt.user).await?;

        let result = ItineraryResult {
            request,
            markdown: completion.text,
            model: completion.model,
            usage: completion.usage,
            generated_at: Utc::now(),
        };

        let found = result.day_sections().len();
        if found != result.request.days() as usize {
            warn!(
                expected = result.request.days(),
                found, "itinerary day sections do not match requested trip length"
            );
        }
        Ok(result)
    }

    pub async fn self_test(&self) -> Result<Completion> {
        self.client.self_test().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_sections_only_match_h3_day_headers() {
        let md = concat!(
            "## Day-by-Day Itinerary\n",
            "### Day 1: Arrival\ntext\n",
            "  ### Day 2\n",
            "#### Day 3\n",
            "### Dayton trip\n",
        );
        assert_eq!(day_sections(md), vec!["### Day 1: Arrival", "### Day 2"]);
    }
}
