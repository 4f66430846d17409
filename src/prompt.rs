use crate::trip::TripRequest;

pub const SYSTEM_PROMPT: &str = r#"You are an experienced and enthusiastic TRAVEL GUIDE PLANNER.

Requirements:
- Create a detailed, day-by-day itinerary for the entire trip
- Include specific places, attractions, restaurants, and activities
- Consider the user's special interests and guardrails/constraints
- Provide practical tips like opening hours, estimated time needed, and travel logistics
- Be realistic about timing and distances
- Include local cuisine recommendations where appropriate
- Suggest morning, afternoon, and evening activities for each day

Output format in Markdown with these top-level H2 sections (##):
## Trip Overview
## Day-by-Day Itinerary
(with subsections: ### Day 1, ### Day 2, etc.)
## Travel Tips & Recommendations
## Estimated Budget Overview
## Important Notes & Reminders"#;

/// System and user instructions for one itinerary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn build(request: &TripRequest) -> Prompt {
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: user_prompt(request),
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn user_prompt(request: &TripRequest) -> String {
    let days = request.days();
    format!(
        "TRAVEL DETAILS
- Destination: {destination}
- Number of Days: {days}

INTERESTS & PREFERENCES
- Special Interests: {interests}

CONSTRAINTS / GUARDRAILS
{guardrails}

INSTRUCTIONS
- Create a complete itinerary covering all {days} days
- For each day, suggest 3-5 activities/places to visit
- Include specific names of attractions, restaurants, and locations
- Consider travel time between locations
- Incorporate the specified interests throughout the itinerary
- Respect all guardrails and constraints mentioned
- Provide practical details (opening hours, booking requirements, etc.)
- Keep the plan realistic and not overly packed
- Total length: approximately 800-1500 words",
        destination = request.destination(),
        interests = or_default(request.interests(), "General sightseeing"),
        guardrails = or_default(request.guardrails(), "None specified"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_interpolates_request() {
        let req =
            TripRequest::new("Tokyo, Japan", 7, "Technology, Food", "Vegetarian only").unwrap();
        let prompt = build(&req);
        assert!(prompt.user.contains("- Destination: Tokyo, Japan"));
        assert!(prompt.user.contains("- Number of Days: 7"));
        assert!(prompt.user.contains("covering all 7 days"));
        assert!(prompt.user.contains("- Special Interests: Technology, Food"));
        assert!(prompt.user.contains("CONSTRAINTS / GUARDRAILS\nVegetarian only"));
    }

    #[test]
    fn blank_optional_fields_get_defaults() {
        let req = TripRequest::new("Lisbon", 3, "", "").unwrap();
        let prompt = build(&req);
        assert!(prompt.user.contains("- Special Interests: General sightseeing"));
        assert!(prompt.user.contains("None specified"));
    }

    #[test]
    fn system_prompt_names_every_section() {
        for section in [
            "## Trip Overview",
            "## Day-by-Day Itinerary",
            "### Day 1",
            "## Travel Tips & Recommendations",
            "## Estimated Budget Overview",
            "## Important Notes & Reminders",
        ] {
            assert!(SYSTEM_PROMPT.contains(section), "missing {section}");
        }
    }
}
