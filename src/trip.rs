use crate::error::{Error, Result};
use serde::Serialize;

/// What the traveller asked for. Validated on construction and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripRequest {
    destination: String,
    days: u32,
    interests: String,
    guardrails: String,
}

impl TripRequest {
    pub fn new(
        destination: impl Into<String>,
        days: u32,
        interests: impl Into<String>,
        guardrails: impl Into<String>,
    ) -> Result<Self> {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(Error::invalid_request("destination is required"));
        }
        if days == 0 {
            return Err(Error::invalid_request("number of days must be at least 1"));
        }
        Ok(Self {
            destination,
            days,
            interests: interests.into().trim().to_string(),
            guardrails: guardrails.into().trim().to_string(),
        })
    }

    /// Build from raw form text, where the day count may read "7" or "7 days".
    pub fn from_form(
        destination: &str,
        days: &str,
        interests: &str,
        guardrails: &str,
    ) -> Result<Self> {
        if destination.trim().is_empty() || days.trim().is_empty() {
            return Err(Error::invalid_request(
                "please provide at least a destination and a number of days",
            ));
        }
        Self::new(destination, parse_day_count(days)?, interests, guardrails)
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn interests(&self) -> &str {
        &self.interests
    }

    pub fn guardrails(&self) -> &str {
        &self.guardrails
    }
}

/// Parse the leading integer of free text such as "5", " 7 days" or "10d".
pub fn parse_day_count(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(Error::invalid_request(format!(
            "number of days must start with a number, got {trimmed:?}"
        )));
    }
    let days: u32 = digits
        .parse()
        .map_err(|_| Error::invalid_request(format!("number of days is too large: {digits}")))?;
    if days == 0 {
        return Err(Error::invalid_request("number of days must be at least 1"));
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_count_accepts_trailing_words() {
        assert_eq!(parse_day_count("7").unwrap(), 7);
        assert_eq!(parse_day_count(" 5 days ").unwrap(), 5);
        assert_eq!(parse_day_count("10d").unwrap(), 10);
    }

    #[test]
    fn day_count_rejects_zero_and_garbage() {
        assert!(parse_day_count("0").is_err());
        assert!(parse_day_count("").is_err());
        assert!(parse_day_count("a week").is_err());
        assert!(parse_day_count("99999999999").is_err());
    }

    #[test]
    fn request_trims_fields() {
        let req = TripRequest::new("  Paris, France ", 3, " Museums ", "").unwrap();
        assert_eq!(req.destination(), "Paris, France");
        assert_eq!(req.interests(), "Museums");
        assert_eq!(req.guardrails(), "");
    }

    #[test]
    fn request_requires_destination_and_days() {
        assert!(matches!(
            TripRequest::new("   ", 3, "", ""),
            Err(Error::InvalidRequest(_))
        ));
        assert!(TripRequest::new("Rome", 0, "", "").is_err());
        assert!(TripRequest::from_form("Rome", "", "", "").is_err());
        assert!(TripRequest::from_form("", "4", "", "").is_err());
    }

    #[test]
    fn form_values_build_a_request() {
        let req = TripRequest::from_form("Tokyo, Japan", "7 days", "Food", "Vegetarian only")
            .unwrap();
        assert_eq!(req.days(), 7);
        assert_eq!(req.guardrails(), "Vegetarian only");
    }
}
