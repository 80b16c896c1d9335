//! Prompt construction for itinerary generation.
//!
//! Pure and deterministic: the same trip and day count always produce the
//! same prompt pair. The output contract stated here is a request, not a
//! guarantee; the parser and normalizer do not rely on it being honoured.

use tripplan_db::models::Trip;

/// The system and user messages for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryPrompt {
    pub system: String,
    pub user: String,
}

/// Fixed output contract the response parser expects.
const SYSTEM_PROMPT: &str = r#"You are a meticulous travel-planning assistant.
Produce a day-by-day itinerary for the destination and date range you are given.

Output contract:
- Reply with ONE JSON object and nothing else: no prose before or after it, no markdown code fences.
- The object has exactly one key, "days", holding an array:
  {
    "days": [
      { "dayNumber": 1, "summary": "string", "description": "string" }
    ]
  }
- The "days" array MUST contain exactly as many items as there are calendar days from the start date to the end date, inclusive.
- "dayNumber" starts at 1 and increases by exactly 1 for each item.
- "summary" is a short title for the day (about 60 characters at most).
- "description" is 1 to 3 sentences of concrete, practical activities in the destination. No hyperlinks.

Planning guidance:
- Keep logistics realistic: group nearby sights, mix landmarks with lesser-known spots, leave room for breaks.
- Do not repeat the same sight on different days. If a sight is closed on that weekday, suggest an alternative.
- Do not mention prices or bookings.
- Write in English unless the destination names are clearly given in another language, in which case use that language."#;

/// Build the prompt pair for `trip` spanning `day_count` days.
pub fn build_prompt(trip: &Trip, day_count: i32) -> ItineraryPrompt {
    let start = trip.start_date.format("%Y-%m-%d");
    let end = trip.end_date.format("%Y-%m-%d");

    let user = format!(
        "City: {city}\n\
         Country: {country}\n\
         StartDate: {start}\n\
         EndDate: {end}\n\
         TotalDays: {day_count}\n\
         \n\
         Produce a plan of exactly {day_count} days for {city}, {country}, \
         covering every day from StartDate to EndDate (inclusive).\n",
        city = trip.city.trim(),
        country = trip.country.trim(),
    );

    ItineraryPrompt {
        system: SYSTEM_PROMPT.to_owned(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn lisbon() -> Trip {
        Trip {
            id: 12,
            title: "Autumn".to_owned(),
            city: " Lisbon ".to_owned(),
            country: "Portugal".to_owned(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 9, 7).unwrap(),
            notes: Some("likes tiles".to_owned()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn system_prompt_states_output_contract() {
        let prompt = build_prompt(&lisbon(), 3);
        assert!(prompt.system.contains("\"days\""));
        assert!(prompt.system.contains("\"dayNumber\""));
        assert!(prompt.system.contains("\"summary\""));
        assert!(prompt.system.contains("\"description\""));
        assert!(prompt.system.contains("no markdown code fences"));
        assert!(prompt.system.contains("exactly as many items"));
    }

    #[test]
    fn user_prompt_carries_trip_details() {
        let prompt = build_prompt(&lisbon(), 3);
        assert!(prompt.user.contains("City: Lisbon\n"));
        assert!(prompt.user.contains("Country: Portugal\n"));
        assert!(prompt.user.contains("StartDate: 2025-09-05\n"));
        assert!(prompt.user.contains("EndDate: 2025-09-07\n"));
        assert!(prompt.user.contains("TotalDays: 3\n"));
        assert!(prompt.user.contains("exactly 3 days for Lisbon, Portugal"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let trip = lisbon();
        assert_eq!(build_prompt(&trip, 3), build_prompt(&trip, 3));
    }

    #[test]
    fn notes_and_title_are_not_sent() {
        let prompt = build_prompt(&lisbon(), 3);
        assert!(!prompt.user.contains("likes tiles"));
        assert!(!prompt.user.contains("Autumn"));
    }
}
