//! Day-plan extraction from raw LLM output.
//!
//! Decoding happens in two passes:
//! 1. The whole text is decoded as `{"days": [...]}`.
//! 2. If that fails, the span from the first `{` to the last `}` is decoded
//!    instead, salvaging replies wrapped in conversational prose.
//!
//! Nested or multiple objects are not disambiguated beyond that span. The
//! result is typed but untrusted; the normalizer reconciles it.

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::warn;

/// One day entry as the model produced it. Nothing here is guaranteed: the
/// day number may be out of range or repeated, the text may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DayPlanItem {
    /// Missing day numbers decode as 0 and are dropped by the normalizer.
    #[serde(rename = "dayNumber", default)]
    pub day_number: i64,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl DayPlanItem {
    pub fn new(day_number: i64, summary: Option<&str>, description: Option<&str>) -> Self {
        Self {
            day_number,
            summary: summary.map(str::to_owned),
            description: description.map(str::to_owned),
        }
    }
}

/// A decoded, non-empty list of day entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParsedPlan {
    /// `null` elements (and a `null` list) are dropped while decoding.
    #[serde(default, deserialize_with = "non_null_days")]
    pub days: Vec<DayPlanItem>,
    /// Whether the fallback substring pass was needed.
    #[serde(skip)]
    pub salvaged: bool,
}

/// Errors from [`parse_plan`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("response JSON does not match the day-plan shape: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("response JSON contains no day entries")]
    NoDays,
}

/// Decode `raw` into a [`ParsedPlan`].
pub fn parse_plan(raw: &str) -> Result<ParsedPlan, ParseError> {
    let plan = match serde_json::from_str::<ParsedPlan>(raw) {
        Ok(plan) => plan,
        Err(direct_err) => {
            let candidate = outermost_object(raw).ok_or(ParseError::NoJsonObject)?;
            let mut plan: ParsedPlan = serde_json::from_str(candidate).map_err(|e| {
                warn!(error = %direct_err, "direct decode failed and salvage failed");
                ParseError::Malformed(e)
            })?;
            warn!(error = %direct_err, "LLM reply was not bare JSON; salvaged embedded object");
            plan.salvaged = true;
            plan
        }
    };

    if plan.days.is_empty() {
        return Err(ParseError::NoDays);
    }
    Ok(plan)
}

fn non_null_days<'de, D>(deserializer: D) -> Result<Vec<DayPlanItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let days = Option::<Vec<Option<DayPlanItem>>>::deserialize(deserializer)?;
    Ok(days.unwrap_or_default().into_iter().flatten().collect())
}

/// The slice from the first `{` through the last `}`, if both exist in that
/// order.
fn outermost_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
