//! Itinerary generation: prompt, parse, normalize, persist.

pub mod normalize;
pub mod parser;
pub mod prompt;
pub mod service;

pub use normalize::normalize;
pub use parser::{DayPlanItem, ParseError, ParsedPlan, parse_plan};
pub use prompt::{ItineraryPrompt, build_prompt};
pub use service::{fetch_itinerary, generate_for_trip_id, generate_itinerary};
