//! Day-by-day itinerary synthesis for trips.
//!
//! The pipeline runs strictly in order and fails closed:
//!
//! ```text
//! Trip ──validate──> day count
//!      ──prompt────> (system, user)
//!      ──llm───────> raw text
//!      ──parser────> ParsedPlan (untrusted)
//!      ──normalize─> exactly day_count DayPlan rows
//!      ──replace───> committed rows, ordered by day
//! ```

pub mod error;
pub mod itinerary;
pub mod llm;
pub mod trip;

pub use error::GenerateError;
