//! Reconcile untrusted day entries with the trip's calendar.
//!
//! [`normalize`] is total: whatever the model returned, the result holds
//! exactly `day_count` rows numbered `1..=day_count`, each with non-blank
//! text.
//!
//! 1. Entries with `day_number < 1` are dropped.
//! 2. Remaining entries are ordered by day number.
//! 3. For a repeated day number the first entry wins.
//! 4. Each day `1..=day_count` takes its entry, filling blank text with
//!    `"Day {n}"` / `"Details TBD."`, or becomes a backfilled placeholder.
//! 5. Entries past `day_count` are never emitted.

use std::collections::BTreeMap;

use tracing::debug;

use tripplan_db::models::DayPlan;

use super::parser::DayPlanItem;

/// Summary of a day the model did not cover.
pub const PLACEHOLDER_SUMMARY: &str = "Plan this day";

/// Description of a day the model did not cover.
pub const PLACEHOLDER_DESCRIPTION: &str =
    "This placeholder was added to meet the exact day count. Please regenerate or edit.";

/// Description used when the model covered a day but left it blank.
pub const BLANK_DESCRIPTION: &str = "Details TBD.";

/// Produce exactly `day_count` rows for `trip_id` from `items`.
///
/// A `day_count` below 1 yields no rows.
pub fn normalize(items: &[DayPlanItem], day_count: i32, trip_id: i64) -> Vec<DayPlan> {
    // BTreeMap keeps day order; `or_insert` keeps the first entry per day.
    let mut by_day: BTreeMap<i64, &DayPlanItem> = BTreeMap::new();
    for item in items.iter().filter(|item| item.day_number >= 1) {
        by_day.entry(item.day_number).or_insert(item);
    }

    let mut backfilled = 0usize;
    let rows: Vec<DayPlan> = (1..=day_count.max(0))
        .map(|day| match by_day.get(&i64::from(day)) {
            Some(item) => DayPlan::new(
                trip_id,
                day,
                non_blank(item.summary.as_deref()).unwrap_or_else(|| format!("Day {day}")),
                non_blank(item.description.as_deref())
                    .unwrap_or_else(|| BLANK_DESCRIPTION.to_owned()),
            ),
            None => {
                backfilled += 1;
                DayPlan::new(trip_id, day, PLACEHOLDER_SUMMARY, PLACEHOLDER_DESCRIPTION)
            }
        })
        .collect();

    debug!(
        trip_id,
        day_count,
        received = items.len(),
        out_of_range = by_day.range(i64::from(day_count) + 1..).count(),
        backfilled,
        "normalized day plans"
    );

    rows
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).map(str::to_owned)
}
