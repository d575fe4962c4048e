use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aircraft::AircraftProfile;
use crate::error::ValidationError;
use crate::flyability::{EvaluationResult, FlyabilityEvaluator, FlyabilityStatus};
use crate::pilot::PilotProfile;
use crate::reasons::Reason;
use crate::weather::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// A candidate or booked window for one pilot, aircraft and site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub site_id: String,
    pub pilot: PilotProfile,
    pub aircraft: AircraftProfile,
}

fn slot_step(duration_minutes: u32) -> Result<Duration, ValidationError> {
    if duration_minutes == 0 {
        return Err(ValidationError::InvalidRange(
            "slot_duration_minutes must be at least 1".to_string(),
        ));
    }
    Ok(Duration::minutes(i64::from(duration_minutes)))
}

/// Number of windows [`plan_slots`] would return for the same arguments,
/// computed without building them.
pub fn count_slots(
    start: NaiveDateTime,
    end: NaiveDateTime,
    duration_minutes: u32,
) -> Result<u64, ValidationError> {
    let step = slot_step(duration_minutes)?.num_seconds();
    let span = end.signed_duration_since(start).num_seconds();
    if span <= 0 {
        return Ok(0);
    }
    let whole = span / step;
    let count = if span % step == 0 { whole } else { whole + 1 };
    Ok(u64::try_from(count).unwrap_or(u64::MAX))
}

/// Splits `[start, end)` into consecutive windows of `duration_minutes`; the
/// last window is clamped to `end`. An empty or inverted range yields no
/// windows.
pub fn plan_slots(
    start: NaiveDateTime,
    end: NaiveDateTime,
    duration_minutes: u32,
) -> Result<Vec<TimeWindow>, ValidationError> {
    let step = slot_step(duration_minutes)?;
    let mut windows = Vec::new();
    let mut current = start;
    while current < end {
        let slot_end = current.checked_add_signed(step).map_or(end, |t| t.min(end));
        windows.push(TimeWindow {
            start: current,
            end: slot_end,
        });
        current = slot_end;
    }
    Ok(windows)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlyabilityRequest {
    pub weather: WeatherSnapshot,
    pub pilot: PilotProfile,
    pub aircraft: AircraftProfile,
}

/// Evaluates every request independently. Results come back in input order.
pub fn evaluate_batch(
    evaluator: &FlyabilityEvaluator,
    requests: &[FlyabilityRequest],
) -> Vec<Result<EvaluationResult, ValidationError>> {
    requests
        .par_iter()
        .map(|req| evaluator.evaluate(&req.weather, &req.pilot, &req.aircraft))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEvaluation {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: FlyabilityStatus,
    pub score: u8,
    pub reasons: Vec<Reason>,
}

impl SlotEvaluation {
    pub fn new(window: TimeWindow, result: EvaluationResult) -> Self {
        Self {
            start: window.start,
            end: window.end,
            status: result.status,
            score: result.score,
            reasons: result.reasons,
        }
    }
}

/// Evaluates each window against its own weather snapshot. Fails as a whole
/// on the first invalid input so callers never see a partial plan.
pub fn evaluate_windows(
    evaluator: &FlyabilityEvaluator,
    windows: &[(TimeWindow, WeatherSnapshot)],
    pilot: &PilotProfile,
    aircraft: &AircraftProfile,
) -> Result<Vec<SlotEvaluation>, ValidationError> {
    windows
        .par_iter()
        .map(|(window, weather)| {
            evaluator
                .evaluate(weather, pilot, aircraft)
                .map(|result| SlotEvaluation::new(*window, result))
        })
        .collect()
}
