//! Display score for a flyability evaluation.
//!
//! `score = clamp(round(100 - 2 * gust - max(0, (3000 - cloud_base) / 50)), 0, 100)`
//!
//! The score only orders slots for display; it never changes the status.

const SCORE_MAX: f64 = 100.0;
const GUST_WEIGHT: f64 = 2.0;
const CLOUD_REFERENCE_FT: f64 = 3000.0;
const CLOUD_FT_PER_POINT: f64 = 50.0;

fn c0100(v: f64) -> f64 {
    v.clamp(0.0, SCORE_MAX)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn flyability_score(wind_gusts_kt: f64, cloud_base_ft: f64) -> u8 {
    let cloud_penalty = ((CLOUD_REFERENCE_FT - cloud_base_ft) / CLOUD_FT_PER_POINT).max(0.0);
    let raw = SCORE_MAX - GUST_WEIGHT * wind_gusts_kt - cloud_penalty;
    // clamped to [0, 100] before the cast
    c0100(raw.round()) as u8
}
