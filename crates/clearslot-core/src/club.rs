use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubMetrics {
    /// Share of members booking through the portal, 0.0 to 1.0.
    pub portal_adoption_rate: f64,
    /// Share of bookings checked against flyability, 0.0 to 1.0.
    pub rag_usage_percent: f64,
    pub calendar_sync_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalBand {
    #[serde(rename = "Legacy-Heavy")]
    LegacyHeavy,
    #[serde(rename = "In Transition")]
    InTransition,
    #[serde(rename = "Modernised")]
    Modernised,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClubOperationalScore {
    pub score: u8,
    pub band: OperationalBand,
    pub explanation: &'static str,
}

fn c01(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute_club_operational_score(metrics: &ClubMetrics) -> ClubOperationalScore {
    let sync = if metrics.calendar_sync_active { 40 } else { 0 };
    // inputs are clamped to [0, 1], so both terms fit in u8
    let adoption = (c01(metrics.portal_adoption_rate) * 40.0).floor() as u8;
    let rag = (c01(metrics.rag_usage_percent) * 20.0).floor() as u8;
    let score = (sync + adoption + rag).min(100);

    let (band, explanation) = if score >= 80 {
        (
            OperationalBand::Modernised,
            "Fully digital operation with real-time safety checks.",
        )
    } else if score >= 50 {
        (
            OperationalBand::InTransition,
            "Moving away from spreadsheets, but some manual processes remain.",
        )
    } else {
        (
            OperationalBand::LegacyHeavy,
            "Reliant on paper/spreadsheets. High manual workload.",
        )
    };

    ClubOperationalScore {
        score,
        band,
        explanation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(adoption: f64, rag: f64, sync: bool) -> ClubMetrics {
        ClubMetrics {
            portal_adoption_rate: adoption,
            rag_usage_percent: rag,
            calendar_sync_active: sync,
        }
    }

    #[test]
    fn bands_follow_score() {
        let high = compute_club_operational_score(&metrics(0.9, 0.8, true));
        assert!(high.score >= 80);
        assert_eq!(high.band, OperationalBand::Modernised);

        let mid = compute_club_operational_score(&metrics(0.5, 0.5, true));
        assert_eq!(mid.score, 70);
        assert_eq!(mid.band, OperationalBand::InTransition);

        let low = compute_club_operational_score(&metrics(0.1, 0.1, false));
        assert!(low.score < 50);
        assert_eq!(low.band, OperationalBand::LegacyHeavy);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(compute_club_operational_score(&metrics(1.0, 1.0, true)).score, 100);
        assert_eq!(compute_club_operational_score(&metrics(0.0, 0.0, false)).score, 0);
        assert_eq!(compute_club_operational_score(&metrics(7.0, -2.0, false)).score, 40);
    }

    #[test]
    fn band_serializes_with_display_name() {
        let json = serde_json::to_string(&OperationalBand::InTransition).expect("serialize");
        assert_eq!(json, "\"In Transition\"");
    }
}
