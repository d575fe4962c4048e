//! Pilot legality: an ordered list of named rules over a pilot profile and a
//! target date. The first failing rule supplies the reason.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aircraft::{AircraftClass, AircraftProfile};
use crate::error::ValidationError;
use crate::pilot::{LicenceType, PilotProfile, Rating};
use crate::policy::{LegalityPolicy, LicenceMinimums, RevalidationPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalityResult {
    pub legal: bool,
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl LegalityResult {
    pub fn legal() -> Self {
        Self {
            legal: true,
            reason: None,
            rule: None,
        }
    }

    pub fn illegal(rule: &str, reason: String) -> Self {
        Self {
            legal: false,
            reason: Some(reason),
            rule: Some(rule.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail(String),
}

/// Everything a rule may look at. Built once per evaluation after the
/// profile has been validated.
#[derive(Debug, Clone, Copy)]
pub struct LegalityContext<'a> {
    pub pilot: &'a PilotProfile,
    pub licence: LicenceType,
    pub total_hours: f64,
    pub aircraft: Option<&'a AircraftProfile>,
    pub target_date: NaiveDate,
}

pub trait LegalityRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome;
}

pub struct MinimumTotalHours {
    policy: LegalityPolicy,
}

impl LegalityRule for MinimumTotalHours {
    fn name(&self) -> &'static str {
        "minimum_total_hours"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        let Some(minimums) = self.policy.licence_minimums.get(&ctx.licence) else {
            return RuleOutcome::Fail(format!(
                "Licence {} is not covered by club policy",
                ctx.licence
            ));
        };
        if ctx.total_hours < minimums.min_total_hours {
            return RuleOutcome::Fail(format!(
                "Invalid licence mins: {} requires {}h total, logged {}h",
                ctx.licence, minimums.min_total_hours, ctx.total_hours
            ));
        }
        RuleOutcome::Pass
    }
}

pub struct MinimumSupervisedSolo {
    policy: LegalityPolicy,
}

impl LegalityRule for MinimumSupervisedSolo {
    fn name(&self) -> &'static str {
        "minimum_supervised_solo_hours"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        let required = minimums_for(&self.policy, ctx.licence)
            .map_or(0.0, |m| m.min_supervised_solo_hours);
        if ctx.pilot.supervised_solo_hours < required {
            return RuleOutcome::Fail(format!(
                "Invalid licence mins: {} requires {}h supervised solo, logged {}h",
                ctx.licence, required, ctx.pilot.supervised_solo_hours
            ));
        }
        RuleOutcome::Pass
    }
}

pub struct CrossCountry {
    policy: LegalityPolicy,
}

impl LegalityRule for CrossCountry {
    fn name(&self) -> &'static str {
        "cross_country"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        let required =
            minimums_for(&self.policy, ctx.licence).is_some_and(|m| m.requires_cross_country);
        if required && !ctx.pilot.cross_country_done {
            return RuleOutcome::Fail(format!(
                "Invalid licence mins: {} requires a qualifying cross-country",
                ctx.licence
            ));
        }
        RuleOutcome::Pass
    }
}

pub struct Recency {
    window_days: u32,
    min_takeoff_landings: u32,
}

impl LegalityRule for Recency {
    fn name(&self) -> &'static str {
        "recency"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        let totals = ctx.pilot.logbook_totals(ctx.target_date, self.window_days);
        if totals.takeoff_landings < self.min_takeoff_landings {
            return RuleOutcome::Fail(format!(
                "Recency: <{} landings in {} days",
                self.min_takeoff_landings, self.window_days
            ));
        }
        RuleOutcome::Pass
    }
}

pub struct Revalidation {
    policy: RevalidationPolicy,
}

impl LegalityRule for Revalidation {
    fn name(&self) -> &'static str {
        "revalidation"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        let p = &self.policy;
        let totals = ctx.pilot.logbook_totals(ctx.target_date, p.window_days);
        let total_hours = totals.hours_pic + totals.instruction_hours;
        let mut needs = Vec::new();
        if total_hours < p.min_total_hours {
            needs.push(format!("{}h total (logged {total_hours}h)", p.min_total_hours));
        }
        if totals.hours_pic < p.min_pic_hours {
            needs.push(format!("{}h PIC (logged {}h)", p.min_pic_hours, totals.hours_pic));
        }
        if totals.instruction_hours < p.min_instruction_hours {
            needs.push(format!(
                "{}h instruction (logged {}h)",
                p.min_instruction_hours, totals.instruction_hours
            ));
        }
        if totals.takeoff_landings < p.min_takeoff_landings {
            needs.push(format!(
                "{} take-offs/landings (logged {})",
                p.min_takeoff_landings, totals.takeoff_landings
            ));
        }
        if needs.is_empty() {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!(
                "Recency requirements not met in {} days: needs {}",
                p.window_days,
                needs.join(", ")
            ))
        }
    }
}

pub struct MedicalValidity;

impl LegalityRule for MedicalValidity {
    fn name(&self) -> &'static str {
        "medical_validity"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        match ctx.pilot.medical_expiry {
            Some(expiry) if expiry < ctx.target_date => {
                RuleOutcome::Fail(format!("Medical certificate expired on {expiry}"))
            }
            _ => RuleOutcome::Pass,
        }
    }
}

pub struct RatingPrivileges;

impl LegalityRule for RatingPrivileges {
    fn name(&self) -> &'static str {
        "rating_privileges"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        let Some(aircraft) = ctx.aircraft else {
            return RuleOutcome::Pass;
        };
        let pilot = ctx.pilot;
        let sep_type = pilot.has_rating(Rating::Sep) || pilot.has_rating(Rating::Ssea);
        let privileged = match aircraft.class {
            AircraftClass::Microlight => {
                pilot.has_rating(Rating::Microlight)
                    || (sep_type && pilot.microlight_differences_trained)
            }
            AircraftClass::Sep => sep_type,
        };
        if privileged {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!(
                "No rating/privileges for {} aircraft",
                aircraft.class
            ))
        }
    }
}

pub struct SeatingConstraint;

impl LegalityRule for SeatingConstraint {
    fn name(&self) -> &'static str {
        "seating_constraint"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        match ctx.aircraft {
            Some(aircraft) if ctx.pilot.single_seat_constraint && aircraft.seats > 1 => {
                RuleOutcome::Fail(format!(
                    "Single-seat constraint: aircraft has {} seats",
                    aircraft.seats
                ))
            }
            _ => RuleOutcome::Pass,
        }
    }
}

pub struct PermitValidity;

impl LegalityRule for PermitValidity {
    fn name(&self) -> &'static str {
        "permit_validity"
    }

    fn check(&self, ctx: &LegalityContext<'_>) -> RuleOutcome {
        match ctx.aircraft.and_then(|a| a.permit_expiry) {
            Some(expiry) if expiry < ctx.target_date => {
                RuleOutcome::Fail(format!("Aircraft permit expired on {expiry}"))
            }
            _ => RuleOutcome::Pass,
        }
    }
}

fn minimums_for(policy: &LegalityPolicy, licence: LicenceType) -> Option<&LicenceMinimums> {
    policy.licence_minimums.get(&licence)
}

pub struct LegalityEvaluator {
    rules: Vec<Box<dyn LegalityRule>>,
}

impl LegalityEvaluator {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Licence minimums, cross-country, recency, optional revalidation and
    /// medical validity. None of these need the aircraft.
    pub fn pilot_rules(policy: &LegalityPolicy) -> Self {
        let mut evaluator = Self::empty()
            .with_rule(MinimumTotalHours {
                policy: policy.clone(),
            })
            .with_rule(MinimumSupervisedSolo {
                policy: policy.clone(),
            })
            .with_rule(CrossCountry {
                policy: policy.clone(),
            })
            .with_rule(Recency {
                window_days: policy.recency_window_days,
                min_takeoff_landings: policy.min_recent_takeoff_landings,
            });
        if let Some(reval) = &policy.revalidation {
            evaluator = evaluator.with_rule(Revalidation {
                policy: reval.clone(),
            });
        }
        evaluator.with_rule(MedicalValidity)
    }

    /// Pilot rules followed by rating, seating and permit checks.
    pub fn with_aircraft_rules(policy: &LegalityPolicy) -> Self {
        Self::pilot_rules(policy)
            .with_rule(RatingPrivileges)
            .with_rule(SeatingConstraint)
            .with_rule(PermitValidity)
    }

    pub fn with_rule(mut self, rule: impl LegalityRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn evaluate(
        &self,
        pilot: &PilotProfile,
        aircraft: Option<&AircraftProfile>,
        target_date: NaiveDate,
    ) -> Result<LegalityResult, ValidationError> {
        let (licence, total_hours) = pilot.validate()?;
        if let Some(aircraft) = aircraft {
            aircraft.validate()?;
        }
        let ctx = LegalityContext {
            pilot,
            licence,
            total_hours,
            aircraft,
            target_date,
        };

        for rule in &self.rules {
            if let RuleOutcome::Fail(reason) = rule.check(&ctx) {
                debug!(rule = rule.name(), %reason, "legality rule failed");
                return Ok(LegalityResult::illegal(rule.name(), reason));
            }
        }
        Ok(LegalityResult::legal())
    }
}

impl Default for LegalityEvaluator {
    fn default() -> Self {
        Self::pilot_rules(&LegalityPolicy::default())
    }
}

/// Pilot-only legality with the default club policy.
pub fn evaluate_legality(
    pilot: &PilotProfile,
    target_date: NaiveDate,
) -> Result<LegalityResult, ValidationError> {
    LegalityEvaluator::default().evaluate(pilot, None, target_date)
}

/// Full legality for flying `aircraft` with the default club policy.
pub fn evaluate_legality_for_aircraft(
    pilot: &PilotProfile,
    aircraft: &AircraftProfile,
    target_date: NaiveDate,
) -> Result<LegalityResult, ValidationError> {
    LegalityEvaluator::with_aircraft_rules(&LegalityPolicy::default()).evaluate(
        pilot,
        Some(aircraft),
        target_date,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pilot::LogbookEntry;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn current_nppl() -> PilotProfile {
        let mut pilot = PilotProfile::new(LicenceType::NpplA, 50.0);
        pilot.supervised_solo_hours = 15.0;
        pilot.ratings = vec![Rating::Microlight];
        pilot.logbook = vec![LogbookEntry::new(date(2026, 5, 20), 1.5, 3)];
        pilot
    }

    #[test]
    fn low_hours_nppl_is_illegal() {
        let mut pilot = PilotProfile::new(LicenceType::NpplA, 15.0);
        pilot.supervised_solo_hours = 2.0;
        let out = evaluate_legality(&pilot, date(2025, 1, 1)).expect("evaluation");
        assert!(!out.legal);
        assert_eq!(out.rule.as_deref(), Some("minimum_total_hours"));
    }

    #[test]
    fn solo_hours_checked_after_total() {
        let mut pilot = current_nppl();
        pilot.supervised_solo_hours = 4.0;
        let out = evaluate_legality(&pilot, date(2026, 6, 15)).expect("evaluation");
        assert_eq!(out.rule.as_deref(), Some("minimum_supervised_solo_hours"));
    }

    #[test]
    fn no_recent_landings_fails_recency() {
        let mut pilot = current_nppl();
        pilot.logbook = vec![LogbookEntry::new(date(2025, 12, 1), 2.0, 6)];
        let out = evaluate_legality(&pilot, date(2026, 6, 15)).expect("evaluation");
        assert!(!out.legal);
        assert_eq!(out.reason.as_deref(), Some("Recency: <1 landings in 90 days"));
    }

    #[test]
    fn current_pilot_is_legal() {
        let out = evaluate_legality(&current_nppl(), date(2026, 6, 15)).expect("evaluation");
        assert_eq!(out, LegalityResult::legal());
    }

    #[test]
    fn ppl_has_no_hour_minimum_by_default() {
        let mut pilot = PilotProfile::new(LicenceType::PplA, 5.0);
        pilot.logbook = vec![LogbookEntry::new(date(2026, 6, 1), 1.0, 1)];
        assert!(evaluate_legality(&pilot, date(2026, 6, 15)).expect("evaluation").legal);
    }

    #[test]
    fn unknown_licence_fails_with_policy_reason() {
        let mut pilot = PilotProfile::new(LicenceType::LaplA, 100.0);
        pilot.logbook = vec![LogbookEntry::new(date(2026, 6, 1), 1.0, 1)];
        let out = evaluate_legality(&pilot, date(2026, 6, 15)).expect("evaluation");
        assert!(out.reason.unwrap_or_default().contains("not covered"));
    }

    #[test]
    fn missing_total_hours_is_validation_error_not_illegal() {
        let pilot = PilotProfile {
            licence_type: Some(LicenceType::NpplA),
            ..PilotProfile::default()
        };
        assert_eq!(
            evaluate_legality(&pilot, date(2026, 6, 15)),
            Err(ValidationError::MissingField("total_hours"))
        );
    }

    #[test]
    fn expired_medical_blocks() {
        let mut pilot = current_nppl();
        pilot.medical_expiry = Some(date(2026, 1, 1));
        let out = evaluate_legality(&pilot, date(2026, 6, 15)).expect("evaluation");
        assert_eq!(
            out.reason.as_deref(),
            Some("Medical certificate expired on 2026-01-01")
        );
    }

    #[test]
    fn medical_checked_before_permit() {
        let mut pilot = current_nppl();
        pilot.medical_expiry = Some(date(2025, 6, 1));
        let mut aircraft = AircraftProfile::new(15.0, 300.0);
        aircraft.permit_expiry = Some(date(2025, 12, 1));
        let out = evaluate_legality_for_aircraft(&pilot, &aircraft, date(2026, 6, 15))
            .expect("evaluation");
        assert_eq!(out.rule.as_deref(), Some("medical_validity"));
    }

    #[test]
    fn sep_pilot_needs_differences_for_microlight() {
        let mut pilot = current_nppl();
        pilot.ratings = vec![Rating::Sep];
        let aircraft = AircraftProfile::new(15.0, 300.0);
        let out = evaluate_legality_for_aircraft(&pilot, &aircraft, date(2026, 6, 15))
            .expect("evaluation");
        assert_eq!(out.rule.as_deref(), Some("rating_privileges"));

        pilot.microlight_differences_trained = true;
        let out = evaluate_legality_for_aircraft(&pilot, &aircraft, date(2026, 6, 15))
            .expect("evaluation");
        assert!(out.legal);
    }

    #[test]
    fn single_seat_pilot_cannot_fly_two_seater() {
        let mut pilot = current_nppl();
        pilot.single_seat_constraint = true;
        let aircraft = AircraftProfile::new(15.0, 300.0);
        let out = evaluate_legality_for_aircraft(&pilot, &aircraft, date(2026, 6, 15))
            .expect("evaluation");
        assert_eq!(out.rule.as_deref(), Some("seating_constraint"));
    }

    #[test]
    fn revalidation_rule_is_opt_in() {
        let policy = LegalityPolicy::default().with_revalidation(RevalidationPolicy::default());
        let evaluator = LegalityEvaluator::pilot_rules(&policy);
        assert!(evaluator.rule_names().contains(&"revalidation"));
        let out = evaluator
            .evaluate(&current_nppl(), None, date(2026, 6, 15))
            .expect("evaluation");
        assert_eq!(out.rule.as_deref(), Some("revalidation"));
        assert!(!LegalityEvaluator::default()
            .rule_names()
            .contains(&"revalidation"));
    }

    #[test]
    fn custom_rules_append_without_restructuring() {
        struct NoWeekendSolo;
        impl LegalityRule for NoWeekendSolo {
            fn name(&self) -> &'static str {
                "no_weekend_solo"
            }
            fn check(&self, _ctx: &LegalityContext<'_>) -> RuleOutcome {
                RuleOutcome::Fail("club closed".to_string())
            }
        }
        let evaluator = LegalityEvaluator::default().with_rule(NoWeekendSolo);
        let out = evaluator
            .evaluate(&current_nppl(), None, date(2026, 6, 15))
            .expect("evaluation");
        assert_eq!(out.rule.as_deref(), Some("no_weekend_solo"));
    }
}
