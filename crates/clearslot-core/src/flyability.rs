//! GO / CHECK / NO_GO classification of weather against club limits.
//!
//! Hard limits are collected first, in a fixed order; any hard finding makes
//! the result `NO_GO` and the first finding leads the reason list. Only when
//! no hard limit is hit are the soft limits collected, surface first, to
//! decide between `CHECK` and `GO`.
//!
//! The crosswind check compares the gust value directly against the
//! aircraft's maximum demonstrated crosswind. Runway heading is not known
//! here, so this overstates the crosswind component for any wind that is not
//! straight across the runway.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aircraft::AircraftProfile;
use crate::error::ValidationError;
use crate::pilot::PilotProfile;
use crate::policy::FlyabilityLimits;
use crate::reasons::{PersonalLimit, Reason, Severity};
use crate::scoring::flyability_score;
use crate::weather::{Readings, RunwaySurface, WeatherSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlyabilityStatus {
    Go,
    Check,
    NoGo,
}

impl FlyabilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Go => "GO",
            Self::Check => "CHECK",
            Self::NoGo => "NO_GO",
        }
    }
}

impl From<Severity> for FlyabilityStatus {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Hard => Self::NoGo,
            Severity::Caution => Self::Check,
            Severity::Info => Self::Go,
        }
    }
}

impl fmt::Display for FlyabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub status: FlyabilityStatus,
    pub score: u8,
    pub reasons: Vec<Reason>,
}

impl EvaluationResult {
    pub fn reason_texts(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlyabilityEvaluator {
    limits: FlyabilityLimits,
}

impl FlyabilityEvaluator {
    /// Rejects negative limits and marginal bands that sit outside the hard
    /// limits.
    pub fn new(limits: FlyabilityLimits) -> Result<Self, ValidationError> {
        limits.validate()?;
        Ok(Self { limits })
    }

    pub fn limits(&self) -> &FlyabilityLimits {
        &self.limits
    }

    pub fn evaluate(
        &self,
        weather: &WeatherSnapshot,
        pilot: &PilotProfile,
        aircraft: &AircraftProfile,
    ) -> Result<EvaluationResult, ValidationError> {
        let readings = weather.readings()?;
        aircraft.validate()?;
        pilot.personal_minima.validate()?;

        let score = flyability_score(readings.wind_gusts_kt, readings.cloud_base_ft);

        let mut reasons = self.hard_findings(&readings, pilot, aircraft);
        if reasons.is_empty() {
            reasons = self.soft_findings(&readings);
        }
        if reasons.is_empty() {
            reasons.push(Reason::WithinLimits);
        }
        // the leading reason is always of the highest severity present
        let status = reasons
            .first()
            .map_or(FlyabilityStatus::Go, |r| r.severity().into());
        let result = EvaluationResult {
            status,
            score,
            reasons,
        };

        debug!(
            status = result.status.as_str(),
            score = result.score,
            first_rule = result.reasons.first().map(Reason::rule),
            "flyability evaluated"
        );
        Ok(result)
    }

    fn hard_findings(
        &self,
        r: &Readings,
        pilot: &PilotProfile,
        aircraft: &AircraftProfile,
    ) -> Vec<Reason> {
        let limits = &self.limits;
        let mut out = Vec::new();

        if r.wind_gusts_kt > limits.max_gust_kt {
            out.push(Reason::WindLimit {
                value: r.wind_gusts_kt,
                threshold: limits.max_gust_kt,
            });
        }
        if r.cloud_base_ft < limits.min_cloud_base_ft {
            out.push(Reason::CloudBaseLimit {
                value: r.cloud_base_ft,
                threshold: limits.min_cloud_base_ft,
            });
        }
        if r.wind_gusts_kt > aircraft.max_demonstrated_crosswind_kt {
            out.push(Reason::CrosswindLimit {
                value: r.wind_gusts_kt,
                threshold: aircraft.max_demonstrated_crosswind_kt,
            });
        }
        if let Some(vis) = r.visibility_m {
            if vis < limits.min_visibility_m {
                out.push(Reason::VisibilityLimit {
                    value: vis,
                    threshold: limits.min_visibility_m,
                });
            }
        }
        if r.runway_surface == RunwaySurface::Ice {
            out.push(Reason::RunwayUnusable {
                surface: r.runway_surface,
            });
        }

        let minima = &pilot.personal_minima;
        if let Some(max_gust) = minima.max_gust_kt {
            if r.wind_gusts_kt > max_gust {
                out.push(Reason::PersonalMinimum {
                    limit: PersonalLimit::Gust,
                    value: r.wind_gusts_kt,
                    threshold: max_gust,
                });
            }
        }
        if let Some(max_wind) = minima.max_wind_kt {
            if r.wind_speed_kt > max_wind {
                out.push(Reason::PersonalMinimum {
                    limit: PersonalLimit::Wind,
                    value: r.wind_speed_kt,
                    threshold: max_wind,
                });
            }
        }
        if let (Some(min_vis), Some(vis)) = (minima.min_visibility_m, r.visibility_m) {
            if vis < min_vis {
                out.push(Reason::PersonalMinimum {
                    limit: PersonalLimit::Visibility,
                    value: vis,
                    threshold: min_vis,
                });
            }
        }

        out
    }

    fn soft_findings(&self, r: &Readings) -> Vec<Reason> {
        let limits = &self.limits;
        let mut out = Vec::new();

        if r.runway_surface != RunwaySurface::Firm {
            out.push(Reason::RunwaySurface {
                surface: r.runway_surface,
            });
        }
        if r.wind_gusts_kt > limits.marginal_gust_kt {
            out.push(Reason::MarginalWind {
                value: r.wind_gusts_kt,
                threshold: limits.marginal_gust_kt,
            });
        }
        if r.cloud_base_ft < limits.marginal_cloud_base_ft {
            out.push(Reason::MarginalCloudBase {
                value: r.cloud_base_ft,
                threshold: limits.marginal_cloud_base_ft,
            });
        }
        if let Some(vis) = r.visibility_m {
            if vis < limits.marginal_visibility_m {
                out.push(Reason::MarginalVisibility {
                    value: vis,
                    threshold: limits.marginal_visibility_m,
                });
            }
        }

        out
    }
}

/// Evaluates with the default club limits.
pub fn evaluate_flyability(
    weather: &WeatherSnapshot,
    pilot: &PilotProfile,
    aircraft: &AircraftProfile,
) -> Result<EvaluationResult, ValidationError> {
    FlyabilityEvaluator::default().evaluate(weather, pilot, aircraft)
}
