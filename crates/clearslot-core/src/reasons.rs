use std::fmt;

use serde::{Deserialize, Serialize};

use crate::weather::RunwaySurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalLimit {
    Gust,
    Wind,
    Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Caution,
    Hard,
}

/// One finding of the flyability cascade. Serialized with a `rule` tag so
/// callers can branch on it; `Display` gives the briefing text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    WindLimit { value: f64, threshold: f64 },
    CloudBaseLimit { value: f64, threshold: f64 },
    CrosswindLimit { value: f64, threshold: f64 },
    VisibilityLimit { value: f64, threshold: f64 },
    RunwayUnusable { surface: RunwaySurface },
    PersonalMinimum {
        limit: PersonalLimit,
        value: f64,
        threshold: f64,
    },
    RunwaySurface { surface: RunwaySurface },
    MarginalWind { value: f64, threshold: f64 },
    MarginalCloudBase { value: f64, threshold: f64 },
    MarginalVisibility { value: f64, threshold: f64 },
    WithinLimits,
}

impl Reason {
    pub fn severity(&self) -> Severity {
        match self {
            Self::WindLimit { .. }
            | Self::CloudBaseLimit { .. }
            | Self::CrosswindLimit { .. }
            | Self::VisibilityLimit { .. }
            | Self::RunwayUnusable { .. }
            | Self::PersonalMinimum { .. } => Severity::Hard,
            Self::RunwaySurface { .. }
            | Self::MarginalWind { .. }
            | Self::MarginalCloudBase { .. }
            | Self::MarginalVisibility { .. } => Severity::Caution,
            Self::WithinLimits => Severity::Info,
        }
    }

    pub fn rule(&self) -> &'static str {
        match self {
            Self::WindLimit { .. } => "WIND_LIMIT",
            Self::CloudBaseLimit { .. } => "CLOUD_BASE_LIMIT",
            Self::CrosswindLimit { .. } => "CROSSWIND_LIMIT",
            Self::VisibilityLimit { .. } => "VISIBILITY_LIMIT",
            Self::RunwayUnusable { .. } => "RUNWAY_UNUSABLE",
            Self::PersonalMinimum { .. } => "PERSONAL_MINIMUM",
            Self::RunwaySurface { .. } => "RUNWAY_SURFACE",
            Self::MarginalWind { .. } => "MARGINAL_WIND",
            Self::MarginalCloudBase { .. } => "MARGINAL_CLOUD_BASE",
            Self::MarginalVisibility { .. } => "MARGINAL_VISIBILITY",
            Self::WithinLimits => "WITHIN_LIMITS",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindLimit { value, threshold } => {
                write!(f, "Gusts {value}kt exceed limit ({threshold}kt).")
            }
            Self::CloudBaseLimit { value, threshold } => {
                write!(f, "Cloud base {value}ft is below minimum ({threshold}ft).")
            }
            Self::CrosswindLimit { value, threshold } => write!(
                f,
                "Gusts {value}kt exceed max demonstrated crosswind ({threshold}kt)."
            ),
            Self::VisibilityLimit { value, threshold } => {
                write!(f, "Visibility {value}m is below safe minimum ({threshold}m).")
            }
            Self::RunwayUnusable { surface } => {
                write!(f, "Runway surface is {}.", surface.as_str().to_uppercase())
            }
            Self::PersonalMinimum {
                limit,
                value,
                threshold,
            } => match limit {
                PersonalLimit::Gust => {
                    write!(f, "Gusts {value}kt exceed personal minimum ({threshold}kt).")
                }
                PersonalLimit::Wind => write!(
                    f,
                    "Wind speed {value}kt exceeds personal minimum ({threshold}kt)."
                ),
                PersonalLimit::Visibility => write!(
                    f,
                    "Visibility {value}m is below personal minimum ({threshold}m)."
                ),
            },
            Self::RunwaySurface { surface } => write!(
                f,
                "Runway {}. Check takeoff performance.",
                surface.as_str().to_uppercase()
            ),
            Self::MarginalWind { value, threshold } => {
                write!(f, "Marginal: gusts {value}kt above {threshold}kt.")
            }
            Self::MarginalCloudBase { value, threshold } => {
                write!(f, "Marginal: cloud base {value}ft below {threshold}ft.")
            }
            Self::MarginalVisibility { value, threshold } => {
                write!(f, "Marginal: visibility {value}m below {threshold}m.")
            }
            Self::WithinLimits => f.write_str("Conditions look good within defined limits."),
        }
    }
}
