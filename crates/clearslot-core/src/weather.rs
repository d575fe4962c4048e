use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{optional_non_negative, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunwaySurface {
    #[default]
    #[serde(alias = "dry")]
    Firm,
    Soft,
    Wet,
    Ice,
}

impl RunwaySurface {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Firm => "firm",
            Self::Soft => "soft",
            Self::Wet => "wet",
            Self::Ice => "ice",
        }
    }
}

impl fmt::Display for RunwaySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather for one site and time window, as delivered by a weather source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSnapshot {
    pub wind_speed_kt: Option<f64>,
    pub wind_gusts_kt: Option<f64>,
    pub cloud_base_ft: Option<f64>,
    pub visibility_m: Option<f64>,
    pub precipitation_rate_mm_hr: Option<f64>,
    pub runway_surface: RunwaySurface,
}

impl WeatherSnapshot {
    pub fn new(wind_gusts_kt: f64, cloud_base_ft: f64, runway_surface: RunwaySurface) -> Self {
        Self {
            wind_gusts_kt: Some(wind_gusts_kt),
            cloud_base_ft: Some(cloud_base_ft),
            runway_surface,
            ..Self::default()
        }
    }

    pub fn with_wind_speed(mut self, kt: f64) -> Self {
        self.wind_speed_kt = Some(kt);
        self
    }

    pub fn with_visibility(mut self, metres: f64) -> Self {
        self.visibility_m = Some(metres);
        self
    }

    pub fn with_surface(mut self, surface: RunwaySurface) -> Self {
        self.runway_surface = surface;
        self
    }

    /// Validates present readings and resolves missing wind/cloud values to 0.
    pub fn readings(&self) -> Result<Readings, ValidationError> {
        Ok(Readings {
            wind_speed_kt: optional_non_negative("wind_speed_kt", self.wind_speed_kt)?
                .unwrap_or(0.0),
            wind_gusts_kt: optional_non_negative("wind_gusts_kt", self.wind_gusts_kt)?
                .unwrap_or(0.0),
            cloud_base_ft: optional_non_negative("cloud_base_ft", self.cloud_base_ft)?
                .unwrap_or(0.0),
            visibility_m: optional_non_negative("visibility_m", self.visibility_m)?,
            precipitation_rate_mm_hr: optional_non_negative(
                "precipitation_rate_mm_hr",
                self.precipitation_rate_mm_hr,
            )?
            .unwrap_or(0.0),
            runway_surface: self.runway_surface,
        })
    }
}

/// Validated weather values the rule cascade runs on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub wind_speed_kt: f64,
    pub wind_gusts_kt: f64,
    pub cloud_base_ft: f64,
    /// `None` when the source did not report visibility.
    pub visibility_m: Option<f64>,
    pub precipitation_rate_mm_hr: f64,
    pub runway_surface: RunwaySurface,
}
