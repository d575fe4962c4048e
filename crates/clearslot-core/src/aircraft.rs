use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{non_negative, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AircraftClass {
    #[default]
    Microlight,
    Sep,
}

impl fmt::Display for AircraftClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Microlight => f.write_str("microlight"),
            Self::Sep => f.write_str("SEP"),
        }
    }
}

fn default_seats() -> u8 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftProfile {
    #[serde(default)]
    pub registration: Option<String>,
    #[serde(default)]
    pub class: AircraftClass,
    #[serde(default = "default_seats")]
    pub seats: u8,
    pub max_demonstrated_crosswind_kt: f64,
    pub min_runway_length_m: f64,
    #[serde(default)]
    pub permit_expiry: Option<NaiveDate>,
}

impl AircraftProfile {
    pub fn new(max_demonstrated_crosswind_kt: f64, min_runway_length_m: f64) -> Self {
        Self {
            registration: None,
            class: AircraftClass::default(),
            seats: default_seats(),
            max_demonstrated_crosswind_kt,
            min_runway_length_m,
            permit_expiry: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative(
            "max_demonstrated_crosswind_kt",
            self.max_demonstrated_crosswind_kt,
        )?;
        non_negative("min_runway_length_m", self.min_runway_length_m)?;
        if self.seats == 0 {
            return Err(ValidationError::InvalidRange(
                "aircraft must have at least one seat".to_string(),
            ));
        }
        Ok(())
    }
}
