use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{non_negative, optional_non_negative, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LicenceType {
    #[serde(rename = "NPPL(A)", alias = "NPPL")]
    NpplA,
    #[serde(rename = "PPL(A)", alias = "PPL")]
    PplA,
    #[serde(rename = "LAPL(A)", alias = "LAPL")]
    LaplA,
    #[serde(rename = "Student", alias = "student")]
    Student,
}

impl LicenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NpplA => "NPPL(A)",
            Self::PplA => "PPL(A)",
            Self::LaplA => "LAPL(A)",
            Self::Student => "Student",
        }
    }
}

impl fmt::Display for LicenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Microlight,
    #[serde(rename = "SEP")]
    Sep,
    #[serde(rename = "SSEA")]
    Ssea,
    #[serde(other)]
    Other,
}

/// Stricter-than-club limits a pilot has set for themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalMinima {
    pub max_wind_kt: Option<f64>,
    pub max_gust_kt: Option<f64>,
    pub min_visibility_m: Option<f64>,
}

impl PersonalMinima {
    pub fn validate(&self) -> Result<(), ValidationError> {
        optional_non_negative("personal_minima.max_wind_kt", self.max_wind_kt)?;
        optional_non_negative("personal_minima.max_gust_kt", self.max_gust_kt)?;
        optional_non_negative("personal_minima.min_visibility_m", self.min_visibility_m)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub hours_pic: f64,
    #[serde(default, alias = "to_landings")]
    pub takeoff_landings: u32,
    #[serde(default, alias = "instruction")]
    pub instruction_hours: f64,
}

impl LogbookEntry {
    pub fn new(date: NaiveDate, hours_pic: f64, takeoff_landings: u32) -> Self {
        Self {
            date,
            hours_pic,
            takeoff_landings,
            instruction_hours: 0.0,
        }
    }
}

/// Totals over the logbook entries falling inside a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LogbookTotals {
    pub hours_pic: f64,
    pub takeoff_landings: u32,
    pub instruction_hours: f64,
    pub entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotProfile {
    pub licence_type: Option<LicenceType>,
    pub ratings: Vec<Rating>,
    pub total_hours: Option<f64>,
    pub supervised_solo_hours: f64,
    pub hours_on_type: f64,
    pub microlight_differences_trained: bool,
    #[serde(alias = "xc_done")]
    pub cross_country_done: bool,
    pub single_seat_constraint: bool,
    pub medical_expiry: Option<NaiveDate>,
    pub personal_minima: PersonalMinima,
    pub logbook: Vec<LogbookEntry>,
}

impl PilotProfile {
    pub fn new(licence_type: LicenceType, total_hours: f64) -> Self {
        Self {
            licence_type: Some(licence_type),
            total_hours: Some(total_hours),
            ..Self::default()
        }
    }

    pub fn has_rating(&self, rating: Rating) -> bool {
        self.ratings.contains(&rating)
    }

    /// Checks required fields and numeric sanity. Returns the licence and total
    /// hours so callers do not have to unwrap them again.
    pub fn validate(&self) -> Result<(LicenceType, f64), ValidationError> {
        let licence = self
            .licence_type
            .ok_or(ValidationError::MissingField("licence_type"))?;
        let total = self
            .total_hours
            .ok_or(ValidationError::MissingField("total_hours"))?;
        let total = non_negative("total_hours", total)?;
        non_negative("supervised_solo_hours", self.supervised_solo_hours)?;
        non_negative("hours_on_type", self.hours_on_type)?;
        self.personal_minima.validate()?;
        for entry in &self.logbook {
            non_negative("logbook.hours_pic", entry.hours_pic)?;
            non_negative("logbook.instruction_hours", entry.instruction_hours)?;
        }
        Ok((licence, total))
    }

    /// Sums entries dated within `[target - window_days, target]`.
    pub fn logbook_totals(&self, target: NaiveDate, window_days: u32) -> LogbookTotals {
        let start = target
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .unwrap_or(NaiveDate::MIN);
        self.logbook
            .iter()
            .filter(|e| e.date >= start && e.date <= target)
            .fold(LogbookTotals::default(), |mut acc, e| {
                acc.hours_pic += e.hours_pic;
                acc.takeoff_landings = acc.takeoff_landings.saturating_add(e.takeoff_landings);
                acc.instruction_hours += e.instruction_hours;
                acc.entries += 1;
                acc
            })
    }
}
