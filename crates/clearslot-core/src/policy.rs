use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{non_negative, PolicyError, ValidationError};
use crate::pilot::LicenceType;

/// Club weather limits for the flyability cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyabilityLimits {
    pub max_gust_kt: f64,
    pub min_cloud_base_ft: f64,
    pub marginal_gust_kt: f64,
    pub marginal_cloud_base_ft: f64,
    pub min_visibility_m: f64,
    pub marginal_visibility_m: f64,
}

impl Default for FlyabilityLimits {
    fn default() -> Self {
        Self {
            max_gust_kt: 25.0,
            min_cloud_base_ft: 1500.0,
            marginal_gust_kt: 15.0,
            marginal_cloud_base_ft: 2400.0,
            min_visibility_m: 3000.0,
            marginal_visibility_m: 5000.0,
        }
    }
}

impl FlyabilityLimits {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("max_gust_kt", self.max_gust_kt)?;
        non_negative("min_cloud_base_ft", self.min_cloud_base_ft)?;
        non_negative("marginal_gust_kt", self.marginal_gust_kt)?;
        non_negative("marginal_cloud_base_ft", self.marginal_cloud_base_ft)?;
        non_negative("min_visibility_m", self.min_visibility_m)?;
        non_negative("marginal_visibility_m", self.marginal_visibility_m)?;
        if self.marginal_gust_kt > self.max_gust_kt {
            return Err(ValidationError::InvalidRange(
                "marginal_gust_kt must not exceed max_gust_kt".to_string(),
            ));
        }
        if self.marginal_cloud_base_ft < self.min_cloud_base_ft {
            return Err(ValidationError::InvalidRange(
                "marginal_cloud_base_ft must not be below min_cloud_base_ft".to_string(),
            ));
        }
        if self.marginal_visibility_m < self.min_visibility_m {
            return Err(ValidationError::InvalidRange(
                "marginal_visibility_m must not be below min_visibility_m".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenceMinimums {
    pub min_total_hours: f64,
    pub min_supervised_solo_hours: f64,
    pub requires_cross_country: bool,
}

impl LicenceMinimums {
    pub fn new(min_total_hours: f64, min_supervised_solo_hours: f64) -> Self {
        Self {
            min_total_hours,
            min_supervised_solo_hours,
            requires_cross_country: false,
        }
    }
}

/// BMAA-style 12-in-24 revalidation experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidationPolicy {
    pub window_days: u32,
    pub min_total_hours: f64,
    pub min_pic_hours: f64,
    pub min_instruction_hours: f64,
    pub min_takeoff_landings: u32,
}

impl Default for RevalidationPolicy {
    fn default() -> Self {
        Self {
            window_days: 730,
            min_total_hours: 12.0,
            min_pic_hours: 6.0,
            min_instruction_hours: 1.0,
            min_takeoff_landings: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegalityPolicy {
    pub licence_minimums: BTreeMap<LicenceType, LicenceMinimums>,
    pub recency_window_days: u32,
    pub min_recent_takeoff_landings: u32,
    pub revalidation: Option<RevalidationPolicy>,
}

impl Default for LegalityPolicy {
    fn default() -> Self {
        let mut licence_minimums = BTreeMap::new();
        licence_minimums.insert(LicenceType::NpplA, LicenceMinimums::new(32.0, 10.0));
        licence_minimums.insert(LicenceType::Student, LicenceMinimums::new(32.0, 10.0));
        licence_minimums.insert(LicenceType::PplA, LicenceMinimums::new(0.0, 0.0));
        Self {
            licence_minimums,
            recency_window_days: 90,
            min_recent_takeoff_landings: 1,
            revalidation: None,
        }
    }
}

impl LegalityPolicy {
    /// CAA issue minimums: NPPL(A) 32h/10h solo, PPL(A) 40h/10h solo plus cross-country.
    pub fn caa_licence_minimums() -> Self {
        let mut policy = Self::default();
        policy.licence_minimums.insert(
            LicenceType::PplA,
            LicenceMinimums {
                min_total_hours: 40.0,
                min_supervised_solo_hours: 10.0,
                requires_cross_country: true,
            },
        );
        policy
    }

    pub fn with_revalidation(mut self, revalidation: RevalidationPolicy) -> Self {
        self.revalidation = Some(revalidation);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for minimums in self.licence_minimums.values() {
            non_negative("min_total_hours", minimums.min_total_hours)?;
            non_negative("min_supervised_solo_hours", minimums.min_supervised_solo_hours)?;
        }
        if self.recency_window_days == 0 {
            return Err(ValidationError::InvalidRange(
                "recency_window_days must be at least 1".to_string(),
            ));
        }
        if let Some(reval) = &self.revalidation {
            non_negative("revalidation.min_total_hours", reval.min_total_hours)?;
            non_negative("revalidation.min_pic_hours", reval.min_pic_hours)?;
            non_negative(
                "revalidation.min_instruction_hours",
                reval.min_instruction_hours,
            )?;
        }
        Ok(())
    }
}

/// Complete club policy, loadable from a JSON document. Missing sections
/// fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearslotPolicy {
    pub flyability: FlyabilityLimits,
    pub legality: LegalityPolicy,
}

impl ClearslotPolicy {
    pub fn from_json_str(raw: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(raw)?;
        policy.flyability.validate()?;
        policy.legality.validate()?;
        Ok(policy)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
