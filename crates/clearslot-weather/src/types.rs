use chrono::NaiveDateTime;
use clearslot_core::WeatherSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    /// ICAO code or club site identifier.
    pub site_id: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl ForecastRequest {
    pub fn current(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            start: None,
            end: None,
        }
    }

    pub fn window(site_id: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            site_id: site_id.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// `site:YYYYMMDDHH`, or `site:now` for an untimed request.
    pub fn hour_key(&self) -> String {
        match self.start {
            Some(start) => format!("{}:{}", self.site_id, start.format("%Y%m%d%H")),
            None => format!("{}:now", self.site_id),
        }
    }
}

/// Conservative conditions reported when no real observation is available.
pub fn cautious_default_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        wind_speed_kt: Some(10.0),
        wind_gusts_kt: Some(15.0),
        cloud_base_ft: Some(2500.0),
        visibility_m: Some(8000.0),
        precipitation_rate_mm_hr: Some(0.0),
        ..WeatherSnapshot::default()
    }
}
