use async_trait::async_trait;
use clearslot_core::WeatherSnapshot;

use crate::error::ProviderError;
use crate::traits::WeatherProvider;
use crate::types::{ForecastRequest, cautious_default_snapshot};

/// Deterministic conditions picked by a keyword in the site id: `SAFE`,
/// `WINDY` or `IFR`. Anything else gets the cautious default.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockWeatherProvider;

impl MockWeatherProvider {
    pub fn snapshot_for(site_id: &str) -> WeatherSnapshot {
        let site = site_id.to_ascii_uppercase();
        if site.contains("SAFE") {
            return snapshot(5.0, 8.0, 4000.0, 9999.0, 0.0);
        }
        if site.contains("WINDY") {
            return snapshot(25.0, 35.0, 3000.0, 9999.0, 0.0);
        }
        if site.contains("IFR") {
            return snapshot(10.0, 15.0, 800.0, 4000.0, 2.0);
        }
        cautious_default_snapshot()
    }
}

fn snapshot(wind: f64, gust: f64, cloud: f64, visibility: f64, precip: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        wind_speed_kt: Some(wind),
        wind_gusts_kt: Some(gust),
        cloud_base_ft: Some(cloud),
        visibility_m: Some(visibility),
        precipitation_rate_mm_hr: Some(precip),
        ..WeatherSnapshot::default()
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn forecast(&self, request: ForecastRequest) -> Result<WeatherSnapshot, ProviderError> {
        Ok(Self::snapshot_for(&request.site_id))
    }
}
