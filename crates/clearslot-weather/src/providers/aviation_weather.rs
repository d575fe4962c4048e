use async_trait::async_trait;
use clearslot_core::WeatherSnapshot;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::config::AviationWeatherConfig;
use crate::error::ProviderError;
use crate::traits::WeatherProvider;
use crate::types::{ForecastRequest, cautious_default_snapshot};

const METRES_PER_STATUTE_MILE: f64 = 1609.34;
const CLEAR_CLOUD_BASE_FT: f64 = 5000.0;
const UNREADABLE_VISIBILITY_M: f64 = 9999.0;
const MISSING_VISIBILITY_SM: f64 = 10.0;

/// Latest METAR from aviationweather.gov for an ICAO station.
#[derive(Clone)]
pub struct AviationWeatherProvider {
    config: AviationWeatherConfig,
    client: Client,
}

impl AviationWeatherProvider {
    pub fn new(config: AviationWeatherConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn metar_url(&self) -> String {
        format!(
            "{}/api/data/metar",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn fetch(&self, icao: &str) -> Result<WeatherSnapshot, ProviderError> {
        let res = self
            .client
            .get(self.metar_url())
            .query(&[("ids", icao), ("format", "json")])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let observations: Vec<MetarObservation> = res.json().await?;
        let latest = observations.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("no METAR available for {icao}"))
        })?;
        Ok(latest.into_snapshot())
    }
}

#[async_trait]
impl WeatherProvider for AviationWeatherProvider {
    fn name(&self) -> &'static str {
        "aviationweather"
    }

    async fn forecast(&self, request: ForecastRequest) -> Result<WeatherSnapshot, ProviderError> {
        match self.fetch(&request.site_id).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) if self.config.fallback_on_error => {
                warn!(
                    site = %request.site_id,
                    error = %err,
                    "METAR fetch failed, using cautious default"
                );
                Ok(cautious_default_snapshot())
            }
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetarObservation {
    #[serde(default)]
    wspd: Option<f64>,
    #[serde(default)]
    wgst: Option<f64>,
    #[serde(default)]
    visib: Option<Value>,
    #[serde(default)]
    clouds: Vec<CloudLayer>,
}

#[derive(Debug, Deserialize)]
struct CloudLayer {
    #[serde(default)]
    cover: String,
    #[serde(default)]
    base: Option<f64>,
}

impl MetarObservation {
    fn into_snapshot(self) -> WeatherSnapshot {
        WeatherSnapshot {
            wind_speed_kt: Some(self.wspd.unwrap_or(0.0)),
            wind_gusts_kt: Some(self.wgst.unwrap_or(0.0)),
            cloud_base_ft: Some(lowest_significant_base(&self.clouds)),
            visibility_m: Some(visibility_metres(self.visib.as_ref())),
            // METAR carries no precipitation rate
            precipitation_rate_mm_hr: Some(0.0),
            ..WeatherSnapshot::default()
        }
    }
}

/// First SCT/BKN/OVC layer with a base, in feet.
fn lowest_significant_base(clouds: &[CloudLayer]) -> f64 {
    clouds
        .iter()
        .filter(|c| matches!(c.cover.as_str(), "SCT" | "BKN" | "OVC"))
        .find_map(|c| c.base)
        .map_or(CLEAR_CLOUD_BASE_FT, |base| base * 100.0)
}

fn visibility_metres(raw: Option<&Value>) -> f64 {
    let miles = match raw {
        None | Some(Value::Null) => Some(MISSING_VISIBILITY_SM),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('+').parse::<f64>().ok(),
        Some(_) => None,
    };
    miles.map_or(UNREADABLE_VISIBILITY_M, |sm| sm * METRES_PER_STATUTE_MILE)
}
