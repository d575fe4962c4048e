use std::time::Duration;

use crate::error::ProviderError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(900);

#[derive(Debug, Clone)]
pub struct AviationWeatherConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Report the cautious default snapshot instead of failing.
    pub fallback_on_error: bool,
}

impl Default for AviationWeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://aviationweather.gov".to_string(),
            timeout: Duration::from_secs(10),
            fallback_on_error: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemoConfig {
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub enum WeatherProviderConfig {
    Mock,
    Demo(DemoConfig),
    AviationWeather(AviationWeatherConfig),
    Cached {
        inner: Box<WeatherProviderConfig>,
        ttl: Duration,
    },
}

impl WeatherProviderConfig {
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("CLEARSLOT_MOCK_EXTERNAL_APIS").is_some_and(|v| is_truthy(&v)) {
            return Ok(Self::Mock);
        }

        let provider = lookup("CLEARSLOT_WEATHER_PROVIDER")
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "mock".to_string());

        let base = match provider.as_str() {
            "mock" => return Ok(Self::Mock),
            "demo" => {
                let seed = match lookup("CLEARSLOT_DEMO_SEED") {
                    Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                        ProviderError::Config(format!("CLEARSLOT_DEMO_SEED is not a u64: {raw}"))
                    })?,
                    None => 0,
                };
                Self::Demo(DemoConfig { seed })
            }
            "aviationweather" | "metar" => {
                let mut cfg = AviationWeatherConfig::default();
                if let Some(base_url) = lookup("CLEARSLOT_WEATHER_BASE_URL") {
                    cfg.base_url = base_url;
                }
                if let Some(secs) = lookup("CLEARSLOT_WEATHER_TIMEOUT_SECS")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                {
                    cfg.timeout = Duration::from_secs(secs.clamp(1, 120));
                }
                if let Some(raw) = lookup("CLEARSLOT_WEATHER_FALLBACK") {
                    cfg.fallback_on_error = is_truthy(&raw);
                }
                Self::AviationWeather(cfg)
            }
            other => {
                return Err(ProviderError::Config(format!(
                    "unsupported weather provider: {other}"
                )));
            }
        };

        let ttl = lookup("CLEARSLOT_WEATHER_CACHE_TTL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_CACHE_TTL, Duration::from_secs);
        if ttl.is_zero() {
            return Ok(base);
        }
        Ok(Self::Cached {
            inner: Box::new(base),
            ttl,
        })
    }
}

fn is_truthy(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered == "1" || lowered == "true" || lowered == "on" || lowered == "yes"
}
