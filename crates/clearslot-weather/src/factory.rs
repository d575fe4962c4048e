use std::sync::Arc;

use crate::cache::CachedWeatherProvider;
use crate::config::WeatherProviderConfig;
use crate::error::ProviderError;
use crate::providers::{AviationWeatherProvider, DemoWeatherProvider, MockWeatherProvider};
use crate::traits::WeatherProvider;

pub fn build_weather_provider(
    cfg: WeatherProviderConfig,
) -> Result<Arc<dyn WeatherProvider>, ProviderError> {
    match cfg {
        WeatherProviderConfig::Mock => Ok(Arc::new(MockWeatherProvider)),
        WeatherProviderConfig::Demo(c) => Ok(Arc::new(DemoWeatherProvider::new(c))),
        WeatherProviderConfig::AviationWeather(c) => {
            Ok(Arc::new(AviationWeatherProvider::new(c)?))
        }
        WeatherProviderConfig::Cached { inner, ttl } => {
            let inner = build_weather_provider(*inner)?;
            Ok(Arc::new(CachedWeatherProvider::new(inner, ttl)))
        }
    }
}
