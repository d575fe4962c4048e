use async_trait::async_trait;
use clearslot_core::{RunwaySurface, WeatherSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DemoConfig;
use crate::error::ProviderError;
use crate::traits::WeatherProvider;
use crate::types::ForecastRequest;

const WET_SURFACE_CHANCE: f64 = 0.4;

/// Plausible random conditions for demos and UI work. The same seed, site
/// and hour always produce the same snapshot.
#[derive(Debug, Clone)]
pub struct DemoWeatherProvider {
    config: DemoConfig,
}

impl DemoWeatherProvider {
    pub fn new(config: DemoConfig) -> Self {
        Self { config }
    }

    pub fn snapshot_for(&self, request: &ForecastRequest) -> WeatherSnapshot {
        let mut rng = StdRng::seed_from_u64(self.mix_seed(request));
        let gusts: u32 = rng.gen_range(10..30);
        let cloud: u32 = rng.gen_range(1200..4200);
        let wind = gusts.saturating_sub(rng.gen_range(3..9));
        let surface = if rng.gen_bool(WET_SURFACE_CHANCE) {
            RunwaySurface::Wet
        } else {
            RunwaySurface::Firm
        };
        WeatherSnapshot {
            wind_speed_kt: Some(f64::from(wind)),
            wind_gusts_kt: Some(f64::from(gusts)),
            cloud_base_ft: Some(f64::from(cloud)),
            visibility_m: None,
            precipitation_rate_mm_hr: Some(0.0),
            runway_surface: surface,
        }
    }

    fn mix_seed(&self, request: &ForecastRequest) -> u64 {
        // FNV-1a over the site id, then fold in seed and hour
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in request.site_id.bytes() {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
        let hour = request
            .start
            .map_or(0, |t| t.and_utc().timestamp().div_euclid(3600));
        h ^ self.config.seed.rotate_left(17) ^ u64::from_ne_bytes(hour.to_ne_bytes())
    }
}

#[async_trait]
impl WeatherProvider for DemoWeatherProvider {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn forecast(&self, request: ForecastRequest) -> Result<WeatherSnapshot, ProviderError> {
        Ok(self.snapshot_for(&request))
    }
}
