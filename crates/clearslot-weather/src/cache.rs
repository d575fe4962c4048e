use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use clearslot_core::WeatherSnapshot;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ProviderError;
use crate::traits::WeatherProvider;
use crate::types::ForecastRequest;

/// Keeps provider answers per site and hour for `ttl`. Errors are not cached.
/// Expired entries are dropped whenever a new answer is stored, so the map
/// only holds keys seen within the last `ttl`.
pub struct CachedWeatherProvider {
    inner: Arc<dyn WeatherProvider>,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, WeatherSnapshot)>>,
}

impl CachedWeatherProvider {
    pub fn new(inner: Arc<dyn WeatherProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn lookup(&self, key: &str) -> Option<WeatherSnapshot> {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, snapshot)| snapshot.clone());
        if fresh.is_none() {
            entries.remove(key);
        }
        fresh
    }

    fn store(&self, key: String, snapshot: WeatherSnapshot) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        let pruned = before - entries.len();
        if pruned > 0 {
            debug!(pruned, "expired weather cache entries dropped");
        }
        entries.insert(key, (Instant::now(), snapshot));
    }
}

#[async_trait]
impl WeatherProvider for CachedWeatherProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn forecast(&self, request: ForecastRequest) -> Result<WeatherSnapshot, ProviderError> {
        let key = request.hour_key();
        if let Some(hit) = self.lookup(&key) {
            debug!(key = %key, "weather cache hit");
            return Ok(hit);
        }

        let snapshot = self.inner.forecast(request).await?;
        self.store(key, snapshot.clone());
        Ok(snapshot)
    }
}
