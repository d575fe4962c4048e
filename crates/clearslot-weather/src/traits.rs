use async_trait::async_trait;
use clearslot_core::WeatherSnapshot;

use crate::error::ProviderError;
use crate::types::ForecastRequest;

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn forecast(&self, request: ForecastRequest) -> Result<WeatherSnapshot, ProviderError>;
}
