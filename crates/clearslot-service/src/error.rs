use std::io;

use clearslot_core::PolicyError;
use clearslot_weather::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("weather provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("runtime error: {0}")]
    Runtime(#[from] io::Error),
}
