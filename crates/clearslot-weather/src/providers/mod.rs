pub mod aviation_weather;
pub mod demo;
pub mod mock;

pub use aviation_weather::AviationWeatherProvider;
pub use demo::DemoWeatherProvider;
pub use mock::MockWeatherProvider;
