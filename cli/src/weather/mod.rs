//! Weather data retrieval
//!
//! The MCP tools only see the [`WeatherProvider`] trait; [`OpenMeteoProvider`]
//! is the production implementation.

pub mod codes;
pub mod open_meteo;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tier_gate::GateError;

use crate::types::Units;

pub use open_meteo::OpenMeteoProvider;

/// Longest forecast the tools will ask for (7 days)
pub const MAX_FORECAST_HOURS: u16 = 168;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("weather service unreachable: {0}")]
    Network(String),

    #[error("weather service rate limit exceeded, try again later")]
    RateLimited,

    #[error("weather service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed weather response: {0}")]
    Malformed(String),
}

impl From<WeatherError> for GateError {
    fn from(err: WeatherError) -> Self {
        GateError::Upstream(err.to_string())
    }
}

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validated coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(format!("latitude must be between -90 and 90, got {latitude}"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(format!(
                "longitude must be between -180 and 180, got {longitude}"
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitLabels {
    pub temperature: String,
    pub wind_speed: String,
}

impl From<Units> for UnitLabels {
    fn from(units: Units) -> Self {
        Self {
            temperature: units.temperature_label().into(),
            wind_speed: units.wind_speed_label().into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub location: Coordinates,
    pub timezone: String,
    pub observed_at: String,
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: String,
    pub weather_code: u8,
    pub conditions: String,
    pub units: UnitLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    pub time: String,
    pub temperature: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub wind_speed: Option<f64>,
    pub weather_code: Option<u8>,
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub location: Coordinates,
    pub timezone: String,
    pub units: UnitLabels,
    pub hourly: Vec<HourlyForecast>,
}

/// Source of weather data
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_current(
        &self,
        location: Coordinates,
        units: Units,
    ) -> Result<CurrentWeather, WeatherError>;

    async fn fetch_forecast(
        &self,
        location: Coordinates,
        units: Units,
        hours: u16,
    ) -> Result<Forecast, WeatherError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinates::new(37.7749, -122.4194).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.5, 0.0).unwrap_err().contains("latitude"));
        assert!(Coordinates::new(0.0, 181.0).unwrap_err().contains("longitude"));
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_weather_error_becomes_upstream_failure() {
        let err: GateError = WeatherError::RateLimited.into();
        assert!(matches!(err, GateError::Upstream(ref msg) if msg.contains("rate limit")));
    }
}
