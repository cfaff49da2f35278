//! Gated weather tools

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tier_gate::{GateError, JsonObject};

use super::parse_args;
use crate::types::Units;
use crate::weather::{Coordinates, MAX_FORECAST_HOURS, WeatherProvider};

const DEFAULT_FORECAST_HOURS: u16 = 24;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CurrentWeatherArgs {
    /// Latitude in decimal degrees, -90 to 90
    pub latitude: f64,
    /// Longitude in decimal degrees, -180 to 180
    pub longitude: f64,
    /// Unit system for temperature and wind speed
    #[serde(default)]
    pub units: Units,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ForecastArgs {
    /// Latitude in decimal degrees, -90 to 90
    pub latitude: f64,
    /// Longitude in decimal degrees, -180 to 180
    pub longitude: f64,
    /// Unit system for temperature and wind speed
    #[serde(default)]
    pub units: Units,
    /// Number of hours to forecast, 1 to 168
    #[serde(default = "default_hours")]
    pub hours: u16,
}

fn default_hours() -> u16 {
    DEFAULT_FORECAST_HOURS
}

fn coordinates(latitude: f64, longitude: f64) -> Result<Coordinates, GateError> {
    Coordinates::new(latitude, longitude).map_err(GateError::InvalidArguments)
}

fn to_value<T: serde::Serialize>(payload: T) -> Result<Value, GateError> {
    serde_json::to_value(payload).map_err(|e| GateError::Handler(e.to_string()))
}

pub async fn current(
    provider: &dyn WeatherProvider,
    arguments: JsonObject,
) -> Result<Value, GateError> {
    let args: CurrentWeatherArgs = parse_args(arguments)?;
    let location = coordinates(args.latitude, args.longitude)?;

    tracing::info!(
        latitude = location.latitude,
        longitude = location.longitude,
        units = %args.units,
        "Fetching current weather"
    );
    let weather = provider.fetch_current(location, args.units).await?;
    to_value(weather)
}

pub async fn forecast(
    provider: &dyn WeatherProvider,
    arguments: JsonObject,
) -> Result<Value, GateError> {
    let args: ForecastArgs = parse_args(arguments)?;
    let location = coordinates(args.latitude, args.longitude)?;
    if !(1..=MAX_FORECAST_HOURS).contains(&args.hours) {
        return Err(GateError::InvalidArguments(format!(
            "hours must be between 1 and {MAX_FORECAST_HOURS}, got {}",
            args.hours
        )));
    }

    tracing::info!(
        latitude = location.latitude,
        longitude = location.longitude,
        units = %args.units,
        hours = args.hours,
        "Fetching forecast"
    );
    let forecast = provider
        .fetch_forecast(location, args.units, args.hours)
        .await?;
    to_value(forecast)
}
