//! Open-Meteo forecast API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::codes::{compass, describe};
use super::{
    Coordinates, CurrentWeather, Forecast, HourlyForecast, UnitLabels, WeatherError,
    WeatherProvider,
};
use crate::types::Units;

/// Open-Meteo API base URL
pub const DEFAULT_API_BASE: &str = "https://api.open-meteo.com/v1";

/// User agent string for HTTP requests
const USER_AGENT: &str = concat!("weather-mcp/", env!("CARGO_PKG_VERSION"));

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
                              weather_code,wind_speed_10m,wind_direction_10m";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,weather_code,wind_speed_10m";

#[derive(Clone)]
pub struct OpenMeteoProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    timezone: String,
    current: Option<CurrentBlock>,
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: u8,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    weather_code: Vec<Option<u8>>,
    wind_speed_10m: Vec<Option<f64>>,
}

impl OpenMeteoProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WeatherError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, query: &[(&str, String)]) -> Result<ForecastResponse, WeatherError> {
        let url = format!("{}/forecast", self.base_url);
        tracing::debug!(%url, "Fetching weather data");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(WeatherError::RateLimited),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(WeatherError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Malformed(e.to_string()))
    }
}

fn base_query(location: Coordinates, units: Units) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", location.latitude.to_string()),
        ("longitude", location.longitude.to_string()),
        ("temperature_unit", units.temperature_param().to_string()),
        ("wind_speed_unit", units.wind_speed_param().to_string()),
        ("timezone", "auto".to_string()),
    ]
}

fn current_from(
    response: ForecastResponse,
    location: Coordinates,
    units: Units,
) -> Result<CurrentWeather, WeatherError> {
    let current = response
        .current
        .ok_or_else(|| WeatherError::Malformed("missing 'current' block".into()))?;

    Ok(CurrentWeather {
        location,
        timezone: response.timezone,
        observed_at: current.time,
        temperature: current.temperature_2m,
        feels_like: current.apparent_temperature,
        humidity: current.relative_humidity_2m,
        wind_speed: current.wind_speed_10m,
        wind_direction: compass(current.wind_direction_10m).to_string(),
        weather_code: current.weather_code,
        conditions: describe(current.weather_code).to_string(),
        units: UnitLabels::from(units),
    })
}

fn forecast_from(
    response: ForecastResponse,
    location: Coordinates,
    units: Units,
    hours: u16,
) -> Result<Forecast, WeatherError> {
    let hourly = response
        .hourly
        .ok_or_else(|| WeatherError::Malformed("missing 'hourly' block".into()))?;

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();
    let entries = hourly
        .time
        .iter()
        .take(usize::from(hours))
        .enumerate()
        .map(|(i, time)| {
            let weather_code = hourly.weather_code.get(i).copied().flatten();
            HourlyForecast {
                time: time.clone(),
                temperature: at(&hourly.temperature_2m, i),
                precipitation_probability: at(&hourly.precipitation_probability, i),
                wind_speed: at(&hourly.wind_speed_10m, i),
                weather_code,
                conditions: weather_code.map_or("Unknown", describe).to_string(),
            }
        })
        .collect();

    Ok(Forecast {
        location,
        timezone: response.timezone,
        units: UnitLabels::from(units),
        hourly: entries,
    })
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_current(
        &self,
        location: Coordinates,
        units: Units,
    ) -> Result<CurrentWeather, WeatherError> {
        let mut query = base_query(location, units);
        query.push(("current", CURRENT_FIELDS.to_string()));

        let response = self.get(&query).await?;
        current_from(response, location, units)
    }

    async fn fetch_forecast(
        &self,
        location: Coordinates,
        units: Units,
        hours: u16,
    ) -> Result<Forecast, WeatherError> {
        let mut query = base_query(location, units);
        query.push(("hourly", HOURLY_FIELDS.to_string()));
        query.push(("forecast_hours", hours.to_string()));

        let response = self.get(&query).await?;
        forecast_from(response, location, units, hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sf() -> Coordinates {
        Coordinates::new(37.7749, -122.4194).unwrap()
    }

    fn parse(value: serde_json::Value) -> ForecastResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_current_from_response() {
        let response = parse(json!({
            "latitude": 37.77,
            "longitude": -122.42,
            "timezone": "America/Los_Angeles",
            "current": {
                "time": "2024-06-01T12:00",
                "interval": 900,
                "temperature_2m": 17.3,
                "relative_humidity_2m": 72,
                "apparent_temperature": 16.1,
                "weather_code": 2,
                "wind_speed_10m": 14.8,
                "wind_direction_10m": 270
            }
        }));

        let current = current_from(response, sf(), Units::Celsius).unwrap();
        assert_eq!(current.temperature, 17.3);
        assert_eq!(current.humidity, 72.0);
        assert_eq!(current.conditions, "Partly cloudy");
        assert_eq!(current.wind_direction, "W");
        assert_eq!(current.timezone, "America/Los_Angeles");
        assert_eq!(current.units.temperature, "°C");
    }

    #[test]
    fn test_current_requires_current_block() {
        let err = current_from(parse(json!({"timezone": "GMT"})), sf(), Units::Celsius).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[test]
    fn test_forecast_truncates_and_tolerates_gaps() {
        let response = parse(json!({
            "timezone": "GMT",
            "hourly": {
                "time": ["2024-06-01T00:00", "2024-06-01T01:00", "2024-06-01T02:00"],
                "temperature_2m": [60.1, null, 58.0],
                "precipitation_probability": [10, 20],
                "weather_code": [0, 61, null],
                "wind_speed_10m": [3.2, 4.1, 5.0]
            }
        }));

        let forecast = forecast_from(response, sf(), Units::Fahrenheit, 2).unwrap();
        assert_eq!(forecast.hourly.len(), 2);
        assert_eq!(forecast.units.wind_speed, "mph");

        let second = &forecast.hourly[1];
        assert_eq!(second.temperature, None);
        assert_eq!(second.precipitation_probability, Some(20.0));
        assert_eq!(second.conditions, "Slight rain");

        let all = forecast_from(
            parse(json!({"hourly": {"time": ["t0", "t1", "t2"], "weather_code": [0, 61, null]}})),
            sf(),
            Units::Celsius,
            24,
        )
        .unwrap();
        assert_eq!(all.hourly.len(), 3);
        assert_eq!(all.hourly[2].conditions, "Unknown");
        assert_eq!(all.hourly[2].precipitation_probability, None);
    }

    #[test]
    fn test_base_query_uses_units() {
        let query = base_query(sf(), Units::Fahrenheit);
        assert!(query.contains(&("temperature_unit", "fahrenheit".to_string())));
        assert!(query.contains(&("wind_speed_unit", "mph".to_string())));
        assert!(query.contains(&("latitude", "37.7749".to_string())));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let provider = OpenMeteoProvider::new("https://api.open-meteo.com/v1/").unwrap();
        assert_eq!(provider.base_url, DEFAULT_API_BASE);
    }
}
