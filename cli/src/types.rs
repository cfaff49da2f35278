use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Measurement system for weather values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Units {
    /// `temperature_unit` query value
    pub fn temperature_param(self) -> &'static str {
        match self {
            Units::Celsius => "celsius",
            Units::Fahrenheit => "fahrenheit",
        }
    }

    /// `wind_speed_unit` query value
    pub fn wind_speed_param(self) -> &'static str {
        match self {
            Units::Celsius => "kmh",
            Units::Fahrenheit => "mph",
        }
    }

    pub fn temperature_label(self) -> &'static str {
        match self {
            Units::Celsius => "°C",
            Units::Fahrenheit => "°F",
        }
    }

    pub fn wind_speed_label(self) -> &'static str {
        match self {
            Units::Celsius => "km/h",
            Units::Fahrenheit => "mph",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.temperature_param())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Transport {
    Http,
    Stdio,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Http => write!(f, "http"),
            Transport::Stdio => write!(f, "stdio"),
        }
    }
}
