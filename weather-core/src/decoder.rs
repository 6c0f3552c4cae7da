//! Decoding of the OpenWeatherMap "current weather" payload.
//!
//! The schema below mirrors the provider's JSON, with every consumed leaf
//! optional so that absence can be reported by path instead of as a generic
//! serde failure. Containers fall back to [`Shape::Other`] when the value is
//! not the expected JSON type, which keeps deserialization itself infallible
//! for any JSON object.

use serde::Deserialize;
use serde_json::Value;

use crate::{error::DecodeError, model::WeatherModel};

/// Parse a raw provider response into a [`WeatherModel`].
///
/// Pure function of its input; never returns a partially filled model.
pub fn decode(raw: impl AsRef<[u8]>) -> Result<WeatherModel, DecodeError> {
    let payload = parse(raw.as_ref())?;

    let main = require_object(payload.main, "main")?;
    let sys = require_object(payload.sys, "sys")?;
    let wind = require_object(payload.wind, "wind")?;
    let weather = require_object(payload.weather, "weather")?;
    let name = require(payload.name, "name")?;
    let dt = require(payload.dt, "dt")?;

    let condition = weather
        .into_iter()
        .next()
        .ok_or_else(|| DecodeError::MissingField("weather[0]".to_string()))?;

    Ok(WeatherModel {
        location_name: name.into_text("name")?,
        country_code: require(sys.country, "sys.country")?.into_text("sys.country")?,
        observed_at_epoch_seconds: dt.into_epoch("dt")?,
        temperature_c: require(main.temp, "main.temp")?.into_f64("main.temp")?,
        temperature_min_c: require(main.temp_min, "main.temp_min")?.into_f64("main.temp_min")?,
        temperature_max_c: require(main.temp_max, "main.temp_max")?.into_f64("main.temp_max")?,
        pressure: main
            .pressure
            .map(|v| v.into_f64("main.pressure"))
            .transpose()?,
        humidity: main
            .humidity
            .map(|v| v.into_f64("main.humidity"))
            .transpose()?,
        sunrise_epoch_seconds: require(sys.sunrise, "sys.sunrise")?.into_epoch("sys.sunrise")?,
        sunset_epoch_seconds: require(sys.sunset, "sys.sunset")?.into_epoch("sys.sunset")?,
        wind_speed: require(wind.speed, "wind.speed")?.into_f64("wind.speed")?,
        condition_description: require(condition.description, "weather[0].description")?
            .into_text("weather[0].description")?,
    })
}

fn parse(raw: &[u8]) -> Result<OwCurrentResponse, DecodeError> {
    let value: Value = serde_json::from_slice(raw).map_err(|_| DecodeError::MalformedJson)?;

    if !value.is_object() {
        return Err(DecodeError::InvalidField("$".to_string()));
    }

    serde_json::from_value(value).map_err(|err| DecodeError::InvalidField(err.to_string()))
}

fn require<T>(value: Option<T>, path: &str) -> Result<T, DecodeError> {
    value.ok_or_else(|| DecodeError::MissingField(path.to_string()))
}

fn require_object<T>(value: Option<Shape<T>>, path: &str) -> Result<T, DecodeError> {
    match require(value, path)? {
        Shape::Expected(inner) => Ok(inner),
        Shape::Other(_) => Err(DecodeError::InvalidField(path.to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Shape<T> {
    Expected(T),
    Other(Value),
}

/// A leaf value as transmitted. Numbers may arrive as JSON numbers or as
/// strings holding a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(u64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl Scalar {
    fn into_f64(self, path: &str) -> Result<f64, DecodeError> {
        let parsed = match self {
            Scalar::Int(n) => Some(n as f64),
            Scalar::Float(n) => Some(n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            Scalar::Other(_) => None,
        };

        parsed
            .filter(|n| n.is_finite())
            .ok_or_else(|| DecodeError::InvalidField(path.to_string()))
    }

    fn into_epoch(self, path: &str) -> Result<u64, DecodeError> {
        let parsed = match self {
            Scalar::Int(n) => Some(n),
            Scalar::Float(n) if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => {
                Some(n as u64)
            }
            Scalar::Text(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        parsed.ok_or_else(|| DecodeError::InvalidField(path.to_string()))
    }

    fn into_text(self, path: &str) -> Result<String, DecodeError> {
        match self {
            Scalar::Text(s) => Ok(s),
            _ => Err(DecodeError::InvalidField(path.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<Scalar>,
    temp_min: Option<Scalar>,
    temp_max: Option<Scalar>,
    pressure: Option<Scalar>,
    humidity: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<Scalar>,
    sunrise: Option<Scalar>,
    sunset: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<Shape<OwMain>>,
    sys: Option<Shape<OwSys>>,
    wind: Option<Shape<OwWind>>,
    weather: Option<Shape<Vec<OwWeather>>>,
    name: Option<Scalar>,
    dt: Option<Scalar>,
}
