//! Display formatting for a weather snapshot.
//!
//! Everything here is presentation only: the snapshot's raw values are never
//! changed, just turned into text.

use chrono::{DateTime, TimeZone, Utc};
use cityweather_core::WeatherModel;
use std::fmt::Display;

pub const GENERIC_ERROR: &str = "Could not load the weather. Check the city name and your connection.";
pub const LOADING: &str = "Loading…";
pub const EMPTY_CITY: &str = "Type a city name.";

pub fn snapshot<Tz>(model: &WeatherModel, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{location}, {country}\n\
         Updated at: {updated}\n\
         {condition}\n\
         {temp}°C\n\
         Min: {min}°C   Max: {max}°C\n\
         Sunrise: {sunrise}   Sunset: {sunset}\n\
         Wind: {wind}\n\
         Pressure: {pressure}\n\
         Humidity: {humidity}",
        location = model.location_name,
        country = model.country_code,
        updated = clock(model.observed_at(), tz, "%d/%m/%Y %I:%M %p"),
        condition = capitalize(&model.condition_description),
        temp = model.temperature_c,
        min = model.temperature_min_c,
        max = model.temperature_max_c,
        sunrise = clock(model.sunrise(), tz, "%I:%M %p"),
        sunset = clock(model.sunset(), tz, "%I:%M %p"),
        wind = model.wind_speed,
        pressure = optional(model.pressure),
        humidity = optional(model.humidity),
    )
}

fn clock<Tz>(at: Option<DateTime<Utc>>, tz: &Tz, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.map(|at| at.with_timezone(tz).format(pattern).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Upper-cases the first character only.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn model() -> WeatherModel {
        WeatherModel {
            location_name: "Sao Paulo".to_string(),
            country_code: "BR".to_string(),
            observed_at_epoch_seconds: 1_700_010_000,
            temperature_c: 21.5,
            temperature_min_c: 19.0,
            temperature_max_c: 23.0,
            pressure: Some(1015.0),
            humidity: None,
            sunrise_epoch_seconds: 1_700_000_000,
            sunset_epoch_seconds: 1_700_040_000,
            wind_speed: 3.2,
            condition_description: "céu limpo".to_string(),
        }
    }

    #[test]
    fn capitalizes_first_letter_only() {
        assert_eq!(capitalize("céu limpo"), "Céu limpo");
        assert_eq!(capitalize("ésta"), "Ésta");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn renders_in_given_timezone() {
        let text = snapshot(&model(), &Utc);

        assert!(text.starts_with("Sao Paulo, BR\n"));
        // 1700010000 = 2023-11-15 01:00:00 UTC
        assert!(text.contains("Updated at: 15/11/2023 01:00 AM"));
        assert!(text.contains("Céu limpo"));
        assert!(text.contains("21.5°C"));
        assert!(text.contains("Min: 19°C   Max: 23°C"));
        assert!(text.contains("Pressure: 1015"));
        assert!(text.contains("Humidity: -"));
    }

    #[test]
    fn local_offset_shifts_clock_not_data() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let m = model();
        let text = snapshot(&m, &brt);

        // 22:13 UTC is 19:13 at UTC-3
        assert!(text.contains("Sunrise: 07:13 PM"));
        assert_eq!(m.sunrise_epoch_seconds, 1_700_000_000);
    }
}
