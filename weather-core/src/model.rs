use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// One decoded current-weather observation.
///
/// Values are kept exactly as the provider sent them; temperatures are
/// Celsius because the request always asks for metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherModel {
    pub location_name: String,
    pub country_code: String,
    pub observed_at_epoch_seconds: u64,
    pub temperature_c: f64,
    pub temperature_min_c: f64,
    pub temperature_max_c: f64,
    /// hPa.
    pub pressure: Option<f64>,
    /// Percent.
    pub humidity: Option<f64>,
    pub sunrise_epoch_seconds: u64,
    pub sunset_epoch_seconds: u64,
    pub wind_speed: f64,
    pub condition_description: String,
}

impl WeatherModel {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.observed_at_epoch_seconds)
    }

    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.sunrise_epoch_seconds)
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.sunset_epoch_seconds)
    }
}

fn epoch_to_utc(secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Lifecycle of the most recent query, as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready(WeatherModel),
    Failed(FetchError),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    /// `Ready` or `Failed`.
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchState::Ready(_) | FetchState::Failed(_))
    }

    pub fn model(&self) -> Option<&WeatherModel> {
        match self {
            FetchState::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchState::Failed(err) => Some(err),
            _ => None,
        }
    }
}
