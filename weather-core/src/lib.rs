//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - The decoded weather snapshot and the query lifecycle state
//! - Decoding of the provider's current-weather payload
//! - The HTTP client for the provider
//! - The controller that drives a query from submission to `Ready`/`Failed`
//! - Configuration & credentials handling
//!
//! It has no terminal or UI dependencies; front-ends read
//! [`WeatherFetchController::current_state`] or subscribe to transitions.

pub mod client;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod model;

pub use client::{OpenWeatherClient, WeatherSource};
pub use config::Config;
pub use controller::{DEFAULT_CITY, StateReceiver, WeatherFetchController};
pub use decoder::decode;
pub use error::{DecodeError, FetchError, NetworkError, ValidationError};
pub use model::{FetchState, WeatherModel};
