//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - The canonical weather model and the transformation from OpenWeather payloads
//! - Day bucketing and reduction of 3-hour forecast samples
//! - An OpenWeather client, persisted preferences and saved cities
//!
//! Transformation and aggregation are pure and do no I/O; only [`client`] and
//! [`config`] touch the network or the filesystem.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod raw;
pub mod transform;

pub use aggregate::{BucketZone, DEFAULT_MAX_DAYS, ForecastOptions};
pub use client::{Location, OpenWeatherClient, RetryPolicy};
pub use config::{Config, SavedCity};
pub use error::{ClientError, TransformError};
pub use model::{
    Coordinates, CurrentConditions, CurrentTemperature, DailyForecast, DailyTemperature, Details,
    Language, Sun, Theme, Units, WeatherDescriptor,
};
pub use transform::{
    normalize_current, normalize_forecast, normalize_forecast_list, parse_current, parse_forecast,
};
