use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{
    aggregate::ForecastOptions,
    error::{ClientError, TransformError},
    model::{Coordinates, CurrentConditions, DailyForecast, Language, Units},
    transform::{normalize_current, normalize_forecast},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Where to ask the weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coords(Coordinates),
}

impl Location {
    fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Location::City(name) => vec![("q", name.clone())],
            Location::Coords(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::City(name) => f.write_str(name),
            Location::Coords(c) => write!(f, "{:.4}, {:.4}", c.lat, c.lon),
        }
    }
}

/// Exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Client for the OpenWeather 2.5 current-weather and 5-day forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn current(
        &self,
        location: &Location,
        units: Units,
        language: Language,
    ) -> Result<CurrentConditions, ClientError> {
        let payload = self.get_json("weather", location, units, language).await?;
        Ok(normalize_current(&payload)?)
    }

    /// Raw forecast response, for callers that need more than the daily list.
    pub async fn forecast_payload(
        &self,
        location: &Location,
        units: Units,
        language: Language,
    ) -> Result<Value, ClientError> {
        self.get_json("forecast", location, units, language).await
    }

    pub async fn forecast(
        &self,
        location: &Location,
        units: Units,
        language: Language,
        options: &ForecastOptions,
    ) -> Result<Vec<DailyForecast>, ClientError> {
        let payload = self.forecast_payload(location, units, language).await?;
        Ok(normalize_forecast(&payload, options)?)
    }

    async fn get_json(
        &self,
        endpoint: &str,
        location: &Location,
        units: Units,
        language: Language,
    ) -> Result<Value, ClientError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut query = location.query();
        query.push(("appid", self.api_key.clone()));
        query.push(("units", units.as_str().to_string()));
        query.push(("lang", language.as_str().to_string()));

        let mut attempt = 0;
        loop {
            tracing::debug!(%url, %location, attempt, "Requesting OpenWeather");

            let outcome = self.http.get(&url).query(&query).send().await;
            let retries_left = attempt < self.retry.max_retries;

            let res = match outcome {
                Ok(res) => res,
                Err(err) if retries_left && is_retryable_error(&err) => {
                    tracing::warn!(%url, error = %err, "OpenWeather request failed, retrying");
                    self.backoff(&mut attempt).await;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let status = res.status();
            if retries_left && is_retryable_status(status) {
                tracing::warn!(%url, %status, "OpenWeather returned a transient error, retrying");
                self.backoff(&mut attempt).await;
                continue;
            }

            let body = res.text().await?;

            if status == StatusCode::NOT_FOUND {
                if let Location::City(name) = location {
                    return Err(ClientError::CityNotFound(name.clone()));
                }
            }

            if !status.is_success() {
                return Err(ClientError::Api { status, body: truncate_body(&body) });
            }

            return serde_json::from_str(&body)
                .map_err(|e| ClientError::Transform(TransformError::Malformed(e)));
        }
    }

    async fn backoff(&self, attempt: &mut u32) {
        tokio::time::sleep(self.retry.delay_for_attempt(*attempt)).await;
        *attempt += 1;
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
