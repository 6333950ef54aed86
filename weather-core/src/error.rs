use reqwest::StatusCode;
use thiserror::Error;

/// Failure to turn a vendor payload into the canonical model.
///
/// Optional vendor fields (wind, visibility, pop) never produce these; a
/// documented default is substituted instead.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The payload is not shaped like the vendor schema at all
    /// (wrong JSON type for an object, array or number).
    #[error("Malformed weather payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A field the vendor schema guarantees is absent.
    #[error("Malformed weather payload: missing required field `{0}`")]
    MissingField(&'static str),

    /// A field is present but its value cannot be accepted.
    #[error("Malformed weather payload: invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Forecast sample {index}: {source}")]
    InSample {
        index: usize,
        #[source]
        source: Box<TransformError>,
    },
}

impl TransformError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field, reason: reason.into() }
    }
}

/// Errors raised by [`crate::OpenWeatherClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("OpenWeather request failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ClientError {
    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::CityNotFound(city) => format!("City not found: {city}"),
            Self::Api { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                "The configured API key was rejected".to_string()
            }
            Self::Api { .. } | Self::Transform(_) => {
                "Weather service unavailable, try again later".to_string()
            }
            Self::Network(_) => "Network error, check your connection".to_string(),
        }
    }
}
