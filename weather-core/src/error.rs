//! Error taxonomy for a fetch lifecycle.
//!
//! Every error exposes a short machine-readable `reason()` that is stable
//! across releases and suitable for logs and diagnostics. `Display` wraps the
//! same reason in a human sentence.

use thiserror::Error;

/// Rejected user input. Raised before any network attempt and never
/// reflected in [`crate::FetchState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("city name must not be empty")]
    EmptyCityName,
}

impl ValidationError {
    pub fn reason(&self) -> String {
        match self {
            ValidationError::EmptyCityName => "empty-city-name".to_string(),
        }
    }
}

/// Transport-level failure while talking to the weather provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("weather provider is unreachable")]
    Unreachable,

    #[error("weather provider answered with HTTP status {0}")]
    HttpStatus(u16),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl NetworkError {
    pub fn reason(&self) -> String {
        match self {
            NetworkError::Unreachable => "unreachable".to_string(),
            NetworkError::HttpStatus(code) => format!("http-status:{code}"),
            NetworkError::Transport(detail) => format!("transport:{detail}"),
        }
    }
}

/// The request URL carries the API key, so it is stripped before the error
/// text is kept.
impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_connect() {
            NetworkError::Unreachable
        } else if let Some(status) = err.status() {
            NetworkError::HttpStatus(status.as_u16())
        } else {
            NetworkError::Transport(err.to_string())
        }
    }
}

/// The payload could not be turned into a [`crate::WeatherModel`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON")]
    MalformedJson,

    /// Dotted path of the absent key, e.g. `main.temp` or `weather[0]`.
    #[error("payload is missing `{0}`")]
    MissingField(String),

    /// Present but unreadable as the expected type.
    #[error("payload field `{0}` has an unexpected value")]
    InvalidField(String),
}

impl DecodeError {
    pub fn reason(&self) -> String {
        match self {
            DecodeError::MalformedJson => "malformed-json".to_string(),
            DecodeError::MissingField(path) => format!("missing-field:{path}"),
            DecodeError::InvalidField(path) => format!("invalid-field:{path}"),
        }
    }
}

/// Why a fetch lifecycle ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl FetchError {
    pub fn reason(&self) -> String {
        match self {
            FetchError::Network(err) => err.reason(),
            FetchError::Decode(err) => err.reason(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_match_wire_names() {
        assert_eq!(ValidationError::EmptyCityName.reason(), "empty-city-name");
        assert_eq!(NetworkError::Unreachable.reason(), "unreachable");
        assert_eq!(NetworkError::HttpStatus(404).reason(), "http-status:404");
        assert_eq!(
            NetworkError::Transport("reset".into()).reason(),
            "transport:reset"
        );
        assert_eq!(DecodeError::MalformedJson.reason(), "malformed-json");
        assert_eq!(
            DecodeError::MissingField("main.temp".into()).reason(),
            "missing-field:main.temp"
        );
    }

    #[test]
    fn fetch_error_keeps_origin() {
        let err: FetchError = NetworkError::HttpStatus(401).into();
        assert!(err.is_network());
        assert_eq!(err.reason(), "http-status:401");

        let err: FetchError = DecodeError::MissingField("dt".into()).into();
        assert!(err.is_decode());
        assert_eq!(err.to_string(), "payload is missing `dt`");
    }
}
