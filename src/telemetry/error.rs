use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid telemetry payload: {0}")]
    InvalidPayload(String),
    #[error("telemetry field '{field}' is not a number: {value}")]
    NotANumber { field: &'static str, value: String },
    #[error("telemetry field '{field}' is not finite")]
    NonFinite { field: &'static str },
    #[error("malformed stream event: {0}")]
    MalformedEvent(String),
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed closed: {0}")]
    Closed(String),
}
