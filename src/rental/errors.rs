use thiserror::Error;

/// Errors from the energy rental market API
#[derive(Debug, Clone, Error)]
pub enum RentalError {
    #[error("Rental market transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    /// The market answered with an error status or error code
    #[error("Rental market API error: {message} (code: {code:?})")]
    Api { code: Option<i64>, message: String },

    #[error("Rental market decode error: {0}")]
    Decode(String),
}

impl RentalError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RentalError::Transport { .. } => true,
            RentalError::Api { code, .. } => matches!(code, Some(c) if *c == 429 || (500..600).contains(c)),
            RentalError::Decode(_) => false,
        }
    }

    pub fn from_reqwest(err: reqwest::Error, endpoint: &str) -> Self {
        if err.is_decode() {
            RentalError::Decode(err.to_string())
        } else {
            RentalError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}
