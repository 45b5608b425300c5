//! Client error types
//!
//! Every backend failure falls into one of three buckets: the request never
//! completed, the backend answered with a non-success status, or the body
//! could not be decoded.

use thiserror::Error;

/// Detail the backend reports when its database connection is down
const DATABASE_UNAVAILABLE: &str = "Banco de dados não disponível";

/// Errors that can occur when talking to the invoice backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection refused, DNS failure, request rejected before a response
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    /// Non-2xx response; `detail` is the backend's message when it sent one
    #[error("API error {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Missing or undecodable response body
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// One human-readable line for the notification surface
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => "Could not connect to the API".to_string(),
            ClientError::Timeout => "The API took too long to respond".to_string(),
            ClientError::Status { detail, .. } if detail.contains(DATABASE_UNAVAILABLE) => {
                "Backend database connection error".to_string()
            }
            ClientError::Status { status: 404, .. } => "Invoice not found on the server".to_string(),
            ClientError::Status { status, detail } if detail.is_empty() => {
                format!("Server error (HTTP {})", status)
            }
            ClientError::Status { status, detail } => format!("Server error (HTTP {}): {}", status, detail),
            ClientError::Malformed(_) => "Unexpected response from the API".to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                detail: String::new(),
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Status {
            status: 500,
            detail: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: boom");
        assert_eq!(err.status(), Some(500));
        assert_eq!(ClientError::Timeout.status(), None);
    }

    #[test]
    fn test_user_messages() {
        let db = ClientError::Status {
            status: 500,
            detail: "Banco de dados não disponível".to_string(),
        };
        assert_eq!(db.user_message(), "Backend database connection error");

        let bare = ClientError::Status {
            status: 502,
            detail: String::new(),
        };
        assert_eq!(bare.user_message(), "Server error (HTTP 502)");

        let missing = ClientError::Status {
            status: 404,
            detail: "Fatura não encontrada".to_string(),
        };
        assert_eq!(missing.user_message(), "Invoice not found on the server");

        assert_eq!(
            ClientError::Network("refused".to_string()).user_message(),
            "Could not connect to the API"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::Malformed(_)));
    }
}
