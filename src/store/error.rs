//! Store error types

use thiserror::Error;

use crate::client::ClientError;
use crate::model::FaturaId;

/// Errors returned by invoice store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend call failed
    #[error("{0}")]
    Client(#[from] ClientError),

    /// No local record with this identifier
    #[error("Invoice not found: {0}")]
    NotFound(FaturaId),

    /// Fields rejected before any request was sent
    #[error("Invalid invoice: {0}")]
    Validation(String),

    /// The user declined a destructive action
    #[error("Action cancelled")]
    Cancelled,

    #[error("Invoice {0} is already paid")]
    AlreadyPaid(FaturaId),

    /// Edit submitted while no invoice was selected for editing
    #[error("No invoice selected for editing")]
    NothingSelected,

    /// Checkout session could not be created and demo mode is off
    #[error("Payment unavailable: {0}")]
    PaymentUnavailable(#[source] ClientError),
}

impl StoreError {
    /// One human-readable line for the notification surface
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Client(e) => e.user_message(),
            StoreError::PaymentUnavailable(e) => {
                format!("Could not start the payment: {}", e.user_message())
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(StoreError::NotFound(9).to_string(), "Invoice not found: 9");
        assert_eq!(StoreError::AlreadyPaid(2).to_string(), "Invoice 2 is already paid");
    }

    #[test]
    fn test_client_error_conversion() {
        let err: StoreError = ClientError::Timeout.into();
        assert!(matches!(err, StoreError::Client(ClientError::Timeout)));
        assert_eq!(err.user_message(), "The API took too long to respond");
    }

    #[test]
    fn test_payment_message() {
        let err = StoreError::PaymentUnavailable(ClientError::Network("refused".into()));
        assert_eq!(
            err.user_message(),
            "Could not start the payment: Could not connect to the API"
        );
    }
}
