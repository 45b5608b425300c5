//! Backend REST Client
//!
//! The invoice backend is an external collaborator reached only over HTTP.
//! [`FaturaBackend`] is the seam the store talks to; [`HttpBackend`] is the
//! reqwest implementation used by the CLI.

mod error;
mod http;

pub use error::ClientError;
pub use http::HttpBackend;

use async_trait::async_trait;

use crate::model::{
    CheckoutSession, Fatura, FaturaId, FaturaInput, HealthResponse, ProcessEmailResponse,
};

/// Operations the invoice backend exposes
#[async_trait]
pub trait FaturaBackend: Send + Sync {
    /// `GET /faturas/`
    async fn list(&self) -> Result<Vec<Fatura>, ClientError>;

    /// `GET /faturas/{id}`
    async fn get(&self, id: FaturaId) -> Result<Fatura, ClientError>;

    /// `POST /faturas/`
    async fn create(&self, input: &FaturaInput) -> Result<Fatura, ClientError>;

    /// `PUT /faturas/{id}` (full replace)
    async fn update(&self, id: FaturaId, input: &FaturaInput) -> Result<Fatura, ClientError>;

    /// `DELETE /faturas/{id}`
    async fn delete(&self, id: FaturaId) -> Result<(), ClientError>;

    /// `POST /processar_email/`
    async fn process_emails(&self) -> Result<ProcessEmailResponse, ClientError>;

    /// `POST /create-checkout-session/{id}`
    async fn checkout_session(&self, id: FaturaId) -> Result<CheckoutSession, ClientError>;

    /// `GET /health`
    async fn health(&self) -> Result<HealthResponse, ClientError>;
}
