//! # Faturas
//!
//! Terminal client for the Moara Energia invoice backend. Invoices are
//! fetched over REST into a single in-memory store, which keeps every
//! mounted view in step with each confirmed change.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration, named environments, persisted selection
//! - [`client`]: the backend seam and its reqwest implementation
//! - [`store`]: the invoice store, filtering, payments, email processing
//! - [`notify`]: short-lived user notifications
//! - [`dashboard`]: aggregates derived from the invoice sequence
//! - [`view`]: section visibility and terminal renderers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use faturas::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let backend = HttpBackend::from_config(&config)?;
//!     let store = InvoiceStore::new(Arc::new(backend), Notifier::default());
//!
//!     store.load().await?;
//!
//!     let pending = store.filter(&FaturaFilter::new().with_status(PaidStatus::Pending));
//!     println!("{} pending invoice(s)", pending.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod dashboard;
pub mod model;
pub mod notify;
pub mod store;
pub mod view;

pub use client::{ClientError, FaturaBackend, HttpBackend};

pub use config::{
    generate_default_config, Config, ConfigError, Endpoint, EnvironmentInfo,
    EnvironmentSelection, LoggingConfig,
};

pub use dashboard::DashboardStats;

pub use model::{
    CheckoutSession, Fatura, FaturaId, FaturaInput, HealthResponse, ProcessEmailResponse,
};

pub use notify::{Notification, NotificationLevel, Notifier};

pub use store::{
    AlwaysConfirm, Confirm, FaturaFilter, InvoiceStore, LoadOutcome, PaidStatus, PaymentOutcome,
    ProcessLog, StoreError, StoreResult,
};

pub use view::{Layout, Modal, Section, TerminalView, View, ViewController};
