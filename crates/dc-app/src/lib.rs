//! Shared application service layer for dercache.
//!
//! Ties the store, the query encoder and the backend together: call sites
//! ask [`ModelService`] for models, and [`FetchSite`] decides whether a
//! request actually goes out.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod service;

pub use client::{Backend, HttpBackend};
pub use config::ClientConfig;
pub use envelope::Envelope;
pub use error::{AppError, AppResult};
pub use fetch::{CancelToken, FetchOutcome, FetchSite, FetchState, SharedStore, shared_store};
pub use service::ModelService;
