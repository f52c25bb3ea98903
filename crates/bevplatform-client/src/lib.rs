//! REST client for the bevplatform case-management API.

mod actions;
mod auth;
pub mod config;
pub mod error;
mod http;

pub use actions::AppropriationPage;
pub use config::ClientConfig;
pub use error::{ApiError, GENERIC_ERROR};
pub use http::{ApiClient, Query};
