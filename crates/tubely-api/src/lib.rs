//! Tubely API Library
//!
//! HTTP handlers, authentication, and application setup for the Tubely video
//! service.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
