//! Bearer token authentication.

pub mod jwt;
pub mod middleware;
pub mod models;

use tubely_core::AppError;
use uuid::Uuid;

pub use jwt::JwtAuthenticator;
pub use middleware::auth_middleware;
pub use models::AuthUser;

/// Resolves a bearer credential to the identity of its owner.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<Uuid, AppError>;
}
