//! Authentication module
//!
//! The identity provider is an external boundary: each request's
//! bearer credential is verified through it and the resulting
//! identity is trusted as-is.

mod identity;
mod middleware;

pub use identity::{GoogleIdentityProvider, IdentityProvider, VerifiedIdentity};
pub use middleware::CurrentUser;
