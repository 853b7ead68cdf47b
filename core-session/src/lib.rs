//! # Core Session
//!
//! Bridges the hosted identity provider and the catalog's own view of the
//! signed-in user: account registration, sign-in/sign-out, and two-phase
//! resolution of the provider session into an [`AuthUser`] with a
//! confirmed admin flag.

pub mod error;
pub mod resolver;

pub use error::{Result, SessionError};
pub use resolver::{AuthUser, SessionResolver, MIN_USERNAME_LEN};
