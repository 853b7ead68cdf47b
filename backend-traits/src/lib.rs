//! # Backend Traits
//!
//! Service-agnostic contracts for the hosted backend the catalog core talks
//! to. The backend is treated as a black box providing three capabilities:
//!
//! - [`auth::IdentityProvider`] - credential and session management
//! - [`table::TableStore`] - row-level access to named record collections
//! - [`blob::BlobStore`] - bucket-scoped object storage with public URLs
//!
//! Concrete implementations live outside this crate (`backend-memory`
//! provides the in-process one used by tests and demos).

pub mod auth;
pub mod blob;
pub mod error;
pub mod table;

pub use auth::{Identity, IdentityProvider, Session};
pub use blob::BlobStore;
pub use error::{BackendError, Result};
pub use table::{Filter, TableStore};
