//! # Core Catalog
//!
//! The catalog domain: songs with per-key sheet variants, per-user
//! favorites, admin grants, and the listing machinery around them.
//!
//! - [`repository`] - all reads and writes, over the backend traits
//! - [`deletion`] - the client-ordered deletion cascade
//! - [`query`] - the pure in-memory filter/rank/paginate pipeline
//! - [`pagination`] - 1-indexed page types shared by listing surfaces
//! - [`debounce`] - trailing-edge debouncing for interactive input

pub mod debounce;
pub mod deletion;
pub mod error;
pub mod models;
pub mod pagination;
pub mod query;
pub mod repository;

pub use debounce::Debouncer;
pub use deletion::{DeletionReport, DeletionStep, StepOutcome, StepStatus};
pub use error::{CatalogError, Result};
pub use models::{AdminGrant, Category, Instrument, Song, UserProfile, Variant};
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use query::{CategoryFilter, SearchContext, SongQuery};
pub use repository::CatalogRepository;
