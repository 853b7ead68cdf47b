//! # Core Configuration
//!
//! Builder-pattern configuration for the catalog core. Holds the backend
//! handles every module talks through plus the tuning knobs the listing
//! surfaces share. Validation is fail-fast: missing required handles produce
//! actionable errors at build time instead of panics at first use.
//!
//! ## Required Dependencies
//!
//! - `TableStore` - row access to the hosted relational store
//! - `BlobStore` - the sheet-PDF object store
//! - `IdentityProvider` - credential and session management
//! - root admin email - the one address that is always privileged
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//! # use backend_traits::{TableStore, BlobStore, IdentityProvider};
//! # fn handles() -> (Arc<dyn TableStore>, Arc<dyn BlobStore>, Arc<dyn IdentityProvider>) { todo!() }
//!
//! let (tables, blobs, identity) = handles();
//! let config = CoreConfig::builder()
//!     .table_store(tables)
//!     .blob_store(blobs)
//!     .identity_provider(identity)
//!     .root_admin_email("admin@lege.music")
//!     .build()
//!     .expect("failed to build config");
//! ```

use crate::error::{Error, Result};
use backend_traits::{BlobStore, IdentityProvider, TableStore};
use std::sync::Arc;
use std::time::Duration;

/// Storage bucket holding the sheet PDFs.
pub const DEFAULT_BUCKET: &str = "music-sheets";

/// Items per page on every listing surface.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// Maximum entries in a live-search suggestion dropdown.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Delay applied to interactive text input before recomputing filters.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Core configuration for the catalog.
///
/// Use [`CoreConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Row access to the hosted relational store.
    pub table_store: Arc<dyn TableStore>,

    /// The sheet-PDF object store.
    pub blob_store: Arc<dyn BlobStore>,

    /// Credential and session management.
    pub identity_provider: Arc<dyn IdentityProvider>,

    /// The always-privileged, irrevocable admin email.
    pub root_admin_email: String,

    /// Storage bucket name.
    pub bucket: String,

    /// Items per page on listing surfaces.
    pub page_size: u32,

    /// Maximum live-search suggestions.
    pub suggestion_limit: usize,

    /// Debounce delay for interactive text input.
    pub debounce_delay: Duration,
}

impl CoreConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    table_store: Option<Arc<dyn TableStore>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    root_admin_email: Option<String>,
    bucket: Option<String>,
    page_size: Option<u32>,
    suggestion_limit: Option<usize>,
    debounce_delay: Option<Duration>,
}

impl CoreConfigBuilder {
    pub fn table_store(mut self, store: Arc<dyn TableStore>) -> Self {
        self.table_store = Some(store);
        self
    }

    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    pub fn root_admin_email(mut self, email: impl Into<String>) -> Self {
        self.root_admin_email = Some(email.into());
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = Some(limit);
        self
    }

    pub fn debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = Some(delay);
        self
    }

    /// Builds the configuration, validating required dependencies.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` naming the first missing required
    /// handle, or `Error::Config` for invalid tuning values.
    pub fn build(self) -> Result<CoreConfig> {
        let table_store = self.table_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "TableStore".to_string(),
            message: "provide a table store via CoreConfigBuilder::table_store".to_string(),
        })?;
        let blob_store = self.blob_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "BlobStore".to_string(),
            message: "provide a blob store via CoreConfigBuilder::blob_store".to_string(),
        })?;
        let identity_provider =
            self.identity_provider
                .ok_or_else(|| Error::CapabilityMissing {
                    capability: "IdentityProvider".to_string(),
                    message: "provide an identity provider via CoreConfigBuilder::identity_provider"
                        .to_string(),
                })?;
        let root_admin_email = self
            .root_admin_email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| Error::Config("root_admin_email is required".to_string()))?;

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(Error::Config("page_size must be positive".to_string()));
        }

        Ok(CoreConfig {
            table_store,
            blob_store,
            identity_provider,
            root_admin_email,
            bucket: self.bucket.unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            page_size,
            suggestion_limit: self.suggestion_limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT),
            debounce_delay: self.debounce_delay.unwrap_or(DEFAULT_DEBOUNCE_DELAY),
        })
    }
}
