//! # Core Runtime
//!
//! Shared runtime services for the catalog core: the event bus modules emit
//! state changes through, the `tracing` logging bootstrap, and the
//! builder-pattern configuration that wires backend handles into the rest of
//! the workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CatalogEvent, CoreEvent, EventBus, SessionEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
