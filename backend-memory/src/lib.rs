//! # Backend Memory
//!
//! In-process implementations of the `backend-traits` contracts, used by
//! tests and demos across the workspace. The table store enforces the same
//! unique constraints the hosted schema declares and offers failure
//! injection for exercising partial-failure paths; the blob store hands out
//! public URLs in the hosted service's path shape.

pub mod blob;
pub mod identity;
pub mod table;

pub use blob::MemoryBlobStore;
pub use identity::MemoryIdentityProvider;
pub use table::{MemoryTableStore, TableOp};
