//! Relational Store Abstraction
//!
//! Provides a service-agnostic trait for the hosted relational store the
//! catalog runs against. The contract mirrors what a typical
//! backend-as-a-service row API offers: insert, filtered select, update,
//! delete with an affected-row count, and upsert with an explicit conflict
//! target.
//!
//! ## Design Philosophy
//!
//! Rows travel as `serde_json::Value` objects and are (de)serialized into
//! typed models at the call site. This keeps the trait free of per-table
//! generics while still letting every caller work with strong types.
//!
//! The delete row count is part of the contract: callers must be able to
//! distinguish "deleted" from "matched nothing" (including the case where a
//! server-side authorization policy silently filters the row out).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Equality filter on a named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// Create an equality filter, converting the value via `Into<Value>`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Row-level access to named record collections on the hosted store.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert a row and return it as stored (server-populated columns such
    /// as `id` and `created_at` filled in).
    ///
    /// # Errors
    /// - `BackendError::Conflict` if the row violates a unique constraint
    /// - `BackendError::Store` for any other store-level failure
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Select all rows matching every filter (conjunction). No filters
    /// selects the whole collection.
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>>;

    /// Apply `changes` (a partial row object) to all matching rows.
    ///
    /// # Returns
    /// The number of rows updated.
    async fn update(&self, table: &str, filters: &[Filter], changes: Value) -> Result<u64>;

    /// Delete all matching rows.
    ///
    /// # Returns
    /// The number of rows actually removed. Zero is a valid outcome and the
    /// caller decides whether it is an error.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64>;

    /// Insert the row, or overwrite the existing row sharing the same values
    /// in `conflict_columns`.
    async fn upsert(&self, table: &str, row: Value, conflict_columns: &[&str]) -> Result<()>;
}
