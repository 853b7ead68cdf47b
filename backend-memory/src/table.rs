//! In-memory `TableStore`.
//!
//! Rows are JSON objects held per named table. Unique constraints are
//! registered at construction and enforced on insert and upsert, giving
//! tests the same conflict primitive the hosted store provides.
//!
//! Two failure-injection knobs exist for exercising partial-failure paths:
//! - [`MemoryTableStore::fail_next`] makes the next matching operation
//!   return a store error once
//! - [`MemoryTableStore::deny_delete`] makes deletes on a table succeed
//!   while matching zero rows, the shape a server-side authorization policy
//!   produces when it silently filters rows out

use async_trait::async_trait;
use backend_traits::error::{BackendError, Result};
use backend_traits::table::{Filter, TableStore};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Operation selector for [`MemoryTableStore::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOp {
    Insert,
    Select,
    Update,
    Delete,
    Upsert,
}

#[derive(Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    unique: HashMap<String, Vec<Vec<String>>>,
    fail_next: Mutex<HashSet<(String, TableOp)>>,
    deny_delete: Mutex<HashSet<String>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unique constraint over `columns` on `table`.
    pub fn with_unique(mut self, table: &str, columns: &[&str]) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Preconfigured store with the catalog schema's constraints.
    pub fn with_catalog_schema() -> Self {
        Self::new()
            .with_unique("songs", &["id"])
            .with_unique("song_variants", &["song_id", "key"])
            .with_unique("user_favorites", &["user_id", "song_id"])
            .with_unique("admins", &["email"])
            .with_unique("profiles", &["id"])
    }

    /// Make the next `op` on `table` fail once with a store error.
    pub async fn fail_next(&self, table: &str, op: TableOp) {
        self.fail_next.lock().await.insert((table.to_string(), op));
    }

    /// Make deletes on `table` match zero rows without erroring.
    pub async fn deny_delete(&self, table: &str) {
        self.deny_delete.lock().await.insert(table.to_string());
    }

    /// Snapshot of a table's rows, for assertions in tests.
    pub async fn snapshot(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    async fn take_failure(&self, table: &str, op: TableOp) -> Result<()> {
        let mut failures = self.fail_next.lock().await;
        if failures.remove(&(table.to_string(), op)) {
            return Err(BackendError::Store(format!(
                "injected failure: {op:?} on {table}"
            )));
        }
        Ok(())
    }

    fn check_unique(&self, table: &str, rows: &[Value], candidate: &Value) -> Result<()> {
        let Some(constraints) = self.unique.get(table) else {
            return Ok(());
        };
        for columns in constraints {
            let key = constraint_key(candidate, columns);
            if rows.iter().any(|row| constraint_key(row, columns) == key) {
                return Err(BackendError::Conflict(format!(
                    "{table} ({})",
                    columns.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn constraint_key(row: &Value, columns: &[String]) -> Vec<Value> {
    columns
        .iter()
        .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
        .collect()
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| row.get(&f.column) == Some(&f.value))
}

fn merge_into(target: &mut Value, changes: &Value) {
    if let (Some(target), Some(changes)) = (target.as_object_mut(), changes.as_object()) {
        for (k, v) in changes {
            target.insert(k.clone(), v.clone());
        }
    }
}

/// Fill server-populated columns the way the hosted store does.
fn populate_defaults(row: &mut Value) {
    let Some(obj) = row.as_object_mut() else {
        return;
    };
    if !obj.contains_key("id") {
        obj.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
    }
    if !obj.contains_key("created_at") {
        obj.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.take_failure(table, TableOp::Insert).await?;
        if !row.is_object() {
            return Err(BackendError::Store("row must be a JSON object".into()));
        }
        let mut row = row;
        populate_defaults(&mut row);

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        self.check_unique(table, rows, &row)?;
        rows.push(row.clone());
        Ok(row)
    }

    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        self.take_failure(table, TableOp::Select).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(&self, table: &str, filters: &[Filter], changes: Value) -> Result<u64> {
        self.take_failure(table, TableOp::Update).await?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let mut updated = 0;
        for row in rows.iter_mut().filter(|row| matches(row, filters)) {
            merge_into(row, &changes);
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        self.take_failure(table, TableOp::Delete).await?;
        if self.deny_delete.lock().await.contains(table) {
            return Ok(0);
        }
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, filters));
        Ok((before - rows.len()) as u64)
    }

    async fn upsert(&self, table: &str, row: Value, conflict_columns: &[&str]) -> Result<()> {
        self.take_failure(table, TableOp::Upsert).await?;
        let columns: Vec<String> = conflict_columns.iter().map(|c| c.to_string()).collect();
        let key = constraint_key(&row, &columns);

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if let Some(existing) = rows
            .iter_mut()
            .find(|r| constraint_key(r, &columns) == key)
        {
            // Overwrite the conflicting row, keeping server-populated columns.
            let keep: Map<String, Value> = existing
                .as_object()
                .map(|obj| {
                    obj.iter()
                        .filter(|(k, _)| *k == "id" || *k == "created_at")
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default();
            *existing = row;
            merge_into(existing, &Value::Object(keep));
        } else {
            let mut row = row;
            populate_defaults(&mut row);
            rows.push(row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_populates_id_and_created_at() {
        let store = MemoryTableStore::new();
        let row = store
            .insert("songs", json!({ "name": "Amazing Grace" }))
            .await
            .unwrap();
        assert!(row.get("id").unwrap().is_string());
        assert!(row.get("created_at").unwrap().is_string());
    }

    #[tokio::test]
    async fn test_unique_constraint_rejects_duplicate() {
        let store = MemoryTableStore::new().with_unique("user_favorites", &["user_id", "song_id"]);
        let row = json!({ "user_id": "u1", "song_id": "s1" });
        store.insert("user_favorites", row.clone()).await.unwrap();
        let err = store.insert("user_favorites", row).await.unwrap_err();
        assert!(matches!(err, BackendError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_on_conflict_target() {
        let store = MemoryTableStore::new().with_unique("song_variants", &["song_id", "key"]);
        store
            .upsert(
                "song_variants",
                json!({ "song_id": "s1", "key": "C", "pdf_url": "a.pdf" }),
                &["song_id", "key"],
            )
            .await
            .unwrap();
        store
            .upsert(
                "song_variants",
                json!({ "song_id": "s1", "key": "C", "pdf_url": "b.pdf" }),
                &["song_id", "key"],
            )
            .await
            .unwrap();

        let rows = store.snapshot("song_variants").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["pdf_url"], json!("b.pdf"));
    }

    #[tokio::test]
    async fn test_delete_reports_row_count() {
        let store = MemoryTableStore::new();
        store
            .insert("songs", json!({ "id": "s1", "name": "A" }))
            .await
            .unwrap();
        let removed = store
            .delete("songs", &[Filter::eq("id", "s1")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let removed = store
            .delete("songs", &[Filter::eq("id", "s1")])
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_deny_delete_matches_zero_rows() {
        let store = MemoryTableStore::new();
        store
            .insert("songs", json!({ "id": "s1", "name": "A" }))
            .await
            .unwrap();
        store.deny_delete("songs").await;
        let removed = store
            .delete("songs", &[Filter::eq("id", "s1")])
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.snapshot("songs").await.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_errors_once() {
        let store = MemoryTableStore::new();
        store.fail_next("songs", TableOp::Select).await;
        assert!(store.select("songs", &[]).await.is_err());
        assert!(store.select("songs", &[]).await.is_ok());
    }
}
