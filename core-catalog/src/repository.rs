//! Catalog repository: every read and write of songs, variants, favorites,
//! and admin grants goes through here.
//!
//! The repository holds trait-object handles to the backend and works on
//! assembled [`Song`] values. Viewer identity is an explicit parameter on
//! the operations that need it; nothing here consults ambient session
//! state.

use crate::error::{CatalogError, Result};
use crate::models::{AdminGrant, Category, Instrument, Song, Variant, VariantRow};
use crate::deletion::object_name_from_url;
use backend_traits::error::BackendError;
use backend_traits::{BlobStore, Filter, TableStore};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use core_runtime::CoreConfig;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

pub(crate) const SONGS: &str = "songs";
pub(crate) const SONG_VARIANTS: &str = "song_variants";
pub(crate) const USER_FAVORITES: &str = "user_favorites";
pub(crate) const ADMINS: &str = "admins";
pub(crate) const PROFILES: &str = "profiles";

pub struct CatalogRepository {
    tables: Arc<dyn TableStore>,
    blobs: Arc<dyn BlobStore>,
    bucket: String,
    root_admin_email: String,
    events: Option<EventBus>,
}

impl CatalogRepository {
    pub fn new(
        tables: Arc<dyn TableStore>,
        blobs: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
        root_admin_email: impl Into<String>,
    ) -> Self {
        Self {
            tables,
            blobs,
            bucket: bucket.into(),
            root_admin_email: root_admin_email.into(),
            events: None,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            Arc::clone(&config.table_store),
            Arc::clone(&config.blob_store),
            config.bucket.clone(),
            config.root_admin_email.clone(),
        )
    }

    /// Attach an event bus; mutations will publish [`CatalogEvent`]s.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub(crate) fn tables(&self) -> &Arc<dyn TableStore> {
        &self.tables
    }

    pub(crate) fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub(crate) fn emit(&self, event: CatalogEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine.
            let _ = events.emit(CoreEvent::Catalog(event));
        }
    }

    /// Every song, newest first, with variants joined in and `is_favorite`
    /// resolved for `viewer`.
    ///
    /// A failure while looking up the viewer's favorites degrades to
    /// `is_favorite = false` across the board rather than failing the
    /// listing.
    pub async fn list_songs(&self, viewer: Option<&str>) -> Result<Vec<Song>> {
        let rows = self.tables.select(SONGS, &[]).await?;
        let mut songs: Vec<Song> = decode_rows(SONGS, rows)?;
        songs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let variant_rows: Vec<VariantRow> =
            decode_rows(SONG_VARIANTS, self.tables.select(SONG_VARIANTS, &[]).await?)?;
        let mut by_song: HashMap<String, Vec<Variant>> = HashMap::new();
        for row in variant_rows {
            by_song
                .entry(row.song_id.clone())
                .or_default()
                .push(row.into_variant());
        }

        let favorites = self.favorite_song_ids(viewer).await;
        for song in &mut songs {
            if let Some(variants) = by_song.remove(&song.id) {
                song.variants = variants;
            }
            song.is_favorite = favorites.contains(&song.id);
        }
        Ok(songs)
    }

    /// One song by id, assembled the same way as [`list_songs`].
    ///
    /// [`list_songs`]: CatalogRepository::list_songs
    pub async fn get_song(&self, song_id: &str, viewer: Option<&str>) -> Result<Song> {
        let rows = self
            .tables
            .select(SONGS, &[Filter::eq("id", song_id)])
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound {
                entity_type: "song".to_string(),
                id: song_id.to_string(),
            })?;
        let mut song: Song = decode_row(SONGS, row)?;

        let variant_rows: Vec<VariantRow> = decode_rows(
            SONG_VARIANTS,
            self.tables
                .select(SONG_VARIANTS, &[Filter::eq("song_id", song_id)])
                .await?,
        )?;
        song.variants = variant_rows.into_iter().map(VariantRow::into_variant).collect();

        song.is_favorite = self.favorite_song_ids(viewer).await.contains(&song.id);
        Ok(song)
    }

    /// Adds a song with its initial key variants.
    ///
    /// The song row and the variant rows are separate writes with no
    /// transaction underneath, so a variant failure triggers a compensating
    /// delete of the song row to avoid leaving a variantless orphan.
    #[instrument(skip(self, variants), fields(variant_count = variants.len()))]
    pub async fn create_song(
        &self,
        name: &str,
        categories: Vec<Category>,
        instrument: Instrument,
        variants: Vec<Variant>,
    ) -> Result<Song> {
        Song::validate_name(name).map_err(|message| CatalogError::InvalidInput {
            field: "name".to_string(),
            message,
        })?;
        if variants.is_empty() {
            return Err(CatalogError::InvalidInput {
                field: "variants".to_string(),
                message: "a song needs at least one key variant".to_string(),
            });
        }

        let row = self
            .tables
            .insert(
                SONGS,
                json!({
                    "name": name.trim(),
                    "categories": categories,
                    "instrument": instrument,
                    "search_count": 0,
                }),
            )
            .await?;
        let mut song: Song = decode_row(SONGS, row)?;

        for variant in &variants {
            let result = self
                .tables
                .insert(
                    SONG_VARIANTS,
                    json!({
                        "song_id": song.id,
                        "key": variant.key,
                        "pdf_url": variant.pdf_url,
                    }),
                )
                .await;
            if let Err(e) = result {
                warn!(song_id = %song.id, key = %variant.key, error = %e,
                    "variant insert failed, rolling back song row");
                if let Err(rollback) = self
                    .tables
                    .delete(SONGS, &[Filter::eq("id", song.id.as_str())])
                    .await
                {
                    error!(song_id = %song.id, error = %rollback,
                        "compensating song delete failed; orphaned song row remains");
                }
                return Err(e.into());
            }
        }

        song.variants = variants;
        self.emit(CatalogEvent::SongAdded {
            song_id: song.id.clone(),
            name: song.name.clone(),
        });
        Ok(song)
    }

    /// Adds or replaces the variant for `(song_id, key)`.
    ///
    /// When a variant for the key already exists with a different URL, its
    /// stored file is removed first, best-effort; a removal failure is
    /// logged and does not block the upsert.
    pub async fn add_variant(&self, song_id: &str, key: &str, pdf_url: &str) -> Result<()> {
        let existing: Vec<VariantRow> = decode_rows(
            SONG_VARIANTS,
            self.tables
                .select(
                    SONG_VARIANTS,
                    &[Filter::eq("song_id", song_id), Filter::eq("key", key)],
                )
                .await?,
        )?;
        if let Some(previous) = existing.first() {
            if previous.pdf_url != pdf_url {
                if let Some(name) = object_name_from_url(&previous.pdf_url, &self.bucket) {
                    if let Err(e) = self.blobs.remove(&self.bucket, &[name]).await {
                        warn!(song_id, key, error = %e,
                            "failed to remove replaced sheet file; continuing");
                    }
                }
            }
        }

        self.tables
            .upsert(
                SONG_VARIANTS,
                json!({ "song_id": song_id, "key": key, "pdf_url": pdf_url }),
                &["song_id", "key"],
            )
            .await?;
        self.emit(CatalogEvent::VariantUpserted {
            song_id: song_id.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    /// Flips the viewer's favorite state for a song and returns the new
    /// state. Anonymous viewers cannot favorite.
    pub async fn toggle_favorite(&self, viewer: Option<&str>, song_id: &str) -> Result<bool> {
        let user_id = viewer.ok_or(CatalogError::Unauthenticated)?;
        let filters = [Filter::eq("user_id", user_id), Filter::eq("song_id", song_id)];

        let existing = self.tables.select(USER_FAVORITES, &filters).await?;
        let favorited = if existing.is_empty() {
            match self
                .tables
                .insert(
                    USER_FAVORITES,
                    json!({ "user_id": user_id, "song_id": song_id }),
                )
                .await
            {
                Ok(_) => {}
                // Raced with another toggle; the desired state holds.
                Err(BackendError::Conflict(_)) => {}
                Err(e) => return Err(e.into()),
            }
            true
        } else {
            self.tables.delete(USER_FAVORITES, &filters).await?;
            false
        };

        self.emit(CatalogEvent::FavoriteToggled {
            song_id: song_id.to_string(),
            user_id: user_id.to_string(),
            favorited,
        });
        Ok(favorited)
    }

    /// Bumps a song's search counter. Best-effort: a vanished song is
    /// logged, not an error.
    pub async fn increment_search(&self, song_id: &str) -> Result<()> {
        let rows = self
            .tables
            .select(SONGS, &[Filter::eq("id", song_id)])
            .await?;
        let Some(row) = rows.first() else {
            debug!(song_id, "search increment for missing song; skipping");
            return Ok(());
        };
        let current = row.get("search_count").and_then(Value::as_i64).unwrap_or(0);
        self.tables
            .update(
                SONGS,
                &[Filter::eq("id", song_id)],
                json!({ "search_count": current + 1 }),
            )
            .await?;
        Ok(())
    }

    /// The most-searched songs, capped at `limit`. Songs never surfaced
    /// through search are excluded.
    pub async fn top_songs(&self, limit: usize) -> Result<Vec<Song>> {
        let mut songs = self.list_songs(None).await?;
        songs.retain(|song| song.search_count > 0);
        songs.sort_by(|a, b| b.search_count.cmp(&a.search_count));
        songs.truncate(limit);
        Ok(songs)
    }

    /// Grants admin capability to an email. The email must belong to a
    /// registered profile; granting an existing admin is a no-op.
    pub async fn grant_admin(&self, email: &str) -> Result<()> {
        let profiles = self
            .tables
            .select(PROFILES, &[Filter::eq("email", email)])
            .await?;
        if profiles.is_empty() {
            return Err(CatalogError::AccountNotFound {
                email: email.to_string(),
            });
        }

        match self.tables.insert(ADMINS, json!({ "email": email })).await {
            Ok(_) => Ok(()),
            Err(BackendError::Conflict(_)) => {
                debug!(email, "admin grant already present");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revokes admin capability. The root admin is protected.
    pub async fn revoke_admin(&self, email: &str) -> Result<()> {
        if email.eq_ignore_ascii_case(&self.root_admin_email) {
            return Err(CatalogError::ProtectedAccount {
                email: email.to_string(),
            });
        }
        self.tables
            .delete(ADMINS, &[Filter::eq("email", email)])
            .await?;
        Ok(())
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminGrant>> {
        decode_rows(ADMINS, self.tables.select(ADMINS, &[]).await?)
    }

    /// Whether an email holds admin capability, either through the grant
    /// table or by being the root admin.
    pub async fn is_admin(&self, email: &str) -> Result<bool> {
        if email.eq_ignore_ascii_case(&self.root_admin_email) {
            return Ok(true);
        }
        let grants = self
            .tables
            .select(ADMINS, &[Filter::eq("email", email)])
            .await?;
        Ok(!grants.is_empty())
    }

    async fn favorite_song_ids(&self, viewer: Option<&str>) -> HashSet<String> {
        let Some(user_id) = viewer else {
            return HashSet::new();
        };
        match self
            .tables
            .select(USER_FAVORITES, &[Filter::eq("user_id", user_id)])
            .await
        {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| {
                    row.get("song_id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .collect(),
            Err(e) => {
                warn!(user_id, error = %e,
                    "favorites lookup failed; listing without favorite flags");
                HashSet::new()
            }
        }
    }
}

pub(crate) fn decode_row<T: DeserializeOwned>(table: &str, row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| CatalogError::Decode {
        table: table.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}
