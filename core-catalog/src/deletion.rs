//! Cascading song deletion.
//!
//! The backend exposes no transactions and no referential actions, so the
//! cascade is client-ordered: fetch variants, derive stored object names
//! from their URLs, remove the files, delete favorites, delete variants,
//! and finally delete the song row. Preparatory steps are best-effort;
//! only the song-row delete decides success, and it must remove exactly
//! the one row. Zero removed rows means the song is gone already or a
//! server-side policy denied the delete, and the operation fails rather
//! than reporting a deletion that did not happen.

use crate::error::{CatalogError, Result};
use crate::models::VariantRow;
use crate::repository::{
    decode_rows, CatalogRepository, SONGS, SONG_VARIANTS, USER_FAVORITES,
};
use backend_traits::Filter;
use core_runtime::events::CatalogEvent;
use tracing::{instrument, warn};

/// One stage of the deletion cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    FetchVariants,
    RemoveStoredFiles,
    DeleteFavorites,
    DeleteVariants,
    DeleteSong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Ok,
    /// The step had nothing to do (e.g. no stored files to remove).
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: DeletionStep,
    pub status: StepStatus,
}

/// What happened during a (successful) deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub steps: Vec<StepOutcome>,
    /// Set when stored files could not be removed and are now orphaned;
    /// surfaces as a warning, not a failure.
    pub storage_warning: Option<String>,
}

impl DeletionReport {
    fn record(&mut self, step: DeletionStep, status: StepStatus) {
        self.steps.push(StepOutcome { step, status });
    }

    pub fn status(&self, step: DeletionStep) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|outcome| outcome.step == step)
            .map(|outcome| &outcome.status)
    }
}

impl CatalogRepository {
    /// Deletes a song and everything hanging off it.
    ///
    /// Returns a [`DeletionReport`] describing each stage. Fails only when
    /// the final song-row delete errors or matches zero rows; earlier
    /// failures degrade (orphaned files become a `storage_warning`,
    /// orphaned rows are logged).
    #[instrument(skip(self))]
    pub async fn delete_song(&self, song_id: &str) -> Result<DeletionReport> {
        let mut report = DeletionReport::default();
        let by_song = [Filter::eq("song_id", song_id)];

        let variants: Vec<VariantRow> = match self.tables().select(SONG_VARIANTS, &by_song).await {
            Ok(rows) => match decode_rows(SONG_VARIANTS, rows) {
                Ok(variants) => {
                    report.record(DeletionStep::FetchVariants, StepStatus::Ok);
                    variants
                }
                Err(e) => {
                    warn!(song_id, error = %e, "variant rows undecodable; deleting without file cleanup");
                    report.record(DeletionStep::FetchVariants, StepStatus::Failed(e.to_string()));
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(song_id, error = %e, "variant fetch failed; deleting without file cleanup");
                report.record(DeletionStep::FetchVariants, StepStatus::Failed(e.to_string()));
                Vec::new()
            }
        };

        let names: Vec<String> = variants
            .iter()
            .filter_map(|v| object_name_from_url(&v.pdf_url, self.bucket()))
            .collect();
        if names.is_empty() {
            report.record(DeletionStep::RemoveStoredFiles, StepStatus::Skipped);
        } else {
            match self.blobs().remove(self.bucket(), &names).await {
                Ok(()) => report.record(DeletionStep::RemoveStoredFiles, StepStatus::Ok),
                Err(e) => {
                    let warning = format!(
                        "failed to remove {} stored file(s) for song {song_id}: {e}",
                        names.len()
                    );
                    warn!(song_id, error = %e, "stored file removal failed; files are orphaned");
                    report.record(DeletionStep::RemoveStoredFiles, StepStatus::Failed(e.to_string()));
                    report.storage_warning = Some(warning);
                }
            }
        }

        match self.tables().delete(USER_FAVORITES, &by_song).await {
            Ok(_) => report.record(DeletionStep::DeleteFavorites, StepStatus::Ok),
            Err(e) => {
                warn!(song_id, error = %e, "favorite cleanup failed; rows are orphaned");
                report.record(DeletionStep::DeleteFavorites, StepStatus::Failed(e.to_string()));
            }
        }

        match self.tables().delete(SONG_VARIANTS, &by_song).await {
            Ok(_) => report.record(DeletionStep::DeleteVariants, StepStatus::Ok),
            Err(e) => {
                warn!(song_id, error = %e, "variant cleanup failed; rows are orphaned");
                report.record(DeletionStep::DeleteVariants, StepStatus::Failed(e.to_string()));
            }
        }

        match self
            .tables()
            .delete(SONGS, &[Filter::eq("id", song_id)])
            .await
        {
            Ok(0) => {
                report.record(
                    DeletionStep::DeleteSong,
                    StepStatus::Failed("matched zero rows".to_string()),
                );
                Err(CatalogError::DeleteIneffective {
                    id: song_id.to_string(),
                })
            }
            Ok(_) => {
                report.record(DeletionStep::DeleteSong, StepStatus::Ok);
                self.emit(CatalogEvent::SongDeleted {
                    song_id: song_id.to_string(),
                    storage_warning: report.storage_warning.clone(),
                });
                Ok(report)
            }
            Err(e) => {
                report.record(DeletionStep::DeleteSong, StepStatus::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }
}

/// Derives the stored object name from a sheet's public URL.
///
/// The URL is percent-decoded first. If the path contains a
/// `/{bucket}/` segment the remainder after it (query-stripped) is the
/// object name; otherwise the last path segment is used. URLs that yield
/// no usable name return `None` and the file is left alone.
pub fn object_name_from_url(url: &str, bucket: &str) -> Option<String> {
    let decoded = match urlencoding::decode(url) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => url.to_string(),
    };
    if !decoded.contains('/') {
        return None;
    }

    let marker = format!("/{bucket}/");
    if let Some(pos) = decoded.find(&marker) {
        let name = strip_query(&decoded[pos + marker.len()..]);
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let path = strip_query(&decoded);
    let name = path.rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn strip_query(s: &str) -> &str {
    match s.find('?') {
        Some(pos) => &s[..pos],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET: &str = "music-sheets";

    #[test]
    fn test_object_name_from_hosted_public_url() {
        let url = "https://demo.storage.example.com/storage/v1/object/public/music-sheets/hymns/amazing-grace.pdf";
        assert_eq!(
            object_name_from_url(url, BUCKET).as_deref(),
            Some("hymns/amazing-grace.pdf")
        );
    }

    #[test]
    fn test_object_name_is_percent_decoded() {
        let url = "https://demo.storage.example.com/storage/v1/object/public/music-sheets/o%20holy%20night.pdf";
        assert_eq!(
            object_name_from_url(url, BUCKET).as_deref(),
            Some("o holy night.pdf")
        );
    }

    #[test]
    fn test_query_string_is_stripped() {
        let url = "https://demo.storage.example.com/storage/v1/object/public/music-sheets/a.pdf?token=abc&download=1";
        assert_eq!(object_name_from_url(url, BUCKET).as_deref(), Some("a.pdf"));
    }

    #[test]
    fn test_external_url_falls_back_to_last_segment() {
        let url = "https://www.w3.org/WAI/ER/tests/xhtml/testfiles/resources/pdf/dummy.pdf";
        assert_eq!(
            object_name_from_url(url, BUCKET).as_deref(),
            Some("dummy.pdf")
        );
    }

    #[test]
    fn test_unusable_urls_yield_none() {
        assert_eq!(object_name_from_url("not-a-url", BUCKET), None);
        assert_eq!(
            object_name_from_url("https://example.com/bucket/", BUCKET),
            None
        );
    }
}
