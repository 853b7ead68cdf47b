//! End-to-end coverage of the deletion cascade against the in-memory
//! backend, including the partial-failure paths.

use backend_memory::{MemoryBlobStore, MemoryTableStore, TableOp};
use backend_traits::{BlobStore, TableStore};
use bytes::Bytes;
use core_catalog::deletion::{DeletionStep, StepStatus};
use core_catalog::{CatalogError, CatalogRepository, Category, Instrument, Song, Variant};
use std::sync::Arc;

const BUCKET: &str = "music-sheets";
const ROOT: &str = "admin@lege.music";

struct Fixture {
    tables: Arc<MemoryTableStore>,
    blobs: Arc<MemoryBlobStore>,
    repo: CatalogRepository,
}

fn fixture() -> Fixture {
    let tables = Arc::new(MemoryTableStore::with_catalog_schema());
    let blobs = Arc::new(MemoryBlobStore::new());
    let repo = CatalogRepository::new(
        Arc::clone(&tables) as Arc<dyn TableStore>,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
        BUCKET,
        ROOT,
    );
    Fixture {
        tables,
        blobs,
        repo,
    }
}

impl Fixture {
    /// A song with two uploaded sheets and favorites from two users.
    async fn seed_full_song(&self, name: &str) -> Song {
        let c_url = self
            .blobs
            .upload(BUCKET, &format!("{name}-c.pdf"), Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        let g_url = self
            .blobs
            .upload(BUCKET, &format!("{name}-g.pdf"), Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        let song = self
            .repo
            .create_song(
                name,
                vec![Category::Worship],
                Instrument::Piano,
                vec![
                    Variant {
                        key: "C".to_string(),
                        pdf_url: c_url,
                    },
                    Variant {
                        key: "G".to_string(),
                        pdf_url: g_url,
                    },
                ],
            )
            .await
            .unwrap();
        for user in ["u1", "u2"] {
            self.repo
                .toggle_favorite(Some(user), &song.id)
                .await
                .unwrap();
        }
        song
    }

    async fn rows_for_song(&self, table: &str, song_id: &str) -> usize {
        self.tables
            .snapshot(table)
            .await
            .iter()
            .filter(|row| {
                row.get("song_id").and_then(|v| v.as_str()) == Some(song_id)
                    || row.get("id").and_then(|v| v.as_str()) == Some(song_id)
            })
            .count()
    }
}

#[tokio::test]
async fn test_delete_removes_rows_files_and_favorites() {
    let fx = fixture();
    let doomed = fx.seed_full_song("doomed").await;
    let kept = fx.seed_full_song("kept").await;

    let report = fx.repo.delete_song(&doomed.id).await.unwrap();

    assert!(report.storage_warning.is_none());
    assert_eq!(report.status(DeletionStep::DeleteSong), Some(&StepStatus::Ok));
    assert_eq!(
        report.status(DeletionStep::RemoveStoredFiles),
        Some(&StepStatus::Ok)
    );

    assert_eq!(fx.rows_for_song("songs", &doomed.id).await, 0);
    assert_eq!(fx.rows_for_song("song_variants", &doomed.id).await, 0);
    assert_eq!(fx.rows_for_song("user_favorites", &doomed.id).await, 0);
    assert!(!fx.blobs.contains(BUCKET, "doomed-c.pdf").await);
    assert!(!fx.blobs.contains(BUCKET, "doomed-g.pdf").await);

    // The other song is untouched.
    assert_eq!(fx.rows_for_song("songs", &kept.id).await, 1);
    assert_eq!(fx.rows_for_song("song_variants", &kept.id).await, 2);
    assert_eq!(fx.blobs.object_count(BUCKET).await, 2);
}

#[tokio::test]
async fn test_storage_failure_degrades_to_warning() {
    let fx = fixture();
    let song = fx.seed_full_song("stubborn").await;
    fx.blobs.fail_removals(true);

    let report = fx.repo.delete_song(&song.id).await.unwrap();

    assert!(report.storage_warning.is_some());
    assert!(matches!(
        report.status(DeletionStep::RemoveStoredFiles),
        Some(StepStatus::Failed(_))
    ));
    // Row deletion still completed.
    assert_eq!(fx.rows_for_song("songs", &song.id).await, 0);
    assert_eq!(fx.rows_for_song("song_variants", &song.id).await, 0);
}

#[tokio::test]
async fn test_zero_row_song_delete_is_an_error() {
    let fx = fixture();
    let song = fx.seed_full_song("denied").await;
    fx.tables.deny_delete("songs").await;

    let err = fx.repo.delete_song(&song.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::DeleteIneffective { .. }));
    assert_eq!(fx.rows_for_song("songs", &song.id).await, 1);
}

#[tokio::test]
async fn test_deleting_missing_song_is_an_error() {
    let fx = fixture();
    let err = fx.repo.delete_song("no-such-song").await.unwrap_err();
    assert!(matches!(err, CatalogError::DeleteIneffective { .. }));
}

#[tokio::test]
async fn test_variant_fetch_failure_still_deletes_rows() {
    let fx = fixture();
    let song = fx.seed_full_song("unlucky").await;
    fx.tables.fail_next("song_variants", TableOp::Select).await;

    let report = fx.repo.delete_song(&song.id).await.unwrap();

    assert!(matches!(
        report.status(DeletionStep::FetchVariants),
        Some(StepStatus::Failed(_))
    ));
    // No names to remove, so file cleanup was skipped and the sheets are
    // orphaned; rows are gone regardless.
    assert_eq!(
        report.status(DeletionStep::RemoveStoredFiles),
        Some(&StepStatus::Skipped)
    );
    assert!(report.storage_warning.is_none());
    assert_eq!(fx.rows_for_song("songs", &song.id).await, 0);
    assert_eq!(fx.rows_for_song("song_variants", &song.id).await, 0);
    assert!(fx.blobs.contains(BUCKET, "unlucky-c.pdf").await);
}

#[tokio::test]
async fn test_malformed_variant_urls_do_not_block_deletion() {
    let fx = fixture();
    let song = fx
        .repo
        .create_song(
            "external",
            vec![Category::Others],
            Instrument::Band,
            vec![
                Variant {
                    key: "C".to_string(),
                    pdf_url: "https://www.w3.org/testfiles/resources/pdf/dummy.pdf".to_string(),
                },
                Variant {
                    key: "G".to_string(),
                    pdf_url: "not-a-url".to_string(),
                },
            ],
        )
        .await
        .unwrap();

    let report = fx.repo.delete_song(&song.id).await.unwrap();

    // Removal of the one derivable name succeeds (missing objects are
    // ignored); the underivable one is skipped without complaint.
    assert!(report.storage_warning.is_none());
    assert_eq!(report.status(DeletionStep::DeleteSong), Some(&StepStatus::Ok));
    assert_eq!(fx.rows_for_song("songs", &song.id).await, 0);
    assert_eq!(fx.rows_for_song("song_variants", &song.id).await, 0);
}
