use std::{path::Path, sync::Arc};

use jiff::civil::{Date, date};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::OnConflict,
};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    entities::{file, torrent},
    error::AppResult,
    models::{Release, StoredRelease},
};

pub const PROVIDER: &str = "1337x";
const RELEASE_TYPE: &str = "movie";
/// Detail pages carry no upload date; every row gets this one.
const UPLOAD_DATE: Date = date(2024, 1, 1);
const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mkv", "avi", "mpeg", "mpg", "mpv", "mov"];

/// Writes releases and their video files. All writes go through one lock.
#[derive(Clone)]
pub struct ReleaseStore {
    db: DatabaseConnection,
    write_lock: Arc<Mutex<()>>,
}

impl ReleaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, write_lock: Arc::new(Mutex::new(())) }
    }

    /// Inserts or replaces the release row and one row per video file, in one
    /// transaction.
    ///
    /// `fileIndex` is the position in the unfiltered file list. Each file row
    /// carries the release's total size.
    pub async fn upsert(&self, release: &Release) -> AppResult<()> {
        let Some(movie_id) = release.movie_id.as_deref().filter(|id| !id.is_empty()) else {
            return Err(anyhow::anyhow!("release {} has no movie id", release.info_hash).into());
        };
        let size = i64::try_from(release.size_bytes)
            .map_err(|_| anyhow::anyhow!("size {} out of range", release.size_bytes))?;

        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let row = torrent::ActiveModel {
            info_hash: Set(release.info_hash.clone()),
            provider: Set(PROVIDER.to_string()),
            title: Set(release.title.clone()),
            size: Set(size),
            kind: Set(RELEASE_TYPE.to_string()),
            upload_date: Set(UPLOAD_DATE.to_string()),
            seeders: Set(release.seeder_count()),
            trackers: Set(release.trackers.join(",")),
        };
        torrent::Entity::insert(row)
            .on_conflict(
                OnConflict::column(torrent::Column::InfoHash)
                    .update_columns([
                        torrent::Column::Provider,
                        torrent::Column::Title,
                        torrent::Column::Size,
                        torrent::Column::Kind,
                        torrent::Column::UploadDate,
                        torrent::Column::Seeders,
                        torrent::Column::Trackers,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await?;

        let mut written = 0;
        for (index, name) in release.files.iter().enumerate() {
            if !is_video_file(name) {
                continue;
            }
            let row = file::ActiveModel {
                id: Default::default(),
                info_hash: Set(release.info_hash.clone()),
                file_index: Set(index as i32),
                title: Set(name.clone()),
                size: Set(size),
                movie_id: Set(movie_id.to_string()),
            };
            file::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([file::Column::InfoHash, file::Column::FileIndex])
                        .update_columns([
                            file::Column::Title,
                            file::Column::Size,
                            file::Column::MovieId,
                        ])
                        .to_owned(),
                )
                .exec(&txn)
                .await?;
            written += 1;
        }

        txn.commit().await?;

        info!(
            title = %release.title,
            info_hash = %release.info_hash,
            movie_id = %movie_id,
            files = written,
            "recorded release"
        );
        Ok(())
    }

    /// Every stored release that has a file tagged with `movie_id`.
    pub async fn find_by_movie_id(&self, movie_id: &str) -> AppResult<Vec<StoredRelease>> {
        let rows = file::Entity::find()
            .filter(file::Column::MovieId.eq(movie_id))
            .order_by_asc(file::Column::InfoHash)
            .order_by_asc(file::Column::FileIndex)
            .find_also_related(torrent::Entity)
            .all(&self.db)
            .await?;

        let mut out: Vec<StoredRelease> = Vec::new();
        for (file, torrent) in rows {
            let Some(torrent) = torrent else { continue };
            match out.last_mut() {
                Some(last) if last.torrent.info_hash == torrent.info_hash => last.files.push(file),
                _ => out.push(StoredRelease { torrent, files: vec![file] }),
            }
        }
        Ok(out)
    }
}

fn is_video_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::db;

    async fn temp_store() -> (tempfile::TempDir, ReleaseStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.sqlite").display());
        let db = db::connect_and_migrate(&url).await.unwrap();
        (dir, ReleaseStore::new(db))
    }

    fn release(files: &[&str]) -> Release {
        Release {
            title: "Some Movie 2019 1080p".to_string(),
            info_hash: "0123456789abcdef0123456789abcdef01234567".to_string(),
            size_bytes: 700 * 107_374_182,
            seeders: "12".to_string(),
            trackers: vec!["udp://a:1337/announce".to_string(), "udp://b:80".to_string()],
            files: files.iter().map(|f| f.to_string()).collect(),
            movie_id: Some("tt0133093".to_string()),
            ..Release::default()
        }
    }

    #[test]
    fn only_video_extensions_pass() {
        assert!(is_video_file("Movie.2019.mkv"));
        assert!(is_video_file("Movie.MP4"));
        assert!(is_video_file("clip.mpv"));
        assert!(!is_video_file("Movie.nfo"));
        assert!(!is_video_file("Subs/English.srt"));
        assert!(!is_video_file("mkv"));
    }

    #[tokio::test]
    async fn upsert_writes_release_and_video_files() {
        let (_dir, store) = temp_store().await;
        store.upsert(&release(&["Movie.mkv", "Movie.nfo", "Sample.mp4"])).await.unwrap();

        let stored = store.find_by_movie_id("tt0133093").await.unwrap();
        assert_eq!(stored.len(), 1);
        let torrent = &stored[0].torrent;
        assert_eq!(torrent.provider, "1337x");
        assert_eq!(torrent.kind, "movie");
        assert_eq!(torrent.upload_date, "2024-01-01");
        assert_eq!(torrent.seeders, Some(12));
        assert_eq!(torrent.size, 700 * 107_374_182);
        assert_eq!(torrent.trackers, "udp://a:1337/announce,udp://b:80");

        let files: Vec<(i32, &str)> =
            stored[0].files.iter().map(|f| (f.file_index, f.title.as_str())).collect();
        assert_eq!(files, vec![(0, "Movie.mkv"), (2, "Sample.mp4")]);
        // File rows carry the release total, not a per-file size.
        assert!(stored[0].files.iter().all(|f| f.size == torrent.size));
    }

    #[tokio::test]
    async fn upsert_twice_keeps_one_row_per_key_and_last_write_wins() {
        let (_dir, store) = temp_store().await;
        let first = release(&["Movie.mkv", "Sample.mp4"]);
        store.upsert(&first).await.unwrap();

        let mut second = first.clone();
        second.title = "Some Movie REPACK".to_string();
        second.seeders = "40".to_string();
        second.files = vec!["Movie.REPACK.mkv".to_string(), "Sample.mp4".to_string()];
        store.upsert(&second).await.unwrap();

        assert_eq!(torrent::Entity::find().count(&store.db).await.unwrap(), 1);
        assert_eq!(file::Entity::find().count(&store.db).await.unwrap(), 2);

        let stored = store.find_by_movie_id("tt0133093").await.unwrap();
        assert_eq!(stored[0].torrent.title, "Some Movie REPACK");
        assert_eq!(stored[0].torrent.seeders, Some(40));
        assert_eq!(stored[0].files[0].title, "Movie.REPACK.mkv");
    }

    #[tokio::test]
    async fn repeated_file_names_get_their_own_index() {
        let (_dir, store) = temp_store().await;
        store.upsert(&release(&["CD1/Movie.avi", "Movie.avi", "Movie.avi"])).await.unwrap();

        let stored = store.find_by_movie_id("tt0133093").await.unwrap();
        let indexes: Vec<i32> = stored[0].files.iter().map(|f| f.file_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn release_without_movie_id_is_refused() {
        let (_dir, store) = temp_store().await;
        let mut unresolved = release(&["Movie.mkv"]);
        unresolved.movie_id = None;

        assert!(store.upsert(&unresolved).await.is_err());
        assert_eq!(torrent::Entity::find().count(&store.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_seeders_are_stored_as_null() {
        let (_dir, store) = temp_store().await;
        let mut blank = release(&["Movie.mkv"]);
        blank.seeders = String::new();
        store.upsert(&blank).await.unwrap();

        let stored = store.find_by_movie_id("tt0133093").await.unwrap();
        assert_eq!(stored[0].torrent.seeders, None);
    }
}
