use tracing::{debug, error, info, warn};

use crate::{
    extractor,
    http::PageSource,
    models::{ProcessStats, ReleaseLink},
    store::ReleaseStore,
    tmdb::IdentifierResolver,
};

/// Visits every release page in order and records what can be resolved.
///
/// Nothing that goes wrong with one release stops the loop.
pub async fn process_links(
    pages: &dyn PageSource,
    resolver: &dyn IdentifierResolver,
    store: &ReleaseStore,
    base_url: &str,
    links: Vec<ReleaseLink>,
) -> ProcessStats {
    let total = links.len();
    info!(total = total, "checking release links");

    let mut stats = ProcessStats::default();

    for (n, link) in links.into_iter().enumerate() {
        let url = format!("{}{}", base_url.trim_end_matches('/'), link.path);
        debug!(url = %url, progress = n + 1, total = total, "processing release");

        let html = match pages.fetch(&url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(url = %url, error = %err, "failed to fetch release page");
                stats.failed += 1;
                continue;
            },
        };

        let release = match extractor::extract_release(&html, &link.title, resolver).await {
            Ok(Some(release)) => release,
            Ok(None) => {
                stats.unresolved += 1;
                continue;
            },
            Err(err) => {
                warn!(url = %url, error = %err, "failed to parse release page");
                stats.failed += 1;
                continue;
            },
        };

        match store.upsert(&release).await {
            Ok(()) => stats.stored += 1,
            Err(err) => {
                error!(info_hash = %release.info_hash, error = %err, "failed to record release");
                stats.failed += 1;
            },
        }
    }

    info!(
        total = stats.total(),
        stored = stats.stored,
        unresolved = stats.unresolved,
        failed = stats.failed,
        "finished release links"
    );
    stats
}

#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, PaginatorTrait};

    use super::*;
    use crate::{
        db,
        entities::{file, torrent},
        extractor::fixtures::{INFO_HASH, release_page},
        http::testing::FakeSite,
        tmdb::testing::FixedResolver,
    };

    const BASE: &str = "https://site.test";

    async fn temp_db() -> (tempfile::TempDir, sea_orm::DatabaseConnection) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("scrape.sqlite").display());
        (dir, db::connect_and_migrate(&url).await.unwrap())
    }

    #[tokio::test]
    async fn release_page_ends_up_as_one_torrent_and_its_video_files() {
        let (_dir, conn) = temp_db().await;
        let store = ReleaseStore::new(conn.clone());
        let resolver = FixedResolver::default();
        let html = release_page(
            "700 MB",
            Some("https://www.imdb.com/title/tt0133093"),
            &["Some.Movie.mkv (699 MB)", "Some.Movie.nfo (2 KB)", "Sample.avi (10 MB)"],
        );
        let site = FakeSite::default().with_page(&format!("{BASE}/torrent/1/some-movie/"), &html);

        let stats = process_links(
            &site,
            &resolver,
            &store,
            BASE,
            vec![ReleaseLink::new("/torrent/1/some-movie/", "Some Movie ")],
        )
        .await;

        assert_eq!(stats, ProcessStats { stored: 1, unresolved: 0, failed: 0 });
        assert_eq!(resolver.calls(), 0);

        let torrents = torrent::Entity::find().all(&conn).await.unwrap();
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].info_hash, INFO_HASH);
        assert_eq!(torrents[0].size, 700 * 107_374_182);
        assert_eq!(torrents[0].seeders, Some(12));
        assert_eq!(torrents[0].trackers, "udp://tracker.opentrackr.org:1337/announce");

        let files = file::Entity::find().all(&conn).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.movie_id == "tt0133093"));
    }

    #[tokio::test]
    async fn bad_pages_are_counted_and_skipped() {
        let (_dir, conn) = temp_db().await;
        let store = ReleaseStore::new(conn.clone());
        let resolver = FixedResolver::default();
        let good =
            release_page("1.2 GB", Some("https://www.imdb.com/title/tt0110912"), &["Pulp.mkv"]);
        let unresolved = release_page("1.2 GB", None, &["Unknown.mkv"]);
        let site = FakeSite::default()
            .with_page(&format!("{BASE}/torrent/1/broken/"), "<html><body>gone</body></html>")
            .with_page(&format!("{BASE}/torrent/3/unknown/"), &unresolved)
            .with_page(&format!("{BASE}/torrent/4/pulp/"), &good);

        let links = vec![
            ReleaseLink::new("/torrent/1/broken/", "Broken"),
            ReleaseLink::new("/torrent/2/missing/", "Missing"),
            ReleaseLink::new("/torrent/3/unknown/", "Unknown"),
            ReleaseLink::new("/torrent/4/pulp/", "Pulp Fiction "),
        ];
        let stats = process_links(&site, &resolver, &store, BASE, links).await;

        assert_eq!(stats, ProcessStats { stored: 1, unresolved: 1, failed: 2 });
        assert_eq!(stats.total(), 4);
        assert_eq!(resolver.calls(), 1);
        assert_eq!(torrent::Entity::find().count(&conn).await.unwrap(), 1);
    }
}
