mod cache;
mod config;
mod crawler;
mod db;
mod entities;
mod error;
mod extractor;
mod http;
mod models;
mod processor;
mod scheduler;
mod store;
mod title;
mod tmdb;

use std::sync::Arc;

use anyhow::Context;

use crate::{
    cache::PageCache,
    config::Config,
    http::{HttpPageSource, PageSource},
    store::ReleaseStore,
    tmdb::{IdentifierResolver, TmdbResolver},
};

pub struct AppState {
    pub config: Arc<Config>,
    pub pages: Arc<dyn PageSource>,
    pub cache: PageCache,
    pub resolver: Arc<dyn IdentifierResolver>,
    pub store: ReleaseStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,leetindex=debug,sqlx=warn".to_string()),
        )
        .init();

    tracing::info!("scraper starting");

    let config = Arc::new(Config::from_env()?);

    let db = db::connect_and_migrate(&config.database_url)
        .await
        .context("connecting to the release database")?;

    let mut args = std::env::args().skip(1);
    if let Some("lookup") = args.next().as_deref() {
        let movie_id = args.next().context("usage: leetindex lookup <imdb id>")?;
        return lookup(&ReleaseStore::new(db), &movie_id).await;
    }

    let cache = PageCache::open(&config.cache_dir).await?;
    let pages = HttpPageSource::new(config.http_timeout)?;

    let tmdb_http = wreq::Client::builder().timeout(config.http_timeout).build()?;
    let resolver = TmdbResolver::new(
        tmdb_http,
        config.tmdb_access_token.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        pages: Arc::new(pages),
        cache,
        resolver: Arc::new(resolver),
        store: ReleaseStore::new(db),
    });

    if let Err(err) = scheduler::run_initial_sync_if_marked(&state).await {
        tracing::error!(error = %err, "initial sync failed");
    }

    let jobs = scheduler::spawn_listing_jobs(state.clone());
    tracing::info!(jobs = jobs.len(), "listing jobs scheduled");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    for job in jobs {
        job.abort();
    }

    Ok(())
}

async fn lookup(store: &ReleaseStore, movie_id: &str) -> anyhow::Result<()> {
    let releases = store.find_by_movie_id(movie_id).await?;
    if releases.is_empty() {
        println!("no releases recorded for {movie_id}");
    }
    for release in releases {
        let torrent = &release.torrent;
        println!(
            "{}  {}  {} bytes  seeders={}",
            torrent.info_hash,
            torrent.title,
            torrent.size,
            torrent.seeders.map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()),
        );
        for file in &release.files {
            println!("    [{}] {}", file.file_index, file.title);
        }
    }
    Ok(())
}
