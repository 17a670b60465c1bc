use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    AppState,
    crawler::{self, LibraryCrawl},
    error::AppResult,
    models::ProcessStats,
    processor,
};

/// Runs the full library crawl once if the init marker exists, then removes
/// the marker. Returns whether the crawl ran.
pub async fn run_initial_sync_if_marked(state: &AppState) -> AppResult<bool> {
    let marker = &state.config.init_marker;
    if !tokio::fs::try_exists(marker).await? {
        return Ok(false);
    }

    info!(marker = %marker.display(), "found init marker, running full library sync");
    let crawl = LibraryCrawl {
        base_url: &state.config.base_url,
        library_url: &state.config.library_url,
        max_page: state.config.library_max_page,
        delay: Duration::from_millis(state.config.scrape_delay_ms),
    };
    let links = crawler::crawl_library(&*state.pages, &state.cache, &crawl).await;
    processor::process_links(
        &*state.pages,
        &*state.resolver,
        &state.store,
        &state.config.base_url,
        links,
    )
    .await;

    tokio::fs::remove_file(marker).await?;
    info!("initial sync complete");
    Ok(true)
}

/// One recurring job per configured listing URL.
///
/// A job awaits its own scrape before waiting for the next tick and skips ticks
/// it missed, so the same URL is never scraped twice at once.
pub fn spawn_listing_jobs(state: Arc<AppState>) -> Vec<JoinHandle<()>> {
    state
        .config
        .listing_urls
        .iter()
        .cloned()
        .map(|url| {
            let state = state.clone();
            tokio::spawn(async move { run_listing_job(state, url).await })
        })
        .collect()
}

async fn run_listing_job(state: Arc<AppState>, url: String) {
    let every = state.config.scrape_interval;
    let Some(first_run) = Instant::now().checked_add(every) else {
        warn!(url = %url, every_secs = every.as_secs(), "scrape interval out of range");
        return;
    };
    let mut ticker = tokio::time::interval_at(first_run, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(url = %url, every_secs = every.as_secs(), "scheduled listing scrape");

    loop {
        ticker.tick().await;
        scrape_listing(&state, &url).await;
    }
}

pub async fn scrape_listing(state: &AppState, url: &str) -> Option<ProcessStats> {
    let links = match crawler::crawl_listing(&*state.pages, url).await {
        Ok(links) => links,
        Err(err) => {
            warn!(url = %url, error = %err, "listing scrape failed");
            return None;
        },
    };

    let stats = processor::process_links(
        &*state.pages,
        &*state.resolver,
        &state.store,
        &state.config.base_url,
        links,
    )
    .await;
    Some(stats)
}
