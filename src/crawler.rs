use std::{sync::LazyLock, time::Duration};

use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheKey, PageCache},
    error::FetchError,
    http::PageSource,
    models::ReleaseLink,
    title::normalize_title,
};

const RELEASE_PATH_PREFIX: &str = "/torrent/";

static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Where and how far to walk the movie library.
#[derive(Clone, Debug)]
pub struct LibraryCrawl<'a> {
    pub base_url: &'a str,
    pub library_url: &'a str,
    pub max_page: u32,
    pub delay: Duration,
}

/// Walks the movie library index, then every movie page it lists.
///
/// Each release link found on a movie page is paired with the title the index
/// gave that movie. A missing index page ends the walk; any other failure only
/// skips the page or movie it happened on.
pub async fn crawl_library(
    pages: &dyn PageSource,
    cache: &PageCache,
    crawl: &LibraryCrawl<'_>,
) -> Vec<ReleaseLink> {
    let mut links = Vec::new();

    for page in 1..=crawl.max_page {
        if page > 1 && !crawl.delay.is_zero() {
            debug!(delay_ms = crawl.delay.as_millis() as u64, "waiting before next index page");
            tokio::time::sleep(crawl.delay).await;
        }

        let html = match index_page(pages, cache, crawl.library_url, page).await {
            Ok(Some(html)) => html,
            Ok(None) => {
                info!(page = page, "movie library exhausted");
                break;
            },
            Err(err) => {
                warn!(page = page, error = %err, "skipping index page");
                continue;
            },
        };

        let movies = parse_index_page(&html);
        debug!(page = page, movies = movies.len(), "parsed index page");

        for (title, movie_path) in movies {
            match movie_releases(pages, cache, crawl.base_url, &movie_path, &title).await {
                Ok(found) => {
                    debug!(movie = %title, releases = found.len(), "collected movie releases");
                    links.extend(found);
                },
                Err(err) => warn!(movie = %title, path = %movie_path, error = %err, "skipping movie"),
            }
        }
    }

    info!(links = links.len(), "library crawl finished");
    links
}

/// Reads one live listing page and pairs each release link with its own
/// normalized link text.
pub async fn crawl_listing(
    pages: &dyn PageSource,
    url: &str,
) -> Result<Vec<ReleaseLink>, FetchError> {
    info!(url = %url, "requesting listing");
    let html = pages.fetch(url).await?;

    let doc = Html::parse_document(&html);
    let links: Vec<ReleaseLink> = doc
        .select(&LINK)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            href.starts_with(RELEASE_PATH_PREFIX)
                .then(|| ReleaseLink::new(href, normalize_title(&a.text().collect::<String>())))
        })
        .collect();

    debug!(url = %url, links = links.len(), "parsed listing");
    Ok(links)
}

/// `Ok(None)` when the page does not exist.
async fn index_page(
    pages: &dyn PageSource,
    cache: &PageCache,
    library_url: &str,
    page: u32,
) -> Result<Option<String>, FetchError> {
    let key = CacheKey::IndexPage(page);
    if let Some(html) = cached(cache, &key).await {
        debug!(page = page, "index page from cache");
        return Ok(Some(html));
    }

    let url = format!("{}/{}/", library_url.trim_end_matches('/'), page);
    info!(url = %url, "requesting index page");
    let html = match pages.fetch(&url).await {
        Ok(html) => html,
        Err(FetchError::NotFound(_)) => return Ok(None),
        Err(err) => return Err(err),
    };
    store_in_cache(cache, &key, &html).await;
    Ok(Some(html))
}

async fn movie_releases(
    pages: &dyn PageSource,
    cache: &PageCache,
    base_url: &str,
    movie_path: &str,
    title: &str,
) -> Result<Vec<ReleaseLink>, FetchError> {
    let key = CacheKey::Detail(movie_path);
    let html = match cached(cache, &key).await {
        Some(html) => {
            debug!(movie = %title, "movie page from cache");
            html
        },
        None => {
            let url = format!("{}{}", base_url.trim_end_matches('/'), movie_path);
            info!(url = %url, "requesting movie releases");
            let html = pages.fetch(&url).await?;
            store_in_cache(cache, &key, &html).await;
            html
        },
    };

    Ok(release_paths(&html).into_iter().map(|path| ReleaseLink::new(path, title)).collect())
}

/// An unreadable cache entry counts as a miss.
async fn cached(cache: &PageCache, key: &CacheKey<'_>) -> Option<String> {
    match cache.get(key).await {
        Ok(hit) => hit,
        Err(err) => {
            warn!(key = ?key, error = %err, "cache read failed");
            None
        },
    }
}

async fn store_in_cache(cache: &PageCache, key: &CacheKey<'_>, html: &str) {
    if let Err(err) = cache.put(key, html).await {
        warn!(key = ?key, error = %err, "cache write failed");
    }
}

/// `(title, path)` of the first link under every `h3`.
fn parse_index_page(html: &str) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    doc.select(&HEADING)
        .filter_map(|h3| {
            let a = h3.select(&LINK).next()?;
            let href = a.value().attr("href")?;
            Some((a.text().collect::<String>(), href.to_string()))
        })
        .collect()
}

fn release_paths(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with(RELEASE_PATH_PREFIX))
        .map(str::to_string)
        .collect()
}
