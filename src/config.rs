use std::{path::PathBuf, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub cache_dir: PathBuf,
    pub base_url: String,
    pub library_url: String,
    pub library_max_page: u32,
    pub scrape_delay_ms: u64,
    pub listing_urls: Vec<String>,
    pub scrape_interval: Duration,
    pub init_marker: PathBuf,
    pub http_timeout: Duration,
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub tmdb_rps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://leetindex.db?mode=rwc".to_string(),
            cache_dir: PathBuf::from("./scrape-cache"),
            base_url: "https://1337x.to".to_string(),
            library_url: "https://1337x.to/movie-library".to_string(),
            library_max_page: 301,
            scrape_delay_ms: 1000,
            listing_urls: Vec::new(),
            scrape_interval: Duration::from_secs(3600),
            init_marker: PathBuf::from(".init"),
            http_timeout: Duration::from_secs(30),
            tmdb_access_token: String::new(),
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            tmdb_rps: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let cache_dir = std::env::var("CACHE_DIR").map(PathBuf::from).unwrap_or(defaults.cache_dir);
        let base_url = std::env::var("SITE_BASE_URL").unwrap_or(defaults.base_url);
        let library_url = std::env::var("LIBRARY_URL").unwrap_or(defaults.library_url);

        let library_max_page = parse_var("LIBRARY_MAX_PAGE")?.unwrap_or(defaults.library_max_page);
        let scrape_delay_ms = parse_var("SCRAPE_DELAY_MS")?.unwrap_or(defaults.scrape_delay_ms);

        let listing_urls = std::env::var("SCRAPE_URLS")
            .map(|raw| split_urls(&raw))
            .unwrap_or(defaults.listing_urls);

        let mut interval_parts = Vec::new();
        for (name, unit) in [
            ("SCRAPE_INTERVAL_DAYS", 86_400),
            ("SCRAPE_INTERVAL_HOURS", 3_600),
            ("SCRAPE_INTERVAL_MINUTES", 60),
            ("SCRAPE_INTERVAL_SECONDS", 1),
        ] {
            if let Some(value) = parse_var::<u64>(name)? {
                interval_parts.push((value, unit));
            }
        }
        let scrape_interval = sum_interval(&interval_parts)?.unwrap_or(defaults.scrape_interval);

        let init_marker =
            std::env::var("INIT_MARKER").map(PathBuf::from).unwrap_or(defaults.init_marker);

        let http_timeout = parse_var("HTTP_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let tmdb_access_token = std::env::var("TMDB_ACCESS_TOKEN").unwrap_or_default();
        let tmdb_base_url = std::env::var("TMDB_BASE_URL").unwrap_or(defaults.tmdb_base_url);
        let tmdb_rps = parse_var("TMDB_RPS")?.unwrap_or(defaults.tmdb_rps);

        Ok(Self {
            database_url,
            cache_dir,
            base_url,
            library_url,
            library_max_page,
            scrape_delay_ms,
            listing_urls,
            scrape_interval,
            init_marker,
            http_timeout,
            tmdb_access_token,
            tmdb_base_url,
            tmdb_rps,
        })
    }
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map(Some).with_context(|| name.to_string())
        },
        _ => Ok(None),
    }
}

/// Sums `(value, seconds per unit)` pairs. `None` when no part was given.
fn sum_interval(parts: &[(u64, u64)]) -> anyhow::Result<Option<Duration>> {
    if parts.is_empty() {
        return Ok(None);
    }
    let mut secs: u64 = 0;
    for &(value, unit) in parts {
        secs = value
            .checked_mul(unit)
            .and_then(|part| secs.checked_add(part))
            .ok_or_else(|| anyhow::anyhow!("scrape interval is too large"))?;
    }
    if secs == 0 {
        anyhow::bail!("scrape interval must be greater than zero");
    }
    Ok(Some(Duration::from_secs(secs)))
}

fn split_urls(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_urls_drops_blank_entries() {
        let urls = split_urls(" https://1337x.to/cat/Movies/1/ ,, https://1337x.to/top-100-movies ,");
        assert_eq!(
            urls,
            vec![
                "https://1337x.to/cat/Movies/1/".to_string(),
                "https://1337x.to/top-100-movies".to_string(),
            ]
        );
    }

    #[test]
    fn interval_parts_add_up() {
        let interval = sum_interval(&[(1, 86_400), (2, 3_600), (30, 1)]).unwrap();
        assert_eq!(interval, Some(Duration::from_secs(86_400 + 7_200 + 30)));
        assert_eq!(sum_interval(&[]).unwrap(), None);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = sum_interval(&[(0, 3_600), (0, 60)]).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn overflowing_interval_is_rejected() {
        let err = sum_interval(&[(u64::MAX, 86_400)]).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(sum_interval(&[(u64::MAX, 1), (1, 1)]).is_err());
    }

    #[test]
    fn defaults_point_at_the_movie_library() {
        let config = Config::default();
        assert_eq!(config.library_max_page, 301);
        assert!(config.library_url.starts_with(&config.base_url));
        assert!(!config.scrape_interval.is_zero());
    }
}
