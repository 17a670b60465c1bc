use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;
use tracing::debug;
use wreq::header::AUTHORIZATION;

use crate::error::AppResult;

/// Looks a movie title up in an external database.
///
/// Answers with the raw numeric IMDB identifier (no `tt` prefix) of the best
/// match, or `None` when nothing matched.
#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    async fn resolve(&self, title: &str) -> AppResult<Option<String>>;
}

pub struct TmdbResolver {
    client: wreq::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbResolver {
    pub fn new(client: wreq::Client, access_token: String, base_url: String, rps: u32) -> Self {
        if access_token.trim().is_empty() {
            tracing::warn!("no TMDB_ACCESS_TOKEN provided, title lookups will never match");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, access_token, base_url, limiter }
    }

    async fn search_movie(&self, title: &str) -> AppResult<Option<i64>> {
        self.limiter.until_ready().await;

        let url = format!("{}/search/movie", self.base_url.trim_end_matches('/'));
        let resp: SearchResponse = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.bearer())
            .query(&[("query", title)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.results.into_iter().next().map(|m| m.id))
    }

    async fn imdb_id(&self, tmdb_id: i64) -> AppResult<Option<String>> {
        self.limiter.until_ready().await;

        let url = format!("{}/movie/{}", self.base_url.trim_end_matches('/'), tmdb_id);
        let details: MovieDetails = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(details.imdb_id.as_deref().and_then(numeric_imdb_id))
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

#[async_trait]
impl IdentifierResolver for TmdbResolver {
    async fn resolve(&self, title: &str) -> AppResult<Option<String>> {
        if self.access_token.trim().is_empty() {
            return Ok(None);
        }

        let query = title.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let Some(tmdb_id) = self.search_movie(query).await? else {
            debug!(title = %query, "no TMDB search result");
            return Ok(None);
        };

        let imdb_id = self.imdb_id(tmdb_id).await?;
        debug!(title = %query, tmdb_id = tmdb_id, imdb_id = ?imdb_id, "resolved title via TMDB");
        Ok(imdb_id)
    }
}

fn numeric_imdb_id(imdb_id: &str) -> Option<String> {
    let digits = imdb_id.trim().trim_start_matches("tt");
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then(|| digits.to_string())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchMovie>,
}

#[derive(Debug, Deserialize)]
struct SearchMovie {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    imdb_id: Option<String>,
}
