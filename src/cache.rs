use std::{io::ErrorKind, path::PathBuf};

use tracing::debug;

use crate::error::AppResult;

const DETAIL_PAGE_FILE: &str = "page.html";

/// Identifies one cached page of the target site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CacheKey<'a> {
    /// A numbered page of the movie library index.
    IndexPage(u32),
    /// A site-relative detail path such as `/movie/123/Some-Movie/`.
    Detail(&'a str),
}

/// Write-once, file-backed HTML cache. Entries never expire.
#[derive(Clone, Debug)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    pub async fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub async fn get(&self, key: &CacheKey<'_>) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => {
                debug!(path = %path.display(), "cache hit");
                Ok(Some(html))
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn put(&self, key: &CacheKey<'_>, html: &str) -> AppResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, html).await?;
        debug!(path = %path.display(), bytes = html.len(), "cached page");
        Ok(())
    }

    fn path_for(&self, key: &CacheKey<'_>) -> PathBuf {
        match key {
            CacheKey::IndexPage(page) => self.root.join(format!("main-{page}.html")),
            CacheKey::Detail(detail_path) => {
                let mut path = self.root.clone();
                for segment in detail_path.split('/') {
                    if segment.is_empty() || segment == "." || segment == ".." {
                        continue;
                    }
                    path.push(sanitize_segment(segment));
                }
                path.join(DETAIL_PAGE_FILE)
            },
        }
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::open(dir.path()).await.unwrap();

        let key = CacheKey::IndexPage(3);
        assert_eq!(cache.get(&key).await.unwrap(), None);

        cache.put(&key, "<html>page three</html>").await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("<html>page three</html>"));
        assert!(dir.path().join("main-3.html").is_file());
    }

    #[tokio::test]
    async fn detail_paths_mirror_url_segments() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::open(dir.path()).await.unwrap();

        let key = CacheKey::Detail("/movie/8630/The-Matrix/");
        cache.put(&key, "matrix").await.unwrap();

        let expected = dir.path().join("movie").join("8630").join("The-Matrix").join("page.html");
        assert!(expected.is_file());
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("matrix"));
    }

    #[tokio::test]
    async fn detail_paths_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::open(dir.path().join("cache")).await.unwrap();

        let path = cache.path_for(&CacheKey::Detail("/../../etc/pass wd"));
        assert!(path.starts_with(&cache.root));
        assert!(path.ends_with("etc/pass_wd/page.html"));
    }
}
