/// A release page to visit, paired with the movie title it was found under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseLink {
    pub path: String,
    pub title: String,
}

impl ReleaseLink {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self { path: path.into(), title: title.into() }
    }
}

/// One torrent as described by its detail page.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Release {
    pub title: String,
    /// Lowercase hex, 40 characters.
    pub info_hash: String,
    pub size_bytes: u64,
    /// Raw text of the seeders counter; may be empty.
    pub seeders: String,
    pub trackers: Vec<String>,
    pub files: Vec<String>,
    pub movie_id: Option<String>,
    pub magnet_links: Vec<String>,
    pub cache_torrent_links: Vec<String>,
}

impl Release {
    /// Seeder count as stored; anything that is not a number becomes `None`.
    pub fn seeder_count(&self) -> Option<i32> {
        self.seeders.trim().replace(',', "").parse().ok()
    }
}

/// A stored release together with its file rows.
#[derive(Clone, Debug)]
pub struct StoredRelease {
    pub torrent: crate::entities::torrent::Model,
    pub files: Vec<crate::entities::file::Model>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProcessStats {
    pub stored: usize,
    pub unresolved: usize,
    pub failed: usize,
}

impl ProcessStats {
    pub fn total(&self) -> usize {
        self.stored + self.unresolved + self.failed
    }
}
