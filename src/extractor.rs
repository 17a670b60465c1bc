use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::{error::ExtractError, models::Release, tmdb::IdentifierResolver};

const IMDB_TITLE_PREFIX: &str = "https://www.imdb.com/title";
const IMDB_ID_PREFIX: &str = "tt";
const TORRENT_CACHES: [&str; 3] =
    ["http://itorrents.org", "http://torrage.info", "http://btcache.me"];

const MB_BYTES: u64 = 107_374_182;
const GB_BYTES: u64 = 1_073_741_824;

static IMDB_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://www\.imdb\.com/title/tt\d+").expect("imdb url pattern"));

static SIZE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\(.*\)").expect("size annotation pattern"));

macro_rules! selector {
    ($css:literal) => {{
        static SELECTOR: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect($css));
        &*SELECTOR
    }};
}

/// Turns one release page into a [`Release`].
///
/// `associated_title` is the title the crawler found the link under; it is
/// only used for the external lookup. `Ok(None)` means no movie identifier
/// could be found, which drops the release.
pub async fn extract_release(
    html: &str,
    associated_title: &str,
    resolver: &dyn IdentifierResolver,
) -> Result<Option<Release>, ExtractError> {
    let mut release = parse_release(html)?;

    if release.movie_id.as_deref().is_some_and(|id| !id.is_empty()) {
        return Ok(Some(release));
    }

    if let Some(found) = IMDB_URL.find(html) {
        let id = last_segment(found.as_str());
        debug!(title = %release.title, imdb_id = %id, "imdb id found in raw page text");
        release.movie_id = Some(id);
        return Ok(Some(release));
    }

    match resolver.resolve(associated_title).await {
        Ok(Some(raw_id)) => {
            debug!(title = %associated_title, imdb_id = %raw_id, "imdb id resolved by title");
            release.movie_id = Some(format!("{IMDB_ID_PREFIX}{raw_id}"));
            Ok(Some(release))
        },
        Ok(None) => {
            debug!(title = %release.title, "release has no imdb id");
            Ok(None)
        },
        Err(err) => {
            warn!(title = %associated_title, error = %err, "title lookup failed");
            Ok(None)
        },
    }
}

/// Structured pass over the page. `movie_id` is only set from an IMDB anchor.
///
/// When the page repeats the IMDB anchor, the total size or the info hash, the
/// last occurrence is taken.
pub fn parse_release(html: &str) -> Result<Release, ExtractError> {
    let doc = Html::parse_document(html);

    let title = doc
        .select(selector!("h1"))
        .next()
        .map(|h1| element_text(&h1).trim().to_string())
        .ok_or(ExtractError::MissingElement("h1"))?;

    let mut release = Release { title, ..Release::default() };

    for a in doc.select(selector!("a[href]")) {
        let Some(href) = a.value().attr("href") else { continue };
        if href.starts_with(IMDB_TITLE_PREFIX) {
            release.movie_id = Some(last_segment(href));
        }
        if href.starts_with("magnet:") {
            release.magnet_links.push(href.to_string());
        }
        if TORRENT_CACHES.iter().any(|host| href.starts_with(host)) {
            release.cache_torrent_links.push(href.to_string());
        }
    }

    let size_text = doc
        .select(selector!("li"))
        .filter(|li| element_text(li).contains("Total size"))
        .filter_map(|li| li.select(selector!("span")).next())
        .last()
        .map(|span| element_text(&span));
    if let Some(size_text) = size_text {
        release.size_bytes = parse_size(&size_text)?;
    }

    release.seeders = doc
        .select(selector!("span.seeds"))
        .next()
        .map(|span| element_text(&span))
        .ok_or(ExtractError::MissingElement("span.seeds"))?;

    let info_hash = doc
        .select(selector!("p, li"))
        .filter(|el| element_text(el).contains("Infohash :"))
        .filter_map(|el| el.select(selector!("span")).next())
        .last()
        .map(|span| element_text(&span).trim().to_lowercase())
        .ok_or(ExtractError::MissingElement("infohash"))?;
    if info_hash.len() != 40 || !info_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ExtractError::InfoHash(info_hash));
    }
    release.info_hash = info_hash;

    let files = doc
        .select(selector!("div#files"))
        .next()
        .ok_or(ExtractError::MissingElement("div#files"))?;
    release.files = files
        .select(selector!("li"))
        .map(|li| SIZE_ANNOTATION.replace_all(&element_text(&li), "").trim().to_string())
        .collect();

    let trackers = doc
        .select(selector!("div#tracker-list"))
        .next()
        .ok_or(ExtractError::MissingElement("div#tracker-list"))?;
    release.trackers =
        trackers.select(selector!("li")).map(|li| element_text(&li).trim().to_string()).collect();

    debug!(
        title = %release.title,
        info_hash = %release.info_hash,
        size = release.size_bytes,
        files = release.files.len(),
        trackers = release.trackers.len(),
        magnets = release.magnet_links.len(),
        mirrors = release.cache_torrent_links.len(),
        "parsed release page"
    );

    Ok(release)
}

/// Converts `"1,234.5 MB"` style sizes to bytes. The decimal part is dropped
/// before scaling.
pub fn parse_size(text: &str) -> Result<u64, ExtractError> {
    let invalid = || ExtractError::Size(text.to_string());

    let mut parts = text.split_whitespace();
    let number = parts.next().ok_or_else(invalid)?;
    let multiplier = match parts.next() {
        Some("GB") => GB_BYTES,
        Some("MB") => MB_BYTES,
        _ => return Err(invalid()),
    };

    let whole = number.split('.').next().unwrap_or_default().replace(',', "");
    let value: u64 = whole.parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}

fn last_segment(url: &str) -> String {
    url.trim_end_matches('\\').rsplit('/').next().unwrap_or_default().to_string()
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

#[cfg(test)]
pub mod fixtures {
    pub const INFO_HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    /// A release page shaped like the real site's markup.
    pub fn release_page(size: &str, imdb_anchor: Option<&str>, files: &[&str]) -> String {
        let anchor = imdb_anchor
            .map(|href| format!(r#"<a href="{href}" target="_blank">IMDB</a>"#))
            .unwrap_or_default();
        let files: String =
            files.iter().map(|f| format!("<li><i class=\"flaticon-file\"></i> {f}</li>")).collect();
        format!(
            r#"<html><body>
<div class="box-info-heading clearfix"><h1> Some.Movie.2019.1080p.WEBRip.x264 </h1></div>
<ul class="dropdown-menu">
  <li><a href="magnet:?xt=urn:btih:0123456789ABCDEF0123456789ABCDEF01234567&dn=Some.Movie">Magnet Download</a></li>
  <li><a href="http://itorrents.org/torrent/0123456789ABCDEF0123456789ABCDEF01234567.torrent">ITORRENTS MIRROR</a></li>
  <li><a href="http://torrage.info/torrent.php?h=0123456789ABCDEF0123456789ABCDEF01234567">TORRAGE MIRROR</a></li>
  <li><a href="/user/uploader/">uploader</a></li>
</ul>
<ul class="list">
  <li><strong>Category</strong> <span>Movies</span></li>
  <li><strong>Total size</strong> <span>{size}</span></li>
</ul>
<ul class="list">
  <li><strong>Seeders</strong> <span class="seeds">12</span></li>
  <li><strong>Leechers</strong> <span class="leeches">3</span></li>
</ul>
<div class="infohash-box"><p><strong>Infohash :</strong> <span>0123456789ABCDEF0123456789ABCDEF01234567</span></p></div>
<div class="torrent-detail-info">{anchor}</div>
<div class="file-content" id="files"><ul>{files}</ul></div>
<div class="tracker-list" id="tracker-list"><ul>
  <li> udp://tracker.opentrackr.org:1337/announce </li>
</ul></div>
</body></html>"#
        )
    }
}
