use std::sync::LazyLock;

use regex::Regex;

static VIDEO_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([^\\]+)\.(?:avi|mkv|mpeg|mpg|mov|mp4)$").expect("extension pattern")
});

static RELEASE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)(?:dvdrip|xvid|\s?\bcd[0-9]|dvdscr|brrip|divx|[{(\[]?[0-9]{4})")
        .expect("release tag pattern")
});

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\(.*\)").expect("parenthetical pattern"));

/// Reduces a release name or link text to something a movie search can use.
///
/// The video extension is stripped while the dots are still in place. Each
/// later stage cuts the output of the previous one. The result is not
/// re-trimmed, so `"Movie.Title.2020.BRRip.mkv"` keeps the space in front of
/// the year: `"Movie Title "`. Titles recorded by earlier crawls look the same.
pub fn normalize_title(raw: &str) -> String {
    let raw = raw.trim();
    let stem = first_group(&VIDEO_EXTENSION, raw);
    let mut title = stem.as_deref().unwrap_or(raw).replace('.', " ");

    if let Some(head) = first_group(&RELEASE_TAG, &title) {
        title = head;
    }
    if let Some(head) = first_group(&PARENTHETICAL, &title) {
        title = head;
    }

    title
}

fn first_group(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}
