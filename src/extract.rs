use std::sync::LazyLock;

use regex::Regex;

use crate::models::PostRef;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("url regex"));

static WORK_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/?@(?P<username>.+?)/works/(?P<work_id>\d+)/?$").expect("work path regex"));

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\W_]+").expect("non-word regex"));

/// Extracts all http/https URLs from a block of text
///
/// Trailing sentence punctuation is stripped so that URLs embedded in prose
/// ("see https://example.com/x.") come out clean.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ';', ':', '!', '?']).to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

/// Parses a work listing path like `/@username/works/12345` into a PostRef
///
/// Leading and trailing slashes are optional. Returns `None` when the path
/// does not have the expected shape.
pub fn parse_work_path(path: &str) -> Option<PostRef> {
    let caps = WORK_PATH_RE.captures(path)?;
    let username = caps.name("username")?.as_str().to_string();
    let post_id: u64 = caps.name("work_id")?.as_str().parse().ok()?;
    Some(PostRef { username, post_id })
}

/// Collapses every run of non-alphanumeric characters to a single underscore
/// and trims underscores from both ends
///
/// Used for archive member names, which must stay portable across
/// filesystems.
pub fn sanitize_name(text: &str) -> String {
    NON_WORD_RE.replace_all(text, "_").trim_matches('_').to_string()
}

/// Derives a file extension (with leading dot) from a resource URL
///
/// Falls back to the `fm` query parameter when the URL path carries no
/// extension, which is how the site's image CDN encodes formats.
pub fn ext_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let filename = parsed.path_segments()?.next_back()?.to_string();
    if let Some((_, ext)) = filename.rsplit_once('.') {
        if !ext.is_empty() {
            return Some(format!(".{ext}"));
        }
    }
    parsed
        .query_pairs()
        .find(|(k, _)| k == "fm")
        .map(|(_, v)| format!(".{v}"))
}

/// Repairs image URLs whose extension was cut off mid-token
///
/// Some post bodies truncate links at a fixed length, leaving `.j`, `.pn`,
/// `.gi` and friends. The completion preserves the original casing.
pub fn fix_truncated_ext(url: &str) -> String {
    let ext = match url.rsplit_once('.') {
        Some((_, tail)) if !tail.contains('/') => tail,
        _ => return url.to_string(),
    };
    let suffix = match ext {
        "j" => "pg",
        "jp" => "g",
        "J" => "PG",
        "JP" => "G",
        "p" => "ng",
        "pn" => "g",
        "P" => "NG",
        "PN" => "G",
        "g" => "if",
        "gi" => "f",
        "G" => "IF",
        "GI" => "F",
        _ => return url.to_string(),
    };
    format!("{url}{suffix}")
}

#[cfg(test)]
mod prop_tests;
