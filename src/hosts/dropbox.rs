use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;

use super::{disposition_filename, save_body, url_host, HostAdapter, HostError, Result};

/// Dropbox share links (`/s/`, `/sh/` and `/scl/fi/` forms)
///
/// Fetching rewrites the link to `dl=1`, which serves the file (or a zip of
/// the shared folder) directly.
pub struct Dropbox;

impl Dropbox {
    fn share_token(url: &str) -> Option<String> {
        let parsed = reqwest::Url::parse(url).ok()?;
        let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["s", token, ..] | ["sh", token, ..] => Some((*token).to_string()),
            ["scl", "fi", token, ..] | ["scl", "fo", token, ..] => Some((*token).to_string()),
            _ => None,
        }
    }

    fn direct_url(url: &str) -> Option<String> {
        let mut parsed = reqwest::Url::parse(url).ok()?;
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| k != "dl")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        parsed.query_pairs_mut().clear().extend_pairs(pairs).append_pair("dl", "1");
        Some(parsed.into())
    }
}

#[async_trait]
impl HostAdapter for Dropbox {
    fn name(&self) -> &'static str {
        "dropbox"
    }

    fn matches(&self, url: &str) -> bool {
        matches!(
            url_host(url).as_deref(),
            Some("dropbox.com") | Some("www.dropbox.com") | Some("dl.dropboxusercontent.com")
        )
    }

    fn resource_id(&self, url: &str) -> Option<String> {
        Self::share_token(url).map(|token| format!("dropbox_{token}"))
    }

    async fn fetch(&self, client: &Client, url: &str, dest_dir: &Path) -> Result<()> {
        let token = Self::share_token(url)
            .ok_or_else(|| HostError::Unsupported(format!("no dropbox share token in {url}")))?;
        let direct = Self::direct_url(url)
            .ok_or_else(|| HostError::Unsupported(format!("unparsable dropbox url {url}")))?;
        let response = client.get(&direct).send().await?;

        let filename = disposition_filename(&response)
            .or_else(|| {
                reqwest::Url::parse(url)
                    .ok()?
                    .path_segments()?
                    .next_back()
                    .filter(|s| s.contains('.'))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("{token}.bin"));
        save_body(response, dest_dir, &filename).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        assert!(Dropbox.matches("https://www.dropbox.com/s/abc/pack.zip?dl=0"));
        assert!(Dropbox.matches("https://dropbox.com/sh/abc/xyz"));
        assert!(!Dropbox.matches("https://drive.google.com/s/abc"));
    }

    #[test]
    fn test_resource_id_share_forms() {
        assert_eq!(
            Dropbox.resource_id("https://www.dropbox.com/s/ab12cd/pack.zip?dl=0"),
            Some("dropbox_ab12cd".into())
        );
        assert_eq!(
            Dropbox.resource_id("https://www.dropbox.com/scl/fi/xyz987/art.png?rlkey=k"),
            Some("dropbox_xyz987".into())
        );
        assert_eq!(Dropbox.resource_id("https://www.dropbox.com/home"), None);
    }

    #[test]
    fn test_direct_url_forces_dl() {
        assert_eq!(
            Dropbox::direct_url("https://www.dropbox.com/s/ab/p.zip?dl=0").unwrap(),
            "https://www.dropbox.com/s/ab/p.zip?dl=1"
        );
        assert_eq!(
            Dropbox::direct_url("https://www.dropbox.com/s/ab/p.zip").unwrap(),
            "https://www.dropbox.com/s/ab/p.zip?dl=1"
        );
    }
}
