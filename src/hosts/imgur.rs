use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{save_body, url_host, HostAdapter, HostError, Result};

/// Imgur direct images and single-image pages
///
/// Albums and galleries need the authenticated API; their links are
/// reported as unresolvable.
pub struct Imgur;

impl Imgur {
    /// `(hash, extension)` for a single-image link
    fn image_ref(url: &str) -> Option<(String, Option<String>)> {
        let parsed = reqwest::Url::parse(url).ok()?;
        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
        let first = segments.next()?;
        if segments.next().is_some() {
            return None;
        }
        if matches!(first, "a" | "gallery" | "t" | "user") {
            debug!(%url, "imgur album/gallery link, not resolvable without the API");
            return None;
        }
        match first.rsplit_once('.') {
            Some((hash, ext)) if !hash.is_empty() => {
                Some((hash.to_string(), Some(ext.to_string())))
            }
            _ => Some((first.to_string(), None)),
        }
    }
}

#[async_trait]
impl HostAdapter for Imgur {
    fn name(&self) -> &'static str {
        "imgur"
    }

    fn matches(&self, url: &str) -> bool {
        matches!(
            url_host(url).as_deref(),
            Some("imgur.com") | Some("i.imgur.com") | Some("m.imgur.com")
        )
    }

    fn resource_id(&self, url: &str) -> Option<String> {
        Self::image_ref(url).map(|(hash, _)| format!("imgur_{hash}"))
    }

    async fn fetch(&self, client: &Client, url: &str, dest_dir: &Path) -> Result<()> {
        let (hash, ext) = Self::image_ref(url)
            .ok_or_else(|| HostError::Unsupported(format!("no imgur image hash in {url}")))?;
        // The image CDN serves the file under any known hash; the extension
        // only influences the filename we keep
        let ext = ext.unwrap_or_else(|| "png".to_string());
        let direct = format!("https://i.imgur.com/{hash}.{ext}");
        let response = client.get(&direct).send().await?;
        save_body(response, dest_dir, &format!("{hash}.{ext}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        assert!(Imgur.matches("https://i.imgur.com/aBcD123.png"));
        assert!(Imgur.matches("https://imgur.com/aBcD123"));
        assert!(!Imgur.matches("https://example.com/imgur.com"));
    }

    #[test]
    fn test_resource_id_direct_image() {
        assert_eq!(Imgur.resource_id("https://i.imgur.com/aBcD123.png"), Some("imgur_aBcD123".into()));
    }

    #[test]
    fn test_resource_id_page_link() {
        assert_eq!(Imgur.resource_id("https://imgur.com/aBcD123"), Some("imgur_aBcD123".into()));
    }

    #[test]
    fn test_albums_unresolvable() {
        assert_eq!(Imgur.resource_id("https://imgur.com/a/xYz9"), None);
        assert_eq!(Imgur.resource_id("https://imgur.com/gallery/xYz9"), None);
    }
}
