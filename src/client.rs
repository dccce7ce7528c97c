use std::path::Path;

use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, REFERER, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::extract::parse_work_path;
use crate::models::{Post, PostRef, WorkListing};

/// Listing page size used by the site's own frontend
const PAGE_LIMIT: usize = 90;

/// Desktop browser User-Agent pool; one is drawn per session
const UA_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36 Edg/117.0.2045.47",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:118.0) Gecko/20100101 Firefox/118.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:118.0) Gecko/20100101 Firefox/118.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
];

/// Picks a random desktop User-Agent string
pub fn random_user_agent() -> &'static str {
    UA_POOL.choose(&mut rand::rng()).copied().expect("UA pool is non-empty")
}

/// Error type for site API operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server returned an error status
    #[error("server error ({status}): {url}")]
    Server { status: reqwest::StatusCode, url: String },

    /// Network/connection/decoding error
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// Local file error while saving a download
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extension trait for turning error statuses into [`ClientError::Server`]
trait ResponseExt: Sized {
    fn check(self) -> Result<Self, ClientError>;
}

impl ResponseExt for reqwest::Response {
    fn check(self) -> Result<Self, ClientError> {
        if self.status().is_success() {
            Ok(self)
        } else {
            Err(ClientError::Server { status: self.status(), url: self.url().to_string() })
        }
    }
}

/// HTTP client for the Skeb public JSON API
///
/// Carries the session headers the site expects: a browser User-Agent, a
/// Referer pointing back at the site, and the anonymous `Bearer null`
/// authorization the frontend itself sends.
pub struct SkebClient {
    base_url: String,
    client: Client,
}

impl SkebClient {
    /// Creates a client session against `base_url` (e.g. `https://skeb.jp`)
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            HeaderValue::from_str(base_url).unwrap_or(HeaderValue::from_static("https://skeb.jp")),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer null"));

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client })
    }

    /// Fetches one page of the art works listing, newest first
    pub async fn get_page(&self, offset: usize, limit: usize) -> Result<Vec<WorkListing>, ClientError> {
        let url = format!("{}/api/works", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("sort", "date".to_string()),
                ("genre", "art".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?
            .check()?;
        Ok(response.json().await?)
    }

    /// Walks listing pages from the top and returns up to `limit` parsed
    /// post references
    ///
    /// Stops early on the first empty page. Listing entries whose path does
    /// not look like a work path are skipped.
    pub async fn list_newest(&self, limit: usize) -> Result<Vec<PostRef>, ClientError> {
        let mut refs = Vec::new();
        let mut offset = 0;
        while refs.len() < limit {
            let page = self.get_page(offset, PAGE_LIMIT).await?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            for entry in &page {
                match parse_work_path(&entry.path) {
                    Some(post_ref) => {
                        refs.push(post_ref);
                        if refs.len() >= limit {
                            break;
                        }
                    }
                    None => debug!(path = %entry.path, "unparsable listing path, skipped"),
                }
            }
        }
        Ok(refs)
    }

    /// Fetches a single post's full payload
    pub async fn get_post(&self, username: &str, post_id: u64) -> Result<Post, ClientError> {
        let url = format!("{}/api/users/{}/works/{}", self.base_url, username, post_id);
        let response = self.client.get(&url).send().await?.check()?;
        Ok(response.json().await?)
    }

    /// Downloads a resource through the session to a local file
    pub async fn download(&self, url: &str, dest: &Path) -> Result<(), ClientError> {
        let response = self.client.get(url).send().await?.check()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(UA_POOL.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_client_builds_and_trims_base_url() {
        let client = SkebClient::new("https://skeb.jp/").unwrap();
        assert_eq!(client.base_url, "https://skeb.jp");
    }
}
