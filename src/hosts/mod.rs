//! Adapters for the file hosts creators link from their post bodies
//!
//! Each adapter answers three questions about a URL: is it mine, what stable
//! resource id does it map to (for dedup across runs), and how do I fetch it
//! into a local directory. Adapters are tried in registry order; the first
//! match wins.

mod dropbox;
mod google_drive;
mod imgur;

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

pub use dropbox::Dropbox;
pub use google_drive::GoogleDrive;
pub use imgur::Imgur;

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status { status: reqwest::StatusCode, url: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported resource: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, HostError>;

#[async_trait]
pub trait HostAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this adapter claims the URL
    fn matches(&self, url: &str) -> bool;

    /// Stable resource id for dedup, e.g. `googledrive_{file_id}`
    ///
    /// `None` means the adapter recognizes the host but cannot pin down a
    /// resource (throwaway link formats, unsupported album types); callers
    /// skip such URLs.
    fn resource_id(&self, url: &str) -> Option<String>;

    /// Downloads the resource's files into `dest_dir`
    async fn fetch(&self, client: &Client, url: &str, dest_dir: &Path) -> Result<()>;
}

/// The adapter registry, in match priority order
pub fn known_hosts() -> Vec<Box<dyn HostAdapter>> {
    vec![Box::new(GoogleDrive), Box::new(Imgur), Box::new(Dropbox)]
}

/// Host part of a URL, lowercased
pub(crate) fn url_host(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed.host_str().map(str::to_lowercase)
}

/// Filename advertised in a Content-Disposition header, if any
pub(crate) fn disposition_filename(response: &reqwest::Response) -> Option<String> {
    let raw = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    // RFC 5987 form first, then the plain quoted form
    if let Some(rest) = raw.split("filename*=UTF-8''").nth(1) {
        let name = rest.split(';').next().unwrap_or(rest).trim();
        let decoded: String = percent_decode(name);
        return Some(decoded.replace(std::path::MAIN_SEPARATOR, "_"));
    }
    let rest = raw.split("filename=").nth(1)?;
    let name = rest.split(';').next().unwrap_or(rest).trim().trim_matches('"');
    Some(name.replace(std::path::MAIN_SEPARATOR, "_"))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&input[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Writes a response body into `dest_dir` under `filename`
pub(crate) async fn save_body(
    response: reqwest::Response,
    dest_dir: &Path,
    filename: &str,
) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        return Err(HostError::Status { status, url: response.url().to_string() });
    }
    tokio::fs::create_dir_all(dest_dir).await?;
    let bytes = response.bytes().await?;
    tokio::fs::write(dest_dir.join(filename), &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_claims_are_disjoint_per_url() {
        let hosts = known_hosts();
        let urls = [
            "https://drive.google.com/file/d/abc/view",
            "https://i.imgur.com/xyz.png",
            "https://www.dropbox.com/s/tok/pack.zip?dl=0",
        ];
        for url in urls {
            let claims = hosts.iter().filter(|h| h.matches(url)).count();
            assert_eq!(claims, 1, "exactly one adapter should claim {url}");
        }
    }

    #[test]
    fn test_unclaimed_url() {
        let hosts = known_hosts();
        assert!(hosts.iter().all(|h| !h.matches("https://example.com/file.zip")));
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("final%20art%281%29.png"), "final art(1).png");
        assert_eq!(percent_decode("plain.png"), "plain.png");
    }
}
