use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use super::{disposition_filename, save_body, url_host, HostAdapter, HostError, Result};

static FILE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/file/d/(?P<id>[\w-]+)").expect("drive path regex"));

static FORM_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<form[^>]*id="download-form"[^>]*action="(?P<action>[^"]+)""#)
        .expect("drive form regex")
});

static HIDDEN_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input[^>]*type="hidden"[^>]*name="(?P<name>[^"]+)"[^>]*value="(?P<value>[^"]*)""#)
        .expect("drive input regex")
});

/// Google Drive share links
///
/// Single files only. Folder links need the Drive listing API and are
/// reported as unresolvable so the caller skips them.
pub struct GoogleDrive;

impl GoogleDrive {
    fn file_id(url: &str) -> Option<String> {
        if let Some(caps) = FILE_PATH_RE.captures(url) {
            return Some(caps["id"].to_string());
        }
        let parsed = reqwest::Url::parse(url).ok()?;
        if parsed.path().starts_with("/drive/folders/") {
            debug!(%url, "drive folder link, not resolvable to a single resource");
            return None;
        }
        parsed
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())
    }
}

#[async_trait]
impl HostAdapter for GoogleDrive {
    fn name(&self) -> &'static str {
        "googledrive"
    }

    fn matches(&self, url: &str) -> bool {
        url_host(url).as_deref() == Some("drive.google.com")
    }

    fn resource_id(&self, url: &str) -> Option<String> {
        Self::file_id(url).map(|id| format!("googledrive_{id}"))
    }

    async fn fetch(&self, client: &Client, url: &str, dest_dir: &Path) -> Result<()> {
        let id = Self::file_id(url)
            .ok_or_else(|| HostError::Unsupported(format!("no drive file id in {url}")))?;
        let direct = format!("https://drive.google.com/uc?export=download&id={id}");
        let response = client.get(&direct).send().await?;

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/html"))
            .unwrap_or(false);

        let response = if is_html {
            // Virus-scan interstitial: replay the confirmation form
            let page = response.text().await?;
            let action = FORM_ACTION_RE
                .captures(&page)
                .map(|c| c["action"].replace("&amp;", "&"))
                .ok_or_else(|| {
                    HostError::Unsupported(format!("drive confirmation page not understood for {id}"))
                })?;
            let params: Vec<(String, String)> = HIDDEN_INPUT_RE
                .captures_iter(&page)
                .map(|c| (c["name"].to_string(), c["value"].to_string()))
                .collect();
            client.get(&action).query(&params).send().await?
        } else {
            response
        };

        let filename =
            disposition_filename(&response).unwrap_or_else(|| format!("{id}.bin"));
        save_body(response, dest_dir, &filename).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        assert!(GoogleDrive.matches("https://drive.google.com/file/d/abc/view"));
        assert!(!GoogleDrive.matches("https://docs.example.com/file/d/abc"));
        assert!(!GoogleDrive.matches("not a url"));
    }

    #[test]
    fn test_resource_id_from_file_path() {
        assert_eq!(
            GoogleDrive.resource_id("https://drive.google.com/file/d/1aB_c-9/view?usp=sharing"),
            Some("googledrive_1aB_c-9".into())
        );
    }

    #[test]
    fn test_resource_id_from_query() {
        assert_eq!(
            GoogleDrive.resource_id("https://drive.google.com/uc?export=download&id=xYz12"),
            Some("googledrive_xYz12".into())
        );
        assert_eq!(
            GoogleDrive.resource_id("https://drive.google.com/open?id=xYz12"),
            Some("googledrive_xYz12".into())
        );
    }

    #[test]
    fn test_folder_links_unresolvable() {
        assert_eq!(
            GoogleDrive.resource_id("https://drive.google.com/drive/folders/1AbCd"),
            None
        );
    }
}
