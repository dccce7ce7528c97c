use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{Result, StoreError};
use super::traits::{CommitOp, MirrorStore};

/// Git-LFS tracking rules appended on repository creation; state tables can
/// outgrow the regular blob limits
const LFS_RULES: &[&str] = &[
    "*.json filter=lfs diff=lfs merge=lfs -text",
    "*.csv filter=lfs diff=lfs merge=lfs -text",
];

/// One entry of the Hub tree listing
#[derive(Debug, Deserialize)]
struct TreeEntry {
    #[serde(rename = "type")]
    entry_type: String,
    path: String,
}

/// A mirror living in a Hugging Face dataset repository
///
/// Talks to the Hub HTTP API directly: `resolve/` URLs for reads, the
/// `tree` endpoint for listings, and the NDJSON `commit` endpoint for
/// writes. All repositories are created private.
pub struct HubStore {
    repo_id: String,
    endpoint: String,
    client: Client,
}

impl HubStore {
    /// Creates a store for `repo_id` (`namespace/name`)
    pub fn new(repo_id: &str, endpoint: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| StoreError::Malformed("token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            repo_id: repo_id.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn api_url(&self, tail: &str) -> String {
        format!("{}/api/datasets/{}{}", self.endpoint, self.repo_id, tail)
    }

    fn resolve_url(&self, path: &str) -> String {
        format!("{}/datasets/{}/resolve/main/{}", self.endpoint, self.repo_id, path)
    }

    async fn repo_exists(&self) -> Result<bool> {
        let url = self.api_url("");
        let response = self.client.get(&url).send().await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => Ok(false),
            status => Err(StoreError::Status { status, url }),
        }
    }

    async fn create_repo(&self) -> Result<()> {
        let (organization, name) = match self.repo_id.split_once('/') {
            Some((org, name)) => (Some(org), name),
            None => (None, self.repo_id.as_str()),
        };
        let mut body = json!({
            "type": "dataset",
            "name": name,
            "private": true,
        });
        if let Some(org) = organization {
            body["organization"] = json!(org);
        }
        let url = format!("{}/api/repos/create", self.endpoint);
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { status, url });
        }
        Ok(())
    }

    /// Appends the LFS rules to `.gitattributes`, keeping whatever rules the
    /// Hub seeded the repository with
    async fn track_state_files(&self) -> Result<()> {
        let existing = self.read_text(".gitattributes").await.unwrap_or_default();
        let mut lines: Vec<String> =
            existing.lines().filter(|l| !l.is_empty()).map(str::to_string).collect();
        for rule in LFS_RULES {
            if !lines.iter().any(|l| l == rule) {
                lines.push((*rule).to_string());
            }
        }
        self.write_text(".gitattributes", &lines.join("\n"), "Track state files with LFS.").await
    }

    fn ndjson_line(op: &CommitOp) -> Result<String> {
        let value = match op {
            CommitOp::Add { path, source } => {
                let bytes = std::fs::read(source)?;
                json!({
                    "key": "file",
                    "value": {
                        "path": path,
                        "content": BASE64.encode(&bytes),
                        "encoding": "base64",
                    }
                })
            }
            CommitOp::AddBytes { path, bytes } => json!({
                "key": "file",
                "value": {
                    "path": path,
                    "content": BASE64.encode(bytes),
                    "encoding": "base64",
                }
            }),
            CommitOp::Copy { src, dest } => json!({
                "key": "copyFile",
                "value": { "path": dest, "srcPath": src }
            }),
            CommitOp::Delete { path } => json!({
                "key": "deletedFile",
                "value": { "path": path }
            }),
        };
        Ok(value.to_string())
    }
}

#[async_trait]
impl MirrorStore for HubStore {
    async fn ensure_repository(&self) -> Result<()> {
        if self.repo_exists().await? {
            return Ok(());
        }
        info!(repo = %self.repo_id, "creating dataset repository");
        self.create_repo().await?;
        self.track_state_files().await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let url = self.resolve_url(path);
        let response = self.client.head(&url).send().await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::Status { status, url }),
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.resolve_url(path);
        let response = self.client.get(&url).send().await?;
        match response.status() {
            s if s.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(path.to_string())),
            status => Err(StoreError::Status { status, url }),
        }
    }

    async fn size(&self, path: &str) -> Result<u64> {
        let url = self.resolve_url(path);
        let response = self.client.head(&url).send().await?;
        match response.status() {
            s if s.is_success() => response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| StoreError::Malformed(format!("no content length for {path}"))),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(path.to_string())),
            status => Err(StoreError::Status { status, url }),
        }
    }

    async fn download_to(&self, path: &str, dest: &Path) -> Result<()> {
        let bytes = self.read(path).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let tail = if prefix.is_empty() {
            "/tree/main".to_string()
        } else {
            format!("/tree/main/{}", prefix.trim_end_matches('/'))
        };
        let url = format!("{}?recursive=true", self.api_url(&tail));
        let response = self.client.get(&url).send().await?;
        match response.status() {
            s if s.is_success() => {
                let entries: Vec<TreeEntry> = response.json().await?;
                Ok(entries
                    .into_iter()
                    .filter(|e| e.entry_type == "file")
                    .map(|e| e.path)
                    .collect())
            }
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(StoreError::Status { status, url }),
        }
    }

    async fn commit(&self, ops: Vec<CommitOp>, message: &str) -> Result<()> {
        let mut lines = vec![json!({
            "key": "header",
            "value": { "summary": message, "description": "" }
        })
        .to_string()];
        for op in &ops {
            lines.push(Self::ndjson_line(op)?);
        }

        let url = self.api_url("/commit/main");
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/x-ndjson")
            .body(lines.join("\n"))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { status, url });
        }
        info!(repo = %self.repo_id, ops = ops.len(), "commit: {message}");
        Ok(())
    }

    fn file_url(&self, path: &str) -> String {
        self.resolve_url(path)
    }
}
