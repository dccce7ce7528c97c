use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::client::{random_user_agent, ClientError, SkebClient};
use crate::errors::MirrorError;
use crate::extract::{extract_urls, fix_truncated_ext};
use crate::hosts::{known_hosts, HostAdapter};
use crate::pack::pack_directory;
use crate::repo::readme::plural;
use crate::repo::UNARCHIVED_DIR;
use crate::storage::MirrorStore;
use crate::throttle::Throttle;

/// Pacing between host downloads (the hosts are not the site being
/// mirrored and get a slower beat)
const DOWNLOAD_INTERVAL_SECS: f64 = 5.0;

/// Options for a link-mirroring run
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// How many newest posts to scan for links
    pub candidates: usize,
    /// Pacing interval between post fetches
    pub timespan: Duration,
}

/// What a link-mirroring run accomplished
#[derive(Debug, Default)]
pub struct MirrorSummary {
    /// Posts scanned
    pub posts: usize,
    /// URLs considered
    pub urls: usize,
    /// Resource archives uploaded
    pub packages: usize,
}

/// Scans the newest posts for external resource links and archives each
/// resolvable resource as `unarchived/{resource_id}.zip`
pub async fn mirror_newest(
    client: &SkebClient,
    store: &dyn MirrorStore,
    opts: &MirrorOptions,
) -> Result<MirrorSummary, MirrorError> {
    store.ensure_repository().await?;

    let hosts = known_hosts();
    let host_client = Client::builder()
        .user_agent(random_user_agent())
        .build()
        .map_err(ClientError::from)?;

    let refs = client.list_newest(opts.candidates).await?;
    info!("{} to scan", plural(refs.len(), "post"));

    let mut post_throttle = Throttle::new(opts.timespan);
    let mut download_throttle = Throttle::from_secs_f64(DOWNLOAD_INTERVAL_SECS);
    let mut summary = MirrorSummary::default();

    for post_ref in &refs {
        post_throttle.wait().await;
        let post = match client.get_post(&post_ref.username, post_ref.post_id).await {
            Ok(post) => post,
            Err(ClientError::Server { status, url }) if status.is_client_error() => {
                warn!(%post_ref, %status, %url, "post unavailable, skipped");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        summary.posts += 1;

        let text = format!("{}\n{}", post.source_body, post.body);
        // body links are often truncated mid-extension by the site's editor
        let urls: Vec<String> =
            extract_urls(&text).into_iter().map(|u| fix_truncated_ext(&u)).collect();
        info!("{} found in {}", plural(urls.len(), "url"), post_ref);

        let prefix = format!("{}_{}_", post_ref.username, post_ref.post_id);
        for url in &urls {
            summary.urls += 1;
            if try_process_url(store, &hosts, &host_client, &mut download_throttle, url, &prefix)
                .await?
            {
                summary.packages += 1;
            }
        }
    }

    Ok(summary)
}

/// Archives one URL's resource if a host adapter claims it
///
/// Returns whether a package was uploaded. A URL is dropped (not an error)
/// when no adapter claims it, its resource id is unresolvable, the resource
/// was already archived by any earlier run, the download fails, or the
/// download turns out empty.
pub async fn try_process_url(
    store: &dyn MirrorStore,
    hosts: &[Box<dyn HostAdapter>],
    http: &Client,
    throttle: &mut Throttle,
    url: &str,
    prefix: &str,
) -> Result<bool, MirrorError> {
    for host in hosts {
        if !host.matches(url) {
            continue;
        }
        let Some(resource_id) = host.resource_id(url) else {
            info!(%url, host = host.name(), "unknown resource info, skipped");
            return Ok(false);
        };
        info!(%resource_id, %url, "resource confirmed");

        let zip_name = format!("{resource_id}.zip");
        let already = store
            .list("")
            .await?
            .iter()
            .any(|path| path.ends_with(&format!("/{zip_name}")));
        if already {
            info!(%resource_id, "already crawled, skipped");
            return Ok(false);
        }

        throttle.wait().await;
        let scratch = tempfile::tempdir()?;
        let download_dir = scratch.path().join("download");
        std::fs::create_dir_all(&download_dir)?;
        if let Err(err) = host.fetch(http, url, &download_dir).await {
            warn!(%url, error = %err, "download failed, skipped");
            return Ok(false);
        }

        let zip_path = scratch.path().join(&zip_name);
        let entries = pack_directory(&download_dir, &zip_path, prefix)?;
        if entries == 0 {
            info!(%resource_id, "empty package detected, skipped");
            return Ok(false);
        }

        store
            .upload_file(
                &zip_path,
                &format!("{UNARCHIVED_DIR}/{zip_name}"),
                &format!("Add resource {resource_id:?}."),
            )
            .await?;
        info!(%resource_id, entries, "package uploaded");
        return Ok(true);
    }

    info!(%url, "url unconfirmed, skipped");
    Ok(false)
}
