use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::client::{ClientError, SkebClient};
use crate::errors::MirrorError;
use crate::extract::{ext_from_url, parse_work_path};
use crate::models::{ArtworkRecord, PackRecord, PostRef};
use crate::pack::pack_flat;
use crate::repo::artwork_repo::{load_artworks, save_artworks_op};
use crate::repo::readme::{format_size, plural, render_crawl_readme};
use crate::repo::record_repo::{load_records, save_records_op};
use crate::repo::state_repo::{enqueue_unique, load_queue, load_seen, save_queue_op, save_seen_op};
use crate::repo::tag_repo::{load_tags, save_tags_op, TagSet};
use crate::repo::{PACKS_DIR, README_FILE};
use crate::storage::{CommitOp, MirrorStore};
use crate::throttle::Throttle;

use super::timestamp_slug;

/// Options for a newest-works crawl run
#[derive(Debug, Clone)]
pub struct NewestOptions {
    /// How many listing entries to pull before falling back to the queue
    pub candidates: usize,
    /// Cap on newly processed posts this run
    pub max_items: usize,
    /// Wall-clock budget for the run
    pub max_runtime: Duration,
    /// Pacing interval between post fetches
    pub timespan: Duration,
}

/// What a crawl run accomplished
#[derive(Debug)]
pub struct CrawlSummary {
    /// Posts newly processed (mirrored or recorded as unusable)
    pub processed: usize,
    /// Images shipped in the pack
    pub images: usize,
    /// Name of the committed pack, `None` when nothing was downloaded
    pub pack: Option<String>,
}

struct CrawlState {
    seen: BTreeSet<String>,
    queue: Vec<PostRef>,
    queued: HashSet<String>,
    artworks: Vec<ArtworkRecord>,
    tags: TagSet,
    processed: usize,
}

impl CrawlState {
    /// Marks a post as handled for this and every future run
    fn finish(&mut self, post_ref: &PostRef) {
        self.seen.insert(post_ref.suit_id());
        self.processed += 1;
    }
}

/// Keeps only the tags actually mentioned in the post body
///
/// Creators routinely tag-spam; a tag counts only when its text appears in
/// the body once embedded URLs are stripped (URLs tend to contain tag-like
/// tokens).
fn confirmed_tags(tag_list: &[String], body: &str) -> Vec<String> {
    let mut cleaned = body.to_string();
    for url in crate::extract::extract_urls(body) {
        cleaned = cleaned.replace(&url, "");
    }
    let cleaned_lower = cleaned.to_lowercase();
    tag_list
        .iter()
        .filter(|tag| cleaned_lower.contains(&tag.to_lowercase()))
        .cloned()
        .collect()
}

async fn process_post(
    client: &SkebClient,
    state: &mut CrawlState,
    img_dir: &Path,
    pack_name: &str,
    post_ref: &PostRef,
) -> Result<(), MirrorError> {
    let post = match client.get_post(&post_ref.username, post_ref.post_id).await {
        Ok(post) => post,
        Err(ClientError::Server { status, url }) if status.is_client_error() => {
            // deleted or hidden post: record it so the queue can't wedge on it
            warn!(%post_ref, %status, %url, "post unavailable, recorded and skipped");
            state.finish(post_ref);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(client_account) = post.client.clone() else {
        info!(%post_ref, "no client for this work, skipped");
        state.finish(post_ref);
        return Ok(());
    };

    let creator = post.creator.clone();
    let item_name = format!(
        "{}_{}__{}_{}__{}",
        creator.id, creator.screen_name, client_account.id, client_account.screen_name, post.id
    );

    let Some(image_url) = post.article_image_url.clone().filter(|u| !u.is_empty()) else {
        warn!(%post_ref, "no article image for this work");
        state.finish(post_ref);
        return Ok(());
    };

    let final_tags: Vec<String> = confirmed_tags(&post.tag_list, &post.body)
        .into_iter()
        .map(|tag| state.tags.intern(&tag))
        .collect();

    let ext = ext_from_url(&image_url).unwrap_or_default();
    let filename = format!("{item_name}{ext}");
    let dst = img_dir.join(&filename);
    info!(url = %image_url, file = %filename, "downloading article image");
    if let Err(err) = client.download(&image_url, &dst).await {
        error!(url = %image_url, error = %err, "download skipped due to error");
    }

    for work in &post.similar_works {
        if let Some(similar) = parse_work_path(&work.path) {
            enqueue_unique(&mut state.queue, &mut state.queued, &state.seen, similar);
        }
    }

    state.artworks.push(ArtworkRecord {
        id: post.id,
        post_id: post_ref.post_id,
        creator_id: creator.id,
        creator_name: creator.screen_name,
        client_id: client_account.id,
        client_name: client_account.screen_name,
        filename,
        packname: pack_name.to_string(),
        body: post.body,
        article_image_url: image_url,
        preview_url: post.preview_url,
        og_image_url: post.og_image_url,
        tags: final_tags,
    });
    state.finish(post_ref);
    Ok(())
}

/// Crawls the newest works into a fresh pack
///
/// Candidates come from the live listing first, then from the pending queue
/// persisted by earlier runs; the queue grows as processed posts surface
/// similar works. The pack and every state file land in one commit; a run
/// that downloads nothing commits nothing.
pub async fn crawl_newest(
    client: &SkebClient,
    store: &dyn MirrorStore,
    opts: &NewestOptions,
) -> Result<CrawlSummary, MirrorError> {
    let start = Instant::now();
    store.ensure_repository().await?;

    let seen = load_seen(store).await?;
    let queue = load_queue(store).await?;
    let queued: HashSet<String> = queue.iter().map(PostRef::suit_id).collect();
    let artworks = load_artworks(store).await?;
    let mut records = load_records(store).await?;
    let tags = TagSet::from_records(load_tags(store).await?);
    info!(
        "state loaded: {}, {}",
        plural(seen.len(), "seen id"),
        plural(queue.len(), "queued post")
    );

    let listing = client.list_newest(opts.candidates).await?;
    info!("{} listed", plural(listing.len(), "candidate post"));

    let scratch = tempfile::tempdir()?;
    let img_dir = scratch.path().join("images");
    std::fs::create_dir_all(&img_dir)?;
    let pack_name = format!("skb_newest_pack_{}.zip", timestamp_slug());

    let mut throttle = Throttle::new(opts.timespan);
    let mut state =
        CrawlState { seen, queue, queued, artworks, tags, processed: 0 };

    let out_of_budget = |state: &CrawlState| {
        state.processed >= opts.max_items || start.elapsed() >= opts.max_runtime
    };

    for post_ref in &listing {
        if out_of_budget(&state) {
            break;
        }
        if state.seen.contains(&post_ref.suit_id()) {
            debug!(%post_ref, "already crawled, skipped");
            continue;
        }
        throttle.wait().await;
        process_post(client, &mut state, &img_dir, &pack_name, post_ref).await?;
    }

    // The queue can grow while being walked; entries appended by a queued
    // post's similar works are eligible in the same run.
    let mut consumed = 0;
    while consumed < state.queue.len() {
        if out_of_budget(&state) {
            break;
        }
        let post_ref = state.queue[consumed].clone();
        consumed += 1;
        if state.seen.contains(&post_ref.suit_id()) {
            debug!(%post_ref, "already crawled, skipped");
            continue;
        }
        throttle.wait().await;
        process_post(client, &mut state, &img_dir, &pack_name, &post_ref).await?;
    }
    state.queue.drain(..consumed);

    if std::fs::read_dir(&img_dir)?.next().is_none() {
        warn!("no images downloaded, quitting without commit");
        return Ok(CrawlSummary { processed: state.processed, images: 0, pack: None });
    }

    let pack_path = scratch.path().join(&pack_name);
    let image_count = pack_flat(&img_dir, &pack_path)?;
    let pack_size = std::fs::metadata(&pack_path)?.len();

    records.push(PackRecord {
        filename: pack_name.clone(),
        images: image_count,
        size: format_size(pack_size),
        download: format!("[Download]({})", store.file_url(&format!("{PACKS_DIR}/{pack_name}"))),
    });
    records.sort_by(|a, b| b.filename.cmp(&a.filename));

    let total_artworks = state.artworks.len();
    let tags = state.tags.recount(&state.artworks);
    let readme = render_crawl_readme(&records, total_artworks, &tags);

    let ops = vec![
        CommitOp::add(format!("{PACKS_DIR}/{pack_name}"), &pack_path),
        save_records_op(records)?,
        save_tags_op(&tags)?,
        save_seen_op(&state.seen),
        save_artworks_op(state.artworks),
        save_queue_op(&state.queue),
        CommitOp::add_bytes(README_FILE, readme.into_bytes()),
    ];
    store.commit(ops, &format!("Create new pack {pack_name:?}.")).await?;
    info!(pack = %pack_name, images = image_count, "crawl committed");

    Ok(CrawlSummary {
        processed: state.processed,
        images: image_count,
        pack: Some(pack_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_confirmed_tags_requires_body_mention() {
        let body = "An original character piece. おまけ included!";
        let confirmed = confirmed_tags(&tags(&["original character", "omake", "おまけ"]), body);
        assert_eq!(confirmed, vec!["original character", "おまけ"]);
    }

    #[test]
    fn test_confirmed_tags_ignores_matches_inside_urls() {
        let body = "full set: https://example.com/galleries/watercolor/123";
        let confirmed = confirmed_tags(&tags(&["watercolor"]), body);
        assert!(confirmed.is_empty());
    }

    #[test]
    fn test_confirmed_tags_is_case_insensitive() {
        let body = "A WaterColor commission";
        let confirmed = confirmed_tags(&tags(&["watercolor"]), body);
        assert_eq!(confirmed, vec!["watercolor"]);
    }
}
