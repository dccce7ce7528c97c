use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use tracing::info;

use crate::models::PostRef;
use crate::storage::{CommitOp, MirrorStore};

use super::{json_op, QUEUE_FILE, SEEN_FILE};

/// Loads the seen-post dedup keys, empty on a fresh mirror
///
/// ### Returns
///
/// The set of `{username}_{post_id}` keys that have already been processed
/// (mirrored or deliberately skipped).
pub async fn load_seen(store: &dyn MirrorStore) -> Result<BTreeSet<String>> {
    if !store.exists(SEEN_FILE).await? {
        return Ok(BTreeSet::new());
    }
    let bytes = store.read(SEEN_FILE).await?;
    let seen: BTreeSet<String> = serde_json::from_slice(&bytes)?;
    info!("{} seen post ids loaded", seen.len());
    Ok(seen)
}

/// Renders the seen set back to its state file
///
/// A `BTreeSet` serializes in sorted order, which keeps the file diffable
/// across commits.
pub fn save_seen_op(seen: &BTreeSet<String>) -> CommitOp {
    json_op(SEEN_FILE, seen)
}

/// Loads the pending-post queue, empty on a fresh mirror
pub async fn load_queue(store: &dyn MirrorStore) -> Result<Vec<PostRef>> {
    if !store.exists(QUEUE_FILE).await? {
        return Ok(Vec::new());
    }
    let bytes = store.read(QUEUE_FILE).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Renders the queue back to its state file
pub fn save_queue_op(queue: &[PostRef]) -> CommitOp {
    json_op(QUEUE_FILE, &queue)
}

/// Appends a post to the queue unless it was already seen or queued
///
/// `queued` is the caller-maintained suit-id index of `queue`; it is updated
/// on insert. Returns whether the post was appended.
pub fn enqueue_unique(
    queue: &mut Vec<PostRef>,
    queued: &mut HashSet<String>,
    seen: &BTreeSet<String>,
    post: PostRef,
) -> bool {
    let suit_id = post.suit_id();
    if seen.contains(&suit_id) || queued.contains(&suit_id) {
        return false;
    }
    queued.insert(suit_id);
    queue.push(post);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::tests::setup_test_store;

    fn post(username: &str, id: u64) -> PostRef {
        PostRef { username: username.into(), post_id: id }
    }

    #[tokio::test]
    async fn test_seen_round_trip_is_sorted() {
        let store = setup_test_store();
        assert!(load_seen(store.as_ref()).await.unwrap().is_empty());

        let seen: BTreeSet<String> =
            ["zoe_3", "alice_1", "bob_2"].into_iter().map(String::from).collect();
        store.commit(vec![save_seen_op(&seen)], "state").await.unwrap();

        let raw = store.read_text(SEEN_FILE).await.unwrap();
        assert_eq!(raw, r#"["alice_1","bob_2","zoe_3"]"#);

        let loaded = load_seen(store.as_ref()).await.unwrap();
        assert_eq!(loaded, seen);
    }

    #[tokio::test]
    async fn test_queue_round_trip() {
        let store = setup_test_store();
        assert!(load_queue(store.as_ref()).await.unwrap().is_empty());

        let queue = vec![post("alice", 1), post("bob", 2)];
        store.commit(vec![save_queue_op(&queue)], "state").await.unwrap();

        let loaded = load_queue(store.as_ref()).await.unwrap();
        assert_eq!(loaded, queue);
    }

    #[test]
    fn test_enqueue_unique_dedups() {
        let mut queue = Vec::new();
        let mut queued = HashSet::new();
        let seen: BTreeSet<String> = ["alice_1".to_string()].into_iter().collect();

        // already seen
        assert!(!enqueue_unique(&mut queue, &mut queued, &seen, post("alice", 1)));
        // fresh
        assert!(enqueue_unique(&mut queue, &mut queued, &seen, post("bob", 2)));
        // now queued
        assert!(!enqueue_unique(&mut queue, &mut queued, &seen, post("bob", 2)));

        assert_eq!(queue, vec![post("bob", 2)]);
    }
}
