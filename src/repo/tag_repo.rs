use std::collections::HashMap;

use anyhow::Result;

use crate::models::{ArtworkRecord, TagRecord};
use crate::storage::{CommitOp, MirrorStore};

use super::{csv_op, TAGS_FILE};

/// Loads the tag table, empty on a fresh mirror
pub async fn load_tags(store: &dyn MirrorStore) -> Result<Vec<TagRecord>> {
    if !store.exists(TAGS_FILE).await? {
        return Ok(Vec::new());
    }
    let bytes = store.read(TAGS_FILE).await?;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let mut tags = Vec::new();
    for row in reader.deserialize() {
        tags.push(row?);
    }
    Ok(tags)
}

/// Renders the tag table back to its state file
pub fn save_tags_op(tags: &[TagRecord]) -> Result<CommitOp> {
    csv_op(TAGS_FILE, tags)
}

/// The known tags, interned case-insensitively
///
/// The site's tags are free-form text; the same tag shows up as `OC`, `oc`
/// and `Oc` across posts. The first spelling encountered becomes the
/// canonical one, and every later variant maps onto it.
#[derive(Debug, Default)]
pub struct TagSet {
    tags: Vec<TagRecord>,
    by_lower: HashMap<String, usize>,
}

impl TagSet {
    pub fn from_records(tags: Vec<TagRecord>) -> Self {
        let by_lower = tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.to_lowercase(), i))
            .collect();
        Self { tags, by_lower }
    }

    /// Maps a tag to its canonical spelling, registering it when new
    pub fn intern(&mut self, name: &str) -> String {
        let lower = name.to_lowercase();
        if let Some(&i) = self.by_lower.get(&lower) {
            return self.tags[i].name.clone();
        }
        self.tags.push(TagRecord { name: name.to_string(), count: 0 });
        self.by_lower.insert(lower, self.tags.len() - 1);
        name.to_string()
    }

    /// Recomputes every tag's count from the artwork index and returns the
    /// table sorted by descending count, then name
    pub fn recount(mut self, artworks: &[ArtworkRecord]) -> Vec<TagRecord> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for artwork in artworks {
            for tag in &artwork.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
        for tag in &mut self.tags {
            tag.count = counts.get(tag.name.as_str()).copied().unwrap_or(0);
        }
        self.tags
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::tests::setup_test_store;

    fn artwork_with_tags(id: u64, tags: &[&str]) -> ArtworkRecord {
        ArtworkRecord {
            id,
            post_id: id,
            creator_id: 1,
            creator_name: "alice".into(),
            client_id: 2,
            client_name: "bob".into(),
            filename: format!("{id}.png"),
            packname: "p.zip".into(),
            body: String::new(),
            article_image_url: String::new(),
            preview_url: None,
            og_image_url: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_intern_is_case_insensitive_first_spelling_wins() {
        let mut set = TagSet::default();
        assert_eq!(set.intern("OriginalCharacter"), "OriginalCharacter");
        assert_eq!(set.intern("originalcharacter"), "OriginalCharacter");
        assert_eq!(set.intern("ORIGINALCHARACTER"), "OriginalCharacter");
        assert_eq!(set.intern("fanart"), "fanart");
    }

    #[test]
    fn test_recount_orders_by_count_then_name() {
        let mut set = TagSet::default();
        for t in ["b", "a", "rare"] {
            set.intern(t);
        }
        let artworks = vec![
            artwork_with_tags(1, &["a", "b"]),
            artwork_with_tags(2, &["a", "b"]),
            artwork_with_tags(3, &["a"]),
        ];
        let tags = set.recount(&artworks);
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "rare"]);
        assert_eq!(tags[0].count, 3);
        assert_eq!(tags[2].count, 0);
    }

    #[tokio::test]
    async fn test_tags_csv_round_trip() {
        let store = setup_test_store();

        let tags = vec![
            TagRecord { name: "oc".into(), count: 12 },
            TagRecord { name: "comma, in name".into(), count: 1 },
        ];
        store.commit(vec![save_tags_op(&tags).unwrap()], "state").await.unwrap();

        let loaded = load_tags(store.as_ref()).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].name, "comma, in name");
        assert_eq!(loaded[0].count, 12);
    }
}
