use serde::{Deserialize, Serialize};

/// One entry of the site's works listing
///
/// The listing only carries a site-relative path; everything else about the
/// work is fetched separately via [`crate::client::SkebClient::get_post`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkListing {
    /// Site-relative path of the work, e.g. `/@alice/works/12345`
    pub path: String,
}

/// A parsed reference to a single post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    /// Creator's account name as it appears in the listing path
    pub username: String,

    /// Numeric work id
    pub post_id: u64,
}

impl PostRef {
    /// The `{username}_{post_id}` key used for dedup bookkeeping
    pub fn suit_id(&self) -> String {
        format!("{}_{}", self.username, self.post_id)
    }
}

impl std::fmt::Display for PostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}/works/{}", self.username, self.post_id)
    }
}

/// An account attached to a post (either the commissioning client or the
/// creator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub screen_name: String,
}

/// A full post payload from `/api/users/{username}/works/{post_id}`
///
/// Only the fields the mirror consumes are modeled; the API sends plenty
/// more, which serde ignores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Site-global artwork id (distinct from the per-creator work id)
    pub id: u64,

    /// Post body; may embed external resource URLs
    #[serde(default)]
    pub body: String,

    /// Commission request text, also a URL source
    #[serde(default)]
    pub source_body: String,

    /// The commissioning client. Absent on self-published works, which the
    /// mirror skips.
    #[serde(default)]
    pub client: Option<Account>,

    /// The creator of the work
    pub creator: Account,

    /// Full-size article image, the asset the mirror archives
    #[serde(default)]
    pub article_image_url: Option<String>,

    #[serde(default)]
    pub preview_url: Option<String>,

    #[serde(default)]
    pub og_image_url: Option<String>,

    /// Tags the creator attached to the post
    #[serde(default)]
    pub tag_list: Vec<String>,

    /// Related works, used to grow the pending queue
    #[serde(default)]
    pub similar_works: Vec<WorkListing>,
}

/// One mirrored artwork's metadata row in `artworks.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkRecord {
    /// Site-global artwork id
    pub id: u64,

    /// Per-creator work id
    pub post_id: u64,

    pub creator_id: u64,
    pub creator_name: String,
    pub client_id: u64,
    pub client_name: String,

    /// Image filename inside its pack
    pub filename: String,

    /// Name of the pack the image was shipped in
    pub packname: String,

    pub body: String,
    pub article_image_url: String,
    pub preview_url: Option<String>,
    pub og_image_url: Option<String>,

    /// Tags confirmed against the post body
    pub tags: Vec<String>,
}

/// One pack's row in `records.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackRecord {
    /// Pack filename under `packs/`
    #[serde(rename = "Filename")]
    pub filename: String,

    /// Number of images in the pack
    #[serde(rename = "Images")]
    pub images: usize,

    /// Human-readable pack size
    #[serde(rename = "Size")]
    pub size: String,

    /// Markdown download link
    #[serde(rename = "Download")]
    pub download: String,
}

/// One tag's row in `tags.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub name: String,

    /// Number of mirrored artworks carrying the tag
    #[serde(default)]
    pub count: usize,
}

/// One repacked archive's row in `index.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub filename: String,

    /// Pack size in bytes
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suit_id() {
        let r = PostRef { username: "alice".into(), post_id: 99 };
        assert_eq!(r.suit_id(), "alice_99");
        assert_eq!(r.to_string(), "@alice/works/99");
    }

    #[test]
    fn test_post_deserializes_with_missing_optionals() {
        let raw = r#"{
            "id": 5,
            "creator": {"id": 1, "screen_name": "alice"},
            "extra_field_the_api_sends": true
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.id, 5);
        assert!(post.client.is_none());
        assert!(post.article_image_url.is_none());
        assert!(post.tag_list.is_empty());
        assert!(post.similar_works.is_empty());
        assert_eq!(post.body, "");
    }

    #[test]
    fn test_post_deserializes_full_payload() {
        let raw = r#"{
            "id": 42,
            "body": "thank you! https://example.com/extra",
            "source_body": "request text",
            "client": {"id": 7, "screen_name": "bob"},
            "creator": {"id": 1, "screen_name": "alice"},
            "article_image_url": "https://cdn.example.com/a.png",
            "preview_url": "https://cdn.example.com/a_small.png",
            "og_image_url": "https://cdn.example.com/a_og.png",
            "tag_list": ["oc", "illustration"],
            "similar_works": [{"path": "/@alice/works/41"}]
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.client.as_ref().unwrap().screen_name, "bob");
        assert_eq!(post.similar_works.len(), 1);
        assert_eq!(post.tag_list, vec!["oc", "illustration"]);
    }

    #[test]
    fn test_pack_record_csv_headers() {
        let mut w = csv::Writer::from_writer(Vec::new());
        w.serialize(PackRecord {
            filename: "skb_newest_pack_1.zip".into(),
            images: 3,
            size: "1.5 MiB".into(),
            download: "[Download](https://example.com)".into(),
        })
        .unwrap();
        let data = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert!(data.starts_with("Filename,Images,Size,Download"));
    }
}
