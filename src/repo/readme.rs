use crate::models::{IndexRecord, PackRecord, TagRecord};
use crate::storage::MirrorStore;

use super::PACKS_DIR;

/// Tags below this count stay out of the rendered tag table
const TAG_DISPLAY_THRESHOLD: usize = 10;

/// Pack rows shown in the crawl README
const PACK_DISPLAY_LIMIT: usize = 20;

/// Formats a byte count the way the mirror's tables show sizes
///
/// Bytes stay integral ("512 B"); larger units get three decimals
/// ("1.500 MiB").
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.3} {unit}")
}

/// "1 image" / "5 images"
pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Renders a pipe-delimited markdown table
///
/// Cell text is taken as-is apart from escaping `|`, which would otherwise
/// break the row.
pub fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&headers.join(" | "));
    out.push_str(" |\n|");
    for _ in headers {
        out.push_str("---|");
    }
    out.push('\n');
    for row in rows {
        out.push_str("| ");
        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }
    out
}

/// Renders the mirror README after a crawl run
///
/// Front matter first (the mirror host renders it as dataset metadata),
/// then the newest packs, a total, and the popular-tag table.
pub fn render_crawl_readme(
    records: &[PackRecord],
    total_artworks: usize,
    tags: &[TagRecord],
) -> String {
    let pack_rows: Vec<Vec<String>> = records
        .iter()
        .take(PACK_DISPLAY_LIMIT)
        .map(|r| {
            vec![r.filename.clone(), r.images.to_string(), r.size.clone(), r.download.clone()]
        })
        .collect();

    let tag_rows: Vec<Vec<String>> = tags
        .iter()
        .filter(|t| t.count >= TAG_DISPLAY_THRESHOLD)
        .map(|t| vec![t.name.clone(), t.count.to_string()])
        .collect();

    let mut out = String::from("---\nlicense: mit\n---\n\n");
    out.push_str("## Packages\n\n");
    out.push_str(&markdown_table(&["Filename", "Images", "Size", "Download"], &pack_rows));
    out.push_str("\n## Analysis\n\n");
    out.push_str(&format!("{} in total.\n", plural(total_artworks, "image")));
    out.push_str("\n## Tags\n\n");
    out.push_str("Only some selected tags are shown.\n\n");
    out.push_str(&markdown_table(&["name", "count"], &tag_rows));
    out
}

/// Renders the mirror README after a repack run
pub fn render_repack_readme(store: &dyn MirrorStore, index: &[IndexRecord]) -> String {
    let rows: Vec<Vec<String>> = index
        .iter()
        .map(|r| {
            let url = store.file_url(&format!("{PACKS_DIR}/{}", r.filename));
            vec![r.filename.clone(), format_size(r.size), format!("[Download]({url})")]
        })
        .collect();

    let mut out = String::from("---\nlicense: mit\n---\n\n");
    out.push_str(&markdown_table(&["Filename", "Size", "Link"], &rows));
    out
}
