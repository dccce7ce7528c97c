use clap::ValueEnum;
use rskeb::jobs::{CrawlSummary, MirrorSummary, StatusReport};
use rskeb::models::{PackRecord, TagRecord};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just names or counts)
    pub quiet: bool,
}

/// Prints the pack record table
pub fn print_records(records: &[PackRecord], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if records.is_empty() {
                if !config.quiet {
                    println!("No packs found.");
                }
                return;
            }
            if config.quiet {
                for record in records {
                    println!("{}", record.filename);
                }
                return;
            }
            let max_name = records.iter().map(|r| r.filename.len()).max().unwrap_or(8);
            println!("{:<width$}  {:>6}  SIZE", "FILENAME", "IMAGES", width = max_name);
            for record in records {
                println!(
                    "{:<width$}  {:>6}  {}",
                    record.filename,
                    record.images,
                    record.size,
                    width = max_name,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records).unwrap());
        }
    }
}

/// Prints the tag table
pub fn print_tags(tags: &[TagRecord], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if tags.is_empty() {
                if !config.quiet {
                    println!("No tags found.");
                }
                return;
            }
            if config.quiet {
                for tag in tags {
                    println!("{}", tag.name);
                }
                return;
            }
            let max_name = tags.iter().map(|t| t.name.len()).max().unwrap_or(4);
            println!("{:<width$}  COUNT", "NAME", width = max_name);
            for tag in tags {
                println!("{:<width$}  {}", tag.name, tag.count, width = max_name);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tags).unwrap());
        }
    }
}

/// Prints a full status report
pub fn print_status(report: &StatusReport, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", report.records.len());
                return;
            }
            println!("Artworks: {}", report.artworks);
            println!("Seen:     {}", report.seen);
            println!("Queued:   {}", report.queued);
            println!();
            print_records(&report.records, config);
            println!();
            print_tags(&report.tags, config);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "artworks": report.artworks,
                    "seen": report.seen,
                    "queued": report.queued,
                    "records": report.records,
                    "tags": report.tags,
                }))
                .unwrap()
            );
        }
    }
}

/// Prints the result of a crawl run
pub fn print_crawl_summary(summary: &CrawlSummary, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                if let Some(ref pack) = summary.pack {
                    println!("{pack}");
                }
                return;
            }
            match summary.pack {
                Some(ref pack) => println!(
                    "Processed {} posts, packed {} images into {}",
                    summary.processed, summary.images, pack
                ),
                None => println!(
                    "Processed {} posts, no images downloaded, nothing committed",
                    summary.processed
                ),
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "processed": summary.processed,
                    "images": summary.images,
                    "pack": summary.pack,
                }))
                .unwrap()
            );
        }
    }
}

/// Prints the result of a link-mirroring run
pub fn print_mirror_summary(summary: &MirrorSummary, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", summary.packages);
                return;
            }
            println!(
                "Scanned {} posts, {} urls, uploaded {} packages",
                summary.posts, summary.urls, summary.packages
            );
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "posts": summary.posts,
                    "urls": summary.urls,
                    "packages": summary.packages,
                }))
                .unwrap()
            );
        }
    }
}

/// Prints a simple success message (for operations that don't return data)
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("{message}");
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(
                    &serde_json::json!({"status": "ok", "message": message})
                )
                .unwrap()
            );
        }
    }
}
