/// rskeb: a mirroring pipeline for Skeb artwork deliveries
///
/// This library discovers newly delivered works through the site's public
/// JSON API, extracts external resource links from post bodies, downloads
/// resources from known file hosts, packages everything into zip packs, and
/// mirrors the packs to a configurable storage medium: a local directory or
/// a private Hugging Face dataset repository.
///
/// All bookkeeping (seen ids, the pending queue, artwork metadata, tag
/// statistics, pack records) lives inside the mirror itself, so stateless
/// scheduled runs resume exactly where the previous run stopped.
///
/// ### Modules
///
/// - `client`: session and API client for the site
/// - `config`: layered configuration (defaults, TOML file, CLI/env)
/// - `extract`: URL, path and name text utilities
/// - `hosts`: adapters for the file hosts creators link to
/// - `jobs`: the batch operations (`newest`, `mirror`, `repack`, `status`)
/// - `models`: wire format and persisted state records
/// - `pack`: zip packaging
/// - `repo`: mirror state bookkeeping
/// - `storage`: the storage mediums (local disk, Hub repository)
/// - `throttle`: request pacing

/// Site API client module
pub mod client;

/// Configuration management module
pub mod config;

/// Top-level error type
pub mod errors;

/// Text extraction utilities
pub mod extract;

/// File host adapters
pub mod hosts;

/// Batch job module
pub mod jobs;

/// Data models module
pub mod models;

/// Zip packaging module
pub mod pack;

/// Mirror state repository module
pub mod repo;

/// Storage medium module
pub mod storage;

/// Request pacing module
pub mod throttle;
