use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::extract::sanitize_name;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("archive entry escapes the target directory: {0}")]
    UnsafeEntry(String),
}

pub type Result<T> = std::result::Result<T, PackError>;

/// Packs a directory tree into a zip with flattened, sanitized member names
///
/// Each file lands as `{prefix}{sanitized relative stem}{ext}`, which keeps
/// one resource's files distinguishable after several resources are merged
/// into a single pack. Returns the number of entries written; `0` means the
/// downloaded resource was empty and the caller should not ship the pack.
pub fn pack_directory(src: &Path, zip_path: &Path, prefix: &str) -> Result<usize> {
    let mut writer = ZipWriter::new(File::create(zip_path)?);
    let options = SimpleFileOptions::default();
    let mut written = 0;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| PackError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(src).expect("walked under src");
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        let (stem, ext) = match rel_str.rsplit_once('.') {
            Some((stem, ext)) if !ext.contains('/') => (stem, format!(".{ext}")),
            _ => (rel_str.as_str(), String::new()),
        };
        let member = format!("{prefix}{}{ext}", sanitize_name(stem));

        writer.start_file(member, options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut writer)?;
        written += 1;
    }

    writer.finish()?;
    Ok(written)
}

/// Zips the files of a flat directory under their own names, deleting each
/// source file once archived
///
/// This is the per-run image pack: the scratch directory is consumed in the
/// process. Returns the number of entries written.
pub fn pack_flat(src: &Path, zip_path: &Path) -> Result<usize> {
    let mut names: Vec<_> = std::fs::read_dir(src)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let mut writer = ZipWriter::new(File::create(zip_path)?);
    let options = SimpleFileOptions::default();
    for name in &names {
        let source = src.join(name);
        writer.start_file(name.as_str(), options)?;
        let mut file = File::open(&source)?;
        io::copy(&mut file, &mut writer)?;
        std::fs::remove_file(&source)?;
    }
    writer.finish()?;
    Ok(names.len())
}

/// Packs a directory tree preserving relative member paths
///
/// Used by repacking, where member names were already flattened when the
/// source archives were built.
pub fn pack_tree(src: &Path, zip_path: &Path) -> Result<usize> {
    let mut writer = ZipWriter::new(File::create(zip_path)?);
    let options = SimpleFileOptions::default();
    let mut written = 0;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| PackError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(src).expect("walked under src");
        writer.start_file(rel.to_string_lossy().replace('\\', "/"), options)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut writer)?;
        written += 1;
    }

    writer.finish()?;
    Ok(written)
}

/// Extracts a zip into `dest`, preserving relative paths
///
/// Entries whose names would escape `dest` (absolute paths, `..` segments)
/// are rejected outright.
pub fn extract_zip(zip_path: &Path, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let rel = entry
            .enclosed_name()
            .ok_or_else(|| PackError::UnsafeEntry(entry.name().to_string()))?;
        let out = dest.join(rel);
        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&out)?;
        io::copy(&mut entry, &mut file)?;
        file.flush()?;
    }
    Ok(())
}

/// Merges several zips into one, preserving each member's relative path
///
/// Later archives overwrite colliding members, matching extract-then-repack
/// behavior. Returns `None` when the sources contained no files at all.
pub fn merge_zips(zips: &[impl AsRef<Path>], merged_path: &Path) -> Result<Option<usize>> {
    let staging = tempfile::tempdir()?;
    for zip in zips {
        debug!(path = %zip.as_ref().display(), "unpacking into merge staging");
        extract_zip(zip.as_ref(), staging.path())?;
    }
    let written = pack_tree(staging.path(), merged_path)?;
    if written == 0 {
        std::fs::remove_file(merged_path)?;
        return Ok(None);
    }
    Ok(Some(written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn seed(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn member_names(zip_path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(zip_path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_pack_directory_flattens_and_sanitizes() {
        let src = tempdir().unwrap();
        seed(src.path(), "sub dir/final (1).png", "img1");
        seed(src.path(), "readme.txt", "hello");

        let out = tempdir().unwrap();
        let zip_path = out.path().join("res.zip");
        let n = pack_directory(src.path(), &zip_path, "alice_12_").unwrap();
        assert_eq!(n, 2);

        let mut names = member_names(&zip_path);
        names.sort();
        assert_eq!(names, vec!["alice_12_readme.txt", "alice_12_sub_dir_final_1.png"]);
    }

    #[test]
    fn test_pack_directory_empty_source() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let zip_path = out.path().join("res.zip");
        assert_eq!(pack_directory(src.path(), &zip_path, "p_").unwrap(), 0);
    }

    #[test]
    fn test_pack_flat_consumes_sources() {
        let src = tempdir().unwrap();
        seed(src.path(), "b.png", "b");
        seed(src.path(), "a.png", "a");

        let out = tempdir().unwrap();
        let zip_path = out.path().join("pack.zip");
        assert_eq!(pack_flat(src.path(), &zip_path).unwrap(), 2);
        assert_eq!(member_names(&zip_path), vec!["a.png", "b.png"]);
        assert_eq!(fs::read_dir(src.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_extract_round_trip() {
        let src = tempdir().unwrap();
        seed(src.path(), "x/y.txt", "nested");
        let out = tempdir().unwrap();
        let zip_path = out.path().join("t.zip");
        pack_tree(src.path(), &zip_path).unwrap();

        let dest = tempdir().unwrap();
        extract_zip(&zip_path, dest.path()).unwrap();
        assert_eq!(fs::read_to_string(dest.path().join("x/y.txt")).unwrap(), "nested");
    }

    #[test]
    fn test_merge_zips() {
        let out = tempdir().unwrap();

        let src1 = tempdir().unwrap();
        seed(src1.path(), "a.txt", "a");
        let zip1 = out.path().join("1.zip");
        pack_tree(src1.path(), &zip1).unwrap();

        let src2 = tempdir().unwrap();
        seed(src2.path(), "b/c.txt", "c");
        let zip2 = out.path().join("2.zip");
        pack_tree(src2.path(), &zip2).unwrap();

        let merged = out.path().join("merged.zip");
        let n = merge_zips(&[&zip1, &zip2], &merged).unwrap();
        assert_eq!(n, Some(2));

        let mut names = member_names(&merged);
        names.sort();
        assert_eq!(names, vec!["a.txt", "b/c.txt"]);
    }

    #[test]
    fn test_merge_zips_all_empty() {
        let out = tempdir().unwrap();
        let src = tempdir().unwrap();
        let zip1 = out.path().join("1.zip");
        pack_tree(src.path(), &zip1).unwrap();

        let merged = out.path().join("merged.zip");
        assert_eq!(merge_zips(&[&zip1], &merged).unwrap(), None);
        assert!(!merged.exists());
    }
}
