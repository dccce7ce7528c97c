/// Common test utilities for rskeb integration tests
///
/// Shared helpers for building local mirrors and seed archives. Integration
/// tests run entirely against the local storage medium; nothing here
/// touches the network.
use std::path::Path;

use rskeb::pack::pack_tree;
use rskeb::storage::LocalStore;
use tempfile::TempDir;

/// Creates a local mirror rooted in a fresh temp directory
///
/// The TempDir must be kept alive by the caller for the duration of the
/// test.
pub fn create_local_mirror() -> (TempDir, LocalStore) {
    let dir = TempDir::new().expect("create temp mirror root");
    let store = LocalStore::new(dir.path());
    (dir, store)
}

/// Builds a real zip archive holding the given (member, content) pairs and
/// returns its bytes
pub fn build_zip(members: &[(&str, &str)]) -> Vec<u8> {
    let src = TempDir::new().expect("create zip staging dir");
    for (member, content) in members {
        let path = src.path().join(member);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
    let out = TempDir::new().expect("create zip output dir");
    let zip_path = out.path().join("archive.zip");
    pack_tree(src.path(), &zip_path).unwrap();
    std::fs::read(&zip_path).unwrap()
}

/// Extracts a stored zip (by bytes) into a directory for inspection
pub fn unzip_bytes(bytes: &[u8], dest: &Path) {
    let staging = TempDir::new().expect("create unzip staging dir");
    let zip_path = staging.path().join("archive.zip");
    std::fs::write(&zip_path, bytes).unwrap();
    rskeb::pack::extract_zip(&zip_path, dest).unwrap();
}
