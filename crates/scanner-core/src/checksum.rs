use std::path::Path;

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};

/// Change-detection checksum. Deliberately derived from path + mtime +
/// size rather than file contents: hashing content would require reading
/// every byte of every file on each Refresh, defeating the fast
/// unchanged-checksum short-circuit in the Refresh pipeline. See
/// spec.md §9, "Checksum is metadata-derived, not content-based".
pub fn compute(path: &Path) -> std::io::Result<String> {
    let meta = std::fs::metadata(path)?;
    let modified: DateTime<Local> = meta.modified()?.into();
    let source = format!(
        "{}-{}-{}",
        path.display(),
        modified.format("%Y-%m-%d %H:%M:%S"),
        meta.len(),
    );

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_pure_function_of_path_mtime_size() {
        let dir = tempfile_dir();
        let path = dir.join("a.flac");
        std::fs::write(&path, b"hello").unwrap();

        let first = compute(&path).unwrap();
        let second = compute(&path).unwrap();
        assert_eq!(first, second);

        std::fs::remove_dir_all(dir).ok();
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("scanner-core-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
