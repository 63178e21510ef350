use std::path::{Path, PathBuf};

use async_walkdir::{Filtering, WalkDir};
use futures::StreamExt;

/// Depth-first walk of `root`. A directory containing a `.ignore` file
/// is pruned: neither it nor its contents are returned.
pub async fn walk_library(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = WalkDir::new(root).filter(|entry| async move {
        if entry.path().is_dir() && entry.path().join(".ignore").exists() {
            Filtering::IgnoreDir
        } else {
            Filtering::Continue
        }
    });

    let mut files = Vec::new();
    while let Some(entry) = entries.next().await {
        let entry = entry?;
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// `true` when the file's basename starts with `.`.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('.'))
}

/// MIME-class classification used by Scan's `newPaths` filter.
pub enum MediaClass {
    Audio,
    Video,
    Image,
    Other,
}

pub fn media_class(path: &Path) -> MediaClass {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else { return MediaClass::Other };
    let Some(mime) = mime_guess::from_ext(ext).first() else { return MediaClass::Other };
    match mime.type_() {
        mime_guess::mime::AUDIO => MediaClass::Audio,
        mime_guess::mime::VIDEO => MediaClass::Video,
        mime_guess::mime::IMAGE => MediaClass::Image,
        _ => MediaClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prunes_directories_containing_ignore_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.mp3"), b"x").unwrap();
        let ignored = dir.path().join("skip_me");
        std::fs::create_dir(&ignored).unwrap();
        std::fs::write(ignored.join(".ignore"), b"").unwrap();
        std::fs::write(ignored.join("hidden.mp3"), b"x").unwrap();

        let files = walk_library(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "keep.mp3");
    }

    #[test]
    fn classifies_by_extension() {
        assert!(matches!(media_class(Path::new("a.mp3")), MediaClass::Audio));
        assert!(matches!(media_class(Path::new("a.mp4")), MediaClass::Video));
        assert!(matches!(media_class(Path::new("a.jpg")), MediaClass::Image));
        assert!(matches!(media_class(Path::new("a.txt")), MediaClass::Other));
    }

    #[test]
    fn hidden_file_detection() {
        assert!(is_hidden(Path::new("/a/.hidden")));
        assert!(!is_hidden(Path::new("/a/visible")));
    }
}
