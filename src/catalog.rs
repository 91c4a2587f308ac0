//! Media discovery: enumerate a folder, classify entries, apply the sort mode.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::DisplayOrderMode;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v", "3gp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// One classified media asset. Immutable once enumerated; identity is the path.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub modified: SystemTime,
}

/// Classify `path` by extension; `None` when it is not a recognized media file.
pub fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())?
        .to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Ordered sequence of media entries plus the sort mode that produced it.
#[derive(Debug, Clone)]
pub struct MediaCatalog {
    entries: Vec<MediaEntry>,
    mode: DisplayOrderMode,
}

impl MediaCatalog {
    /// Enumerate media under `folder` and order it per `mode`.
    ///
    /// Fails softly: a missing or unreadable folder yields an empty catalog.
    pub fn load(folder: &Path, include_subfolders: bool, mode: DisplayOrderMode) -> Self {
        if !folder.is_dir() {
            warn!(folder = %folder.display(), "media folder missing or unreadable");
            return Self {
                entries: Vec::new(),
                mode,
            };
        }

        let mut walker = WalkDir::new(folder).follow_links(true);
        if !include_subfolders {
            walker = walker.max_depth(1);
        }

        let mut entries = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
            .filter_map(|res| match res {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(%err, "skipping unreadable entry");
                    None
                }
            })
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path().to_path_buf();
            let Some(kind) = classify(&path) else {
                continue;
            };
            let modified = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push(MediaEntry {
                path,
                kind,
                modified,
            });
        }
        debug!(count = entries.len(), folder = %folder.display(), "enumerated media");
        Self::from_entries(entries, mode)
    }

    /// Build a catalog from pre-enumerated entries, applying `mode` ordering.
    pub fn from_entries(mut entries: Vec<MediaEntry>, mode: DisplayOrderMode) -> Self {
        // Stable base order so Random shuffles over a deterministic input.
        entries.sort_by_key(|e| e.path.to_string_lossy().to_lowercase());
        match mode {
            DisplayOrderMode::Random => {}
            DisplayOrderMode::DateAscending => entries.sort_by(|a, b| {
                a.modified
                    .cmp(&b.modified)
                    .then_with(|| a.path.cmp(&b.path))
            }),
            DisplayOrderMode::DateDescending => entries.sort_by(|a, b| {
                b.modified
                    .cmp(&a.modified)
                    .then_with(|| a.path.cmp(&b.path))
            }),
        }
        Self { entries, mode }
    }

    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&MediaEntry> {
        self.entries.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mode(&self) -> DisplayOrderMode {
        self.mode
    }

    /// Remove and return the entry at `index`; indices above it shift down.
    pub fn remove(&mut self, index: usize) -> MediaEntry {
        self.entries.remove(index)
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    // Never filter the walk root itself.
    if entry.depth() == 0 {
        return false;
    }
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn entry(path: &str, secs: u64) -> MediaEntry {
        MediaEntry {
            path: PathBuf::from(path),
            kind: MediaKind::Image,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    fn paths(catalog: &MediaCatalog) -> Vec<&str> {
        catalog
            .entries()
            .iter()
            .map(|e| e.path.to_str().unwrap())
            .collect()
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify(Path::new("a.jpg")), Some(MediaKind::Image));
        assert_eq!(classify(Path::new("b.WEBP")), Some(MediaKind::Image));
        assert_eq!(classify(Path::new("c.MP4")), Some(MediaKind::Video));
        assert_eq!(classify(Path::new("d.3gp")), Some(MediaKind::Video));
        assert_eq!(classify(Path::new("e.txt")), None);
        assert_eq!(classify(Path::new("noext")), None);
    }

    #[test]
    fn flat_load_skips_subfolders() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("sub").join("b.jpg"), b"x").unwrap();

        let catalog = MediaCatalog::load(tmp.path(), false, DisplayOrderMode::Random);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.entries()[0].path.ends_with("a.jpg"));
    }

    #[test]
    fn recursive_load_skips_hidden_dirs() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join(".cache")).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.jpg"), b"x").unwrap();
        fs::write(tmp.path().join(".cache").join("b.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("sub").join("c.png"), b"x").unwrap();
        fs::write(tmp.path().join("sub").join("notes.txt"), b"x").unwrap();

        let catalog = MediaCatalog::load(tmp.path(), true, DisplayOrderMode::Random);
        let mut names: Vec<_> = catalog
            .entries()
            .iter()
            .map(|e| e.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.jpg", "c.png"]);
    }

    #[test]
    fn missing_folder_yields_empty_catalog() {
        let catalog = MediaCatalog::load(
            Path::new("/definitely/not/here"),
            true,
            DisplayOrderMode::DateAscending,
        );
        assert!(catalog.is_empty());
        assert_eq!(catalog.mode(), DisplayOrderMode::DateAscending);
    }

    #[test]
    fn date_ascending_sorts_by_mtime_with_path_tiebreak() {
        let catalog = MediaCatalog::from_entries(
            vec![entry("b.jpg", 20), entry("c.jpg", 10), entry("a.jpg", 10)],
            DisplayOrderMode::DateAscending,
        );
        assert_eq!(paths(&catalog), vec!["a.jpg", "c.jpg", "b.jpg"]);
    }

    #[test]
    fn date_descending_orders_newest_first() {
        let catalog = MediaCatalog::from_entries(
            vec![entry("a.jpg", 10), entry("b.jpg", 30), entry("c.jpg", 20)],
            DisplayOrderMode::DateDescending,
        );
        assert_eq!(paths(&catalog), vec!["b.jpg", "c.jpg", "a.jpg"]);
    }

    #[test]
    fn random_mode_keeps_lowercase_path_base_order() {
        let catalog = MediaCatalog::from_entries(
            vec![entry("B.jpg", 5), entry("a.jpg", 9)],
            DisplayOrderMode::Random,
        );
        assert_eq!(paths(&catalog), vec!["a.jpg", "B.jpg"]);
    }

    #[test]
    fn remove_shifts_following_entries_down() {
        let mut catalog = MediaCatalog::from_entries(
            vec![entry("a.jpg", 1), entry("b.jpg", 2), entry("c.jpg", 3)],
            DisplayOrderMode::DateAscending,
        );
        let removed = catalog.remove(1);
        assert!(removed.path.ends_with("b.jpg"));
        assert_eq!(paths(&catalog), vec!["a.jpg", "c.jpg"]);
    }
}
