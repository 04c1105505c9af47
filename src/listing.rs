//! Directory listing for the file browser.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "aac", "m4a"];

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

impl Entry {
    pub fn is_audio(&self) -> bool {
        !self.is_dir && is_audio_file(&self.path)
    }
}

/// Entries of `dir`, directories first, then by file name.
///
/// Access errors are logged and yield an empty listing.
pub fn list_directory(dir: &Path) -> Vec<Entry> {
    let read = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            warn!("cannot list {}: {e}", dir.display());
            return Vec::new();
        }
    };
    let mut entries: Vec<Entry> = read
        .filter_map(|e| e.ok())
        .map(|e| {
            let path = e.path();
            Entry {
                name: e.file_name().to_string_lossy().to_string(),
                is_dir: path.is_dir(),
                path,
            }
        })
        .collect();
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    entries
}

/// Audio files among `entries`, in listing order.
pub fn audio_files(entries: &[Entry]) -> Vec<PathBuf> {
    entries
        .iter()
        .filter(|e| e.is_audio())
        .map(|e| e.path.clone())
        .collect()
}
