use std::{
    fmt,
    path::{Path, PathBuf},
};

/// One decodable audio file, identified by its path. Immutable once queued.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track(PathBuf);

impl Track {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        // Relative paths are anchored at the cwd so the queue never depends on it later.
        let path = if path.is_relative() {
            std::env::current_dir()
                .map(|cwd| cwd.join(&path))
                .unwrap_or(path)
        } else {
            path
        };
        Track(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name for display, falling back to the full path.
    pub fn name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for Track {
    fn from(path: PathBuf) -> Self {
        Track::new(path)
    }
}

impl AsRef<Path> for Track {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
