//! Storage configuration.

use std::path::{Path, PathBuf};

/// Filesystem layout roots.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root under which `temp/uploads/` and `videos/` live.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/lib/coursecast"),
        }
    }
}

impl StorageConfig {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            root: std::env::var("CCAST_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/coursecast")),
        }
    }

    /// Directory holding in-flight upload fragments.
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("temp").join("uploads")
    }

    /// Directory holding finished asset directories.
    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_roots() {
        let config = StorageConfig::new("/srv/media");
        assert_eq!(config.uploads_dir(), PathBuf::from("/srv/media/temp/uploads"));
        assert_eq!(config.videos_dir(), PathBuf::from("/srv/media/videos"));
    }
}
