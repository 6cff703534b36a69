use std::path::{Path, PathBuf};

/// Answers whether a path referenced by the configuration exists.
///
/// The default [`LocalFs`] probe checks the local filesystem; tests and
/// remote dataset providers can substitute their own.
pub trait PathProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Local filesystem, with relative paths resolved against `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct LocalFs {
    base_dir: Option<PathBuf>,
}

impl LocalFs {
    #[must_use]
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl PathProbe for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}
