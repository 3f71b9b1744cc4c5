use std::path::{Path, PathBuf};

pub const BOOKKEEPING_FILE: &str = "bookkeeping.json";

/// Inputs for one index build.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Directory holding `<shard>/<local>` HTML files and the bookkeeping map.
    pub corpus_root: PathBuf,
    /// sled database directory.
    pub db_path: PathBuf,
    /// Defaults to `<corpus_root>/bookkeeping.json`.
    pub bookkeeping_path: Option<PathBuf>,
    pub stopwords_path: Option<PathBuf>,
    /// Worker threads for the build; rayon's default when unset.
    pub threads: Option<usize>,
}

impl IndexConfig {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(corpus_root: P, db_path: Q) -> Self {
        Self {
            corpus_root: corpus_root.as_ref().to_path_buf(),
            db_path: db_path.as_ref().to_path_buf(),
            bookkeeping_path: None,
            stopwords_path: None,
            threads: None,
        }
    }

    pub fn with_stopwords<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.stopwords_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn bookkeeping_path(&self) -> PathBuf {
        self.bookkeeping_path
            .clone()
            .unwrap_or_else(|| self.corpus_root.join(BOOKKEEPING_FILE))
    }
}
