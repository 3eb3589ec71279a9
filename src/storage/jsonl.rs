//! JSONL-based queue storage: one item per line, head first.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::traits::QueueStore;
use crate::domain::QueueItem;
use crate::error::Result;

/// JSONL file storage for queue items.
///
/// Appends go straight to the end of the file. Rewrites go through a sibling
/// temp file that is renamed over the original.
#[derive(Debug)]
pub struct JsonlQueueStore {
    path: PathBuf,
}

impl JsonlQueueStore {
    /// Create a store backed by the file at `path`, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Create a store for `collection` inside `base_path`.
    pub fn in_dir(base_path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        Self::new(base_path.as_ref().join(format!("{}.jsonl", collection)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl QueueStore for JsonlQueueStore {
    fn load(&self) -> Result<Vec<QueueItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut items = Vec::new();
        let mut skipped = 0usize;
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<QueueItem>(line) {
                Ok(item) => items.push(item),
                // A torn final line from an interrupted append
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %e,
                        "Skipping unreadable queue line"
                    );
                }
            }
        }

        // Later appends must start on a fresh line
        if skipped > 0 || (!content.is_empty() && !content.ends_with('\n')) {
            tracing::info!(path = %self.path.display(), kept = items.len(), skipped, "Repairing queue file");
            self.replace_all(&items)?;
        }
        Ok(items)
    }

    fn append(&self, item: &QueueItem) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(item)?)?;
        file.sync_data()?;
        Ok(())
    }

    fn replace_all(&self, items: &[QueueItem]) -> Result<()> {
        let temp = self.temp_path();
        {
            let file = File::create(&temp)?;
            let mut writer = BufWriter::new(file);
            for item in items {
                writeln!(writer, "{}", serde_json::to_string(item)?)?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
