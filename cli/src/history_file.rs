use anyhow::Context;
use anyhow::Result;
use catalog_course_search::HistoryEntry;
use catalog_course_search::HistoryError;
use catalog_course_search::HistoryPort;
use catalog_course_search::MemoryHistory;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Navigation history persisted as JSON, rewritten after every write.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
    stack: MemoryHistory,
}

impl FileHistory {
    /// Opens the history at `path`, starting a fresh one at `initial_url` when
    /// the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>, initial_url: &str) -> Result<Self> {
        let path = path.into();
        let stack = match fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data).context("parse search history")?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                MemoryHistory::new(initial_url)
            }
            Err(err) => return Err(err).context("read search history"),
        };
        Ok(Self { path, stack })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stack(&self) -> &MemoryHistory {
        &self.stack
    }

    /// Moves the cursor back, persists it and returns the restored entry.
    pub fn back(&mut self) -> Result<Option<HistoryEntry>> {
        let entry = self.stack.back().cloned();
        if entry.is_some() {
            self.persist()?;
        }
        Ok(entry)
    }

    /// Moves the cursor forward, persists it and returns the restored entry.
    pub fn forward(&mut self) -> Result<Option<HistoryEntry>> {
        let entry = self.stack.forward().cloned();
        if entry.is_some() {
            self.persist()?;
        }
        Ok(entry)
    }

    pub fn persist(&self) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.stack)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl HistoryPort for FileHistory {
    fn current_url(&self) -> Result<String, HistoryError> {
        self.stack.current_url()
    }

    fn push(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.stack.push(entry)?;
        self.persist()
    }

    fn replace(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.stack.replace(entry)?;
        self.persist()
    }
}
