//! File-backed stand-in adapter.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Result, SystemAdapter, join_lines};

/// Reads and writes a designated local file standing in for a live
/// scheduler, for platforms without native crontab integration.
pub struct FileAdapter {
    path: PathBuf,
}

impl FileAdapter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SystemAdapter for FileAdapter {
    fn raw_table(&self) -> Result<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_tasks(&self, lines: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, join_lines(lines))?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }
}
