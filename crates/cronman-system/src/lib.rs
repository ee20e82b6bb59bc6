//! cronman-system: abstraction over the live OS scheduler.
//!
//! The [`SystemAdapter`] trait covers exactly four operations: read the raw
//! live table, read it as parsed tasks, overwrite it, and report
//! availability. Two implementations exist: [`CrontabAdapter`] drives the
//! POSIX `crontab` command, [`FileAdapter`] uses a designated local file as
//! a stand-in where no native scheduler integration exists.

pub mod crontab;
pub mod file;

use std::path::Path;

use cronman_config::{AdapterMode, SystemConfig};
use cronman_types::Task;

pub use crontab::CrontabAdapter;
pub use file::FileAdapter;

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("crontab install failed: {0}")]
    Install(String),
}

pub type Result<T> = std::result::Result<T, SystemError>;

/// Polymorphic seam over the live scheduler.
pub trait SystemAdapter: Send + Sync {
    /// The raw content of the live table. A missing or unreadable live
    /// table reads as empty, never as an error.
    fn raw_table(&self) -> Result<String>;

    /// Overwrite the live table with the given lines.
    fn write_tasks(&self, lines: &[String]) -> Result<()>;

    /// Whether this adapter can reach a live scheduler at all.
    fn is_available(&self) -> bool;

    /// The live table parsed into tasks (unparsable lines dropped).
    fn tasks(&self) -> Result<Vec<Task>> {
        Ok(cronman_schedule::parse_table(&self.raw_table()?))
    }
}

/// Select the adapter once at startup based on configuration and platform
/// detection; callers inject the boxed trait object from then on.
pub fn detect(config: &SystemConfig) -> Box<dyn SystemAdapter> {
    match config.adapter {
        AdapterMode::Crontab => Box::new(CrontabAdapter::new(&config.backup_dir)),
        AdapterMode::File => Box::new(FileAdapter::new(&config.file)),
        AdapterMode::Auto => {
            if crontab::crontab_available() {
                Box::new(CrontabAdapter::new(&config.backup_dir))
            } else {
                tracing::debug!("crontab command not found, using file-backed adapter");
                Box::new(FileAdapter::new(&config.file))
            }
        }
    }
}

/// Join table lines into the raw content written to a live table.
pub(crate) fn join_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}

/// Build a stand-in adapter rooted at the given file (used by tests and by
/// callers that manage paths themselves).
pub fn file_adapter(path: &Path) -> Box<dyn SystemAdapter> {
    Box::new(FileAdapter::new(path))
}
