//! cronman-store: the authoritative local copy of the task table.
//!
//! All mutations hold an exclusive advisory lock on the table file for the
//! duration of the read-modify-write; snapshot reads go lock-free (a stale
//! read is acceptable, a refresh replaces it). Every successful mutation
//! appends an audit-log line and pushes the new table to the injected
//! [`SystemAdapter`] so the live scheduler stays in lockstep — the push is
//! best-effort: a no-op where no scheduler is reachable, logged but never
//! raised when it fails.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::warn;

use cronman_system::SystemAdapter;
use cronman_types::Task;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task index {index} out of range (table has {len} lines)")]
    NotFound { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// File-backed task table with an audit log.
pub struct TableStore {
    table_file: PathBuf,
    audit_log: PathBuf,
    adapter: Option<Box<dyn SystemAdapter>>,
}

impl TableStore {
    /// Open a store, creating the table file and audit log (and their
    /// parent directories) if missing.
    pub fn open(table_file: &Path, audit_log: &Path) -> Result<Self> {
        for path in [table_file, audit_log] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            OpenOptions::new().create(true).append(true).open(path)?;
        }
        Ok(Self {
            table_file: table_file.to_path_buf(),
            audit_log: audit_log.to_path_buf(),
            adapter: None,
        })
    }

    /// Inject the live-scheduler adapter that successful mutations push to.
    pub fn with_adapter(mut self, adapter: Box<dyn SystemAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    // ─── Snapshot reads (lock-free) ─────────────────────────

    /// The full raw table content.
    pub fn read_all(&self) -> Result<String> {
        match std::fs::read_to_string(&self.table_file) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// The table as raw lines, blanks and comments included.
    pub fn lines(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.lines().map(String::from).collect())
    }

    /// The table parsed into tasks (unparsable lines dropped).
    pub fn tasks(&self) -> Result<Vec<Task>> {
        Ok(cronman_schedule::parse_table(&self.read_all()?))
    }

    // ─── Mutations (exclusive lock) ─────────────────────────

    /// Atomically append one line to the table.
    pub fn append(&self, line: &str) -> Result<()> {
        let line = line.trim_end();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.table_file)?;
        file.lock_exclusive()?;
        (&file).write_all(format!("{line}\n").as_bytes())?;
        self.committed("ADDED", line);
        Ok(())
    }

    /// Replace the line at `index`. Fails with [`StoreError::NotFound`] when
    /// `index` is outside the current line count (computed from a fresh read
    /// under the lock, so stale indices are rejected, never misapplied).
    pub fn replace_at(&self, index: usize, new_line: &str) -> Result<()> {
        let new_line = new_line.trim_end().to_string();
        let old = self.mutate_lines(|lines| {
            let slot = lines.get_mut(index).ok_or(index)?;
            Ok(std::mem::replace(slot, new_line.clone()))
        })?;
        self.committed("UPDATED", &format!("FROM: {old} TO: {new_line}"));
        Ok(())
    }

    /// Remove the line at `index`, with the same bounds contract as
    /// [`TableStore::replace_at`].
    pub fn remove_at(&self, index: usize) -> Result<()> {
        let removed = self.mutate_lines(|lines| {
            if index >= lines.len() {
                return Err(index);
            }
            Ok(lines.remove(index))
        })?;
        self.committed("DELETED", &removed);
        Ok(())
    }

    /// Wholesale overwrite of the table, used for import and pull-sync.
    pub fn replace_all(&self, content: &str) -> Result<()> {
        let file = self.open_locked()?;
        write_back(&file, content)?;
        self.committed("IMPORTED", "Cron file imported");
        Ok(())
    }

    /// Run one read-modify-write cycle under the exclusive lock. The
    /// closure fails with the out-of-range index; the table is left
    /// byte-identical in that case.
    fn mutate_lines<T>(
        &self,
        mutate: impl FnOnce(&mut Vec<String>) -> std::result::Result<T, usize>,
    ) -> Result<T> {
        let mut file = self.open_locked()?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        let mut lines: Vec<String> = content.lines().map(String::from).collect();
        let len = lines.len();

        let value = mutate(&mut lines).map_err(|index| StoreError::NotFound { index, len })?;

        let mut new_content = lines.join("\n");
        if !new_content.is_empty() {
            new_content.push('\n');
        }
        write_back(&file, &new_content)?;
        Ok(value)
    }

    fn open_locked(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.table_file)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    // ─── Audit log + system push ────────────────────────────

    /// Append one audit line: `[YYYY-MM-DD HH:MM:SS] ACTION: details`.
    pub fn audit(&self, action: &str, details: &str) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log)?;
        file.lock_exclusive()?;
        (&file).write_all(format!("[{timestamp}] {action}: {details}\n").as_bytes())?;
        Ok(())
    }

    /// The most recent audit lines, newest first.
    pub fn recent_audit(&self, limit: usize) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.audit_log) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(content.lines().rev().take(limit).map(String::from).collect())
    }

    /// Post-commit bookkeeping: audit append and live-table push, both
    /// best-effort. Runs only after the mutation itself succeeded.
    fn committed(&self, action: &str, details: &str) {
        if let Err(e) = self.audit(action, details) {
            warn!("Audit log append failed: {e}");
        }
        self.push_to_system();
    }

    /// Push the current table to the live scheduler. No-op when no adapter
    /// is injected or the platform has none; failures are logged, never
    /// raised.
    pub fn push_to_system(&self) {
        let Some(adapter) = &self.adapter else {
            return;
        };
        if !adapter.is_available() {
            return;
        }
        match self.lines() {
            Ok(lines) => {
                if let Err(e) = adapter.write_tasks(&lines) {
                    warn!("Live table push failed: {e}");
                }
            }
            Err(e) => warn!("Could not read table for live push: {e}"),
        }
    }

    /// The injected adapter, if any.
    pub fn adapter(&self) -> Option<&dyn SystemAdapter> {
        self.adapter.as_deref()
    }
}

/// Truncate and rewrite an open, locked file.
fn write_back(mut file: &File, content: &str) -> Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> TableStore {
        TableStore::open(&dir.join("crontab"), &dir.join("audit.log")).unwrap()
    }

    #[test]
    fn test_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append("* * * * * echo a # cronmanager").unwrap();
        store.append("0 0 * * * echo b # cronmanager").unwrap();
        assert_eq!(
            store.read_all().unwrap(),
            "* * * * * echo a # cronmanager\n0 0 * * * echo b # cronmanager\n"
        );
        assert_eq!(store.tasks().unwrap().len(), 2);
    }

    #[test]
    fn test_replace_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append("* * * * * echo a").unwrap();
        store.append("* * * * * echo b").unwrap();
        store.replace_at(1, "0 0 * * * echo c").unwrap();
        assert_eq!(
            store.lines().unwrap(),
            vec!["* * * * * echo a", "0 0 * * * echo c"]
        );
    }

    #[test]
    fn test_stale_index_rejected_table_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append("* * * * * echo a").unwrap();
        let before = store.read_all().unwrap();

        assert!(matches!(
            store.replace_at(5, "x"),
            Err(StoreError::NotFound { len: 1, .. })
        ));
        assert!(matches!(
            store.remove_at(1),
            Err(StoreError::NotFound { len: 1, .. })
        ));
        assert_eq!(store.read_all().unwrap(), before);
    }

    #[test]
    fn test_remove_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append("* * * * * echo a").unwrap();
        store.append("* * * * * echo b").unwrap();
        store.remove_at(0).unwrap();
        assert_eq!(store.lines().unwrap(), vec!["* * * * * echo b"]);
        // Index 0 is reused by the surviving line.
        assert_eq!(store.tasks().unwrap()[0].index, 0);
    }

    #[test]
    fn test_replace_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append("* * * * * echo old").unwrap();
        store.replace_all("# imported\n*/5 * * * * echo new # cronmanager\n").unwrap();
        assert_eq!(
            store.read_all().unwrap(),
            "# imported\n*/5 * * * * echo new # cronmanager\n"
        );
    }

    #[test]
    fn test_audit_trail() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append("* * * * * echo a").unwrap();
        store.replace_at(0, "* * * * * echo b").unwrap();
        store.remove_at(0).unwrap();
        store.replace_all("").unwrap();

        let audit = store.recent_audit(10).unwrap();
        assert_eq!(audit.len(), 4);
        // Newest first.
        assert!(audit[0].contains("IMPORTED: Cron file imported"));
        assert!(audit[1].contains("DELETED: * * * * * echo b"));
        assert!(audit[2].contains("UPDATED: FROM: * * * * * echo a TO: * * * * * echo b"));
        assert!(audit[3].contains("ADDED: * * * * * echo a"));
        // [YYYY-MM-DD HH:MM:SS] prefix.
        assert!(audit[0].starts_with('['));
        assert_eq!(audit[0].find(']'), Some(20));
    }

    #[test]
    fn test_mutation_pushes_to_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live_crontab");
        // The stand-in only reports available once its file exists.
        std::fs::write(&live, "").unwrap();

        let store = store_in(dir.path()).with_adapter(cronman_system::file_adapter(&live));
        store.append("* * * * * echo a # cronmanager").unwrap();

        assert_eq!(
            std::fs::read_to_string(&live).unwrap(),
            "* * * * * echo a # cronmanager\n"
        );
    }

    #[test]
    fn test_failed_mutation_skips_audit_and_push() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append("* * * * * echo a").unwrap();
        let audit_before = store.recent_audit(10).unwrap();

        store.remove_at(9).unwrap_err();
        assert_eq!(store.recent_audit(10).unwrap(), audit_before);
    }
}
