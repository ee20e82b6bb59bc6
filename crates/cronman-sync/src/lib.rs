//! cronman-sync: reconciliation between the local table and the live
//! scheduler.
//!
//! The [`Reconciler`] holds no state across calls — every operation is a
//! pure function of the two current snapshots (store and live table).

use std::collections::HashSet;

use cronman_schedule::{ensure_marker, strip_marker};
use cronman_store::{StoreError, TableStore};
use cronman_system::{SystemAdapter, SystemError};
use cronman_types::{Task, TaskStatus};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("system error: {0}")]
    System(#[from] SystemError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Mediates between the table store and the live scheduler.
pub struct Reconciler<'a> {
    store: &'a TableStore,
    system: &'a dyn SystemAdapter,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a TableStore, system: &'a dyn SystemAdapter) -> Self {
        Self { store, system }
    }

    /// The live table's tasks, each tagged [`TaskStatus::Known`] when its
    /// command matches a store task's command and [`TaskStatus::Unknown`]
    /// otherwise. Classification is by command-string equality only; a
    /// command appearing under a different schedule is still known.
    pub fn diff(&self) -> Result<Vec<Task>> {
        let store_tasks = self.store.tasks()?;
        let known: HashSet<&str> = store_tasks.iter().map(|t| t.command.as_str()).collect();

        let mut live = self.system.tasks()?;
        for task in &mut live {
            task.status = Some(if known.contains(task.command.as_str()) {
                TaskStatus::Known
            } else {
                TaskStatus::Unknown
            });
        }
        Ok(live)
    }

    /// Adopt the live table as authoritative: drop blanks and comments,
    /// stamp the ownership marker onto lines lacking it (never duplicating
    /// one), and replace the store's content wholesale.
    pub fn pull_from_system(&self) -> Result<()> {
        let raw = self.system.raw_table()?;
        let owned: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(ensure_marker)
            .collect();

        let mut content = owned.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        self.store.replace_all(&content)?;
        Ok(())
    }

    /// Write the store's current content verbatim to the live scheduler.
    /// The adapter archives the previous live table before overwriting.
    pub fn push_to_system(&self) -> Result<()> {
        let lines = self.store.lines()?;
        self.system.write_tasks(&lines)?;
        Ok(())
    }

    /// Whether the store and the live table currently differ. Content is
    /// normalized first (blanks, comments, and ownership markers ignored)
    /// so marker-only differences don't report a pending change.
    pub fn has_changed(&self) -> Result<bool> {
        let store = normalize(&self.store.read_all()?);
        let live = normalize(&self.system.raw_table()?);
        Ok(store != live)
    }
}

fn normalize(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| strip_marker(line).trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn fixture(dir: &Path, live_content: &str) -> (TableStore, Box<dyn SystemAdapter>) {
        let store = TableStore::open(&dir.join("crontab"), &dir.join("audit.log")).unwrap();
        let live = dir.join("live_crontab");
        std::fs::write(&live, live_content).unwrap();
        (store, cronman_system::file_adapter(&live))
    }

    #[test]
    fn test_diff_tags_known_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let (store, system) = fixture(
            dir.path(),
            "* * * * * echo a\n0 0 * * * echo b\n",
        );
        store.append("* * * * * echo a # cronmanager").unwrap();

        let reconciler = Reconciler::new(&store, system.as_ref());
        let tagged = reconciler.diff().unwrap();
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[0].command, "echo a");
        assert_eq!(tagged[0].status, Some(TaskStatus::Known));
        assert_eq!(tagged[1].command, "echo b");
        assert_eq!(tagged[1].status, Some(TaskStatus::Unknown));
    }

    #[test]
    fn test_diff_ignores_schedule_differences() {
        let dir = tempfile::tempdir().unwrap();
        let (store, system) = fixture(dir.path(), "0 4 * * * echo a\n");
        store.append("*/5 * * * * echo a # cronmanager").unwrap();

        let reconciler = Reconciler::new(&store, system.as_ref());
        let tagged = reconciler.diff().unwrap();
        assert_eq!(tagged[0].status, Some(TaskStatus::Known));
    }

    #[test]
    fn test_pull_normalizes_and_stamps_marker() {
        let dir = tempfile::tempdir().unwrap();
        let (store, system) = fixture(
            dir.path(),
            "# MAILTO=root\n\n* * * * * echo a\n0 0 * * * echo b # cronmanager\n",
        );

        let reconciler = Reconciler::new(&store, system.as_ref());
        reconciler.pull_from_system().unwrap();

        assert_eq!(
            store.read_all().unwrap(),
            "* * * * * echo a # cronmanager\n0 0 * * * echo b # cronmanager\n"
        );
        // Adopting the live table leaves nothing pending.
        assert!(!reconciler.has_changed().unwrap());
    }

    #[test]
    fn test_pull_from_empty_live_table() {
        let dir = tempfile::tempdir().unwrap();
        let (store, system) = fixture(dir.path(), "");
        store.append("* * * * * echo stale").unwrap();

        Reconciler::new(&store, system.as_ref())
            .pull_from_system()
            .unwrap();
        assert_eq!(store.read_all().unwrap(), "");
    }

    #[test]
    fn test_push_writes_store_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let (store, system) = fixture(dir.path(), "0 0 * * * echo old\n");
        store.append("*/5 * * * * echo hi # cronmanager").unwrap();

        let reconciler = Reconciler::new(&store, system.as_ref());
        assert!(reconciler.has_changed().unwrap());
        reconciler.push_to_system().unwrap();
        assert_eq!(
            system.raw_table().unwrap(),
            "*/5 * * * * echo hi # cronmanager\n"
        );
        assert!(!reconciler.has_changed().unwrap());
    }

    #[test]
    fn test_add_then_push_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let (store, system) = fixture(dir.path(), "");
        let task = cronman_schedule::parse_line("*/5 * * * * echo hi", 0).unwrap();

        store
            .append(&cronman_schedule::serialize_line(&task.schedule, &task.command))
            .unwrap();
        assert_eq!(
            store.read_all().unwrap(),
            "*/5 * * * * echo hi # cronmanager\n"
        );

        Reconciler::new(&store, system.as_ref())
            .push_to_system()
            .unwrap();
        assert_eq!(
            system.raw_table().unwrap(),
            "*/5 * * * * echo hi # cronmanager\n"
        );
    }

    #[test]
    fn test_has_changed_ignores_marker_only_differences() {
        let dir = tempfile::tempdir().unwrap();
        let (store, system) = fixture(dir.path(), "* * * * * echo a\n");
        store.append("* * * * * echo a # cronmanager").unwrap();

        let reconciler = Reconciler::new(&store, system.as_ref());
        assert!(!reconciler.has_changed().unwrap());
    }
}
