//! POSIX crontab adapter.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Result, SystemAdapter, SystemError, join_lines};

/// Drives the platform `crontab` command. Before every overwrite the
/// current live table is archived to a timestamped file in `backup_dir` for
/// manual disaster recovery.
pub struct CrontabAdapter {
    backup_dir: PathBuf,
}

impl CrontabAdapter {
    pub fn new(backup_dir: &Path) -> Self {
        Self {
            backup_dir: backup_dir.to_path_buf(),
        }
    }

    /// Archive the current live table to a timestamped file in the backup
    /// directory. Runs before every overwrite.
    pub fn backup_live_table(&self) -> Result<PathBuf> {
        let content = self.raw_table()?;
        let path = backup_path(&self.backup_dir);
        std::fs::write(&path, content)?;
        tracing::info!("Live crontab backed up to {}", path.display());
        Ok(path)
    }
}

impl SystemAdapter for CrontabAdapter {
    fn raw_table(&self) -> Result<String> {
        // `crontab -l` exits non-zero when the user has no table; that and
        // a missing binary both read as an empty live table.
        match Command::new("crontab").arg("-l").output() {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            _ => Ok(String::new()),
        }
    }

    fn write_tasks(&self, lines: &[String]) -> Result<()> {
        self.backup_live_table()?;

        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(join_lines(lines).as_bytes())?;
        tmp.flush()?;

        let output = Command::new("crontab").arg(tmp.path()).output()?;
        if !output.status.success() {
            return Err(SystemError::Install(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        crontab_available()
    }
}

/// Whether the platform `crontab` command exists on PATH.
pub fn crontab_available() -> bool {
    Command::new("which")
        .arg("crontab")
        .output()
        .map(|o| o.status.success() && !String::from_utf8_lossy(&o.stdout).trim().is_empty())
        .unwrap_or(false)
}

/// Timestamp-named backup location for a pre-overwrite live table snapshot.
pub fn backup_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("cronmanager_backup_{stamp}.cron"))
}
