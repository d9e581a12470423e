//! Run lock preventing overlapping snapshot passes
//!
//! An `flock` on a fixed file. The kernel drops it when the holder exits.
//! The file itself is never unlinked.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Who holds the lock, written into the lock file for operators
#[derive(Debug, Serialize, Deserialize)]
struct Holder {
    pid: u32,
    started_at: String,
}

/// Held for the duration of a snapshot pass; unlocked on drop
pub struct RunLock {
    path: PathBuf,
    file: File,
}

impl RunLock {
    /// Take the lock at `path`, failing if another pass holds it
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create lock directory {}", dir.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        if !try_lock(&file)? {
            let holder = read_holder(&mut file)
                .map(|h| format!("pid {}", h.pid))
                .unwrap_or_else(|| "pid unknown".to_string());
            anyhow::bail!("Another rznap run is in progress ({})", holder);
        }

        write_holder(&mut file)
            .with_context(|| format!("Failed to write lock file {}", path.display()))?;
        tracing::debug!("Acquired run lock {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Clear the holder record and unlock
    pub fn release(self) -> Result<()> {
        self.file
            .set_len(0)
            .with_context(|| format!("Failed to clear lock file {}", self.path.display()))?;
        Ok(())
    }
}

/// Non-blocking exclusive `flock`; `false` when someone else holds it
fn try_lock(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(()) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e).context("flock failed"),
    }
}

fn read_holder(file: &mut File) -> Option<Holder> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_holder(file: &mut File) -> Result<()> {
    let holder = Holder {
        pid: std::process::id(),
        started_at: chrono::Local::now().to_rfc3339(),
    };

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    serde_json::to_writer(&mut *file, &holder)?;
    file.flush()?;
    Ok(())
}
