//! Advisory file lock around writes to the knowledge base.
//!
//! A daemon and a standalone CLI may share one data directory. Every
//! read-prepend-write holds an exclusive `flock()` on `maarifa.lock` so two
//! processes saving at once cannot drop each other's entry.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

const LOCK_FILE_NAME: &str = "maarifa.lock";

/// Exclusive lock on a data directory, released on drop.
pub struct StoreLock {
    #[allow(dead_code)]
    file: File,
}

impl StoreLock {
    /// Blocks until the lock is available.
    pub fn acquire(dir: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE_NAME))?;

        lock_exclusive(&file)?;

        Ok(StoreLock { file })
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// no advisory locking off unix; the in-process mutex still serializes writers
#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
impl Drop for StoreLock {
    fn drop(&mut self) {
        unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use std::time::Duration;

    #[test]
    fn test_second_holder_waits_for_release() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();

        let first = StoreLock::acquire(&dir).unwrap();
        let acquired = Arc::new(AtomicBool::new(false));

        let handle = std::thread::spawn({
            let dir = dir.clone();
            let acquired = acquired.clone();
            move || {
                let _second = StoreLock::acquire(&dir).unwrap();
                acquired.store(true, Ordering::SeqCst);
            }
        });

        std::thread::sleep(Duration::from_millis(100));
        assert!(!acquired.load(Ordering::SeqCst));

        drop(first);
        handle.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }
}
