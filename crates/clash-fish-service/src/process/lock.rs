use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::{debug, warn};

use super::{POLL_INTERVAL, PROCESS_TARGET};
use crate::lifecycle::LifecycleError;

const LOCK_FILE_MODE: u32 = 0o600;

/// Exclusive lock held across the check-then-write sequences of `start` and
/// `stop`.
///
/// Exclusion comes from an advisory `flock(2)` on the lock file, which the
/// kernel drops when the holder exits, so a crashed holder never leaves the
/// lock wedged. The file itself persists between holders and carries the
/// current holder's pid for diagnostics; it is emptied on release.
#[derive(Debug)]
pub(crate) struct LifecycleLock {
    path: PathBuf,
    file: Flock<File>,
}

impl LifecycleLock {
    pub(crate) fn acquire(path: &Path, wait: Duration) -> Result<Self, LifecycleError> {
        let deadline = Instant::now() + wait;
        let mut file = open(path).map_err(|source| lock_error(path, source))?;
        loop {
            match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(locked) => {
                    record_holder(&locked).map_err(|source| lock_error(path, source))?;
                    debug!(
                        target: PROCESS_TARGET,
                        file = %path.display(),
                        "acquired lifecycle lock"
                    );
                    return Ok(Self {
                        path: path.to_path_buf(),
                        file: locked,
                    });
                }
                Err((unlocked, Errno::EWOULDBLOCK)) => file = unlocked,
                Err((_, errno)) => return Err(lock_error(path, io::Error::from(errno))),
            }

            if Instant::now() >= deadline {
                return Err(LifecycleError::LockHeld {
                    path: path.to_path_buf(),
                    pid: read_holder(path),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for LifecycleLock {
    fn drop(&mut self) {
        if let Err(error) = self.file.set_len(0) {
            warn!(
                target: PROCESS_TARGET,
                file = %self.path.display(),
                error = %error,
                "failed to clear lock holder"
            );
        }
    }
}

fn open(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(LOCK_FILE_MODE);
    }
    options.open(path)
}

fn record_holder(file: &File) -> io::Result<()> {
    file.set_len(0)?;
    let mut writer = file;
    writeln!(writer, "{}", std::process::id())?;
    file.sync_all()
}

fn read_holder(path: &Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    content.trim().parse::<u32>().ok()
}

fn lock_error(path: &Path, source: io::Error) -> LifecycleError {
    LifecycleError::LockCreate {
        path: path.to_path_buf(),
        source,
    }
}
