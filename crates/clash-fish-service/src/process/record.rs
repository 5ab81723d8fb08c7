use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clash_fish_config::write_atomically;
use tracing::info;

use super::PROCESS_TARGET;
use crate::lifecycle::LifecycleError;

const PID_FILE_MODE: u32 = 0o644;

/// The PID file naming the supervising process.
///
/// Holds the decimal process id followed by a newline. Writes go through a
/// temporary file and a rename so readers never see a partial record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidRecord {
    path: PathBuf,
}

impl PidRecord {
    /// Record stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Reads the recorded pid; `None` when no record exists.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::PidRead`] on I/O failure and
    /// [`LifecycleError::PidParse`] when the contents are not a pid.
    pub fn read(&self) -> Result<Option<u32>, LifecycleError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LifecycleError::PidRead {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let trimmed = content.trim();
        trimmed
            .parse::<u32>()
            .map(Some)
            .map_err(|_| LifecycleError::PidParse {
                path: self.path.clone(),
                content: trimmed.to_owned(),
            })
    }

    /// Replaces the record with `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::PidWrite`] on I/O failure.
    pub fn write(&self, pid: u32) -> Result<(), LifecycleError> {
        write_atomically(&self.path, format!("{pid}\n").as_bytes(), PID_FILE_MODE).map_err(
            |source| LifecycleError::PidWrite {
                path: self.path.clone(),
                source,
            },
        )?;
        info!(
            target: PROCESS_TARGET,
            pid,
            file = %self.path.display(),
            "pid file written"
        );
        Ok(())
    }

    /// Deletes the record. A missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::PidRemove`] on other I/O failures.
    pub fn remove(&self) -> Result<(), LifecycleError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(target: PROCESS_TARGET, file = %self.path.display(), "pid file removed");
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LifecycleError::PidRemove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> (tempfile::TempDir, PidRecord) {
        let dir = tempfile::tempdir().expect("tempdir");
        let record = PidRecord::new(dir.path().join("clash-fish.pid"));
        (dir, record)
    }

    #[test]
    fn missing_record_reads_as_none() {
        let (_dir, record) = record();
        assert_eq!(record.read().expect("read"), None);
        record.remove().expect("removing a missing record succeeds");
    }

    #[test]
    fn written_record_is_decimal_with_newline() {
        let (_dir, record) = record();
        record.write(4242).expect("write");
        assert_eq!(fs::read_to_string(record.path()).expect("raw"), "4242\n");
        assert_eq!(record.read().expect("read"), Some(4242));
        record.remove().expect("remove");
        assert!(!record.path().exists());
    }

    #[rstest]
    #[case("  17\n\n", Some(17))]
    #[case("17", Some(17))]
    fn read_trims_whitespace(#[case] content: &str, #[case] expected: Option<u32>) {
        let (_dir, record) = record();
        fs::write(record.path(), content).expect("seed");
        assert_eq!(record.read().expect("read"), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("-5")]
    fn read_rejects_garbage(#[case] content: &str) {
        let (_dir, record) = record();
        fs::write(record.path(), content).expect("seed");
        let error = record.read().expect_err("garbage");
        assert!(matches!(error, LifecycleError::PidParse { .. }));
    }
}
