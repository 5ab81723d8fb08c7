use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Writes `contents` to `path` through a temporary sibling and a rename.
///
/// Data is flushed and fsync'd before the rename so readers never observe a
/// partially written file. `mode` sets the Unix permission bits.
///
/// # Errors
///
/// Returns any I/O error from creating, writing, syncing, or renaming the
/// temporary file, including a missing parent directory.
pub fn write_atomically(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let file = staged(path, contents, mode)?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

/// Like [`write_atomically`] but fails with `AlreadyExists` instead of
/// replacing a file that is already present.
pub(crate) fn write_new_atomically(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let file = staged(path, contents, mode)?;
    file.persist_noclobber(path).map_err(|error| error.error)?;
    Ok(())
}

fn staged(path: &Path, contents: &[u8], mode: u32) -> io::Result<NamedTempFile> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "target path did not have a parent directory",
        )
    })?;

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(crate::APP_NAME),
    );
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        builder.permissions(Permissions::from_mode(mode));
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    Ok(file)
}
