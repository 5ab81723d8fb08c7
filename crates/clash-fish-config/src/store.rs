//! Loads, saves, and initialises the on-disk configuration document.
//!
//! The store never caches: every call reads from or writes to disk so each
//! command invocation observes the current file.

use std::fs::{self, DirBuilder};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[cfg(unix)]
use std::os::unix::fs::DirBuilderExt;

use crate::defaults::{CONFIG_HEADER, default_configuration};
use crate::document::Configuration;
use crate::files::{write_atomically, write_new_atomically};
use crate::paths::ConfigPaths;
use crate::validation::{ValidationError, validate};

const DIRECTORY_MODE: u32 = 0o755;
const CONFIG_FILE_MODE: u32 = 0o644;

/// Result of [`ConfigStore::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A default document was written.
    Created,
    /// A document already existed and was left untouched.
    AlreadyInitialized,
}

/// Errors raised while reading or writing the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No document exists at the canonical path.
    #[error("configuration file not found at '{path}'")]
    NotFound {
        /// Expected document path.
        path: PathBuf,
    },
    /// Reading the document failed.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document is malformed or lacks a required key.
    #[error("failed to parse configuration '{path}': {source}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying YAML failure.
        #[source]
        source: serde_yaml::Error,
    },
    /// The in-memory document could not be serialised.
    #[error("failed to serialise configuration: {source}")]
    Serialise {
        /// Underlying YAML failure.
        #[source]
        source: serde_yaml::Error,
    },
    /// Writing the document failed.
    #[error("failed to write configuration '{path}': {source}")]
    Write {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Creating the configuration directory or a subdirectory failed.
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document parsed but failed semantic validation.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}

/// Access to `config.yaml` under one configuration directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: ConfigPaths,
}

impl ConfigStore {
    /// Creates a store over the given layout.
    #[must_use]
    pub fn new(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    /// Layout this store reads from.
    #[must_use]
    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Path to the document.
    #[must_use]
    pub fn config_file(&self) -> &Path {
        self.paths.config_file()
    }

    /// Whether a document is present at the canonical path.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.paths.config_file().is_file()
    }

    /// Ensures the directory layout exists and writes defaults if needed.
    ///
    /// An existing document is never overwritten; that case is reported as
    /// [`InitOutcome::AlreadyInitialized`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CreateDirectory`] or [`ConfigError::Write`] on
    /// I/O failure.
    pub fn init(&self) -> Result<InitOutcome, ConfigError> {
        create_directory(self.paths.config_dir())?;
        for dir in self.paths.subdirectories() {
            create_directory(dir)?;
        }

        if self.exists() {
            return Ok(InitOutcome::AlreadyInitialized);
        }
        let contents = render(&default_configuration())?;
        let path = self.paths.config_file();
        match write_new_atomically(path, contents.as_bytes(), CONFIG_FILE_MODE) {
            Ok(()) => Ok(InitOutcome::Created),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(InitOutcome::AlreadyInitialized)
            }
            Err(source) => Err(ConfigError::Write {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Reads the raw document bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when the file is absent and
    /// [`ConfigError::Read`] for other I/O failures.
    pub fn read_raw(&self) -> Result<Vec<u8>, ConfigError> {
        let path = self.paths.config_file();
        fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
        })
    }

    /// Reads and deserialises the document.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::read_raw`], or [`ConfigError::Parse`]
    /// for malformed YAML and missing required keys.
    pub fn load(&self) -> Result<Configuration, ConfigError> {
        let bytes = self.read_raw()?;
        serde_yaml::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: self.paths.config_file().to_path_buf(),
            source,
        })
    }

    /// Loads the document and runs [`validate`] on it.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::load`] or [`ConfigError::Validation`].
    pub fn load_validated(&self) -> Result<Configuration, ConfigError> {
        let config = self.load()?;
        validate(&config)?;
        Ok(config)
    }

    /// Rewrites the whole document, header included.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialise`] or [`ConfigError::Write`].
    pub fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        let contents = render(config)?;
        let path = self.paths.config_file();
        write_atomically(path, contents.as_bytes(), CONFIG_FILE_MODE).map_err(|source| {
            ConfigError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Validates `config` without touching disk.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(&self, config: &Configuration) -> Result<(), ValidationError> {
        validate(config)
    }
}

fn render(config: &Configuration) -> Result<String, ConfigError> {
    let body = serde_yaml::to_string(config).map_err(|source| ConfigError::Serialise { source })?;
    Ok(format!("{CONFIG_HEADER}{body}"))
}

fn create_directory(path: &Path) -> Result<(), ConfigError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIRECTORY_MODE);
    #[cfg(not(unix))]
    let _ = DIRECTORY_MODE;
    builder
        .create(path)
        .map_err(|source| ConfigError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        })
}
