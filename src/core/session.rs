//! The persisted session slot.
//!
//! The login flow (external to this binary) writes a serialized identity
//! into a single named slot; the shell reads it at startup and deletes it on
//! logout. The slot is modeled as an injected [`SessionStore`] capability so
//! the auth path can be exercised against a fake instead of the real data
//! directory.

use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// File name of the session slot under the platform data directory.
pub const SESSION_FILE: &str = "session.json";

/// Errors that can occur while touching the session slot.
#[derive(Debug)]
pub enum SessionError {
    /// Failed to read the session file from disk.
    Read {
        /// Path to the session file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write or replace the session file.
    Write {
        /// Path to the session file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to delete the session file.
    Delete {
        /// Path to the session file that could not be removed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Read { path, source } => {
                write!(f, "Failed to read session at {}: {}", path.display(), source)
            }
            SessionError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write session at {}: {}",
                    path.display(),
                    source
                )
            }
            SessionError::Delete { path, source } => {
                write!(
                    f,
                    "Failed to delete session at {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl StdError for SessionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SessionError::Read { source, .. }
            | SessionError::Write { source, .. }
            | SessionError::Delete { source, .. } => Some(source),
        }
    }
}

/// Capability over the single named session slot.
///
/// `load` returning `Ok(None)` is the normal logged-out state, not an error.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn store(&self, token: &str) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session slot backed by a file in the platform data directory.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let proj_dirs = ProjectDirs::from("app", "textwo", "textwo")
            .ok_or("Failed to determine data directory")?;
        Ok(Self {
            path: proj_dirs.data_dir().join(SESSION_FILE),
        })
    }

    /// Use an explicit path instead of the platform data directory.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn store(&self, token: &str) -> Result<(), SessionError> {
        let write_err = |source: std::io::Error| SessionError::Write {
            path: self.path.clone(),
            source,
        };

        let parent = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        // Replace atomically so a half-written slot never masquerades as a
        // valid session.
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir).map_err(write_err)?,
            None => NamedTempFile::new().map_err(write_err)?,
        };
        temp_file.write_all(token.as_bytes()).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Delete {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
