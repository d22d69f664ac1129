//! Serialization of fitted model parameters.
//!
//! Parameters are plain data structs (`Vec`s, scalars, enums) encoded with
//! `bincode`. Artifacts are written through a temporary file in the destination
//! directory and renamed into place, so a failed write never leaves a truncated
//! artifact at the target path. The artifact keeps the permissions of the file
//! it replaces; a new artifact is `0o644` on unix.

use std::error::Error;
use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{ForestError, Result};

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain numerical data, not views or handles.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> std::result::Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> std::result::Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// Atomically replaces the file at `path` with `bytes`.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ForestError::io(dir, e))?;
    // NamedTempFile is created 0o600.
    if let Some(perms) = artifact_permissions(path) {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| ForestError::io(tmp.path(), e))?;
    }
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| ForestError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| ForestError::io(path, e.error))?;

    info!(path = %path.display(), bytes = bytes.len(), "Saved model artifact");
    Ok(())
}

/// Permissions for the artifact replacing `path`: those of the existing file,
/// otherwise `0o644`.
fn artifact_permissions(path: &Path) -> Option<Permissions> {
    if let Ok(existing) = std::fs::metadata(path) {
        return Some(existing.permissions());
    }
    default_permissions()
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

/// Reads the whole artifact at `path`.
pub fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    info!(path = %path.display(), "Loading model artifact");
    std::fs::read(path).map_err(|e| ForestError::io(path, e))
}
