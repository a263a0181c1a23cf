//! Working-tree helpers: existence checks, atomic overwrite, content digests.

use std::io::Write;
use std::path::{Component, Path};

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Whether `rel` names a location inside the tree it is joined to.
///
/// Absolute paths and `..` components are rejected; `./` is allowed.
pub fn is_contained(rel: &str) -> bool {
    !rel.is_empty()
        && Path::new(rel)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Whether `rel` exists relative to `root` without leaving it.
pub fn exists_in(root: &Path, rel: &str) -> bool {
    is_contained(rel) && root.join(rel).exists()
}

/// Replace the contents of `path` with `contents`.
///
/// The data is written to a temporary file next to the target and renamed
/// over it, so readers see either the old or the new file. Existing
/// permissions are carried over.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Hex SHA-256 of `data`.
pub fn content_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
