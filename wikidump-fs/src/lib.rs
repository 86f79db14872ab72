//! Capability-based filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io;

/// Create `path` and any missing ancestors.
///
/// Succeeds without touching the filesystem when the directory already exists.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    let (anchor, relative) = split_anchor(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(&relative)
}

/// Create the parent directory of `path` when it names one.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Report whether `path` names an existing regular file.
///
/// A missing path surfaces as an [`io::ErrorKind::NotFound`] error so callers
/// can tell an absent input apart from a directory.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.metadata(name).map(|meta| meta.is_file())
}

/// Open the directory `path` is anchored at and return the remaining suffix.
///
/// Prefixes, the root and any leading `..` components form the anchor so the
/// suffix never escapes the capability it is resolved against.
fn split_anchor(path: &Utf8Path) -> io::Result<(Dir, Utf8PathBuf)> {
    let mut anchor = Utf8PathBuf::new();
    let mut relative = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir => anchor.push(component.as_str()),
            Utf8Component::ParentDir if relative.as_str().is_empty() => {
                anchor.push(component.as_str());
            }
            Utf8Component::CurDir => {}
            other => relative.push(other.as_str()),
        }
    }
    if anchor.as_str().is_empty() {
        anchor.push(".");
    }
    let dir = Dir::open_ambient_dir(&anchor, ambient_authority())?;
    Ok((dir, relative))
}
