//! Per-case symlink setup (spec.md §4.1 "Symlink setup"): before launch,
//! for each `(src, dst)` in a case's symlink map, create a symlink at
//! `workdir/src` pointing at `dst`, rejecting any `src` that escapes the
//! working directory after normalization.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use judge_common::{InternalError, JudgeError};

/// Creates every declared symlink under `workdir`. Fails closed:
/// `InternalError` on the first `src` that resolves outside `workdir`.
pub fn create_symlinks(workdir: &Path, symlinks: &BTreeMap<String, String>) -> Result<(), JudgeError> {
    for (src, dst) in symlinks {
        let link_path = resolve_within(workdir, src)
            .ok_or_else(|| InternalError::new(format!("symlink '{src}' escapes the working directory")))?;
        if let Some(parent) = link_path.parent() {
            fs::create_dir_all(parent).map_err(JudgeError::Io)?;
        }
        std::os::unix::fs::symlink(dst, &link_path).map_err(JudgeError::Io)?;
    }
    Ok(())
}

/// Lexically resolves `rel` against `workdir`, rejecting absolute paths and
/// any `..` that would climb above `workdir`. Lexical, not `fs::canonicalize`,
/// because `rel` names a path that does not exist yet (it's the symlink
/// we're about to create).
fn resolve_within(workdir: &Path, rel: &str) -> Option<PathBuf> {
    let mut stack: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(seg) => stack.push(seg),
            Component::CurDir => {}
            Component::ParentDir => stack.pop()?,
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    let mut result = workdir.to_path_buf();
    result.extend(stack);
    Some(result)
}
