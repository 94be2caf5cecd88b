//! Utility functions for path handling.

use std::{
    env,
    path::{Path, PathBuf},
};

/// Resolves an executable the way a shell would.
///
/// A name containing a path separator is used as is, otherwise every directory
/// of `PATH` is searched in order. Returns `None` when nothing is found.
///
/// # Examples
///
/// ```text
/// find_executable("mpg123")             -> Some("/usr/bin/mpg123")
/// find_executable("/opt/bin/mpg123")    -> Some("/opt/bin/mpg123") if it exists
/// find_executable("not-installed")      -> None
/// ```
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.components().count() > 1 {
        return is_executable(path).then(|| path.to_path_buf());
    }

    let dirs = env::var_os("PATH")?;
    env::split_paths(&dirs)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
