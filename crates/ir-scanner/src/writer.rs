//! Atomic write-back.
//!
//! The new content is written to a temporary file in the same directory,
//! synced, given the original file's permissions and renamed over it, so a
//! reader never sees a half-written file.

use std::fs;
use std::io::Write;

use camino::Utf8Path;
use tempfile::NamedTempFile;

use crate::error::ScanError;

/// Replaces the content of `path` with `contents`.
///
/// # Errors
///
/// Returns [`ScanError::Write`] if any step fails; the original file is then
/// left as it was.
pub fn write_atomic(path: &Utf8Path, contents: &str) -> Result<(), ScanError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ScanError::write(path, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ScanError::write(path, e))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())
            .map_err(|e| ScanError::write(path, e))?;
    }

    tmp.persist(path)
        .map_err(|e| ScanError::write(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8 tempdir");
        let path = root.join("board.ts");
        fs::write(&path, "old").expect("write");

        write_atomic(&path, "new content").expect("atomic write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "new content");
        let leftovers = fs::read_dir(root).expect("read_dir").count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8 tempdir");
        let path = root.join("tool.ts");
        fs::write(&path, "old").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).expect("chmod");

        write_atomic(&path, "new").expect("atomic write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let err = write_atomic(Utf8Path::new("/no/such/dir/file.ts"), "x").expect_err("fails");
        assert!(matches!(err, ScanError::Write { .. }));
    }
}
