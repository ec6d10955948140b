//! Directory traversal for source files.
//!
//! [`FileWalker`] uses the `ignore` crate to walk a root directory while
//! respecting `.gitignore` patterns, keeping files whose extension is in the
//! configured list and skipping build and dependency directories.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use ir_scanner::FileWalker;
//!
//! let walker = FileWalker::new(Utf8Path::new("src/schemas"))?
//!     .with_extensions(&["ts"]);
//! for path in walker.collect_paths()? {
//!     println!("found {path}");
//! }
//! # Ok::<(), ir_scanner::ScanError>(())
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use crate::error::ScanError;

/// Directories that never contain files to rewrite.
const SKIP_DIRECTORIES: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".git",
    "coverage",
    ".turbo",
    ".next",
];

/// Extensions used when none are configured.
const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// A file walker that discovers source files under one root.
///
/// Paths are returned sorted so that runs are reproducible.
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Additional directories to skip (beyond the standard list).
    skip_dirs: Vec<String>,
    /// File extensions to keep, without the dot.
    extensions: Vec<String>,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl FileWalker {
    /// Creates a walker for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::MissingRoot`] if `root` does not exist or is not
    /// a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::MissingRoot(root.to_owned()));
        }

        Ok(Self {
            root: root.to_owned(),
            skip_dirs: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            follow_links: false,
        })
    }

    /// Adds directories to skip during traversal.
    ///
    /// These are in addition to the default skip list (`node_modules`, `dist`, etc.).
    #[must_use]
    pub fn with_skip_dirs<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        self.skip_dirs
            .extend(dirs.iter().map(|d| d.as_ref().to_owned()));
        self
    }

    /// Replaces the extensions to keep.
    #[must_use]
    pub fn with_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_owned())
            .collect();
        self
    }

    /// Configures whether to follow symbolic links.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects every matching file under the root, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    /// Returns [`ScanError::NonUtf8Path`] if a non-UTF-8 path is encountered.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;

            if !self.has_extension(utf8_path) || self.should_skip_path(utf8_path) {
                continue;
            }
            paths.push(utf8_path.to_owned());
        }

        paths.sort();
        Ok(paths)
    }

    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(self.follow_links)
            // Single-threaded walk; files are processed in parallel afterwards
            .threads(1)
            .require_git(false)
            .build()
    }

    fn has_extension(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.components().any(|component| {
            let name = component.as_str();
            SKIP_DIRECTORIES.contains(&name) || self.skip_dirs.iter().any(|d| d == name)
        })
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn walker(skip: &[&str]) -> FileWalker {
        FileWalker {
            root: Utf8PathBuf::from("."),
            skip_dirs: skip.iter().map(ToString::to_string).collect(),
            extensions: vec!["ts".to_owned(), "tsx".to_owned()],
            follow_links: false,
        }
    }

    #[test]
    fn test_has_extension() {
        let walker = walker(&[]);
        assert!(walker.has_extension(Utf8Path::new("foo.ts")));
        assert!(walker.has_extension(Utf8Path::new("src/bar.tsx")));
        assert!(!walker.has_extension(Utf8Path::new("foo.js")));
        assert!(!walker.has_extension(Utf8Path::new("foo")));

        let walker = walker.with_extensions(&[".mts"]);
        assert!(walker.has_extension(Utf8Path::new("foo.mts")));
        assert!(!walker.has_extension(Utf8Path::new("foo.ts")));
    }

    #[test]
    fn test_should_skip_path() {
        let walker = walker(&["generated"]);
        assert!(walker.should_skip_path(Utf8Path::new("node_modules/foo.ts")));
        assert!(walker.should_skip_path(Utf8Path::new("src/dist/bar.ts")));
        assert!(walker.should_skip_path(Utf8Path::new("src/generated/bar.ts")));
        assert!(!walker.should_skip_path(Utf8Path::new("src/tools/boards.ts")));
    }

    #[test]
    fn test_missing_root() {
        let err = FileWalker::new(Utf8Path::new("/definitely/not/here")).expect_err("missing");
        assert!(matches!(err, ScanError::MissingRoot(_)));
    }

    #[test]
    fn test_collect_paths_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8Path::from_path(dir.path()).expect("utf8 tempdir");
        fs::create_dir_all(root.join("tools")).expect("mkdir");
        fs::create_dir_all(root.join("node_modules/zod")).expect("mkdir");
        fs::write(root.join("tools/b.ts"), "").expect("write");
        fs::write(root.join("a.ts"), "").expect("write");
        fs::write(root.join("notes.md"), "").expect("write");
        fs::write(root.join("node_modules/zod/index.ts"), "").expect("write");

        let paths = FileWalker::new(root)
            .expect("walker")
            .collect_paths()
            .expect("collect");
        let names: Vec<_> = paths
            .iter()
            .filter_map(|p| p.strip_prefix(root).ok())
            .map(Utf8Path::as_str)
            .collect();
        assert_eq!(names, ["a.ts", "tools/b.ts"]);
    }
}
