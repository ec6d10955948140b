//! Parallel injection over a set of files.
//!
//! [`Injector`] collects the target files, then processes them with a rayon
//! parallel iterator. Each worker thread owns a [`TsParser`] and a
//! `bumpalo_herd` arena member, so nothing is locked while files are parsed
//! and rewritten. Results come back in input order.
//!
//! # Per-file flow
//!
//! 1. cancelled run → `Skipped(Cancelled)`
//! 2. excluded file name → `Skipped(Excluded)`
//! 3. missing file → warning, `Skipped(NotFound)`
//! 4. read, transform, re-parse; any failure → `Failed`, file untouched
//! 5. changed text → atomic write, `Updated`

use std::fs;

use bumpalo_herd::Herd;
use camino::{Utf8Path, Utf8PathBuf};
use ir_core::{Config, FileOutcome, FxHashSet, SkipReason};
use ir_rewriter::{RewriteReport, Rewriter, Transform};
use ir_ts_parser::{Bump, Dialect, ParseError, TsParser};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::stats::RunStats;
use crate::walker::FileWalker;
use crate::writer::write_atomic;
use crate::{FileReport, RunResult};

/// Rewrites every target file of a run.
///
/// # Examples
///
/// ```no_run
/// use ir_core::Config;
/// use ir_scanner::Injector;
///
/// let injector = Injector::new(Config::default())?;
/// let result = injector.run()?;
/// println!("{}", result.stats);
/// # Ok::<(), ir_scanner::ScanError>(())
/// ```
#[derive(Debug)]
pub struct Injector {
    config: Config,
    cancel: CancellationToken,
}

impl Injector {
    /// Creates an injector for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Uses `token` to stop the run early.
    ///
    /// Files not yet started when the token is cancelled are reported as
    /// `Skipped(Cancelled)`; files in flight finish normally.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns the run configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns every file the run will consider, in processing order.
    ///
    /// Walked files come first (sorted per root), then explicit files. A path
    /// reachable twice is listed once. Explicit files are listed even if they
    /// do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::MissingRoot`] if any root does not exist; roots
    /// are all checked before any is walked.
    pub fn collect_targets(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let scan = &self.config.scan;
        let walkers = scan
            .roots
            .iter()
            .map(|root| {
                Ok(FileWalker::new(root)?
                    .with_skip_dirs(&scan.skip_dirs)
                    .with_extensions(&scan.file_extensions)
                    .with_follow_links(scan.follow_links))
            })
            .collect::<Result<Vec<_>, ScanError>>()?;

        let mut seen: FxHashSet<Utf8PathBuf> = FxHashSet::default();
        let mut targets = Vec::new();
        for walker in &walkers {
            for path in walker.collect_paths()? {
                if seen.insert(path.clone()) {
                    targets.push(path);
                }
            }
        }
        for file in &scan.files {
            if seen.insert(file.clone()) {
                targets.push(file.clone());
            }
        }
        Ok(targets)
    }

    /// Runs the injection over every target file.
    ///
    /// # Errors
    ///
    /// Returns an error only for setup failures (missing root, walk error).
    /// Per-file failures are reported in the [`RunResult`].
    pub fn run(&self) -> Result<RunResult, ScanError> {
        let scan = &self.config.scan;
        info!(
            roots = scan.roots.len(),
            files = scan.files.len(),
            dry_run = scan.dry_run,
            "Starting injection run"
        );

        let targets = self.collect_targets()?;
        info!(count = targets.len(), "Collected files");

        let stats = RunStats::new();
        let files = self.process_files(&targets, &stats);
        let stats = stats.snapshot();

        info!(
            files = stats.files,
            updated = stats.updated,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            errors = stats.errors,
            "Run completed"
        );
        Ok(RunResult { stats, files })
    }

    /// Processes `paths` in parallel, counting into `stats`.
    ///
    /// The returned reports are in the order of `paths`.
    #[must_use]
    pub fn process_files(&self, paths: &[Utf8PathBuf], stats: &RunStats) -> Vec<FileReport> {
        let herd = Herd::new();

        paths
            .par_iter()
            .map_init(
                || (TsParser::new().ok(), herd.get()),
                |(parser, member), path| {
                    let report = self.process_inner(path, parser.as_mut(), member.as_bump());
                    stats.record_outcome(report.outcome);
                    stats.record_report(&report.report);
                    report
                },
            )
            .collect()
    }

    /// Processes one file with its own parser and arena.
    #[must_use]
    pub fn process_file(&self, path: &Utf8Path) -> FileReport {
        let bump = Bump::new();
        let mut parser = TsParser::new().ok();
        self.process_inner(path, parser.as_mut(), &bump)
    }

    fn process_inner(
        &self,
        path: &Utf8Path,
        parser: Option<&mut TsParser>,
        bump: &Bump,
    ) -> FileReport {
        if self.cancel.is_cancelled() {
            return FileReport::skipped(path, SkipReason::Cancelled);
        }
        if self.config.scan.is_excluded_path(path) {
            debug!(path = %path, "Excluded file");
            return FileReport::skipped(path, SkipReason::Excluded);
        }
        if !path.is_file() {
            warn!(path = %path, "File not found, skipping");
            return FileReport::skipped(path, SkipReason::NotFound);
        }

        match self.rewrite_file(path, parser, bump) {
            Ok((outcome, report)) => {
                debug!(path = %path, outcome = %outcome, "Processed file");
                FileReport {
                    path: path.to_owned(),
                    outcome,
                    report,
                    error: None,
                }
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to process file");
                FileReport::failed(path, e)
            }
        }
    }

    fn rewrite_file(
        &self,
        path: &Utf8Path,
        parser: Option<&mut TsParser>,
        bump: &Bump,
    ) -> Result<(FileOutcome, RewriteReport), ScanError> {
        let parser = parser.ok_or_else(|| ScanError::Parser(ParseError::LanguageInit))?;
        let dialect = path
            .extension()
            .map_or(Dialect::TypeScript, Dialect::from_extension);
        if parser.dialect() != dialect {
            parser.set_dialect(dialect)?;
        }

        let source = fs::read_to_string(path).map_err(|e| ScanError::read(path, e))?;
        let output = Rewriter::new(&self.config.routing)
            .transform(parser, bump, &source)
            .map_err(|e| ScanError::rewrite(path, e))?;

        let outcome = match output.transform {
            Transform::NothingToDo => FileOutcome::Unchanged,
            Transform::AlreadyInjected => FileOutcome::Skipped(SkipReason::AlreadyInjected),
            Transform::Rewritten(text) => {
                if self.config.scan.dry_run {
                    debug!(path = %path, "Dry run, not writing");
                } else {
                    write_atomic(path, &text)?;
                }
                FileOutcome::Updated
            }
        };
        Ok((outcome, output.report))
    }
}
