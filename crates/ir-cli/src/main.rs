//! CLI entry point for the instance-routing injector.
//!
//! Rewrites zod schemas and async tool handlers in place so that every
//! request can name the instance it targets.
//!
//! # Usage
//!
//! ```bash
//! # Rewrite the default roots (src/schemas, src/server/tools)
//! inject-instance
//!
//! # Rewrite specific directories and files, without writing
//! inject-instance src/schemas --file src/server/tools/boards.ts --dry-run
//!
//! # Machine-readable report
//! inject-instance --json > report.json
//! ```
//!
//! The exit status is non-zero if any file failed.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::fmt::Write as _;
use std::io::Write;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use clap::builder::FalseyValueParser;
use ir_core::{Config, FileOutcome};
use ir_scanner::{CancellationToken, Injector, RunResult};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Injects the instance-routing parameter into zod schemas and tool handlers.
///
/// Schemas gain `...instanceParameterSchema`; handlers gain an `instance`
/// field and resolve their client with `getClientForInstance`. Running the
/// tool again changes nothing.
#[derive(Parser)]
#[command(name = "inject-instance", version, about, long_about = None)]
struct Cli {
    /// Directories to walk.
    ///
    /// Defaults to `src/schemas` and `src/server/tools`, or to none when
    /// only `--file` is given.
    roots: Vec<Utf8PathBuf>,

    /// Individual files to rewrite (repeatable).
    #[arg(long = "file", value_name = "FILE")]
    files: Vec<Utf8PathBuf>,

    /// JSON configuration file.
    #[arg(long, env = "IR_INJECT_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Module that exports the client resolver; imported when set.
    #[arg(long, env = "IR_INJECT_RESOLVER_MODULE")]
    resolver_module: Option<String>,

    /// Report what would change without writing any file.
    #[arg(
        long,
        env = "IR_INJECT_DRY_RUN",
        value_parser = FalseyValueParser::new()
    )]
    dry_run: bool,

    /// Print the run report as JSON instead of progress lines.
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs go
/// to stderr so that `--json` output stays clean.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds the run [`Config`] from the config file and CLI arguments.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the result is
/// invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if !cli.roots.is_empty() {
        config.scan.roots.clone_from(&cli.roots);
    } else if !cli.files.is_empty() {
        config.scan.roots.clear();
    }
    if !cli.files.is_empty() {
        config.scan.files.clone_from(&cli.files);
    }
    if cli.dry_run {
        config.scan.dry_run = true;
    }
    if let Some(module) = &cli.resolver_module {
        config.routing.resolver_module = Some(module.clone());
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Renders one progress line per file, the summary and the updated count.
fn render_report(result: &RunResult, dry_run: bool) -> String {
    let mut out = String::new();

    for file in &result.files {
        let path = &file.path;
        let _ = match file.outcome {
            FileOutcome::Updated if dry_run => writeln!(out, "✓ Would update {path}"),
            FileOutcome::Updated => writeln!(out, "✓ Updated {path}"),
            FileOutcome::Unchanged => writeln!(out, "- No changes needed for {path}"),
            FileOutcome::Skipped(reason) => {
                writeln!(out, "- Skipped {path} ({})", reason.label())
            }
            FileOutcome::Failed => match &file.error {
                Some(error) => writeln!(out, "✗ Error updating {path}: {error}"),
                None => writeln!(out, "✗ Error updating {path}"),
            },
        };
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.stats);
    let verb = if dry_run { "Would update" } else { "Updated" };
    let _ = writeln!(out, "{verb} {} files", result.updated());
    out
}

/// Maps a finished run to the process exit status: failure if any file
/// failed.
fn exit_code(result: &RunResult) -> ExitCode {
    if result.stats.has_errors() {
        info!(errors = result.stats.errors, "Run finished with errors");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing
    init_tracing(cli.verbose, cli.no_color);

    // 4. Build the run; missing roots and bad config abort here
    let config = build_config(&cli)?;
    let dry_run = config.scan.dry_run;
    let token = CancellationToken::new();
    let injector = Injector::new(config)?.with_cancellation(token.clone());

    // 5. Run on the blocking pool; Ctrl-C stops files not yet started
    let mut task = tokio::task::spawn_blocking(move || injector.run());
    let result = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, finishing files in progress");
            token.cancel();
            task.await?
        }
    }?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if cli.json {
        writeln!(handle, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        write!(handle, "{}", render_report(&result, dry_run))?;
    }

    Ok(exit_code(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use clap::CommandFactory;
    use insta::assert_snapshot;
    use ir_core::SkipReason;
    use ir_rewriter::RewriteReport;
    use ir_scanner::{FileReport, RunStats, ScanError};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_files_only_clears_default_roots() {
        let cli = Cli::parse_from(["inject-instance", "--file", "src/a.ts", "--dry-run"]);
        let config = build_config(&cli).expect("config");
        assert!(config.scan.roots.is_empty());
        assert_eq!(config.scan.files, [Utf8PathBuf::from("src/a.ts")]);
        assert!(config.scan.dry_run);
    }

    #[test]
    fn test_roots_override_defaults() {
        let cli = Cli::parse_from([
            "inject-instance",
            "lib/schemas",
            "--resolver-module",
            "./client.js",
        ]);
        let config = build_config(&cli).expect("config");
        assert_eq!(config.scan.roots, [Utf8PathBuf::from("lib/schemas")]);
        assert_eq!(
            config.routing.resolver_module.as_deref(),
            Some("./client.js")
        );
    }

    #[test]
    fn test_render_report() {
        let stats = RunStats::new();
        let files = vec![
            FileReport {
                path: Utf8PathBuf::from("src/schemas/boards.ts"),
                outcome: FileOutcome::Updated,
                report: RewriteReport::default(),
                error: None,
            },
            FileReport::skipped(
                Utf8Path::new("src/schemas/index.ts"),
                SkipReason::Excluded,
            ),
            FileReport::failed(
                Utf8Path::new("src/schemas/broken.ts"),
                ScanError::MissingRoot(Utf8PathBuf::from("src/schemas/broken.ts")),
            ),
        ];
        for file in &files {
            stats.record_outcome(file.outcome);
        }
        let result = RunResult {
            stats: stats.snapshot(),
            files,
        };

        assert_snapshot!(render_report(&result, false), @r"
        ✓ Updated src/schemas/boards.ts
        - Skipped src/schemas/index.ts (excluded)
        ✗ Error updating src/schemas/broken.ts: root directory does not exist: src/schemas/broken.ts

        Files: 3 (updated 1, unchanged 0, skipped 1, errors 1)
        Schemas injected: 0, handlers rewritten: 0, call sites rewritten: 0, imports added: 0
        Updated 1 files
        ");
    }

    #[test]
    fn test_render_dry_run() {
        let stats = RunStats::new();
        stats.record_outcome(FileOutcome::Updated);
        let result = RunResult {
            stats: stats.snapshot(),
            files: vec![FileReport {
                path: Utf8PathBuf::from("src/server/tools/items.ts"),
                outcome: FileOutcome::Updated,
                report: RewriteReport::default(),
                error: None,
            }],
        };

        let out = render_report(&result, true);
        assert!(out.starts_with("✓ Would update src/server/tools/items.ts\n"));
        assert!(out.ends_with("Would update 1 files\n"));
    }

    #[test]
    fn test_exit_code_reflects_failed_files() {
        let stats = RunStats::new();
        stats.record_outcome(FileOutcome::Updated);
        stats.record_outcome(FileOutcome::Skipped(SkipReason::NotFound));
        let clean = RunResult {
            stats: stats.snapshot(),
            files: Vec::new(),
        };
        assert_eq!(exit_code(&clean), ExitCode::SUCCESS);

        stats.record_outcome(FileOutcome::Failed);
        let failed = RunResult {
            stats: stats.snapshot(),
            files: Vec::new(),
        };
        assert_eq!(exit_code(&failed), ExitCode::FAILURE);
    }
}
