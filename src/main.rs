//! tidy - bulk file-tree maintenance.
//!
//! Usage:
//!   tidy duplicates [PATH]   Find (and optionally delete) duplicate files
//!   tidy archive [PATH]      Zip files older than N days, per category
//!   tidy organize [PATH]     Move files into per-category folders
//!   tidy rename [PATH]       Prefix file names with their modification date
//!   tidy config              Show or create the settings file
//!   tidy --help              Show help
//!
//! Every command accepts `--dry-run`, which reports what would happen and
//! changes nothing.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, Context, Result};
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tidyfile_analyze::{format_age, AgeFilter, AgeFilterConfig, DuplicateConfig};
use tidyfile_core::{
    Classifier, ClassifierKind, EventKind, FileRecord, KeepStrategy, RecordingReporter, Settings,
    Tee, TracingReporter, Unclassified, FINANCE_CATEGORY, MEDIA_CATEGORY, OTHER_CATEGORY,
};
use tidyfile_ops::{
    ArchiveConfig, ArchiveWriter, CompressionMethod, DatePrefixRenamer, DedupeConfig,
    Deduplicator, FsDeleter, MoveReport, OperationType, OrganizeConfig, Organizer,
};
use tidyfile_scan::{Enumerator, ScanConfig, ScanOutput};

#[derive(Parser)]
#[command(
    name = "tidy",
    version,
    about = "Bulk file-tree maintenance: duplicates, archiving, organizing, renaming",
    long_about = "tidy cleans up a directory tree.\n\n\
                  Find duplicate files, zip up old files, sort files into \
                  category folders or date-prefix their names. Run any command \
                  with --dry-run first to see what it would do."
)]
struct Cli {
    /// Report what would happen without changing anything
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every command that walks a tree.
#[derive(Args)]
struct WalkArgs {
    /// Directory to work on
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    no_hidden: bool,

    /// Glob pattern to ignore (repeatable)
    #[arg(short = 'i', long = "ignore")]
    ignore: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Find duplicate files
    Duplicates {
        #[command(flatten)]
        walk: WalkArgs,

        /// Which copy to keep: keep_oldest, keep_newest, keep_shortest_path, keep_first
        #[arg(short, long)]
        strategy: Option<String>,

        /// Delete every copy except the kept one
        #[arg(short, long)]
        delete: bool,

        /// Send deleted files to the trash
        #[arg(long)]
        trash: bool,

        /// Minimum file size to consider (e.g., "1KB", "1MB")
        #[arg(short, long, default_value = "0")]
        min_size: String,
    },

    /// Zip files older than a number of days
    Archive {
        #[command(flatten)]
        walk: WalkArgs,

        /// Minimum age in days
        #[arg(short = 'a', long)]
        days: Option<i64>,

        /// One bundle per category instead of one for everything
        #[arg(short = 'c', long)]
        by_category: bool,

        /// How to categorize: type, extension, downloads, none
        #[arg(long, default_value = "type")]
        classifier: String,

        /// Bundle directory (relative to PATH unless absolute)
        #[arg(short = 'o', long)]
        archive_dir: Option<PathBuf>,

        /// Delete originals once their bundle is verified
        #[arg(short, long)]
        delete: bool,

        /// Send deleted originals to the trash
        #[arg(long)]
        trash: bool,

        /// Store entries without compression
        #[arg(long)]
        store: bool,
    },

    /// Move files into per-category folders
    Organize {
        #[command(flatten)]
        walk: WalkArgs,

        /// Folder that receives the category folders (defaults to PATH)
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// How to categorize: type, extension, downloads
        #[arg(long, default_value = "type")]
        classifier: String,
    },

    /// Prefix file names with their modification date
    Rename {
        #[command(flatten)]
        walk: WalkArgs,

        /// strftime pattern for the prefix
        #[arg(long)]
        date_format: Option<String>,

        /// Rename just this file instead of walking PATH
        #[arg(long, value_name = "FILE")]
        single_file: Option<PathBuf>,
    },

    /// Show the effective settings, or write a default settings file
    Config {
        /// Write default settings to the config path
        #[arg(long)]
        init: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let settings = load_settings(cli.config.as_deref())?;
    let ctx = Invocation {
        settings,
        dry_run: cli.dry_run,
        format: cli.format,
    };

    match cli.command {
        Command::Duplicates {
            walk,
            strategy,
            delete,
            trash,
            min_size,
        } => run_duplicates(&ctx, &walk, strategy.as_deref(), delete, trash, &min_size),
        Command::Archive {
            walk,
            days,
            by_category,
            classifier,
            archive_dir,
            delete,
            trash,
            store,
        } => run_archive(
            &ctx,
            &walk,
            ArchiveOptions {
                days,
                by_category,
                classifier: &classifier,
                archive_dir,
                delete,
                trash,
                store,
            },
        ),
        Command::Organize {
            walk,
            target,
            classifier,
        } => run_organize(&ctx, &walk, target, &classifier),
        Command::Rename {
            walk,
            date_format,
            single_file,
        } => run_rename(&ctx, &walk, date_format, single_file.as_deref()),
        Command::Config { init } => run_config(&ctx, cli.config.as_deref(), init),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let default_filter = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load().context("Failed to load settings")?,
    };
    Ok(settings)
}

/// Per-invocation state shared by every command.
struct Invocation {
    settings: Settings,
    dry_run: bool,
    format: OutputFormat,
}

impl Invocation {
    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn dry_run_banner(&self) {
        if self.dry_run && matches!(self.format, OutputFormat::Text) {
            println!(" [dry run] nothing will be changed");
            println!();
        }
    }
}

/// Enumerate a tree, classifying records on the way.
fn scan(walk: &WalkArgs, classifier: &dyn Classifier) -> Result<ScanOutput> {
    let config = ScanConfig::builder()
        .root(&walk.path)
        .recursive(walk.recursive)
        .include_hidden(!walk.no_hidden)
        .ignore_patterns(walk.ignore.clone())
        .build()
        .map_err(|e| eyre!("Invalid scan options: {e}"))?;

    tracing::info!(root = %walk.path.display(), recursive = walk.recursive, "scanning");
    let output = Enumerator::with_classifier(classifier)
        .scan(&config)
        .with_context(|| format!("Cannot scan {}", walk.path.display()))?;

    for warning in &output.warnings {
        tracing::warn!("{warning}");
    }
    Ok(output)
}

fn classifier_kind(name: &str) -> Result<ClassifierKind> {
    ClassifierKind::from_str(name)
        .map_err(|_| eyre!("Unknown classifier '{name}' (expected type, extension, downloads or none)"))
}

fn build_classifier(settings: &Settings, name: &str) -> Result<Box<dyn Classifier>> {
    Ok(classifier_kind(name)?.build(settings.category_map(), settings.invoice_keywords.clone()))
}

/// Run duplicate detection and optional deletion.
fn run_duplicates(
    ctx: &Invocation,
    walk: &WalkArgs,
    strategy: Option<&str>,
    delete: bool,
    trash: bool,
    min_size: &str,
) -> Result<()> {
    let strategy = match strategy {
        Some(name) => KeepStrategy::parse(name)?,
        None => ctx.settings.strategy()?,
    };
    let min_bytes = parse_size(min_size)?;

    let output = scan(walk, &Unclassified)?;

    let duplicates = DuplicateConfig::builder()
        .chunk_size(ctx.settings.hash_chunk_size)
        .min_size(min_bytes)
        .build()
        .map_err(|e| eyre!("Invalid duplicate options: {e}"))?;
    let config = DedupeConfig::builder()
        .strategy(strategy)
        .delete(delete)
        .dry_run(ctx.dry_run)
        .duplicates(duplicates)
        .build()
        .map_err(|e| eyre!("Invalid duplicate options: {e}"))?;

    let deleter = FsDeleter::new(trash || ctx.settings.use_trash);
    let summary = Deduplicator::with_config(config).run(&output.records, &deleter, &TracingReporter);

    if let OutputFormat::Json = ctx.format {
        return ctx.print_json(&summary);
    }

    ctx.dry_run_banner();
    println!("{}", "─".repeat(70));
    println!(" Duplicate File Report ({strategy})");
    println!("{}", "─".repeat(70));
    println!();

    let report = &summary.report;
    if report.groups.is_empty() {
        println!(" No duplicate files found in {} files.", report.files_analyzed);
    } else {
        println!(
            " Found {} duplicate groups ({} files) among {} files",
            report.group_count,
            report.total_duplicate_files(),
            report.files_analyzed
        );
        println!(" Total wasted space: {}", format_size(report.total_wasted_space));
        println!();

        for (i, decision) in summary.decisions.iter().enumerate() {
            let group = &decision.group;
            println!(
                " Group {} ({} files, {} each, {} wasted) [{}]",
                i + 1,
                group.count(),
                format_size(group.size),
                format_size(group.wasted_bytes()),
                group.fingerprint.short()
            );
            println!("   keep    {}", decision.keep.path().display());
            for record in &decision.remove {
                println!("   remove  {}", record.path().display());
            }
            println!();
        }
    }

    if delete {
        println!(" {}", summary.deletion.complete(ctx.dry_run).summary());
        for failure in &summary.deletion.failed {
            println!("   ! {failure}");
        }
    } else if report.has_duplicates() {
        println!(
            " Run with --delete to reclaim {}",
            format_size(summary.reclaimable_bytes())
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!(" {} file(s) could not be read:", report.failures.len());
        for failure in &report.failures {
            println!("   ! {failure}");
        }
    }

    Ok(())
}

struct ArchiveOptions<'a> {
    days: Option<i64>,
    by_category: bool,
    classifier: &'a str,
    archive_dir: Option<PathBuf>,
    delete: bool,
    trash: bool,
    store: bool,
}

/// Plan and write archive bundles.
fn run_archive(ctx: &Invocation, walk: &WalkArgs, opts: ArchiveOptions<'_>) -> Result<()> {
    let settings = &ctx.settings;
    let min_age_days = opts.days.unwrap_or(settings.min_age_days);
    if min_age_days < 0 {
        bail!("--days must not be negative (got {min_age_days})");
    }

    let classifier = build_classifier(settings, opts.classifier)?;
    let output = scan(walk, classifier.as_ref())?;

    let archive_dir = opts
        .archive_dir
        .unwrap_or_else(|| settings.archive_dir.clone());
    let archive_dir = if archive_dir.is_absolute() {
        archive_dir
    } else {
        output.root.join(archive_dir)
    };

    // Never re-archive earlier bundles.
    let records: Vec<_> = output
        .records
        .into_iter()
        .filter(|r| !r.path().starts_with(&archive_dir))
        .collect();

    let filter = AgeFilter::with_config(
        AgeFilterConfig::builder()
            .archive_dir(archive_dir)
            .bundle_date_format(settings.bundle_date_format.clone())
            .build()
            .map_err(|e| eyre!("Invalid archive options: {e}"))?,
    );
    let plans = filter.filter(&records, min_age_days, opts.by_category)?;

    let writer = ArchiveWriter::with_config(
        ArchiveConfig::builder()
            .source_root(Some(output.root.clone()))
            .delete_originals(opts.delete)
            .dry_run(ctx.dry_run)
            .compression(if opts.store {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            })
            .build()
            .map_err(|e| eyre!("Invalid archive options: {e}"))?,
    );

    let deleter = FsDeleter::new(opts.trash || settings.use_trash);
    let recorder = RecordingReporter::new();
    let reporter = Tee(&TracingReporter, &recorder);
    let report = writer.write_all(&plans, &deleter, &reporter);

    if let OutputFormat::Json = ctx.format {
        return ctx.print_json(&report);
    }

    ctx.dry_run_banner();
    println!("{}", "─".repeat(70));
    println!(
        " Archive Report (older than {})",
        format_age(days_duration(min_age_days))
    );
    println!("{}", "─".repeat(70));
    println!();

    if plans.is_empty() {
        println!(" No files older than {min_age_days} days.");
        return Ok(());
    }

    for result in &report.results {
        let label = result.category.as_deref().unwrap_or("all files");
        let verb = match (result.dry_run, result.created) {
            (true, _) => "would write",
            (false, true) => "wrote",
            (false, false) => "nothing written for",
        };
        let bytes: u64 = plans
            .iter()
            .filter(|p| p.category == result.category)
            .map(|p| p.total_size())
            .sum();
        println!(
            " {label}: {verb} {} ({} files, {})",
            result.bundle_path.display(),
            result.entries_written.len(),
            format_size(bytes)
        );
        for failure in &result.entries_failed {
            println!("   ! {failure}");
        }
        if opts.delete {
            println!("   {}", result.deletion.complete(result.dry_run).summary());
            for failure in &result.deletion.failed {
                println!("   ! {failure}");
            }
        }
    }

    for aborted in &report.aborted {
        let label = aborted.category.as_deref().unwrap_or("all files");
        println!(
            " {label}: aborted {}, nothing deleted: {}",
            aborted.bundle_path.display(),
            aborted.message
        );
    }

    println!();
    println!(
        " {} entries archived, {} failed, {} bundle(s) aborted",
        report.entries_written(),
        report.entries_failed(),
        report.aborted.len()
    );
    let problems = recorder.count(EventKind::Failed);
    if problems > 0 {
        println!(" {problems} problem(s) logged; rerun with -v for details");
    }

    Ok(())
}

/// Move files into category folders.
fn run_organize(
    ctx: &Invocation,
    walk: &WalkArgs,
    target: Option<PathBuf>,
    classifier: &str,
) -> Result<()> {
    let kind = classifier_kind(classifier)?;
    if kind == ClassifierKind::None {
        bail!("organize needs a classifier that assigns categories");
    }
    let settings = &ctx.settings;
    let classifier = kind.build(settings.category_map(), settings.invoice_keywords.clone());
    let output = scan(walk, classifier.as_ref())?;

    let target_root = target.unwrap_or_else(|| output.root.clone());
    let mut category_names: Vec<String> = settings
        .category_map()
        .category_names()
        .into_iter()
        .map(String::from)
        .collect();
    category_names.extend(
        [
            OTHER_CATEGORY,
            FINANCE_CATEGORY,
            MEDIA_CATEGORY,
        ]
        .map(String::from),
    );

    let organizer = Organizer::new(
        OrganizeConfig::builder()
            .target_root(target_root)
            .category_names(category_names)
            .build()
            .map_err(|e| eyre!("Invalid organize options: {e}"))?,
    );
    let report = organizer.organize(&output.records, ctx.dry_run, &TracingReporter);

    print_move_report(ctx, &report, OperationType::Move)
}

/// Date-prefix file names.
fn run_rename(
    ctx: &Invocation,
    walk: &WalkArgs,
    date_format: Option<String>,
    single_file: Option<&Path>,
) -> Result<()> {
    let format = date_format.unwrap_or_else(|| ctx.settings.date_format.clone());
    let renamer = DatePrefixRenamer::new(format)?;
    let records = match single_file {
        Some(file) => vec![single_record(file)?],
        None => scan(walk, &Unclassified)?.records,
    };

    let report = renamer.rename(&records, ctx.dry_run, &TracingReporter);

    print_move_report(ctx, &report, OperationType::Rename)
}

/// Snapshot one named file. Symlinks and directories are refused.
fn single_record(file: &Path) -> Result<FileRecord> {
    let metadata = std::fs::symlink_metadata(file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    if !metadata.file_type().is_file() {
        bail!("{} is not a regular file", file.display());
    }
    let path = file
        .canonicalize()
        .with_context(|| format!("Cannot resolve {}", file.display()))?;
    let modified = metadata
        .modified()
        .with_context(|| format!("Cannot read modification time of {}", file.display()))?;
    Ok(FileRecord::new(path, metadata.len(), modified))
}

fn print_move_report(ctx: &Invocation, report: &MoveReport, operation: OperationType) -> Result<()> {
    if let OutputFormat::Json = ctx.format {
        return ctx.print_json(report);
    }

    ctx.dry_run_banner();
    let moves = if ctx.dry_run {
        &report.would_move
    } else {
        &report.moved
    };
    for planned in moves {
        println!(" {} -> {}", planned.from.display(), planned.to.display());
    }
    for failure in &report.failed {
        println!(" ! {failure}");
    }
    if !moves.is_empty() || !report.failed.is_empty() {
        println!();
    }
    println!(" {}", report.complete(operation, ctx.dry_run).summary());
    Ok(())
}

/// Show or initialize the settings file.
fn run_config(ctx: &Invocation, explicit: Option<&Path>, init: bool) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(Settings::config_path)
        .ok_or_else(|| eyre!("No config directory on this platform; pass --config"))?;

    if init {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        if ctx.dry_run {
            println!(" [dry run] would write {}", path.display());
            return Ok(());
        }
        Settings::default().save_to(&path)?;
        println!(" Wrote {}", path.display());
        return Ok(());
    }

    match ctx.format {
        OutputFormat::Json => ctx.print_json(&ctx.settings),
        OutputFormat::Text => {
            let status = if path.exists() { "" } else { " (not present, using defaults)" };
            println!(" Settings file: {}{status}", path.display());
            println!();
            println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
            Ok(())
        }
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit '{other}'"),
    };
    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size '{s}'"))?;

    Ok((num * multiplier as f64) as u64)
}

/// `days` as a duration; saturates instead of overflowing.
fn days_duration(days: i64) -> std::time::Duration {
    let days = u64::try_from(days).unwrap_or(0);
    std::time::Duration::from_secs(days.saturating_mul(86_400))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_single_file_flag() {
        let cli = Cli::try_parse_from(["tidy", "rename", "--single-file", "notes.txt"]).unwrap();
        match cli.command {
            Command::Rename { single_file, .. } => {
                assert_eq!(single_file, Some(PathBuf::from("notes.txt")));
            }
            _ => panic!("expected rename"),
        }
    }

    #[test]
    fn test_single_record_refuses_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(single_record(temp.path()).is_err());

        let file = temp.path().join("a.txt");
        std::fs::write(&file, "abc").unwrap();
        let record = single_record(&file).unwrap();
        assert_eq!(record.size(), 3);
        assert!(record.path().is_absolute());
    }

    #[test]
    fn test_days_duration_saturates() {
        assert_eq!(days_duration(2).as_secs(), 2 * 86_400);
        assert_eq!(days_duration(i64::MAX).as_secs(), u64::MAX);
        assert_eq!(days_duration(-1).as_secs(), 0);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5k").unwrap(), 1536);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert!(parse_size("12XB").is_err());
        assert!(parse_size("KB").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tidy", "archive", "/tmp", "--dry-run", "-c", "--days", "90"])
            .unwrap();
        assert!(cli.dry_run);
        match cli.command {
            Command::Archive {
                days, by_category, ..
            } => {
                assert_eq!(days, Some(90));
                assert!(by_category);
            }
            _ => panic!("expected archive"),
        }
    }

    #[test]
    fn test_classifier_names() {
        assert_eq!(classifier_kind("downloads").unwrap(), ClassifierKind::Downloads);
        assert!(classifier_kind("bogus").is_err());
    }
}
