//! spacefindr - see where your disk space goes.
//!
//! Usage:
//!   spacefindr [PATH]                  Scan and show a size summary
//!   spacefindr scan [PATH]             Same, with display options
//!   spacefindr layout [PATH]           Print the treemap rectangles of a folder
//!   spacefindr largest [PATH]          List the largest files
//!   spacefindr delete PATH TARGET      Delete an entry and show updated sizes
//!   spacefindr --help                  Show help

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use spacefindr_core::{FilterPolicy, NodeId, ScanConfig, StorageTree};
use spacefindr_layout::{Rect, layout_children};
use spacefindr_ops::delete_entry;
use spacefindr_scan::{ScanEvent, ScanReport, ScanSession, Scanner};

const LOG_TARGETS: &[&str] = &[
    "spacefindr",
    "spacefindr_core",
    "spacefindr_scan",
    "spacefindr_layout",
    "spacefindr_ops",
];

#[derive(Parser)]
#[command(
    name = "spacefindr",
    version,
    about = "See where your disk space goes",
    long_about = "spacefindr scans a directory tree, rolls sizes up to every folder and \
                  lays folders out as a squarified treemap.\n\n\
                  Run `spacefindr [PATH]` for a size summary, or use subcommands."
)]
struct Cli {
    /// Path to analyze (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    #[command(flatten)]
    scan: ScanArgs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Options shared by every command that scans.
#[derive(Args, Clone)]
struct ScanArgs {
    /// Follow symbolic links and junctions instead of skipping them
    #[arg(long, global = true)]
    follow_links: bool,

    /// Which entries to leave out of the tree
    #[arg(long, value_enum, default_value = "standard", global = true)]
    policy: PolicyArg,

    /// Skip entries whose name matches this glob (repeatable)
    #[arg(long = "ignore", value_name = "GLOB", global = true)]
    ignore: Vec<String>,

    /// Minimum milliseconds between progress updates
    #[arg(long, value_name = "MS", global = true)]
    progress_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show a size summary
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Show all entries (no depth limit on display)
        #[arg(short, long)]
        all: bool,

        /// Number of top entries to show per directory
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Print the treemap rectangles of a folder
    Layout {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Folder to lay out, relative to PATH (defaults to PATH itself)
        #[arg(long)]
        folder: Option<PathBuf>,

        /// Viewport width
        #[arg(long, default_value = "120")]
        width: f64,

        /// Viewport height
        #[arg(long, default_value = "40")]
        height: f64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the largest files
    Largest {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of files to show
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete an entry and show the updated folder sizes
    Delete {
        /// Path to scan
        path: PathBuf,

        /// Entry to delete, relative to PATH
        target: PathBuf,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Standard,
    CloudPlaceholders,
}

impl From<PolicyArg> for FilterPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Standard => FilterPolicy::Standard,
            PolicyArg::CloudPlaceholders => FilterPolicy::CloudPlaceholders,
        }
    }
}

impl ScanArgs {
    fn scanner(&self) -> Result<Scanner> {
        let mut builder = ScanConfig::builder();
        builder
            .ignore_reparse_points(!self.follow_links)
            .filter_policy(FilterPolicy::from(self.policy))
            .ignore_patterns(self.ignore.clone());
        if let Some(ms) = self.progress_ms {
            builder.progress_interval_ms(ms);
        }
        let config = builder.build().context("Invalid scan options")?;
        Scanner::new(config).context("Invalid scan options")
    }
}

/// One rectangle of `layout` output.
#[derive(Serialize)]
struct LayoutEntry<'a> {
    name: &'a str,
    path: &'a Path,
    size: u64,
    is_folder: bool,
    rect: Rect,
}

/// One row of `largest` output.
#[derive(Serialize)]
struct FileEntry<'a> {
    path: &'a Path,
    size: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Some(Command::Scan {
            path,
            depth,
            all,
            top,
        }) => {
            run_scan(&path, &cli.scan, if all { None } else { Some(depth) }, top).await?;
        }
        Some(Command::Layout {
            path,
            folder,
            width,
            height,
            format,
        }) => {
            run_layout(&path, &cli.scan, folder.as_deref(), width, height, format).await?;
        }
        Some(Command::Largest { path, top, format }) => {
            run_largest(&path, &cli.scan, top, format).await?;
        }
        Some(Command::Delete { path, target, yes }) => {
            run_delete(&path, &cli.scan, &target, yes).await?;
        }
        None => {
            run_scan(&cli.path, &cli.scan, Some(3), 10).await?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` applies to everything but our own crates,
/// which follow `-v`.
fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    Ok(())
}

/// Scan in the background while drawing a progress line on stderr.
async fn scan_with_progress(path: &Path, options: &ScanArgs) -> Result<(StorageTree, ScanReport)> {
    let scanner = options.scanner()?;
    let mut session = ScanSession::new();

    eprintln!("Scanning {}...", path.display());
    let mut events = session.start(path.to_path_buf(), scanner);

    while let Some(event) = events.recv().await {
        match event {
            ScanEvent::Progress { progress, snapshot } => {
                eprint!(
                    "\r {} files, {} dirs, {} ({:.0} files/s) ",
                    progress.files_scanned,
                    progress.dirs_scanned,
                    format_size(snapshot.total_size()),
                    progress.files_per_second()
                );
            }
            ScanEvent::Complete(result) => {
                eprint!("\r{}\r", " ".repeat(60));
                let (tree, report) = result.context("Scan failed")?;
                for warning in &report.warnings {
                    tracing::info!(path = %warning.path.display(), "{}", warning.message);
                }
                return Ok((tree, report));
            }
        }
    }

    Err(eyre!("Scan stopped without a result"))
}

/// Run a scan and display summary.
async fn run_scan(
    path: &Path,
    options: &ScanArgs,
    max_depth: Option<u32>,
    top_n: usize,
) -> Result<()> {
    let (tree, report) = scan_with_progress(path, options).await?;
    let stats = tree.stats();

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        tree.get(tree.root()).full_path.display(),
        format_size(stats.total_size)
    );
    println!(
        " {} files, {} directories",
        stats.total_files, stats.total_folders
    );
    println!(
        " Scanned {} items in {:.2}s ({:.0} files/s)",
        report.progress.total_items(),
        report.progress.elapsed.as_secs_f64(),
        report.progress.files_per_second()
    );
    println!("{}", "─".repeat(60));
    println!();

    print_node(
        &tree,
        tree.root(),
        0,
        max_depth.unwrap_or(u32::MAX),
        top_n,
        stats.total_size,
    );

    if report.has_warnings() {
        println!();
        println!("{} warning(s) during scan", report.warnings.len());
    }

    Ok(())
}

/// Print the treemap of one folder.
async fn run_layout(
    path: &Path,
    options: &ScanArgs,
    folder: Option<&Path>,
    width: f64,
    height: f64,
    format: OutputFormat,
) -> Result<()> {
    if !(width > 0.0 && height > 0.0) {
        bail!("Viewport must have a positive width and height");
    }

    let (tree, _) = scan_with_progress(path, options).await?;
    let folder = match folder {
        Some(sub) => resolve_entry(&tree, sub)?,
        None => tree.root(),
    };
    let layout = layout_children(&tree, folder, Rect::new(0.0, 0.0, width, height));

    match format {
        OutputFormat::Text => {
            let node = tree.get(folder);
            println!(
                " {} - {} in {width}x{height}",
                node.full_path.display(),
                format_size(node.size)
            );
            println!();
            println!(
                " {:>8} {:>8} {:>8} {:>8}  {:>10}  Name",
                "x", "y", "width", "height", "Size"
            );
            for placed in &layout {
                let child = tree.get(placed.item);
                let marker = if child.is_folder { "/" } else { "" };
                println!(
                    " {:>8.2} {:>8.2} {:>8.2} {:>8.2}  {:>10}  {}",
                    placed.rect.x,
                    placed.rect.y,
                    placed.rect.width,
                    placed.rect.height,
                    format_size(child.size),
                    truncate(&format!("{}{}", child.name, marker), 40)
                );
            }
        }
        OutputFormat::Json => {
            let entries: Vec<LayoutEntry<'_>> = layout
                .iter()
                .map(|placed| {
                    let child = tree.get(placed.item);
                    LayoutEntry {
                        name: child.name.as_str(),
                        path: &child.full_path,
                        size: child.size,
                        is_folder: child.is_folder,
                        rect: placed.rect,
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

/// List the largest files.
async fn run_largest(
    path: &Path,
    options: &ScanArgs,
    top_n: usize,
    format: OutputFormat,
) -> Result<()> {
    let (tree, _) = scan_with_progress(path, options).await?;
    let largest = tree.largest_files(top_n);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Largest Files");
            println!("{}", "─".repeat(70));
            println!();
            for (rank, &id) in largest.iter().enumerate() {
                let node = tree.get(id);
                println!(
                    " {:>3}. {:>10}  {}",
                    rank + 1,
                    format_size(node.size),
                    node.full_path.display()
                );
            }
        }
        OutputFormat::Json => {
            let entries: Vec<FileEntry<'_>> = largest
                .iter()
                .map(|&id| {
                    let node = tree.get(id);
                    FileEntry {
                        path: &node.full_path,
                        size: node.size,
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

/// Delete an entry and print the sizes of the folders above it.
async fn run_delete(path: &Path, options: &ScanArgs, target: &Path, confirmed: bool) -> Result<()> {
    let (mut tree, _) = scan_with_progress(path, options).await?;
    let node = resolve_entry(&tree, target)?;
    let full_path = tree.get(node).full_path.clone();

    if !confirmed {
        bail!(
            "Refusing to delete {} ({}) without --yes",
            full_path.display(),
            format_size(tree.get(node).size)
        );
    }

    let parent = tree.parent(node);
    let freed = delete_entry(&mut tree, node)
        .with_context(|| format!("Could not delete {}", full_path.display()))?;

    println!("Deleted {} ({})", full_path.display(), format_size(freed));
    if let Some(parent) = parent {
        println!();
        for id in tree.breadcrumbs(parent) {
            let folder = tree.get(id);
            println!(
                " {:>10}  {}",
                format_size(folder.size),
                folder.full_path.display()
            );
        }
    }

    Ok(())
}

/// Find the node for a path given relative to the scan root, or absolute.
fn resolve_entry(tree: &StorageTree, target: &Path) -> Result<NodeId> {
    let candidate = tree.get(tree.root()).full_path.join(target);
    let candidate = dunce::canonicalize(&candidate)
        .with_context(|| format!("Invalid path {}", candidate.display()))?;
    tree.find_by_path(&candidate)
        .ok_or_else(|| eyre!("{} is not part of the scanned tree", candidate.display()))
}

/// Print a node and its largest children.
fn print_node(
    tree: &StorageTree,
    id: NodeId,
    depth: u32,
    max_depth: u32,
    top_n: usize,
    root_size: u64,
) {
    let node = tree.get(id);
    let indent = "  ".repeat(depth as usize);
    let ratio = if root_size > 0 {
        node.size as f64 / root_size as f64 * 100.0
    } else {
        0.0
    };

    let bar = make_bar(ratio / 100.0, 10);

    let name = if depth == 0 {
        node.full_path.display().to_string()
    } else {
        node.name.to_string()
    };

    let dir_marker = if node.is_folder { "/" } else { "" };

    println!(
        "{}{}{:<40} {:>10} {:>5.1}% {}",
        indent,
        if node.is_folder { "▼ " } else { "  " },
        truncate(&format!("{}{}", name, dir_marker), 40),
        format_size(node.size),
        ratio,
        bar
    );

    if node.is_folder && depth < max_depth {
        let mut children = tree.children(id).to_vec();
        children.sort_by_key(|&child| Reverse(tree.get(child).size));
        let remaining = children.len().saturating_sub(top_n);

        for &child in children.iter().take(top_n) {
            print_node(tree, child, depth + 1, max_depth, top_n, root_size);
        }

        if remaining > 0 {
            let indent = "  ".repeat((depth + 1) as usize);
            println!("{}  ... and {} more", indent, remaining);
        }
    }
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_shared_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "spacefindr",
            "-vv",
            "layout",
            "/tmp",
            "--policy",
            "cloud-placeholders",
            "--ignore",
            "*.tmp",
            "--ignore",
            "node_modules",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.scan.policy, PolicyArg::CloudPlaceholders));
        assert_eq!(cli.scan.ignore, ["*.tmp", "node_modules"]);
        assert!(matches!(
            cli.command,
            Some(Command::Layout {
                format: OutputFormat::Json,
                ..
            })
        ));
    }

    #[test]
    fn test_scan_args_build_config() {
        let cli = Cli::try_parse_from(["spacefindr", "--follow-links", "--progress-ms", "50"]).unwrap();
        let scanner = cli.scan.scanner().unwrap();
        assert!(!scanner.config().ignore_reparse_points);
        assert_eq!(scanner.config().progress_interval_ms, 50);
    }

    #[test]
    fn test_bad_glob_rejected() {
        let cli = Cli::try_parse_from(["spacefindr", "--ignore", "a["]).unwrap();
        assert!(cli.scan.scanner().is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_make_bar() {
        assert_eq!(make_bar(0.5, 4), "[██░░]");
        assert_eq!(make_bar(0.0, 2), "[░░]");
    }
}
