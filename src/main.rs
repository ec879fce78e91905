//! cwc - gather source files into a context for a language model.
//!
//! Usage:
//!   cwc                                  Gather everything under the current directory
//!   cwc -i '.*\.go$' -x 'vendor/'        Only Go files, skipping vendored code
//!   cwc -i 'main.go' -p ./cmd            Only main.go files below ./cmd
//!   cwc --tree-only                      Show what would be selected
//!   cwc --help                           Show help

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use cwc_scan::{
    File, FileGatherOptions, FileGatherer, GatherConfig, Gathered, build_context,
    generate_file_tree, warn_large_files,
};

#[derive(Parser)]
#[command(
    name = "cwc",
    version,
    about = "Gather files into a context for chatting about your code",
    long_about = "cwc selects files with regular expressions, honors .gitignore and skips \
                  the .git directory, then prints the resulting file tree and a context \
                  document containing every selected file.\n\n\
                  Example: including all '.go' files while excluding the 'vendor/' directory:\n\
                  > cwc --include='.*.go$' --exclude='vendor/'"
)]
struct Cli {
    /// Regex pattern for files to include, e.g. '\.md$'
    #[arg(short, long, default_value = ".*")]
    include: String,

    /// Regex pattern for files to exclude, e.g. '_test\.go$'
    #[arg(short = 'x', long)]
    exclude: Option<String>,

    /// Paths to search for files, e.g. --paths cmd,pkg
    #[arg(short, long, value_delimiter = ',', default_value = ".")]
    paths: Vec<PathBuf>,

    /// Exclude files ignored by .gitignore
    #[arg(short = 'e', long, default_value_t = true, action = ArgAction::Set)]
    exclude_from_gitignore: bool,

    /// Exclude the .git directory
    #[arg(short = 'g', long, default_value_t = true, action = ArgAction::Set)]
    exclude_git_dir: bool,

    /// Warn about files larger than this many bytes
    #[arg(long, default_value_t = 100_000)]
    large_file_threshold: u64,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only print the file tree
    #[arg(long)]
    tree_only: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = GatherConfig::builder()
        .include(cli.include)
        .exclude(cli.exclude)
        .paths(cli.paths)
        .exclude_from_gitignore(cli.exclude_from_gitignore)
        .exclude_git_dir(cli.exclude_git_dir)
        .large_file_threshold(cli.large_file_threshold)
        .build()
        .wrap_err("Invalid arguments")?;

    let gathered = run_gather(&config)?;
    let tree = generate_file_tree(&gathered.root);

    if gathered.files.is_empty() {
        eprintln!("No files found matching the given criteria.");
        return Ok(());
    }

    eprintln!("The following files will be used as context:\n");
    eprint!("{tree}");
    eprintln!();
    warn_large_files(&gathered.files, config.large_file_threshold);

    if cli.tree_only {
        return Ok(());
    }

    let rendered = match cli.format {
        OutputFormat::Text => build_context(&tree, &gathered.files),
        OutputFormat::Json => render_json(&tree, &gathered.files)?,
    };

    match cli.output {
        Some(output_path) => {
            std::fs::write(&output_path, rendered)
                .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!(
                "Wrote {} files ({}) to {}",
                gathered.files.len(),
                format_size(gathered.files.iter().map(|f| f.size()).sum()),
                output_path.display()
            );
        }
        None => {
            print!("{rendered}");
        }
    }

    Ok(())
}

/// Build matchers from the config and walk every scope.
fn run_gather(config: &GatherConfig) -> Result<Gathered> {
    let options = FileGatherOptions::from_config(config).wrap_err("Error creating matchers")?;
    FileGatherer::new()
        .gather(&options)
        .wrap_err("Error gathering files")
}

/// Tree plus per-file summary as pretty JSON.
fn render_json(tree: &str, files: &[File]) -> Result<String> {
    let files: Vec<_> = files
        .iter()
        .map(|file| {
            serde_json::json!({
                "path": file.path,
                "type": file.file_type,
                "size": file.size(),
            })
        })
        .collect();

    let report = serde_json::json!({
        "tree": tree,
        "files": files,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::DECIMAL)
}
