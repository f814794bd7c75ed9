use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use exif_typed::{Directory, Tag, Value, config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exif-typed",
    version,
    about = "Read and edit EXIF tags of JPEG files as typed values"
)]
struct Cli {
    /// JPEG files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: exif-typed.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config file and exit
    #[arg(long)]
    init: bool,

    /// Validate edits without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Display all catalogued EXIF tags and exit
    #[arg(long = "show-exif")]
    show_exif: bool,

    /// Display one tag (repeatable)
    #[arg(long = "get", value_name = "TAG")]
    get: Vec<String>,

    /// Set a text tag, e.g. --set Artist="Jane Doe" (repeatable)
    #[arg(long = "set", value_name = "TAG=VALUE")]
    set: Vec<String>,

    /// List the tag catalogue and exit
    #[arg(long = "list-tags")]
    list_tags: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    // Handle --list-tags
    if cli.list_tags {
        print_catalogue(cli.json)?;
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;

    // Override output flags from CLI
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.json {
        config.output.json = true;
    }

    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No JPEG files found in the specified paths.");
    }

    // Handle --show-exif / --get
    if cli.show_exif || (!cli.get.is_empty() && cli.set.is_empty()) {
        let tags = cli
            .get
            .iter()
            .map(|name| name.parse::<Tag>())
            .collect::<Result<Vec<_>, _>>()?;
        let mut reports = Vec::new();
        for image_path in &images {
            match pipeline::show(image_path, &tags, &config) {
                Ok(report) if config.output.json => reports.push(report),
                Ok(report) => print_report(&report),
                Err(e) => log::error!("Failed to read {}: {e:#}", image_path.display()),
            }
        }
        if config.output.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        return Ok(());
    }

    if cli.set.is_empty() {
        anyhow::bail!("Nothing to do: use --show-exif, --get TAG or --set TAG=VALUE.");
    }

    let edits = cli
        .set
        .iter()
        .map(|text| pipeline::parse_assignment(text))
        .collect::<Result<Vec<_>>>()?;

    log::info!("Found {} image(s) to edit", images.len());
    if config.output.dry_run {
        log::info!("DRY RUN: no files will be modified");
    }

    let mut results = Vec::new();
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::info!("[{}/{}] Editing: {}", i + 1, total, image_path.display());

        let result = pipeline::apply_edits(image_path, &edits, &config);
        match &result.error {
            Some(err) => log::error!("  Error: {err}"),
            None => {
                let names: Vec<&str> = result.applied.iter().map(|t| t.name()).collect();
                log::info!("  Wrote: {}", names.join(", "));
            }
        }
        results.push(result);
    }

    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    // Summary
    let success = results.iter().filter(|r| r.error.is_none()).count();
    let failed = results.len() - success;
    log::info!("Done: {success} succeeded, {failed} failed out of {total} images");

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Width of the value column.
const VAL_WIDTH: usize = 46;
/// Longest value rendered in full; longer ones are summarised.
const MAX_SHOWN: usize = 240;
const INDENT: &str = "                           ";

fn print_catalogue(json: bool) -> Result<()> {
    if json {
        let rows: Vec<serde_json::Value> = Tag::all()
            .iter()
            .map(|tag| {
                serde_json::json!({
                    "name": tag.name(),
                    "id": tag.id().to_string(),
                    "shape": tag.shape().name(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for tag in Tag::all() {
        println!("  {:<28} {:<18} {}", tag.name(), tag.id().to_string(), tag.shape());
    }
    Ok(())
}

fn print_report(report: &pipeline::ImageReport) {
    println!();
    println!("{BOLD}File:{RESET} {}", report.path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if report.tags.is_empty() {
        println!("  {DIM}(no EXIF metadata found){RESET}");
        println!();
        return;
    }

    for directory in [Directory::Primary, Directory::Exif, Directory::Interop] {
        let rows: Vec<(&Tag, &Value)> = report
            .tags
            .iter()
            .filter(|(tag, _)| tag.id().directory == directory)
            .collect();
        if rows.is_empty() {
            continue;
        }
        println!("  {BOLD}{directory}{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for (tag, value) in rows {
            print_row(tag.name(), &render(value));
        }
        println!();
    }
}

fn render(value: &Value) -> String {
    let text = value.to_string();
    if text.len() <= MAX_SHOWN {
        return text;
    }
    match value {
        Value::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        _ => {
            let cut = (0..=MAX_SHOWN).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
            format!("{}…", &text[..cut])
        }
    }
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
