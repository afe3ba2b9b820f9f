use anyhow::{Context, Result};
use clap::Parser;
use policy_sheet::{Config, Criteria};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "policy-sheet",
    about = "Extract access-control policies from a spreadsheet permission matrix"
)]
struct Cli {
    /// Workbook to read (.xlsx, .xlsm, .xlam or .ods)
    file: String,

    /// Existing directory that receives one sub-directory per sheet
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Configuration file; defaults to config.json beside the executable
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only read sheets whose name matches this glob (repeatable)
    #[arg(long = "sheet")]
    sheets: Vec<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "policy_sheet=debug" } else { "policy_sheet=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let criteria = Criteria::with_sheet_patterns(cli.sheets.as_slice()).context("invalid --sheet pattern")?;

    let report = policy_sheet::parse(&cli.file, &cli.out, &config, &criteria)
        .with_context(|| format!("cannot parse {}", cli.file))?;

    if report.has_warnings() {
        println!("Parsed with warnings:");
        for line in report.warnings_html().split("<br>").filter(|line| !line.is_empty()) {
            println!("{}", strip_tags(line));
        }
    } else {
        println!("Successfully parsed and saved");
    }
    tracing::info!(policies = report.policy_count(), sheets = report.sheets.len(), "done");
    Ok(())
}

/// Drops `<b>`-style tags, keeping the text between them.
fn strip_tags(line: &str) -> String {
    let mut text = String::with_capacity(line.len());
    let mut in_tag = false;
    for character in line.chars() {
        match character {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(character),
            _ => (),
        }
    }
    text
}
