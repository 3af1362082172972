//! build-dashboard-template - writes the Master Automation workbook template

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dashboard_template::config::DEFAULT_OUTPUT;
use dashboard_template::inspect::{verify_contract, TemplateReader};
use dashboard_template::logging::init_logging;
use dashboard_template::{generate, TemplateConfig};

#[derive(Parser)]
#[command(name = "build-dashboard-template")]
#[command(
    author,
    version,
    about = "Generate the Master Automation dashboard workbook template"
)]
struct Cli {
    /// Destination file (overwritten if it exists)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Verify an existing workbook against the header contract instead of generating
    #[arg(long, value_name = "PATH", conflicts_with = "output")]
    check: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.check {
        Some(path) => check(&path),
        None => build(cli.output),
    }
}

fn build(output: PathBuf) -> Result<()> {
    let config = TemplateConfig::builder()
        .with_output(&output)
        .build()
        .context("invalid configuration")?;
    let written = generate(config)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("✅ Wrote: {}", written.display());
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let reader = TemplateReader::open(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    verify_contract(&reader).with_context(|| format!("{} does not match", path.display()))?;
    println!("✅ Contract OK: {}", path.display());
    Ok(())
}
