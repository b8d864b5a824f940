//! odt-merge - Fill OpenDocument text templates from JSON data

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use odt_template::{Document, MergeData, TemplateConfig};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "odt-merge")]
#[command(version, about = "Fill OpenDocument text templates", long_about = None)]
#[command(after_help = "EXAMPLES:
    odt-merge letter.odt -d data.json -o out.odt       Merge JSON data
    odt-merge letter.odt -s name=Alice -o out.odt      Bind a single variable
    odt-merge letter.odt --left '${' -d data.json -o out.odt")]
struct Cli {
    /// Template file (.odt)
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// JSON file with variables, images and segment rows
    #[arg(short, long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Bind a document variable, may be repeated
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Where to write the merged document
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Left variable delimiter
    #[arg(long, value_name = "TEXT")]
    left: Option<String>,

    /// Right variable delimiter
    #[arg(long, value_name = "TEXT")]
    right: Option<String>,

    /// Directory for the working copy
    #[arg(long, value_name = "DIR")]
    tmp_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    let mut data = match &cli.data {
        Some(path) => MergeData::load(path)
            .with_context(|| format!("failed to read merge data from {}", path.display()))?,
        None => MergeData::default(),
    };
    for assignment in &cli.set {
        let (key, value) = parse_assignment(assignment)?;
        data.variables.insert(key.to_string(), Value::String(value.to_string()));
    }

    let mut doc = Document::open_with_config(&cli.template, config)
        .with_context(|| format!("failed to open {}", cli.template.display()))?;
    data.apply(&mut doc).context("merge failed")?;
    doc.save_to_disk(Some(&cli.output))
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    tracing::info!("Wrote {}", cli.output.display());
    Ok(())
}

/// Configuration file first, then command line overrides
fn load_config(cli: &Cli) -> anyhow::Result<TemplateConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => TemplateConfig::default(),
    };
    if let Some(left) = &cli.left {
        config.delimiter_left = left.clone();
    }
    if let Some(right) = &cli.right {
        config.delimiter_right = right.clone();
    }
    if let Some(dir) = &cli.tmp_dir {
        config.tmp_dir = Some(dir.clone());
    }
    Ok(config)
}

fn load_config_file(path: &Path) -> anyhow::Result<TemplateConfig> {
    if !path.exists() {
        bail!("config file {} does not exist", path.display());
    }
    TemplateConfig::load(path).with_context(|| format!("failed to read config {}", path.display()))
}

/// Split `KEY=VALUE`; the value may itself contain `=`
fn parse_assignment(assignment: &str) -> anyhow::Result<(&str, &str)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("expected KEY=VALUE, got '{}'", assignment),
    }
}
