//! Scenegraph CLI
//!
//! Turns screenshot-analysis records into validated interaction graphs:
//! - `graphs`: ask a backend for one graph per record and classify the reply
//! - `check`: parse and validate a single response text
//! - `revalidate`: re-run classification over an existing outcome file
//! - `trim`: shrink raw records to the fields the pipeline reads

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use scenegraph_schema::ParseMode;

mod backend;
mod pipeline;
mod trim;

use backend::BackendArgs;
use pipeline::GraphsOptions;

#[derive(Parser)]
#[command(name = "scenegraph")]
#[command(
    author,
    version,
    about = "Scenegraph: interaction graphs from game-screenshot chat records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one graph per input record and write one outcome line each.
    ///
    /// Accepted graphs are written as `{image, graph}`; rejected ones carry
    /// `error` plus the raw text or document. The batch aborts on malformed
    /// input or a backend failure.
    Graphs {
        /// Input JSONL (one record per line; blank lines skipped).
        #[arg(long)]
        input: PathBuf,
        /// Output JSONL (truncated; parent directories created).
        #[arg(long)]
        out: PathBuf,
        /// Output budget per graph.
        #[arg(long, default_value_t = scenegraph_llm::DEFAULT_MAX_TOKENS)]
        max_tokens: u32,
        /// Accept the first `{...}` object embedded in prose or code fences.
        #[arg(long)]
        lenient_json: bool,
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Parse and validate a single response text (`-` reads stdin).
    Check {
        input: PathBuf,
        #[arg(long)]
        lenient_json: bool,
    },

    /// Re-classify an existing outcome file without calling a backend.
    Revalidate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        lenient_json: bool,
    },

    /// Keep only `image`, `ocr_text` and the chat part of `generated`.
    Trim {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn parse_mode(lenient: bool) -> ParseMode {
    if lenient {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Graphs {
            input,
            out,
            max_tokens,
            lenient_json,
            backend,
        } => {
            let generator = backend.build()?;
            println!(
                "{} {} via {}",
                "Generating graphs".green().bold(),
                input.display(),
                generator.describe()
            );
            let opts = GraphsOptions {
                max_tokens,
                parse_mode: parse_mode(lenient_json),
            };
            pipeline::run_graphs(generator.as_ref(), &input, &out, opts)?;
        }
        Commands::Check {
            input,
            lenient_json,
        } => cmd_check(&input, parse_mode(lenient_json))?,
        Commands::Revalidate {
            input,
            out,
            lenient_json,
        } => {
            pipeline::run_revalidate(&input, &out, parse_mode(lenient_json))?;
        }
        Commands::Trim { input, out } => {
            trim::run_trim(&input, &out)?;
        }
    }
    Ok(())
}

fn cmd_check(input: &PathBuf, mode: ParseMode) -> Result<()> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?
    };

    let report = pipeline::check_response(&raw, mode);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
