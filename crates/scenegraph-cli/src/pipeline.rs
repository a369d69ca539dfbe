//! Batch orchestration: records in, one outcome line per record out.
//!
//! Strictly sequential. Each non-blank input line is read, sent to the
//! backend, classified and written before the next line is read. The only
//! errors that escape a record are a malformed input line and a failed
//! backend call; both abort the batch. Parse and schema failures are
//! ordinary outcomes.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use scenegraph_llm::{graph_request, GraphGenerator, ScenePayload};
use scenegraph_schema::{
    parse_response, Graph, GraphSummary, Outcome, ParseMode, Verdict, GRAPH_JSON_PARSE_FAILED,
    PROMPT_ONLY_RELATIONS,
};

const PROGRESS_EVERY: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct GraphsOptions {
    pub max_tokens: u32,
    pub parse_mode: ParseMode,
}

impl Default for GraphsOptions {
    fn default() -> Self {
        Self {
            max_tokens: scenegraph_llm::DEFAULT_MAX_TOKENS,
            parse_mode: ParseMode::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: u64,
    pub ok: u64,
    pub bad: u64,
    pub parse_failed: u64,
    pub schema_invalid: u64,
}

/// Non-blank lines of `input`, each parsed as a JSON record.
///
/// Yields `(line_no, record)` with 1-based line numbers. A line that is not
/// valid JSON, or is JSON but not an object, is an error naming `source` and
/// the line.
pub fn read_records<'a, R: BufRead + 'a>(
    input: R,
    source: &'a str,
) -> impl Iterator<Item = Result<(usize, Value)>> + 'a {
    input
        .lines()
        .enumerate()
        .filter_map(move |(idx, line)| {
            let line_no = idx + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(anyhow::Error::new(e)
                        .context(format!("failed to read {source}:{line_no}"))))
                }
            };
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let record = match serde_json::from_str::<Value>(line) {
                Ok(record) => record,
                Err(e) => {
                    return Some(Err(anyhow::Error::new(e)
                        .context(format!("invalid JSON record at {source}:{line_no}"))))
                }
            };
            if !record.is_object() {
                return Some(Err(anyhow!(
                    "input record at {source}:{line_no} is not a JSON object"
                )));
            }
            Some(Ok((line_no, record)))
        })
}

/// Owns the output stream and the running counters.
pub struct OutcomeWriter<W: Write> {
    out: W,
    stats: BatchStats,
    progress: bool,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stats: BatchStats::default(),
            progress: true,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn record(&mut self, outcome: &Outcome) -> Result<()> {
        let line = outcome.to_line().context("failed to serialize outcome")?;
        writeln!(self.out, "{line}").context("failed to write outcome")?;

        self.stats.total += 1;
        match outcome.error() {
            None => self.stats.ok += 1,
            Some(kind) => {
                self.stats.bad += 1;
                if kind == GRAPH_JSON_PARSE_FAILED {
                    self.stats.parse_failed += 1;
                } else {
                    self.stats.schema_invalid += 1;
                }
            }
        }

        if self.progress && self.stats.total % PROGRESS_EVERY == 0 {
            println!(
                "Processed {} | ok={} bad={}",
                self.stats.total, self.stats.ok, self.stats.bad
            );
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<(BatchStats, W)> {
        self.out.flush().context("failed to flush output")?;
        Ok((self.stats, self.out))
    }
}

/// Generate, classify and write an outcome for every record in `input`.
pub fn run_batch<R: BufRead, W: Write>(
    generator: &dyn GraphGenerator,
    input: R,
    source: &str,
    writer: &mut OutcomeWriter<W>,
    opts: GraphsOptions,
) -> Result<()> {
    for item in read_records(input, source) {
        let (line_no, record) = item?;
        let image = record.get("image").cloned().unwrap_or(Value::Null);

        let payload = ScenePayload::from_record(&record);
        let messages = graph_request(&payload).context("failed to encode request payload")?;
        let raw = generator
            .generate(&messages, opts.max_tokens)
            .with_context(|| format!("{} failed on {source}:{line_no}", generator.describe()))?;

        let outcome = Outcome::classify(image, &raw, opts.parse_mode);
        if let Outcome::SchemaInvalid { image, reason, .. } = &outcome {
            tracing::debug!(%image, line = line_no, %reason, "graph rejected");
        } else if !outcome.is_accepted() {
            tracing::debug!(image = %outcome.image(), line = line_no, "graph did not parse");
        }
        writer.record(&outcome)?;
    }
    Ok(())
}

pub fn run_graphs(
    generator: &dyn GraphGenerator,
    input: &Path,
    out: &Path,
    opts: GraphsOptions,
) -> Result<BatchStats> {
    let source = input.display().to_string();
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("failed to open {source}"))?,
    );
    let mut writer = OutcomeWriter::new(create_output(out)?);

    tracing::info!(backend = %generator.describe(), input = %source, "generating graphs");
    tracing::warn!(
        relations = ?PROMPT_ONLY_RELATIONS,
        "prompt advertises relations the validator rejects; such graphs are marked invalid"
    );

    run_batch(generator, reader, &source, &mut writer, opts)?;
    let (stats, _) = writer.finish()?;
    print_summary(&stats, out);
    Ok(stats)
}

/// Re-run parsing and validation over an existing outcome file.
pub fn run_revalidate(input: &Path, out: &Path, mode: ParseMode) -> Result<BatchStats> {
    let source = input.display().to_string();
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("failed to open {source}"))?,
    );
    let mut writer = OutcomeWriter::new(create_output(out)?);

    for item in read_records(reader, &source) {
        let (line_no, record) = item?;
        let previous: Outcome = serde_json::from_value(record)
            .with_context(|| format!("not an outcome record at {source}:{line_no}"))?;
        let was_accepted = previous.is_accepted();
        let outcome = previous.reclassify(mode);
        if was_accepted != outcome.is_accepted() {
            tracing::info!(
                image = %outcome.image(),
                line = line_no,
                accepted = outcome.is_accepted(),
                "classification changed"
            );
        }
        writer.record(&outcome)?;
    }

    let (stats, _) = writer.finish()?;
    print_summary(&stats, out);
    Ok(stats)
}

/// Verdict for a single response text (`scenegraph check`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub parsed: bool,
    pub valid: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<GraphSummary>,
}

pub fn check_response(raw: &str, mode: ParseMode) -> CheckReport {
    let Some(doc) = parse_response(raw, mode) else {
        return CheckReport {
            parsed: false,
            valid: false,
            reason: GRAPH_JSON_PARSE_FAILED.to_string(),
            summary: None,
        };
    };
    let verdict = Verdict::of(&doc);
    let summary = if verdict.valid {
        Graph::from_document(&doc).ok().map(|g| g.summary())
    } else {
        None
    };
    CheckReport {
        parsed: true,
        valid: verdict.valid,
        reason: verdict.reason,
        summary,
    }
}

pub fn create_output(out: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    Ok(BufWriter::new(file))
}

fn print_summary(stats: &BatchStats, out: &Path) {
    tracing::debug!(
        parse_failed = stats.parse_failed,
        schema_invalid = stats.schema_invalid,
        "rejection breakdown"
    );
    println!(
        "{} total={} ok={} bad={}",
        "Done.".green().bold(),
        stats.total,
        stats.ok,
        stats.bad
    );
    println!("Wrote: {}", out.display());
}
