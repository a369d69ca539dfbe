//! `scenegraph trim`: shrink raw records to the fields the pipeline reads.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::pipeline::create_output;

pub const TRIM_FAILED: &str = "trim_failed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimmedRecord {
    pub image: Value,
    pub ocr_text: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<TrimmedGenerated>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimmedGenerated {
    pub scene_description: Value,
    pub match_context: Value,
    pub messages: Vec<TrimmedMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimmedMessage {
    pub speaker: Value,
    pub text: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimFailure {
    pub error: &'static str,
    pub line: usize,
    pub reason: String,
}

fn field(obj: &serde_json::Map<String, Value>, key: &str) -> Value {
    obj.get(key).cloned().unwrap_or(Value::Null)
}

/// Keep `image`, `ocr_text` and the chat-relevant part of `generated`.
///
/// A non-object `generated` drops the key entirely; a missing one yields
/// empty fields. Non-object chat lines are skipped, so a string or object
/// `messages` trims to `[]`; a scalar `messages` is an error. `target`
/// survives only when present and non-null.
pub fn trim_record(record: &Value) -> Result<TrimmedRecord, String> {
    let obj = record
        .as_object()
        .ok_or_else(|| "record is not a JSON object".to_string())?;

    let mut out = TrimmedRecord {
        image: field(obj, "image"),
        ocr_text: field(obj, "ocr_text"),
        generated: None,
    };

    let empty = serde_json::Map::new();
    let generated = match obj.get("generated") {
        None => &empty,
        Some(Value::Object(gen)) => gen,
        Some(_) => return Ok(out),
    };

    let lines: &[Value] = match generated.get("messages") {
        Some(Value::Array(lines)) => lines,
        None | Some(Value::String(_)) | Some(Value::Object(_)) => &[],
        Some(other) => {
            return Err(format!(
                "generated.messages is not iterable: {}",
                json_kind(other)
            ))
        }
    };

    let messages = lines
        .iter()
        .filter_map(Value::as_object)
        .map(|msg| TrimmedMessage {
            speaker: field(msg, "speaker"),
            text: field(msg, "text"),
            target: msg.get("target").filter(|t| !t.is_null()).cloned(),
        })
        .collect();

    out.generated = Some(TrimmedGenerated {
        scene_description: field(generated, "scene_description"),
        match_context: field(generated, "match_context"),
        messages,
    });
    Ok(out)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimStats {
    pub written: usize,
    pub failed: usize,
}

/// Trim every non-blank line; bad lines become `trim_failed` rows.
pub fn trim_lines<R: BufRead, W: Write>(input: R, mut out: W) -> Result<TrimStats> {
    let mut stats = TrimStats::default();
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let trimmed = serde_json::from_str::<Value>(line)
            .map_err(|e| e.to_string())
            .and_then(|record| trim_record(&record));
        let encoded = match trimmed {
            Ok(record) => {
                stats.written += 1;
                serde_json::to_string(&record)?
            }
            Err(reason) => {
                tracing::debug!(line = line_no, %reason, "trim failed");
                stats.failed += 1;
                serde_json::to_string(&TrimFailure {
                    error: TRIM_FAILED,
                    line: line_no,
                    reason,
                })?
            }
        };
        writeln!(out, "{encoded}")?;
    }
    out.flush()?;
    Ok(stats)
}

pub fn run_trim(input: &Path, out: &Path) -> Result<TrimStats> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?,
    );
    let stats = trim_lines(reader, create_output(out)?)?;
    if stats.failed > 0 {
        tracing::warn!(failed = stats.failed, "some lines could not be trimmed");
    }
    println!("Trimmed file written to: {}", out.display());
    Ok(stats)
}
