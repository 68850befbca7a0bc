//! Recovery parser: strict decode first, then the repair chain.

use contentagent_shared::{ContentAgentError, DecodeDiagnostics, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::repair::RepairPass;

/// Characters of context kept on each side of a decode error.
const CONTEXT_RADIUS: usize = 50;

/// Which repairs it took to decode a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// The pass after which decoding first succeeded; `None` if the text was valid as-is.
    pub recovered_by: Option<RepairPass>,
    /// Passes that changed the text, in application order.
    pub changed: Vec<RepairPass>,
    /// Number of decode attempts made, including the initial strict one.
    pub attempts: usize,
}

/// A decoded payload plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Recovered {
    pub value: Value,
    pub report: RepairReport,
}

/// Decode `text`, applying [`RepairPass::ORDER`] cumulatively on failure.
///
/// Decode is retried once after each pass that changed the text and the
/// chain stops at the first success. `raw_len` is the length of the original
/// backend response, carried into the diagnostics when every pass fails.
#[instrument(skip_all, fields(len = text.len()))]
pub fn recover(text: &str, raw_len: usize) -> Result<Recovered> {
    let mut report = RepairReport {
        attempts: 1,
        ..Default::default()
    };

    let mut last_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(Recovered { value, report }),
        Err(e) => e,
    };
    debug!(error = %last_err, "strict decode failed, starting repair chain");

    let mut current = text.to_string();

    for pass in RepairPass::ORDER {
        let repaired = pass.apply(&current);
        if repaired == current {
            debug!(%pass, "repair pass made no changes");
            continue;
        }

        report.changed.push(pass);
        report.attempts += 1;
        current = repaired;

        match serde_json::from_str::<Value>(&current) {
            Ok(value) => {
                report.recovered_by = Some(pass);
                debug!(%pass, attempts = report.attempts, "payload recovered");
                return Ok(Recovered { value, report });
            }
            Err(e) => {
                debug!(%pass, error = %e, "decode still failing after repair");
                last_err = e;
            }
        }
    }

    let diagnostics = diagnose(&current, &last_err, raw_len);
    warn!(
        line = diagnostics.line,
        column = diagnostics.column,
        raw_len,
        "repair chain exhausted"
    );

    Err(ContentAgentError::UnrecoverableDecode(Box::new(diagnostics)))
}

/// Build diagnostics for the final failed attempt on `text`.
fn diagnose(text: &str, err: &serde_json::Error, raw_len: usize) -> DecodeDiagnostics {
    let offset = byte_offset(text, err.line(), err.column());

    DecodeDiagnostics {
        message: err.to_string(),
        line: err.line(),
        column: err.column(),
        offset,
        context: context_window(text, offset, CONTEXT_RADIUS),
        raw_len,
    }
}

/// Convert a 1-based line/column pair into a byte offset clamped to `text`.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();

    let mut offset = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Up to `radius` characters either side of the byte `offset`.
fn context_window(text: &str, offset: usize, radius: usize) -> String {
    let center = text[..offset].chars().count();
    let start = center.saturating_sub(radius);
    text.chars().skip(start).take(center - start + radius).collect()
}
