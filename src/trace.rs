//! JSON-lines trace reader (spec.md §6). A thin external collaborator: one
//! event object per non-empty line, UTF-8. Malformed JSON or a known event
//! kind missing a required field fails fast with the 1-based line number;
//! an unrecognized `event` discriminator is a no-op, not an error.

use std::io::BufRead;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SimError};
use crate::model::Forecast;

/// One parsed line of the trace.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Alloc { id: String, size: u64 },
    Free { id: String },
    Touch { id: String, forecast: Option<Forecast> },
    SafeWindow,
    /// Discriminator present but not one spec.md §6 names. Treated as a
    /// no-op by the driver.
    Unknown,
}

#[derive(Deserialize)]
struct AllocFields {
    id: String,
    size: i64,
}

#[derive(Deserialize)]
struct FreeFields {
    id: String,
}

#[derive(Deserialize)]
struct TouchFields {
    id: String,
    #[serde(default)]
    mu: Option<f64>,
    #[serde(default)]
    sigma: Option<f64>,
}

/// Parse a single trace line (already stripped of surrounding whitespace,
/// guaranteed non-empty) into a [`TraceEvent`].
fn parse_line(line: &str, line_no: usize) -> Result<TraceEvent> {
    let value: Value = serde_json::from_str(line).map_err(|e| SimError::TraceParse {
        line: line_no,
        message: format!("invalid JSON: {e}"),
    })?;

    let kind = value.get("event").and_then(Value::as_str).ok_or_else(|| SimError::TraceParse {
        line: line_no,
        message: "missing required field `event`".to_string(),
    })?;

    match kind {
        "alloc" => {
            let fields: AllocFields =
                serde_json::from_value(value).map_err(|e| SimError::TraceParse {
                    line: line_no,
                    message: format!("malformed alloc event: {e}"),
                })?;
            if fields.size < 1 {
                return Err(SimError::TraceParse {
                    line: line_no,
                    message: format!("alloc size must be >= 1, got {}", fields.size),
                });
            }
            Ok(TraceEvent::Alloc {
                id: fields.id,
                size: fields.size as u64,
            })
        }
        "free" => {
            let fields: FreeFields =
                serde_json::from_value(value).map_err(|e| SimError::TraceParse {
                    line: line_no,
                    message: format!("malformed free event: {e}"),
                })?;
            Ok(TraceEvent::Free { id: fields.id })
        }
        "touch" => {
            let fields: TouchFields =
                serde_json::from_value(value).map_err(|e| SimError::TraceParse {
                    line: line_no,
                    message: format!("malformed touch event: {e}"),
                })?;
            let forecast = match (fields.mu, fields.sigma) {
                (Some(mu), Some(sigma)) => Some(Forecast::new(mu, sigma)),
                _ => None,
            };
            Ok(TraceEvent::Touch {
                id: fields.id,
                forecast,
            })
        }
        "safe_window" => Ok(TraceEvent::SafeWindow),
        _ => Ok(TraceEvent::Unknown),
    }
}

/// Read every non-empty line of `reader` as a [`TraceEvent`], in order.
pub fn read_trace<R: BufRead>(reader: R) -> Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| SimError::TraceParse {
            line: line_no,
            message: format!("I/O error reading line: {e}"),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        events.push(parse_line(trimmed, line_no)?);
    }
    Ok(events)
}
