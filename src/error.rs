//! Error taxonomy for the simulator: configuration errors and trace parse
//! errors. Runtime "soft" conditions (allocation failure, unknown touch,
//! missing forecast) are never represented here — they are accounted for
//! as counters in [`crate::driver::Counters`] instead (spec.md §7).

use thiserror::Error;

/// Errors that can terminate the simulator before or during a run.
#[derive(Debug, Error)]
pub enum SimError {
    /// `--capacity` was not a positive integer.
    #[error("capacity must be a positive integer, got {0}")]
    NonPositiveCapacity(i64),

    /// `--epoch` was not a positive integer.
    #[error("epoch length must be a positive integer, got {0}")]
    NonPositiveEpoch(i64),

    /// `--reserve` exceeds `--capacity`.
    #[error("reserve ({reserve}) cannot exceed capacity ({capacity})")]
    ReserveExceedsCapacity { reserve: u64, capacity: u64 },

    /// `--reserve` was negative.
    #[error("reserve must not be negative, got {0}")]
    NegativeReserve(i64),

    /// The trace file could not be opened.
    #[error("could not open trace file {path}: {source}")]
    TraceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A line of the trace was not valid JSON, or a known event kind was
    /// missing a required field.
    #[error("trace parse error at line {line}: {message}")]
    TraceParse { line: usize, message: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
