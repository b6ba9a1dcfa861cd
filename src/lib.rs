//! Trace-driven simulator of a tiered-memory residency manager for a
//! fixed-capacity, contiguous high-bandwidth-memory (HBM) region. See
//! SPEC_FULL.md for the full requirements this crate implements.
//!
//! The four core subsystems — [`allocator`], [`fragmentation`],
//! [`policy`], and the [`safety`]/[`scheduler`] gate — are arbitrated by
//! the [`driver::Simulation`] event loop. [`trace`] is the thin JSON-lines
//! ingestion layer and [`report`] is the presentation layer; neither is
//! part of the core.

pub mod allocator;
pub mod config;
pub mod driver;
pub mod error;
pub mod fragmentation;
pub mod model;
pub mod policy;
pub mod report;
pub mod safety;
pub mod scheduler;
pub mod trace;

pub use driver::{Counters, MissMode, SimConfig, Simulation};
pub use error::{Result, SimError};
