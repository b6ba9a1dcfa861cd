//! CLI surface (spec.md §6) and configuration validation (spec.md §7).
//! Flat flags, no subcommands — this tool has exactly one mode of
//! operation, following the single-purpose tool-crate style of the
//! teacher workspace's `hdds-admin`/`hdds-stress` binaries.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::driver::{MissMode as DriverMissMode, SimConfig};
use crate::error::{Result, SimError};
use crate::policy::confidence::ConfidenceConfig;
use crate::policy::PolicyKind;
use crate::safety::Budgets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Confidence,
    Lru,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissModeArg {
    Serve,
    Demand,
}

/// Trace-driven simulator of a tiered-memory residency manager for a
/// fixed-capacity HBM region.
#[derive(Debug, Parser, Clone)]
#[command(name = "hbm-sim", version, about)]
pub struct Cli {
    /// Path to a JSON-lines trace file.
    #[arg(long)]
    pub trace: PathBuf,

    /// Admission/eviction policy under test.
    #[arg(long, value_enum, default_value_t = PolicyArg::Confidence)]
    pub policy: PolicyArg,

    /// Behavior on a touch miss.
    #[arg(long = "miss-mode", value_enum, default_value_t = MissModeArg::Serve)]
    pub miss_mode: MissModeArg,

    /// In demand mode, only demand-load once the safety gate has tripped
    /// fallback (preserves the confidence gate as the primary admission
    /// criterion).
    #[arg(long = "demand-fallback-only", default_value_t = true)]
    pub demand_fallback_only: bool,

    /// HBM region capacity, in bytes (opaque address-space units).
    #[arg(long, default_value_t = 800)]
    pub capacity: i64,

    /// Bytes reserved at the high-address end during compaction.
    #[arg(long, default_value_t = 80)]
    pub reserve: i64,

    /// Number of events per safety/scheduler epoch.
    #[arg(long, default_value_t = 20)]
    pub epoch: i64,

    /// Per-epoch migration-bytes budget before fallback trips.
    #[arg(long = "max-migration-bytes", default_value_t = 180)]
    pub max_migration_bytes: i64,

    /// Per-epoch fault budget before fallback trips.
    #[arg(long = "max-faults", default_value_t = 6)]
    pub max_faults: i64,

    /// Print a fixed-width ASCII memory map after the run.
    #[arg(long = "show-map", default_value_t = false)]
    pub show_map: bool,

    /// Width, in characters, of the ASCII memory map.
    #[arg(long = "map-width", default_value_t = 80)]
    pub map_width: usize,
}

impl Cli {
    /// Validate configuration-error conditions (spec.md §7) and build a
    /// [`SimConfig`]. Fails fast, before any event is processed.
    pub fn into_sim_config(self) -> Result<SimConfig> {
        if self.capacity <= 0 {
            return Err(SimError::NonPositiveCapacity(self.capacity));
        }
        if self.epoch <= 0 {
            return Err(SimError::NonPositiveEpoch(self.epoch));
        }
        if self.reserve < 0 {
            return Err(SimError::NegativeReserve(self.reserve));
        }
        let capacity = self.capacity as u64;
        let reserve = self.reserve as u64;
        if reserve > capacity {
            return Err(SimError::ReserveExceedsCapacity { reserve, capacity });
        }

        Ok(SimConfig {
            capacity,
            reserve,
            epoch_len: self.epoch as u64,
            policy: match self.policy {
                PolicyArg::Confidence => PolicyKind::Confidence,
                PolicyArg::Lru => PolicyKind::Lru,
            },
            miss_mode: match self.miss_mode {
                MissModeArg::Serve => DriverMissMode::Serve,
                MissModeArg::Demand => DriverMissMode::Demand,
            },
            demand_fallback_only: self.demand_fallback_only,
            budgets: Budgets {
                max_migration_bytes: self.max_migration_bytes.max(0) as u64,
                max_faults: self.max_faults.max(0) as u64,
            },
            confidence: ConfidenceConfig::default(),
            allow_prefetch_outside_window: true,
            allow_evict_outside_window: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            trace: PathBuf::from("trace.jsonl"),
            policy: PolicyArg::Confidence,
            miss_mode: MissModeArg::Serve,
            demand_fallback_only: true,
            capacity: 800,
            reserve: 80,
            epoch: 20,
            max_migration_bytes: 180,
            max_faults: 6,
            show_map: false,
            map_width: 80,
        }
    }

    #[test]
    fn valid_config_builds() {
        assert!(base_cli().into_sim_config().is_ok());
    }

    #[test]
    fn nonpositive_capacity_is_config_error() {
        let mut cli = base_cli();
        cli.capacity = 0;
        assert!(matches!(cli.into_sim_config(), Err(SimError::NonPositiveCapacity(0))));
    }

    #[test]
    fn reserve_exceeding_capacity_is_config_error() {
        let mut cli = base_cli();
        cli.reserve = 900;
        assert!(matches!(cli.into_sim_config(), Err(SimError::ReserveExceedsCapacity { .. })));
    }

    #[test]
    fn nonpositive_epoch_is_config_error() {
        let mut cli = base_cli();
        cli.epoch = 0;
        assert!(matches!(cli.into_sim_config(), Err(SimError::NonPositiveEpoch(0))));
    }
}
