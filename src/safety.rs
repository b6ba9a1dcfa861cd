//! Epoch-scoped safety gate: a soft budget on data-movement work
//! (spec.md §4.5). `fallback` is sticky within an epoch once tripped.

use std::fmt;

/// Per-epoch budget ceilings. Exceeding either, strictly, trips `fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    pub max_migration_bytes: u64,
    pub max_faults: u64,
}

/// Epoch-scoped counters plus the sticky fallback flag.
#[derive(Debug, Clone)]
pub struct SafetyGate {
    budgets: Budgets,
    migration_bytes: u64,
    faults: u64,
    fallback: bool,
}

impl SafetyGate {
    pub fn new(budgets: Budgets) -> Self {
        Self {
            budgets,
            migration_bytes: 0,
            faults: 0,
            fallback: false,
        }
    }

    /// Zero the counters and clear `fallback` — called at every epoch
    /// boundary (spec.md §4.7 step 1).
    pub fn reset_epoch(&mut self) {
        self.migration_bytes = 0;
        self.faults = 0;
        self.fallback = false;
    }

    pub fn consume_migration(&mut self, n: u64) {
        self.migration_bytes += n;
        self.check();
    }

    pub fn consume_fault(&mut self, n: u64) {
        self.faults += n;
        self.check();
    }

    fn check(&mut self) {
        if self.migration_bytes > self.budgets.max_migration_bytes || self.faults > self.budgets.max_faults {
            self.fallback = true;
        }
    }

    pub fn allow_action(&self) -> bool {
        !self.fallback
    }

    pub fn fallback(&self) -> bool {
        self.fallback
    }

    pub fn migration_bytes(&self) -> u64 {
        self.migration_bytes
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }
}

impl fmt::Display for SafetyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mig={}/{} faults={}/{} fallback={}",
            self.migration_bytes, self.budgets.max_migration_bytes, self.faults, self.budgets.max_faults, self.fallback
        )
    }
}
