//! Event-driven simulation loop (spec.md §4.7): arbitrates between policy
//! decisions, the safe-window scheduler, and the per-epoch safety gate,
//! with a fallback demand-load path. This is where the four subsystems
//! compose; see SPEC_FULL.md's "Resolved Open Questions" section for the
//! exact per-touch ordering this follows.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::allocator::ContiguousAllocator;
use crate::fragmentation::compute_metrics;
use crate::model::Action;
use crate::policy::confidence::ConfidenceConfig;
use crate::policy::{ConfidenceGatedPolicy, LruBaselinePolicy, PolicyKind};
use crate::safety::{Budgets, SafetyGate};
use crate::scheduler::SafeWindowScheduler;
use crate::trace::TraceEvent;

/// On a touch miss, whether the driver only records a fault (`Serve`) or
/// may demand-load the object (`Demand`) — spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissMode {
    Serve,
    Demand,
}

/// Full simulation configuration — the union of the CLI surface
/// (spec.md §6) and the supplemented migration/fault budget flags
/// (SPEC_FULL.md).
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub capacity: u64,
    pub reserve: u64,
    pub epoch_len: u64,
    pub policy: PolicyKind,
    pub miss_mode: MissMode,
    pub demand_fallback_only: bool,
    pub budgets: Budgets,
    pub confidence: ConfidenceConfig,
    pub allow_prefetch_outside_window: bool,
    pub allow_evict_outside_window: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: 800,
            reserve: 80,
            epoch_len: 20,
            policy: PolicyKind::Confidence,
            miss_mode: MissMode::Serve,
            demand_fallback_only: true,
            budgets: Budgets {
                max_migration_bytes: 180,
                max_faults: 6,
            },
            confidence: ConfidenceConfig::default(),
            allow_prefetch_outside_window: true,
            allow_evict_outside_window: true,
        }
    }
}

/// Run-summary counters, accumulated exactly as spec.md §4.7 and §6
/// describe. Every field here is an accounted outcome, never an exception
/// (spec.md §7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub alloc_events: u64,
    pub free_events: u64,
    pub faults: u64,
    pub migrations: u64,
    pub bytes_moved: u64,
    pub admit: u64,
    pub pin: u64,
    pub evict: u64,
    pub compact: u64,
    pub hbm_alloc_fail: u64,
    pub fallback_epochs: u64,
    pub blocked_prefetch: u64,
    pub blocked_evict: u64,
    pub blocked_compact: u64,
}

/// Owns every piece of simulator state (spec.md §5: the driver is the sole
/// owner, no global mutable state).
pub struct Simulation {
    config: SimConfig,
    allocator: ContiguousAllocator,
    catalog: HashMap<String, u64>,
    safety: SafetyGate,
    scheduler: SafeWindowScheduler,
    confidence: ConfidenceGatedPolicy,
    lru: LruBaselinePolicy,
    counters: Counters,
    upcoming_need: u64,
    event_index: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let allocator = ContiguousAllocator::new(config.capacity);
        let safety = SafetyGate::new(config.budgets);
        let scheduler = SafeWindowScheduler::new(config.allow_prefetch_outside_window, config.allow_evict_outside_window);
        let confidence = ConfidenceGatedPolicy::new(config.confidence);
        Self {
            config,
            allocator,
            catalog: HashMap::new(),
            safety,
            scheduler,
            confidence,
            lru: LruBaselinePolicy::new(),
            counters: Counters::default(),
            upcoming_need: 0,
            event_index: 0,
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn allocator(&self) -> &ContiguousAllocator {
        &self.allocator
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub fn gate(&self) -> &SafetyGate {
        &self.safety
    }

    /// Feed the whole trace through the driver, in order.
    pub fn run(&mut self, events: &[TraceEvent]) {
        for ev in events {
            self.process_event(ev);
        }
    }

    /// Process one event (spec.md §4.7).
    pub fn process_event(&mut self, ev: &TraceEvent) {
        self.event_index += 1;
        if (self.event_index - 1) % self.config.epoch_len == 0 {
            if self.safety.fallback() {
                self.counters.fallback_epochs += 1;
            }
            self.safety.reset_epoch();
            self.scheduler.end_window();
        }

        match ev {
            TraceEvent::SafeWindow => {
                self.scheduler.on_safe_window();
            }
            TraceEvent::Alloc { id, size } => {
                self.catalog.insert(id.clone(), *size);
                self.counters.alloc_events += 1;
                self.upcoming_need = self.upcoming_need.max(*size);
            }
            TraceEvent::Free { id } => {
                self.catalog.remove(id);
                if self.allocator.in_mem(id) {
                    self.allocator.free(id);
                    self.lru.remove(id);
                }
                self.counters.free_events += 1;
            }
            TraceEvent::Touch { id, forecast } => {
                self.handle_touch(id, *forecast);
            }
            TraceEvent::Unknown => {}
        }
    }

    /// `try_compact_then_alloc` (spec.md §4.7): direct alloc first; on
    /// failure, compact (if a safe window permits it and the gate allows
    /// discretionary movement) and retry once.
    fn try_compact_then_alloc(&mut self, id: &str, size: u64) -> bool {
        if self.allocator.alloc(id, size) {
            return true;
        }
        if !self.scheduler.can_compact() {
            return false;
        }
        if !self.safety.allow_action() {
            self.counters.blocked_compact += 1;
            return false;
        }
        let moved = self.allocator.compact(self.config.reserve);
        if moved > 0 {
            self.safety.consume_migration(moved);
            self.counters.bytes_moved += moved;
            self.counters.migrations += 1;
            self.counters.compact += 1;
            debug!(moved, "compacted HBM region");
        }
        self.allocator.alloc(id, size)
    }

    fn handle_touch(&mut self, id: &str, forecast: Option<crate::model::Forecast>) {
        let size = *self.catalog.get(id).unwrap_or(&20);
        let in_hbm = self.allocator.in_mem(id);

        if !in_hbm {
            self.safety.consume_fault(1);
            self.counters.faults += 1;
        }

        match self.config.policy {
            PolicyKind::Lru => self.handle_touch_lru(id, size, in_hbm),
            PolicyKind::Confidence => self.handle_touch_confidence(id, size, in_hbm, forecast),
        }
    }

    fn handle_touch_lru(&mut self, id: &str, size: u64, in_hbm: bool) {
        if in_hbm {
            self.lru.on_touch(id);
            return;
        }
        if self.config.miss_mode != MissMode::Demand {
            return;
        }
        if !(self.safety.allow_action() && self.scheduler.can_prefetch()) {
            self.counters.blocked_prefetch += 1;
            return;
        }
        let mut ok = self.try_compact_then_alloc(id, size);
        if !ok {
            if let Some(victim) = self.lru.pick_victim() {
                self.allocator.free(&victim);
                self.counters.evict += 1;
                ok = self.try_compact_then_alloc(id, size);
            }
        }
        if ok {
            self.lru.on_admit(id);
            self.safety.consume_migration(size);
            self.counters.bytes_moved += size;
            self.counters.migrations += 1;
            self.counters.admit += 1;
        } else {
            self.counters.hbm_alloc_fail += 1;
        }
    }

    fn handle_touch_confidence(&mut self, id: &str, size: u64, in_hbm: bool, forecast: Option<crate::model::Forecast>) {
        let decision = self.confidence.decide_on_touch(id, in_hbm, forecast);
        trace!(id, action = ?decision.action, reason = %decision.reason, "confidence decision");

        // Tracks whether the primary decision path admitted the object this
        // touch, so the demand-fallback path below never fires on top of a
        // successful budgeted admission (spec.md §9 open question #1: the
        // fallback load is a replacement for admission, not an addition).
        let mut admitted_via_primary = false;

        match decision.action {
            Action::Admit => {
                if !self.scheduler.can_prefetch() {
                    // Outside a permitted window: matches `run_sim.py`'s bare
                    // `continue`, which skips the rest of this touch entirely
                    // (no demand-fallback load, no upcoming_need reset).
                    return;
                } else if !self.safety.allow_action() {
                    self.counters.blocked_prefetch += 1;
                } else if self.try_compact_then_alloc(id, size) {
                    self.safety.consume_migration(size);
                    self.counters.bytes_moved += size;
                    self.counters.migrations += 1;
                    self.counters.admit += 1;
                    admitted_via_primary = true;
                } else {
                    self.counters.hbm_alloc_fail += 1;
                }
            }
            Action::Pin => {
                self.counters.pin += 1;
            }
            Action::Evict => {
                if !self.scheduler.can_evict() {
                    // Same as above: `continue`s past the rest of the touch.
                    return;
                } else if !self.safety.allow_action() {
                    self.counters.blocked_evict += 1;
                } else if self.allocator.in_mem(id) {
                    self.allocator.free(id);
                    self.counters.evict += 1;
                }
            }
            Action::Noop | Action::Compact => {}
        }

        // Demand-fallback correctness path: only reachable once
        // `allow_action()` is false, i.e. strictly after fallback has
        // already tripped this epoch (spec.md §9 open question #1).
        if !in_hbm && !admitted_via_primary && self.config.miss_mode == MissMode::Demand {
            let allow_demand = if self.config.demand_fallback_only {
                self.safety.fallback()
            } else {
                true
            };
            if allow_demand && self.scheduler.can_prefetch() && !self.safety.allow_action() {
                if self.try_compact_then_alloc(id, size) {
                    self.counters.bytes_moved += size;
                    self.counters.migrations += 1;
                    self.counters.admit += 1;
                    warn!(id, "demand-loaded under fallback without charging migration budget");
                } else {
                    self.counters.hbm_alloc_fail += 1;
                }
            }
        }

        let metrics = compute_metrics(&self.allocator.extents_free());
        let comp = self.confidence.request_compaction(metrics.external_frag, metrics.lfe, self.upcoming_need);
        self.upcoming_need = 0;
        if comp.action == Action::Compact && self.scheduler.can_compact() {
            if !self.safety.allow_action() {
                self.counters.blocked_compact += 1;
            } else {
                let moved = self.allocator.compact(self.config.reserve);
                if moved > 0 {
                    self.safety.consume_migration(moved);
                    self.counters.bytes_moved += moved;
                    self.counters.migrations += 1;
                    self.counters.compact += 1;
                }
            }
        }
    }
}
