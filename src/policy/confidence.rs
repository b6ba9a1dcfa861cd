//! Confidence-gated hysteretic admission/eviction policy (spec.md §4.3).
//! Admission looks at the lower confidence bound, eviction at the upper
//! bound — the asymmetry creates the `[evict_ub, admit_lb]` hysteresis
//! band that is the central anti-thrash guarantee. Grounded in the shape
//! of `nebula-memory`'s `budget::policy::AllocationPolicy` (a policy
//! struct holding thresholds, returning a decision enum from a pure
//! function of current state).

use std::collections::HashSet;

use crate::model::{Action, Forecast, PolicyDecision};

/// Tunable thresholds for the confidence-gated policy. Defaults match
/// spec.md §4.3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceConfig {
    pub admit_lb: f64,
    pub evict_ub: f64,
    pub z: f64,
    /// Margin above `admit_lb` at which a resident object is promoted to
    /// pinned.
    pub pin_promotion_margin: f64,
    /// Factor of `evict_ub` below which a pinned object's upper bound must
    /// fall before it is released and evicted.
    pub pin_release_floor_factor: f64,
    /// External-fragmentation threshold above which compaction is
    /// requested on quality grounds.
    pub frag_compaction_threshold: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            admit_lb: 0.60,
            evict_ub: 0.35,
            z: 1.0,
            pin_promotion_margin: 0.15,
            pin_release_floor_factor: 0.6,
            frag_compaction_threshold: 0.45,
        }
    }
}

/// Confidence-gated hysteretic policy. Owns the pinned set (spec.md §3).
#[derive(Debug, Clone)]
pub struct ConfidenceGatedPolicy {
    config: ConfidenceConfig,
    pinned: HashSet<String>,
}

impl ConfidenceGatedPolicy {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self {
            config,
            pinned: HashSet::new(),
        }
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.pinned.contains(id)
    }

    /// Decision table, evaluated top-to-bottom, first match wins
    /// (spec.md §4.3).
    pub fn decide_on_touch(&mut self, id: &str, in_hbm: bool, forecast: Option<Forecast>) -> PolicyDecision {
        let Some(fc) = forecast else {
            return PolicyDecision::new(Action::Noop, "no_forecast");
        };
        let lb = fc.lb(self.config.z);
        let ub = fc.ub(self.config.z);

        if !in_hbm {
            return if lb >= self.config.admit_lb {
                PolicyDecision::new(Action::Admit, format!("lb={lb:.2}>=admit_lb"))
            } else {
                PolicyDecision::new(Action::Noop, format!("lb={lb:.2}<admit_lb"))
            };
        }

        if self.pinned.contains(id) {
            let hard_floor = self.config.evict_ub * self.config.pin_release_floor_factor;
            if ub < hard_floor {
                self.pinned.remove(id);
                return PolicyDecision::new(Action::Evict, format!("pinned_ub={ub:.2}<hard_floor"));
            }
            return PolicyDecision::new(Action::Noop, "pinned");
        }

        if ub <= self.config.evict_ub {
            return PolicyDecision::new(Action::Evict, format!("ub={ub:.2}<=evict_ub"));
        }

        if lb >= self.config.admit_lb + self.config.pin_promotion_margin {
            self.pinned.insert(id.to_string());
            return PolicyDecision::new(Action::Pin, format!("lb={lb:.2} promote"));
        }

        PolicyDecision::new(Action::Noop, format!("hold lb={lb:.2} ub={ub:.2}"))
    }

    /// The LFE deficit test takes precedence over the quality (fragmentation
    /// ratio) test — imminent-allocation needs drive compaction before
    /// fragmentation quality does (spec.md §4.3).
    pub fn request_compaction(&self, frag_ratio: f64, lfe: u64, upcoming_need: u64) -> PolicyDecision {
        if lfe < upcoming_need {
            PolicyDecision::new(Action::Compact, format!("lfe={lfe}<need={upcoming_need}"))
        } else if frag_ratio > self.config.frag_compaction_threshold {
            PolicyDecision::new(Action::Compact, format!("frag_ratio={frag_ratio:.2}>threshold"))
        } else {
            PolicyDecision::new(Action::Noop, "no_compaction")
        }
    }
}
