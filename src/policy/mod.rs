//! Admission/eviction policies (spec.md §4.3, §4.4). The two policies are
//! not behind a shared trait object — the driver dispatches on a tagged
//! variant and calls the out-of-band hooks each policy needs explicitly
//! (spec.md §9 "Dynamic dispatch between policies").

pub mod confidence;
pub mod lru;

pub use confidence::ConfidenceGatedPolicy;
pub use lru::LruBaselinePolicy;

/// Which policy the driver is running, selected by `--policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Confidence,
    Lru,
}
