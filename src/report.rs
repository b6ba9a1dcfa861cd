//! Stdout report formatting (spec.md §6): a fixed-format summary consumed
//! by regression tests and (originally) a benchmark-table scraper. All
//! logging goes through `tracing` to stderr so this stays scrapable.

use crate::allocator::ContiguousAllocator;
use crate::driver::{Counters, MissMode, SimConfig, Simulation};
use crate::fragmentation::compute_metrics;
use crate::policy::PolicyKind;

const RULE: &str = "================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------";

/// Render the full stdout report for a finished simulation run.
pub fn render_report(sim: &Simulation, config: &SimConfig, show_map: bool, map_width: usize) -> String {
    let counters = sim.counters();
    let allocator = sim.allocator();
    let metrics = compute_metrics(&allocator.extents_free());

    let mut out = String::new();
    out.push_str(RULE);
    out.push('\n');
    out.push_str("HBM Residency Simulator — Run Summary\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "Policy: {}   Miss mode: {}   Demand-fallback-only: {}\n",
        policy_name(config.policy),
        miss_mode_name(config.miss_mode),
        config.demand_fallback_only
    ));
    out.push_str(&format!(
        "HBM Capacity: {}  HBM Used: {}  HBM Free: {}  Reserve: {}\n",
        config.capacity,
        allocator.used(),
        allocator.free_bytes(),
        config.reserve
    ));
    out.push_str(&format!(
        "Catalog objects: {}  alloc_events: {}  free_events: {}\n",
        sim.catalog_len(),
        counters.alloc_events,
        counters.free_events
    ));
    out.push_str(&counters_lines(&counters));
    out.push_str(&format!("HBM alloc failures: {}  Fallback epochs: {}\n", counters.hbm_alloc_fail, counters.fallback_epochs));
    out.push_str(THIN_RULE);
    out.push('\n');
    out.push_str(&format!(
        "LFE={} holes={} external_frag={:.3} entropy={:.3}\n",
        metrics.lfe, metrics.hole_count, metrics.external_frag, metrics.entropy
    ));
    if show_map {
        out.push_str(THIN_RULE);
        out.push('\n');
        out.push_str("Memory map (ASCII):\n");
        out.push_str(&render_map(allocator, map_width));
        out.push('\n');
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

fn counters_lines(counters: &Counters) -> String {
    format!(
        "Faults: {}  Migrations: {}  Bytes moved: {}  Fallback epochs: {}\nDecisions: admit={} pin={} evict={} compact={}\nBlocked actions: prefetch={} evict={} compact={}\n",
        counters.faults,
        counters.migrations,
        counters.bytes_moved,
        counters.fallback_epochs,
        counters.admit,
        counters.pin,
        counters.evict,
        counters.compact,
        counters.blocked_prefetch,
        counters.blocked_evict,
        counters.blocked_compact,
    )
}

fn policy_name(p: PolicyKind) -> &'static str {
    match p {
        PolicyKind::Confidence => "confidence",
        PolicyKind::Lru => "lru",
    }
}

fn miss_mode_name(m: MissMode) -> &'static str {
    match m {
        MissMode::Serve => "serve",
        MissMode::Demand => "demand",
    }
}

/// Fixed-width ASCII memory map: `.` for free positions, the uppercase
/// first character of a block's object id for occupied ones. Blocks are
/// painted in address order, so an overlapping column (possible only at
/// the sub-character scale of a narrow map) is left with the
/// higher-address block's character (spec.md §6, SPEC_FULL.md).
pub fn render_map(allocator: &ContiguousAllocator, width: usize) -> String {
    let capacity = allocator.capacity().max(1);
    let mut buf = vec!['.'; width];
    for (id, block) in allocator.blocks_by_start() {
        let ch = id
            .chars()
            .next()
            .filter(|c| c.is_ascii())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?');
        let start_col = ((block.start as u128 * width as u128) / capacity as u128) as usize;
        let end_col = (((block.start + block.size) as u128 * width as u128) / capacity as u128) as usize;
        let start_col = start_col.min(width);
        let end_col = end_col.max(start_col + 1).min(width);
        for slot in buf.iter_mut().take(end_col).skip(start_col) {
            *slot = ch;
        }
    }
    buf.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allocator_renders_all_dots() {
        let allocator = ContiguousAllocator::new(100);
        let map = render_map(&allocator, 10);
        assert_eq!(map, "..........");
    }

    #[test]
    fn single_block_paints_its_span() {
        let mut allocator = ContiguousAllocator::new(100);
        allocator.alloc("alpha", 50);
        let map = render_map(&allocator, 10);
        assert_eq!(&map[0..5], "AAAAA");
        assert_eq!(&map[5..10], ".....");
    }

    #[test]
    fn non_ascii_first_char_folds_to_question_mark() {
        let mut allocator = ContiguousAllocator::new(100);
        allocator.alloc("café", 50);
        let map = render_map(&allocator, 10);
        assert_eq!(&map[0..5], "?????");
    }

    #[test]
    fn report_contains_required_labeled_fields_in_order() {
        let config = SimConfig::default();
        let sim = Simulation::new(config.clone());
        let report = render_report(&sim, &config, false, 80);
        let faults_pos = report.find("Faults:").unwrap();
        let migrations_pos = report.find("Migrations:").unwrap();
        let bytes_pos = report.find("Bytes moved:").unwrap();
        let fallback_pos = report.find("Fallback epochs:").unwrap();
        let blocked_pos = report.find("Blocked actions:").unwrap();
        let frag_pos = report.find("LFE=").unwrap();
        assert!(faults_pos < migrations_pos);
        assert!(migrations_pos < bytes_pos);
        assert!(bytes_pos < fallback_pos);
        assert!(fallback_pos < blocked_pos);
        assert!(blocked_pos < frag_pos);
        assert!(report.contains("prefetch=") && report.contains("evict=") && report.contains("compact="));
        assert!(report.contains("holes=") && report.contains("external_frag="));
    }

    #[test]
    fn show_map_appends_memory_map_section() {
        let config = SimConfig::default();
        let sim = Simulation::new(config.clone());
        let report = render_report(&sim, &config, true, 80);
        assert!(report.contains("Memory map (ASCII):"));
    }
}
