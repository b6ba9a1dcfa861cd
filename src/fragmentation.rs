//! Fragmentation metrics derived from a free-extent list (spec.md §4.2).
//! Pure function of the extent sizes — never stored, always recomputed.

/// `ε` guards `log2(p + ε)` against `log2(0)` for a size-zero contribution;
/// it is never applied to the outer `p` multiplier (spec.md §9).
const ENTROPY_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragMetrics {
    pub total_free: u64,
    pub lfe: u64,
    pub hole_count: usize,
    pub external_frag: f64,
    pub entropy: f64,
}

/// Compute fragmentation metrics from a list of free extents (as returned
/// by [`crate::allocator::ContiguousAllocator::extents_free`]).
pub fn compute_metrics(free_extents: &[(u64, u64)]) -> FragMetrics {
    let sizes: Vec<u64> = free_extents.iter().map(|&(_, s)| s).filter(|&s| s > 0).collect();
    let total_free: u64 = sizes.iter().sum();
    let lfe = sizes.iter().copied().max().unwrap_or(0);
    let hole_count = sizes.len();
    let external_frag = if total_free == 0 {
        0.0
    } else {
        (1.0 - (lfe as f64 / total_free as f64)).max(0.0)
    };
    let entropy = entropy_of(&sizes, total_free);
    FragMetrics {
        total_free,
        lfe,
        hole_count,
        external_frag,
        entropy,
    }
}

fn entropy_of(sizes: &[u64], total_free: u64) -> f64 {
    if total_free == 0 {
        return 0.0;
    }
    sizes
        .iter()
        .filter(|&&s| s > 0)
        .map(|&s| {
            let p = s as f64 / total_free as f64;
            -p * (p + ENTROPY_EPS).log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_extents_give_zero_metrics() {
        let m = compute_metrics(&[]);
        assert_eq!(m.total_free, 0);
        assert_eq!(m.lfe, 0);
        assert_eq!(m.hole_count, 0);
        assert_eq!(m.external_frag, 0.0);
        assert_eq!(m.entropy, 0.0);
    }

    #[test]
    fn single_extent_spanning_all_free_has_zero_external_frag() {
        let m = compute_metrics(&[(0, 100)]);
        assert_eq!(m.lfe, 100);
        assert_eq!(m.external_frag, 0.0);
    }

    #[test]
    fn n_equal_extents_give_one_minus_one_over_n() {
        let extents: Vec<(u64, u64)> = (0..4).map(|i| (i * 10, 10)).collect();
        let m = compute_metrics(&extents);
        assert_eq!(m.hole_count, 4);
        assert!((m.external_frag - 0.75).abs() < 1e-9);
    }

    #[test]
    fn zero_length_extents_are_ignored() {
        let m = compute_metrics(&[(0, 0), (5, 30)]);
        assert_eq!(m.hole_count, 1);
        assert_eq!(m.lfe, 30);
    }

    #[test]
    fn trivial_admit_scenario_yields_documented_metrics() {
        // Capacity 100, object of size 30 admitted: one trailing extent of 70.
        let m = compute_metrics(&[(30, 70)]);
        assert_eq!(m.lfe, 70);
        assert_eq!(m.hole_count, 1);
        assert_eq!(m.external_frag, 0.0);
    }
}
