//! Winner and finish-order resolution
//!
//! Finish times within an epsilon of each other count as a tie; ties always
//! resolve to the lowest roster index so that settlement is deterministic even
//! when two runners cross in the same instant.

use crate::consts::FINISH_EPSILON;

/// Index of the minimum finish time, ties to the lowest index
pub fn resolve_winner(finish_times: &[f64]) -> usize {
    debug_assert!(!finish_times.is_empty());
    let mut winner = 0;
    let mut best = finish_times[0];
    for (i, &ft) in finish_times.iter().enumerate().skip(1) {
        if ft < best - FINISH_EPSILON {
            best = ft;
            winner = i;
        }
    }
    winner
}

/// Roster indices sorted ascending by finish time, ties to the lowest index
pub fn finish_order(finish_times: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..finish_times.len()).collect();
    order.sort_by(|&a, &b| {
        let (ta, tb) = (finish_times[a], finish_times[b]);
        if (ta - tb).abs() <= FINISH_EPSILON {
            a.cmp(&b)
        } else {
            ta.total_cmp(&tb)
        }
    });
    order
}
