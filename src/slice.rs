//! One interval's worth of observations: a dense counter vector plus a trailing
//! "skipped" counter for empty intervals collapsed by rotation.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::invariants::debug_assert_retired_zero;
use crate::layout::cell_index;
use crate::summary::Summary;

/// Counter vector for one rotation interval.
///
/// Allocated once at construction and reused in place as the ring rotates; `reset`
/// zeroes a slice's cells (after folding them out of the running [`Summary`]) so the
/// storage can become a fresh head the next time `forward_locked` advances into it.
pub(crate) struct IntervalSlice {
    cells: Box<[AtomicI32]>,
    skipped: AtomicI32,
    input_buckets: u32,
    output_buckets: u32,
}

impl IntervalSlice {
    pub(crate) fn new(input_buckets: u32, output_buckets: u32) -> Self {
        let len = (input_buckets * output_buckets) as usize;
        let cells = (0..len).map(|_| AtomicI32::new(0)).collect::<Vec<_>>().into_boxed_slice();
        Self { cells, skipped: AtomicI32::new(0), input_buckets, output_buckets }
    }

    /// Atomically adds `count` to cell `idx`. Relaxed is sufficient: ordering between
    /// this cell and the summary's matching cell is enforced by program order within
    /// the single caller (`add_trace`), not by inter-counter memory ordering.
    pub(crate) fn add(&self, idx: usize, count: i32) {
        self.cells[idx].fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn set_skipped(&self, k: i32) {
        self.skipped.store(k, Ordering::Relaxed);
    }

    pub(crate) fn get_skipped(&self) -> i32 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Folds this slice's cells out of `summary` (subtracting them from both `cells`
    /// and `row_sums`), zeroes every cell, then zeroes the skip slot last. Must only be
    /// called on the current tail, under the writer side of `rotation_mu`.
    pub(crate) fn reset(&self, summary: &Summary) {
        for i in 0..self.input_buckets {
            for j in 0..self.output_buckets {
                let idx = cell_index(i, j, self.output_buckets);
                let value = self.cells[idx].swap(0, Ordering::Relaxed);
                if value != 0 {
                    summary.subtract(idx, i as usize, value);
                }
                debug_assert_retired_zero!(self.cells[idx].load(Ordering::Relaxed));
            }
        }
        self.skipped.store(0, Ordering::Relaxed);
    }
}
