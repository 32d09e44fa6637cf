//! Debug assertion macros for histogram invariants.
//!
//! These macros provide runtime checks for the ring's structural invariants (spare-slot
//! accounting, head/tail distinctness, monotonic timestamps, and settled-to-zero
//! counters). They are only active in debug builds (`#[cfg(debug_assertions)]`), so
//! there is zero overhead in release builds.
//!
//! Used by `RotatingHistory`, `IntervalSlice`, and `Summary`.

// =============================================================================
// INV-HIST-03: Spare Slot
// =============================================================================

/// Assert that live_size never exceeds the capacity minus the spare slot.
///
/// **Invariant**: `live_size <= ring_capacity - 1`
///
/// Used in: `RotatingHistory::forward_locked()`, `RotatingHistory::reset_tail()`
macro_rules! debug_assert_spare_slot {
    ($live_size:expr, $capacity:expr) => {
        debug_assert!(
            $live_size <= ($capacity as i32) - 1,
            "INV-HIST-03 violated: live_size {} exceeds capacity {} minus the spare slot",
            $live_size,
            $capacity
        )
    };
}

// =============================================================================
// INV-HIST-04: Head/Tail Distinctness
// =============================================================================

/// Assert that head and tail cursors are distinct whenever any slice is live.
///
/// **Invariant**: `head != tail` whenever `live_size > 0`
///
/// Used in: `RotatingHistory::forward_locked()`, `RotatingHistory::reset_tail()`
macro_rules! debug_assert_head_not_tail {
    ($head_seq:expr, $tail_seq:expr, $live_size:expr) => {
        debug_assert!(
            $live_size <= 0 || $head_seq != $tail_seq,
            "INV-HIST-04 violated: head and tail both at {} with live_size {}",
            $head_seq,
            $live_size
        )
    };
}

// =============================================================================
// INV-HIST-05: Monotonic Head Timestamp
// =============================================================================

/// Assert that the head timestamp only ever moves forward.
///
/// **Invariant**: `new_head_timestamp >= old_head_timestamp`
///
/// Used in: `RotatingHistory::forward_locked()`
macro_rules! debug_assert_timestamp_advances {
    ($old:expr, $new:expr) => {
        debug_assert!($new >= $old, "INV-HIST-05 violated: head_timestamp moved backwards")
    };
}

// =============================================================================
// INV-HIST-06: Counters Settle Non-Negative
// =============================================================================

/// Assert that a counter has settled back to zero after a retirement.
///
/// **Invariant**: all counters are >= 0 at rest; a retired cell is exactly 0.
///
/// Used in: `IntervalSlice::reset()`
macro_rules! debug_assert_retired_zero {
    ($value:expr) => {
        debug_assert!(
            $value == 0,
            "INV-HIST-06 violated: cell holds {} after retirement, expected 0",
            $value
        )
    };
}

// =============================================================================
// INV-HIST-01 / INV-HIST-02: Summary Consistency (exercised in tests only)
// =============================================================================

/// Assert that a summary row's cells sum to its cached row total.
///
/// **Invariant**: `sum_j summary.cells[i, j] == summary.row_sums[i]`
///
/// This is O(output_buckets) and is deliberately not called from the hot ingest or
/// predict path; it is exercised by property tests to verify `INV-HIST-01`/`INV-HIST-02`
/// hold across randomized operation sequences.
///
/// Used in: `tests` (property tests over `Summary`)
macro_rules! debug_assert_row_consistent {
    ($computed:expr, $cached:expr, $row:expr) => {
        debug_assert!(
            $computed == $cached,
            "INV-HIST-02 violated: row {} sums to {} but row_sums caches {}",
            $row,
            $computed,
            $cached
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_head_not_tail;
pub(crate) use debug_assert_retired_zero;
pub(crate) use debug_assert_row_consistent;
pub(crate) use debug_assert_spare_slot;
pub(crate) use debug_assert_timestamp_advances;
