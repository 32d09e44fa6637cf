//! Loom-based concurrency tests for the predictor's counter-accounting protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores thread interleavings permitted by the memory model, which
//! a stress test can only sample. These tests model the summary/slice counter protocol
//! in isolation with miniature purpose-built atomics rather than loom-wrapping the
//! production type directly: loom requires `loom::sync` primitives throughout, which the
//! `parking_lot`-backed `RotatingHistory` does not use.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicI32, Ordering};
use loom::sync::Arc;
use loom::thread;

/// Two traces added concurrently must both be counted (no lost updates). Models two
/// concurrent ingesters hitting the same summary cell and row-sum with the same relaxed
/// `fetch_add` pattern `Summary::add` uses, and checks the final totals account for
/// every contribution.
#[test]
fn loom_concurrent_adds_are_never_lost() {
    loom::model(|| {
        let cell = Arc::new(AtomicI32::new(0));
        let row = Arc::new(AtomicI32::new(0));

        let cell_a = Arc::clone(&cell);
        let row_a = Arc::clone(&row);
        let ingest_a = thread::spawn(move || {
            cell_a.fetch_add(3, Ordering::Relaxed);
            row_a.fetch_add(3, Ordering::Relaxed);
        });

        let cell_b = Arc::clone(&cell);
        let row_b = Arc::clone(&row);
        let ingest_b = thread::spawn(move || {
            cell_b.fetch_add(5, Ordering::Relaxed);
            row_b.fetch_add(5, Ordering::Relaxed);
        });

        ingest_a.join().unwrap();
        ingest_b.join().unwrap();

        assert_eq!(cell.load(Ordering::Relaxed), 8);
        assert_eq!(row.load(Ordering::Relaxed), 8);
    });
}

/// Three concurrent ingesters adding to a cell never drop a contribution, regardless of
/// how loom interleaves the individual `fetch_add` calls.
#[test]
fn loom_three_way_concurrent_adds_sum_correctly() {
    loom::model(|| {
        let cell = Arc::new(AtomicI32::new(0));

        let handles: Vec<_> = (1..=3)
            .map(|n| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    cell.fetch_add(n, Ordering::Relaxed);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cell.load(Ordering::Relaxed), 1 + 2 + 3);
    });
}

/// Models `IntervalSlice::reset`'s "subtract from the summary, then zero the slice"
/// pair against a single retiring thread: once it completes, the summary cell must
/// have absorbed exactly the value the slice held, and the slice itself must read zero.
#[test]
fn loom_reset_pair_transfers_the_full_value_exactly_once() {
    loom::model(|| {
        let slice_cell = Arc::new(AtomicI32::new(7));
        let summary_cell = Arc::new(AtomicI32::new(7));

        let slice_for_reset = Arc::clone(&slice_cell);
        let summary_for_reset = Arc::clone(&summary_cell);
        let retire = thread::spawn(move || {
            let value = slice_for_reset.swap(0, Ordering::Relaxed);
            if value != 0 {
                summary_for_reset.fetch_sub(value, Ordering::Relaxed);
            }
        });

        retire.join().unwrap();

        assert_eq!(slice_cell.load(Ordering::Relaxed), 0);
        assert_eq!(summary_cell.load(Ordering::Relaxed), 0);
    });
}
