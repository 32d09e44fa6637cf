//! Public façade: orchestrates the bucketizer, rotating history, and summary behind
//! `add_trace`, `add_trace_at`, `predict`, and `size`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bucketizer::token_to_bucket;
use crate::config::{ColdStrategy, PredictorConfig};
use crate::history::RotatingHistory;
use crate::layout::cell_index;
use crate::summary::Summary;

struct Inner {
    config: PredictorConfig,
    history: RotatingHistory,
    summary: Summary,
    rotation_in_flight: AtomicBool,
    rng: Mutex<StdRng>,
}

/// Online output-length predictor: a sliding-window streaming histogram over
/// (input-bucket, output-bucket) pairs, with lock-free ingest and weighted-sampling
/// prediction.
///
/// `Predictor` is a thin, cheaply-`Clone`-able handle around a shared, reference-counted
/// core: every clone sees the same history and summary, and cloning is how a caller
/// hands the predictor to the dedicated rotation thread without `unsafe`.
#[derive(Clone)]
pub struct Predictor {
    inner: Arc<Inner>,
}

impl Predictor {
    /// Builds a predictor anchored to the current wall-clock instant.
    pub fn new(config: PredictorConfig) -> Self {
        Self::new_at(config, Instant::now())
    }

    /// Builds a predictor anchored to an explicit instant, for deterministic tests that
    /// drive time entirely through `add_trace_at`/`predict_at`.
    pub fn new_at(config: PredictorConfig, start: Instant) -> Self {
        let history =
            RotatingHistory::new(config.ring_capacity(), config.input_buckets, config.output_buckets, start);
        let summary = Summary::new(config.input_buckets, config.output_buckets);
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let inner =
            Inner { config, history, summary, rotation_in_flight: AtomicBool::new(false), rng: Mutex::new(rng) };
        Self { inner: Arc::new(inner) }
    }

    /// Records a completed request's `(input_tokens, output_tokens)` pair, using the
    /// current wall-clock instant as the observation's timestamp.
    pub fn add_trace(&self, input_tokens: u32, output_tokens: u32, count: i32) {
        self.add_trace_at(input_tokens, output_tokens, count, Instant::now());
    }

    /// Deterministic twin of `add_trace` that takes an explicit timestamp.
    pub fn add_trace_at(&self, input_tokens: u32, output_tokens: u32, count: i32, ts: Instant) {
        self.maybe_rotate(ts);

        let inner = &self.inner;
        let i = token_to_bucket(input_tokens, inner.config.input_buckets);
        let j = token_to_bucket(output_tokens, inner.config.output_buckets);
        let idx = cell_index(i, j, inner.config.output_buckets);

        inner.history.add_to_head(&inner.summary, idx, i as usize, count);
    }

    /// Predicts the output-token count for a request with `input_tokens` input tokens,
    /// using the current wall-clock instant to decide whether a stale window should be
    /// rotated out before reading the summary.
    pub fn predict(&self, input_tokens: u32) -> u32 {
        self.predict_at(input_tokens, Instant::now())
    }

    /// Deterministic twin of `predict` that takes an explicit timestamp. Predictions
    /// only ever read the summary; the timestamp exists solely to drive the same
    /// non-blocking rotation probe `add_trace_at` uses, so a long idle gap is reflected
    /// even without further traces arriving.
    pub fn predict_at(&self, input_tokens: u32, ts: Instant) -> u32 {
        self.maybe_rotate(ts);

        let inner = &self.inner;
        let i = token_to_bucket(input_tokens, inner.config.input_buckets);
        let row = inner.summary.load_row(i as usize);
        if row == 0 {
            return self.cold_predict(input_tokens);
        }

        let cursor = inner.rng.lock().gen_range(0..row);
        let mut acc = 0;
        for j in 0..inner.config.output_buckets {
            let idx = cell_index(i, j, inner.config.output_buckets);
            acc += inner.summary.load_cell(idx);
            if cursor < acc {
                return 1u32 << j;
            }
        }
        // Unreachable on the happy path; guards against racing subtractions making the
        // row sum appear consumed before the loop finishes.
        1u32 << (inner.config.output_buckets - 1)
    }

    /// Number of slices currently counted as live, for tests and metrics.
    pub fn size(&self) -> i32 {
        self.inner.history.size()
    }

    fn cold_predict(&self, input_tokens: u32) -> u32 {
        let inner = &self.inner;
        match inner.config.cold_strategy {
            ColdStrategy::Optimistic => 1,
            ColdStrategy::Random => inner.rng.lock().gen_range(1..=inner.config.max_output_tokens()),
            ColdStrategy::Input => input_tokens.clamp(1, inner.config.max_output_tokens()),
            ColdStrategy::Pessimistic => inner.config.max_output_tokens(),
        }
    }

    /// Schedules a rotation if `ts` has crossed an interval boundary. In the default
    /// (non-deterministic) mode this spawns a dedicated rotation thread and yields once,
    /// so ingest stays cooperative and non-blocking; under `synchronous_rotation` (the
    /// test hook) it runs inline instead, guaranteeing the rotation completes before
    /// this call returns.
    fn maybe_rotate(&self, ts: Instant) {
        if !self.inner.history.needs_rotation(ts, self.inner.config.interval) {
            return;
        }

        if self.inner.config.synchronous_rotation {
            self.inner.history.rotate(ts, self.inner.config.interval, &self.inner.summary);
            return;
        }

        let already_running =
            self.inner.rotation_in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed).is_err();
        if !already_running {
            let inner = Arc::clone(&self.inner);
            thread::spawn(move || {
                inner.history.rotate(ts, inner.config.interval, &inner.summary);
                inner.rotation_in_flight.store(false, Ordering::Release);
            });
        }
        thread::yield_now();
    }
}
