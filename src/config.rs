//! Predictor configuration: bucket bounds, rotation timing, and cold-start strategy.

use std::time::Duration;

use crate::bucketizer::bucket_count;
use crate::error::ConfigError;

/// Default rotation quantum, matching the reference default of ten seconds.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Default upper bound on predicted output tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Strategy used by `predict` when an input bucket has never been observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColdStrategy {
    /// Always predict a single output token. Cheap, profile-friendly default.
    #[default]
    Optimistic,
    /// Predict uniformly at random in `[1, max_output_tokens]`.
    Random,
    /// Predict the input token count itself, clamped to `[1, max_output_tokens]`.
    Input,
    /// Always predict `max_output_tokens`, the most conservative estimate.
    Pessimistic,
}

/// Validated, immutable configuration for a [`crate::Predictor`].
///
/// Build one with [`PredictorConfig::builder`], which returns a fallible
/// [`PredictorConfigBuilder`]; `Predictor::new` takes an already-validated config and
/// never fails.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    pub(crate) max_input_tokens: u32,
    pub(crate) max_output_tokens: u32,
    pub(crate) window: Duration,
    pub(crate) interval: Duration,
    pub(crate) cold_strategy: ColdStrategy,
    pub(crate) input_buckets: u32,
    pub(crate) output_buckets: u32,
    pub(crate) ring_capacity: usize,
    pub(crate) rng_seed: Option<u64>,
    pub(crate) synchronous_rotation: bool,
}

impl PredictorConfig {
    /// Starts building a config with the given token bounds and window; `interval`
    /// defaults to [`DEFAULT_INTERVAL`] and `cold_strategy` to `Optimistic`.
    pub fn builder(max_input_tokens: u32, max_output_tokens: u32, window: Duration) -> PredictorConfigBuilder {
        PredictorConfigBuilder {
            max_input_tokens,
            max_output_tokens,
            window,
            interval: DEFAULT_INTERVAL,
            cold_strategy: ColdStrategy::default(),
            rng_seed: None,
            synchronous_rotation: false,
        }
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub(crate) fn ring_capacity(&self) -> usize {
        self.ring_capacity
    }
}

/// Fallible builder for [`PredictorConfig`], in the usual fluent
/// `with_x(mut self, ...) -> Self` style.
#[derive(Debug, Clone)]
pub struct PredictorConfigBuilder {
    max_input_tokens: u32,
    max_output_tokens: u32,
    window: Duration,
    interval: Duration,
    cold_strategy: ColdStrategy,
    rng_seed: Option<u64>,
    synchronous_rotation: bool,
}

impl PredictorConfigBuilder {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cold_strategy(mut self, cold_strategy: ColdStrategy) -> Self {
        self.cold_strategy = cold_strategy;
        self
    }

    /// Seeds the predictor's internal RNG deterministically. Intended for tests; a
    /// production caller normally leaves this unset so the RNG draws from entropy.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Installs a test-hook barrier: rotation runs inline on the calling thread instead
    /// of on a scoped background thread, so a scheduled rotation is guaranteed complete
    /// before `add_trace_at`/`predict` return.
    pub fn with_synchronous_rotation(mut self, synchronous: bool) -> Self {
        self.synchronous_rotation = synchronous;
        self
    }

    pub fn build(self) -> Result<PredictorConfig, ConfigError> {
        if self.max_input_tokens == 0 {
            return Err(ConfigError::ZeroMaxInputTokens);
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::ZeroMaxOutputTokens);
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.window < self.interval {
            return Err(ConfigError::WindowShorterThanInterval {
                window_secs: self.window.as_secs(),
                interval_secs: self.interval.as_secs(),
            });
        }

        let input_buckets = bucket_count(self.max_input_tokens);
        let output_buckets = bucket_count(self.max_output_tokens);

        let whole_intervals = (self.window.as_nanos() / self.interval.as_nanos()) as usize;
        let remainder = self.window.as_nanos() % self.interval.as_nanos() > 0;
        let ring_capacity = whole_intervals + 1 + usize::from(remainder);

        Ok(PredictorConfig {
            max_input_tokens: self.max_input_tokens,
            max_output_tokens: self.max_output_tokens,
            window: self.window,
            interval: self.interval,
            cold_strategy: self.cold_strategy,
            input_buckets,
            output_buckets,
            ring_capacity,
            rng_seed: self.rng_seed,
            synchronous_rotation: self.synchronous_rotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_buckets_and_ring_capacity() {
        let config = PredictorConfig::builder(1024, 1024, Duration::from_secs(60))
            .with_interval(Duration::from_secs(10))
            .build()
            .unwrap();
        assert_eq!(config.input_buckets, 10);
        assert_eq!(config.output_buckets, 10);
        assert_eq!(config.ring_capacity, 7);
    }

    #[test]
    fn rejects_zero_bounds() {
        assert_eq!(
            PredictorConfig::builder(0, 1024, Duration::from_secs(60)).build().unwrap_err(),
            ConfigError::ZeroMaxInputTokens
        );
        assert_eq!(
            PredictorConfig::builder(1024, 0, Duration::from_secs(60)).build().unwrap_err(),
            ConfigError::ZeroMaxOutputTokens
        );
    }

    #[test]
    fn rejects_window_shorter_than_interval() {
        let err = PredictorConfig::builder(1024, 1024, Duration::from_secs(5))
            .with_interval(Duration::from_secs(10))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::WindowShorterThanInterval { window_secs: 5, interval_secs: 10 });
    }

    #[test]
    fn ring_capacity_adds_remainder_slot() {
        let config = PredictorConfig::builder(1024, 1024, Duration::from_secs(65))
            .with_interval(Duration::from_secs(10))
            .build()
            .unwrap();
        // 65 / 10 = 6 whole intervals, remainder 5s > 0 -> +1, plus the spare slot.
        assert_eq!(config.ring_capacity, 8);
    }
}
