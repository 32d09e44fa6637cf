use thiserror::Error;

/// Errors that can occur while building a [`crate::PredictorConfig`].
///
/// All variants are construction-time only; once a `Predictor` exists, `add_trace`,
/// `add_trace_at`, and `predict` never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_input_tokens` was zero.
    #[error("max_input_tokens must be positive")]
    ZeroMaxInputTokens,

    /// `max_output_tokens` was zero.
    #[error("max_output_tokens must be positive")]
    ZeroMaxOutputTokens,

    /// `window` was zero.
    #[error("window must be positive")]
    ZeroWindow,

    /// `interval` was zero.
    #[error("interval must be positive")]
    ZeroInterval,

    /// `window` was shorter than `interval`, which would make the ring degenerate
    /// (a single interval could never become live before being retired).
    #[error("window ({window_secs}s) must be at least as long as interval ({interval_secs}s)")]
    WindowShorterThanInterval {
        /// The configured window, in seconds, for the error message.
        window_secs: u64,
        /// The configured interval, in seconds, for the error message.
        interval_secs: u64,
    },
}
