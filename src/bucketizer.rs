//! Deterministic mapping between token counts and small integer bucket indices.

/// Number of buckets needed to cover token counts in `1..=max_tokens`, using a
/// rounded base-2 logarithm scale. Equivalent to `ceil(log2(max_tokens))` but computed
/// with integer bit-counting to avoid floating-point edge cases at exact powers of two.
pub(crate) fn bucket_count(max_tokens: u32) -> u32 {
    if max_tokens <= 1 {
        1
    } else {
        32 - (max_tokens - 1).leading_zeros()
    }
}

/// Maps a token count to a bucket index in `0..limit`.
///
/// `n == 0` collapses into bucket `0` alongside `n == 1` (both round to `log2 == 0`).
/// Any `n` whose natural bucket would exceed `limit - 1` is clamped into the top bucket,
/// so the predictor stays correct even when a caller's token counts exceed the configured
/// maxima.
pub(crate) fn token_to_bucket(n: u32, limit: u32) -> u32 {
    let b = if n == 0 { 0 } else { (n as f64).log2().round() as u32 };
    b.min(limit.saturating_sub(1))
}
