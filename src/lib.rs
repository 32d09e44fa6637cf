//! Online output-length predictor for LLM serving.
//!
//! Given the input-token count of an incoming request, [`Predictor`] predicts how many
//! output tokens it will generate. The prediction is built from a sliding-window
//! streaming histogram over `(input-bucket, output-bucket)` pairs: a fixed-capacity ring
//! buffer of per-interval slices feeds a running summary, and predictions draw a
//! weighted random sample from the summary row for the request's input bucket in
//! `O(output_buckets)` time.
//!
//! # Key features
//!
//! - Wait-free ingest: `add_trace` only ever takes the reader side of a single
//!   `RwLock` and performs relaxed atomic adds; it never blocks on rotation.
//! - Rotation excises expired intervals cooperatively from a dedicated thread, one ring
//!   position at a time, so sparse traffic doesn't need one slice per idle interval.
//! - Four cold-start strategies for input buckets with no history yet.
//!
//! # Example
//!
//! ```
//! use output_length_predictor::{ColdStrategy, Predictor, PredictorConfig};
//! use std::time::Duration;
//!
//! let config = PredictorConfig::builder(1024, 1024, Duration::from_secs(60))
//!     .with_cold_strategy(ColdStrategy::Optimistic)
//!     .build()
//!     .unwrap();
//! let predictor = Predictor::new(config);
//!
//! predictor.add_trace(200, 400, 1);
//! let predicted = predictor.predict(200);
//! assert!(predicted >= 1);
//! ```

mod bucketizer;
mod config;
mod error;
mod history;
mod invariants;
mod layout;
mod predictor;
mod slice;
mod summary;

pub use config::{ColdStrategy, PredictorConfig, PredictorConfigBuilder, DEFAULT_INTERVAL, DEFAULT_MAX_OUTPUT_TOKENS};
pub use error::ConfigError;
pub use predictor::Predictor;
