pub mod lexicon;
pub mod segment;
pub mod sentence;
pub mod step;

pub use lexicon::*;
pub use segment::*;
pub use sentence::*;
pub use step::*;

use thiserror::Error;

/// Configuration rejected at pipeline construction, before any transcript is
/// processed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} weights must sum to 1.0, got {sum:.3}")]
    WeightSum { name: &'static str, sum: f64 },

    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{0}")]
    Invalid(String),
}
