//! Error type for store and builder operations.
//!
//! Only bounds and precondition failures are errors. "Nothing to do"
//! situations (negative `remove` index, absent map key on `remove`,
//! mutation after `dispose`) are silent no-ops and never produce one.

use thiserror::Error;

/// Errors raised by spark-dom.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Sequence index outside `[0, len)`.
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    /// `transform` on a key the map does not hold.
    #[error("key `{0}` is not present")]
    MissingKey(String),

    /// Element descriptor could not be parsed.
    #[error("malformed element descriptor `{descriptor}`: {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
