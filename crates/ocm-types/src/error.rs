//! Error types for wire decoding

use thiserror::Error;

/// Errors raised while decoding enumerations from their wire codes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid job state code: {0}")]
    InvalidJobState(u8),
}
