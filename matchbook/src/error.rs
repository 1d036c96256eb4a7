use thiserror::Error;

/// Admission-time failures. The engine never mutates state before
/// validation passes, so every variant leaves the book untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown side: {0}")]
    UnknownSide(String),

    #[error("unknown order type: {0}")]
    UnknownOrderType(String),

    #[error("unknown interval: {0}")]
    UnknownInterval(String),

    #[error("order quantity must be positive, got {0}")]
    InvalidQuantity(f64),

    #[error("limit orders require a positive price")]
    MissingPrice,

    #[error("market orders must not carry a price")]
    UnexpectedPrice,
}
