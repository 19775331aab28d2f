//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::AggregateId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, stock rules). Infrastructure concerns belong elsewhere.
///
/// Stock-rule variants carry enough detail (item, lot, shortfall) for a caller
/// to drive a manual retry/skip decision without re-querying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. concurrent mutation of the same row).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Requested quantity exceeds the eligible layer remainder.
    /// The caller decides whether to retry or skip.
    #[error(
        "insufficient stock for item {item_id} at {location_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        item_id: AggregateId,
        location_id: AggregateId,
        requested: Decimal,
        available: Decimal,
    },

    /// A quarantined or expired lot was targeted by a stock mutation.
    /// Not retryable without unblocking the lot first.
    #[error("lot {lot_id} is blocked ({status})")]
    LotBlocked { lot_id: AggregateId, status: String },

    /// A mutation would drive a lot's remaining quantity negative.
    /// Always a bug in the caller, never silently clamped.
    #[error("negative stock on lot {lot_id}: remaining would be {resulting}")]
    NegativeStock {
        lot_id: AggregateId,
        resulting: Decimal,
    },

    /// No direct or single-reverse conversion edge between two units.
    /// A configuration gap, surfaced to the caller.
    #[error("no conversion from {from} to {to}")]
    ConversionNotFound { from: String, to: String },

    /// A state-machine transition was attempted from the wrong state.
    #[error("invalid state: cannot {attempted} from {current}")]
    InvalidState { current: String, attempted: String },

    /// An idempotency key collided with an already-recorded operation.
    #[error("duplicate operation: {0}")]
    DuplicateOperation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        Self::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateOperation(msg.into())
    }

    /// Whether this error is a business-rule failure that a depletion records
    /// as FAILED (recoverable via retry/skip), as opposed to an invariant
    /// violation that aborts the whole operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientStock { .. }
                | Self::LotBlocked { .. }
                | Self::ConversionNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_stock_reports_shortfall_detail() {
        let err = DomainError::InsufficientStock {
            item_id: AggregateId::new(),
            location_id: AggregateId::new(),
            requested: dec!(7),
            available: dec!(4.5),
        };
        let msg = err.to_string();
        assert!(msg.contains("requested 7"));
        assert!(msg.contains("available 4.5"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn negative_stock_is_not_recoverable() {
        let err = DomainError::NegativeStock {
            lot_id: AggregateId::new(),
            resulting: dec!(-1),
        };
        assert!(!err.is_recoverable());
    }
}
