//! Errors raised by the job/transport layer itself.
//!
//! Per §7's taxonomy, transport errors are propagated unchanged and never
//! retried here; format errors (deserialization mismatch or truncation)
//! abort the round. Crypto-verification and structural errors belong to
//! higher layers and are not constructed here.

use thiserror::Error;

/// Error surfaced by a [`Delivery`](crate::transport::Delivery) implementation.
#[derive(Debug, Error)]
pub enum TransportError<E> {
    #[error("send failed")]
    Send(#[source] E),
    #[error("receive failed")]
    Receive(#[source] E),
    #[error("transport cancelled")]
    Cancelled,
    #[error("received message from unexpected party")]
    UnexpectedSender,
    #[error("peer sent a message out of round order")]
    OutOfOrder,
}

/// Deserialization/framing error: truncated payload, wrong length prefix,
/// or a missing slot in a non-uniform message bundle.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("payload truncated: expected at least {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("length prefix {0} exceeds configured maximum")]
    LengthPrefixTooLarge(u64),
    #[error("expected a message for party {0} but slot was empty")]
    MissingSlot(u16),
    #[error("trailing bytes after parsing expected fields")]
    TrailingBytes,
}

/// Error returned by job/message-layer operations, generic over the
/// underlying transport's own error type.
#[derive(Debug, Error)]
pub enum JobError<E> {
    #[error(transparent)]
    Transport(#[from] TransportError<E>),
    #[error(transparent)]
    Format(#[from] FormatError),
}
