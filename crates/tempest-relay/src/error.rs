//! Error types for the relay core.

use thiserror::Error;

use crate::radio::RadioError;

/// Errors that abort a relay cycle or the runtime's bring-up.
///
/// A frame error means a caller precondition was violated (oversize
/// payload); the cycle is abandoned without consuming counter values and
/// the runtime resumes listening. A radio error surfaces only from
/// bring-up; in-cycle transmit failures are logged and never retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// Frame encoding failed.
    #[error("frame encoding failed: {0}")]
    Frame(#[from] tempest_proto::ProtocolError),

    /// A radio operation failed during bring-up.
    #[error(transparent)]
    Radio(#[from] RadioError),
}
