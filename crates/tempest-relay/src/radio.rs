//! The radio collaborator seam.
//!
//! The core never touches hardware. It hands the collaborator a
//! [`RadioConfig`](crate::config::RadioConfig) before each phase and byte
//! buffers to transmit; the collaborator hands back received bytes with
//! their link metrics. Implementations wrap a real transceiver driver or
//! a simulation.

use bytes::Bytes;
use thiserror::Error;

use crate::config::RadioConfig;

/// One reception delivered by the radio collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPacket {
    /// Raw received bytes.
    pub bytes: Bytes,
    /// Received signal strength, dBm.
    pub rssi: f32,
    /// Signal-to-noise ratio, dB.
    pub snr: f32,
}

/// A failed radio operation, carrying the driver's integer status code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("radio {op} failed with code {code}")]
pub struct RadioError {
    /// Which operation failed.
    pub op: &'static str,
    /// Driver status code.
    pub code: i16,
}

impl RadioError {
    /// Build an error for the named operation.
    pub fn new(op: &'static str, code: i16) -> Self {
        Self { op, code }
    }
}

/// Abstraction over the physical transceiver.
///
/// All methods are synchronous; the driver's own timeouts and retries (if
/// any) are its concern. The core never retries a failed transmit.
pub trait Radio {
    /// Apply a parameter set before the next receive or transmit phase.
    fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError>;

    /// Enter receive mode under the currently applied configuration.
    fn start_receive(&mut self) -> Result<(), RadioError>;

    /// Transmit one frame under the currently applied configuration.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError>;

    /// Read out the packet behind a receive-complete notification.
    fn read(&mut self) -> Result<ReceivedPacket, RadioError>;
}
