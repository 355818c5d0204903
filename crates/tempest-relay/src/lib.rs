//! TEMPEST → LoRaWAN / Meshtastic Relay Core
//!
//! Listens for frames under the TEMPEST LoRa configuration and relays
//! each one onto two independently-encrypted networks: a LoRaWAN
//! unconfirmed uplink (channel-hopping across the US915 sub-band-2 ring)
//! and a broadcast Meshtastic text message.
//!
//! # Architecture
//!
//! - **Sans-IO controller**: [`RelayController`] turns radio events into
//!   ordered radio actions without performing I/O itself
//! - **Runtime**: [`RelayRuntime`] executes those actions against a
//!   [`Radio`] implementation (hardware driver or simulation)
//! - **Single-slot signaling**: [`ReceiveSignal`] coalesces
//!   receive-complete notifications, one outstanding at most
//!
//! One cycle runs receive → encode → transmit(LoRaWAN) →
//! transmit(Meshtastic) → resume listening, unconditionally and without
//! retries. Frame building and cryptography live in `tempest-proto` and
//! `tempest-crypto`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod controller;
pub mod error;
pub mod radio;
pub mod runtime;
pub mod signal;

pub use config::{MESHTASTIC_TX, RadioConfig, TEMPEST_RX, lorawan_tx};
pub use controller::{RadioAction, RadioEvent, RelayController, RelayIdentity, RelayKeys};
pub use error::RelayError;
pub use radio::{Radio, RadioError, ReceivedPacket};
pub use runtime::{CycleOutcome, RelayRuntime};
pub use signal::ReceiveSignal;
