//! TEMPEST Relay Wire Formats
//!
//! Frame encoders for the relay's two outbound protocols, plus the
//! monitor-side decode path for Meshtastic packets.
//!
//! # Wire Formats
//!
//! LoRaWAN unconfirmed uplink:
//!
//! ```text
//! MHDR(1) DevAddr(4 LE) FCtrl(1) FCnt(2 LE) FPort(1) FRMPayload(N) MIC(4)
//!                                                    └─ AES-CTR ─┘ └ CMAC ┘
//! ```
//!
//! Meshtastic packet:
//!
//! ```text
//! To(4 LE) From(4 LE) PacketID(4 LE) Flags(1) ChanHash(1) Rsvd(2) Payload(M)
//!                                                                 └ AES-CTR ┘
//! ```
//!
//! where the payload decrypts to the two-field micro-encoding
//! `{portnum: varint, payload: length-delimited bytes}`.
//!
//! Both builders take the plaintext payload by reference, encrypt a copy
//! in place inside the output buffer, and return frozen [`bytes::Bytes`].
//! Buffers never outlive the relay cycle that allocated them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod data;
pub mod errors;
pub mod lorawan;
pub mod mesh;

pub use errors::{ProtocolError, Result};
pub use lorawan::UplinkFrame;
pub use mesh::{MeshHeader, MeshPacket, open_text};
