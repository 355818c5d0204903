//! TEMPEST Relay Cryptographic Primitives
//!
//! Cryptographic building blocks for the TEMPEST→LoRaWAN/Meshtastic relay.
//! Pure functions with deterministic outputs; no I/O, no global state.
//!
//! # Key Usage
//!
//! Three independent 16-byte keys exist for the lifetime of the process,
//! each bound to exactly one construction:
//!
//! ```text
//! Network session key ──► CMAC ──► LoRaWAN frame MIC
//! App session key ──────► A_i counter blocks ──► LoRaWAN payload keystream
//! Mesh channel key ─────► incrementing nonce ──► Meshtastic payload keystream
//! ```
//!
//! No key is ever reused across the two keystream constructions with the
//! same counter/nonce space.
//!
//! # Security
//!
//! Encrypt-only AES:
//! - All usage is CTR mode or CMAC, both of which run the cipher forward
//! - No decrypt direction exists, halving the attack and audit surface
//!
//! CTR symmetry:
//! - XOR keystream application is its own inverse; receivers decrypt by
//!   re-running the identical operation with the matching nonce/counters
//!
//! Key hygiene:
//! - Keys and expanded round-key schedules are zeroized on drop
//! - CMAC subkeys are derived fresh per invocation and never cached

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aes;
pub mod cmac;
pub mod ctr;
pub mod keys;

pub use aes::{Aes128, BLOCK_SIZE};
pub use cmac::cmac;
pub use ctr::{Direction, apply_frame_ctr, apply_packet_ctr, packet_nonce};
pub use keys::{Aes128Key, KeyError};
