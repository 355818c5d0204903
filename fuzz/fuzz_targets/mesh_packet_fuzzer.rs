//! Fuzz target for Meshtastic packet parsing and decryption.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary sequences through `MeshHeader::parse`
//! - Full open: arbitrary bytes and keys through `open_text` (parse,
//!   decrypt, strict two-field decode)
//!
//! # Invariants
//!
//! - Short input rejected with `Truncated`, never a panic or over-read
//! - Decryption of garbage never panics; the strict decoder rejects it
//! - Parsing completes in bounded time for any input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tempest_crypto::Aes128Key;
use tempest_proto::{MeshHeader, mesh, open_text};

#[derive(Debug, Arbitrary)]
struct Input {
    key: [u8; 16],
    packet: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let key = Aes128Key::from(input.key);

    match MeshHeader::parse(&input.packet) {
        Ok((header, payload)) => {
            assert!(input.packet.len() >= mesh::HEADER_LEN);
            assert_eq!(payload.len(), input.packet.len() - mesh::HEADER_LEN);
            assert!(header.hop_limit() <= 7);
            assert!(header.hop_start() <= 7);
        },
        Err(_) => assert!(input.packet.len() < mesh::HEADER_LEN),
    }

    // Must reject or decode cleanly, never panic.
    let _ = open_text(&key, &input.packet);
});
