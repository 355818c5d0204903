//! Fuzz target for the two-field `Data` micro-decoding.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary sequences through the strict decoder
//! - Round-trip: encode arbitrary (portnum, payload), decode, compare
//!
//! # Invariants
//!
//! - Decoding arbitrary bytes returns a result, never panics
//! - Claimed payload lengths past the buffer are rejected, not read
//! - Encode→decode is the identity for every (portnum, payload)

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tempest_proto::data::{decode_data, encode_data, encoded_len};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(Vec<u8>),
    RoundTrip { portnum: u32, payload: Vec<u8> },
}

fuzz_target!(|input: Input| {
    match input {
        Input::Raw(bytes) => {
            if let Ok((_, payload)) = decode_data(&bytes) {
                assert!(payload.len() <= bytes.len());
            }
        },
        Input::RoundTrip { portnum, payload } => {
            let mut buf = Vec::new();
            encode_data(portnum, &payload, &mut buf);
            assert_eq!(buf.len(), encoded_len(portnum, payload.len()));

            let (decoded_port, decoded_payload) =
                decode_data(&buf).expect("self-encoded data decodes");
            assert_eq!(decoded_port, portnum);
            assert_eq!(decoded_payload, payload);
        },
    }
});
