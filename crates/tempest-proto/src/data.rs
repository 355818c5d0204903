//! Two-field micro-encoding for the Meshtastic application payload.
//!
//! A minimal protobuf-compatible `Data` message carrying exactly two
//! fields: the port number (field 1, varint) and the raw payload bytes
//! (field 2, length-delimited). Varints are 7 payload bits per byte,
//! continuation bit set on all but the final byte, least-significant
//! group first.
//!
//! The decoder is strict: it accepts only the shape this encoder
//! produces, failing fast on any other tag (the relay never parses
//! foreign message types).

use bytes::BufMut;

use crate::errors::{ProtocolError, Result};

/// Field 1, wire type 0 (varint): the port number.
pub const TAG_PORTNUM: u8 = 0x08;

/// Field 2, wire type 2 (length-delimited): the payload bytes.
pub const TAG_PAYLOAD: u8 = 0x12;

/// Append the encoded `Data` message to `dst`.
pub fn encode_data(portnum: u32, payload: &[u8], dst: &mut impl BufMut) {
    dst.put_u8(TAG_PORTNUM);
    put_varint(dst, u64::from(portnum));
    dst.put_u8(TAG_PAYLOAD);
    put_varint(dst, payload.len() as u64);
    dst.put_slice(payload);
}

/// Exact byte length `encode_data` will produce.
pub fn encoded_len(portnum: u32, payload_len: usize) -> usize {
    2 + varint_len(u64::from(portnum)) + varint_len(payload_len as u64) + payload_len
}

/// Parse an encoded `Data` message back into (portnum, payload).
///
/// # Errors
///
/// - `UnexpectedTag` if either field tag differs from the two defined ones
/// - `Truncated` if the buffer ends inside a field
/// - `VarintOverflow` if a varint exceeds 64 bits
pub fn decode_data(bytes: &[u8]) -> Result<(u32, &[u8])> {
    let mut pos = 0;

    expect_tag(bytes, &mut pos, TAG_PORTNUM)?;
    let portnum = get_varint(bytes, &mut pos)?;

    expect_tag(bytes, &mut pos, TAG_PAYLOAD)?;
    let len = get_varint(bytes, &mut pos)? as usize;

    let end = pos.checked_add(len).ok_or(ProtocolError::VarintOverflow)?;
    let payload = bytes.get(pos..end).ok_or(ProtocolError::Truncated {
        expected: end,
        actual: bytes.len(),
    })?;

    Ok((portnum as u32, payload))
}

/// Append `value` as a varint.
pub(crate) fn put_varint(dst: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        dst.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Number of bytes `put_varint` emits for `value`.
pub(crate) fn varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

fn expect_tag(bytes: &[u8], pos: &mut usize, tag: u8) -> Result<()> {
    let byte = *bytes.get(*pos).ok_or(ProtocolError::Truncated {
        expected: *pos + 1,
        actual: bytes.len(),
    })?;
    if byte != tag {
        return Err(ProtocolError::UnexpectedTag { tag: byte, offset: *pos });
    }
    *pos += 1;
    Ok(())
}

fn get_varint(bytes: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *bytes.get(*pos).ok_or(ProtocolError::Truncated {
            expected: *pos + 1,
            actual: bytes.len(),
        })?;
        *pos += 1;

        if shift >= 64 || (shift == 63 && byte > 1) {
            return Err(ProtocolError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7F) << shift;

        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn varint_bytes(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        put_varint(&mut buf, value);
        buf
    }

    #[test]
    fn varint_single_byte_values() {
        assert_eq!(varint_bytes(0), [0x00]);
        assert_eq!(varint_bytes(1), [0x01]);
        assert_eq!(varint_bytes(127), [0x7F]);
    }

    #[test]
    fn varint_multi_byte_values() {
        assert_eq!(varint_bytes(128), [0x80, 0x01]);
        assert_eq!(varint_bytes(300), [0xAC, 0x02]);
        assert_eq!(varint_bytes(u64::MAX), [0xFF; 9].iter().copied().chain([0x01]).collect::<Vec<_>>());
    }

    #[test]
    fn varint_len_matches_encoding() {
        for value in [0, 1, 127, 128, 300, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            assert_eq!(varint_len(value), varint_bytes(value).len(), "value {value}");
        }
    }

    #[test]
    fn encode_text_message() {
        let mut buf = Vec::new();
        encode_data(1, b"Hi", &mut buf);
        assert_eq!(buf, [0x08, 0x01, 0x12, 0x02, b'H', b'i']);
    }

    #[test]
    fn encoded_len_matches_encoder() {
        let mut buf = Vec::new();
        encode_data(300, &[0u8; 200], &mut buf);
        assert_eq!(buf.len(), encoded_len(300, 200));
    }

    #[test]
    fn decode_rejects_wrong_first_tag() {
        let result = decode_data(&[0x10, 0x01]);
        assert_eq!(result, Err(ProtocolError::UnexpectedTag { tag: 0x10, offset: 0 }));
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        // Claims 5 payload bytes, provides 2.
        let result = decode_data(&[0x08, 0x01, 0x12, 0x05, b'H', b'i']);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(matches!(decode_data(&[]), Err(ProtocolError::Truncated { .. })));
    }

    #[test]
    fn decode_rejects_oversized_varint() {
        // Eleven continuation bytes run past 64 bits.
        let mut bytes = vec![0x08];
        bytes.extend([0xFF; 10]);
        bytes.push(0x7F);
        assert_eq!(decode_data(&bytes), Err(ProtocolError::VarintOverflow));
    }

    proptest! {
        #[test]
        fn data_round_trip(
            portnum in any::<u32>(),
            payload in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let mut buf = Vec::new();
            encode_data(portnum, &payload, &mut buf);
            prop_assert_eq!(buf.len(), encoded_len(portnum, payload.len()));

            let (decoded_port, decoded_payload) = decode_data(&buf).unwrap();
            prop_assert_eq!(decoded_port, portnum);
            prop_assert_eq!(decoded_payload, &payload[..]);
        }

        #[test]
        fn decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode_data(&bytes);
        }
    }
}
