//! Meshtastic packet builder and monitor-side decoder.
//!
//! A packet is a 16-byte routing header followed by the encrypted
//! two-field `Data` encoding of the relayed text. The header travels in
//! the clear; only the payload is encrypted, with the mesh channel key
//! and the simple incrementing-nonce keystream seeded from the packet and
//! sender identifiers.
//!
//! Packet integrity is the receiver's concern: the mesh side carries no
//! MIC, matching the upstream protocol design.

use bytes::{BufMut, Bytes, BytesMut};
use tempest_crypto::{Aes128Key, apply_packet_ctr};

use crate::{
    data,
    errors::{ProtocolError, Result},
};

/// Broadcast destination address.
pub const BROADCAST_ADDR: u32 = 0xFFFF_FFFF;

/// Routing header length: to(4) + from(4) + id(4) + flags(1) +
/// channel hash(1) + two reserved bytes.
pub const HEADER_LEN: usize = 16;

/// Flags byte: `hop_start` 3 (bits 5-7) and `hop_limit` 3 (bits 0-2).
pub const FLAGS_HOP3: u8 = 0x63;

/// Channel hash for the default channel, precomputed offline from the
/// channel name and key. A different target channel needs this recomputed
/// with the same hash procedure.
pub const CHANNEL_HASH_DEFAULT: u8 = 0x08;

/// Port number for plain text messages.
pub const PORT_TEXT_MESSAGE: u32 = 1;

/// Largest text payload that still fits a 255-byte radio frame after the
/// 16-byte header and up to 5 bytes of `Data` framing.
pub const MAX_TEXT_PAYLOAD: usize = 234;

/// A Meshtastic packet awaiting encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPacket<'a> {
    /// Destination node, usually [`BROADCAST_ADDR`].
    pub to: u32,
    /// Originating node identifier.
    pub from: u32,
    /// Packet identifier; also seeds the payload keystream nonce.
    pub packet_id: u32,
    /// Text payload (the relayed bytes, unmodified).
    pub payload: &'a [u8],
}

impl MeshPacket<'_> {
    /// Total encoded packet length for a payload of `payload_len` bytes.
    pub fn encoded_len(payload_len: usize) -> usize {
        HEADER_LEN + data::encoded_len(PORT_TEXT_MESSAGE, payload_len)
    }

    /// Encode the packet, encrypting the `Data` payload in place.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if the payload exceeds [`MAX_TEXT_PAYLOAD`]
    pub fn encode(&self, mesh_key: &Aes128Key) -> Result<Bytes> {
        if self.payload.len() > MAX_TEXT_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_TEXT_PAYLOAD,
            });
        }

        let mut buf = BytesMut::with_capacity(Self::encoded_len(self.payload.len()));
        buf.put_u32_le(self.to);
        buf.put_u32_le(self.from);
        buf.put_u32_le(self.packet_id);
        buf.put_u8(FLAGS_HOP3);
        buf.put_u8(CHANNEL_HASH_DEFAULT);
        // next_hop / relay_node, unused by this relay
        buf.put_u8(0x00);
        buf.put_u8(0x00);

        data::encode_data(PORT_TEXT_MESSAGE, self.payload, &mut buf);
        apply_packet_ctr(mesh_key, self.packet_id, self.from, &mut buf[HEADER_LEN..]);

        debug_assert_eq!(buf.len(), Self::encoded_len(self.payload.len()));
        Ok(buf.freeze())
    }
}

/// Parsed routing header of a received packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHeader {
    /// Destination node.
    pub to: u32,
    /// Originating node.
    pub from: u32,
    /// Packet identifier.
    pub packet_id: u32,
    /// Hop accounting byte.
    pub flags: u8,
    /// Channel hash byte.
    pub channel_hash: u8,
}

impl MeshHeader {
    /// Remaining hop budget, from the low three flag bits.
    pub fn hop_limit(&self) -> u8 {
        self.flags & 0x07
    }

    /// Hop budget the packet started with, from the high three flag bits.
    pub fn hop_start(&self) -> u8 {
        (self.flags >> 5) & 0x07
    }

    /// Split a raw packet into its header and the encrypted payload.
    ///
    /// # Errors
    ///
    /// - `Truncated` if fewer than [`HEADER_LEN`] bytes are present
    pub fn parse(packet: &[u8]) -> Result<(Self, &[u8])> {
        if packet.len() < HEADER_LEN {
            return Err(ProtocolError::Truncated { expected: HEADER_LEN, actual: packet.len() });
        }

        let word = |i: usize| {
            let mut arr = [0u8; 4];
            arr.copy_from_slice(&packet[i..i + 4]);
            u32::from_le_bytes(arr)
        };

        let header = Self {
            to: word(0),
            from: word(4),
            packet_id: word(8),
            flags: packet[12],
            channel_hash: packet[13],
        };
        Ok((header, &packet[HEADER_LEN..]))
    }
}

/// Decrypt and decode a received packet down to its text payload.
///
/// The monitor-side counterpart of [`MeshPacket::encode`]: parse the
/// header, re-run the symmetric keystream with the header's identifiers,
/// and decode the two-field `Data` message.
///
/// # Errors
///
/// - `Truncated` / `UnexpectedTag` / `VarintOverflow` if the packet is
///   malformed or was encrypted under a different key
pub fn open_text(mesh_key: &Aes128Key, packet: &[u8]) -> Result<(MeshHeader, u32, Vec<u8>)> {
    let (header, encrypted) = MeshHeader::parse(packet)?;

    let mut plain = encrypted.to_vec();
    apply_packet_ctr(mesh_key, header.packet_id, header.from, &mut plain);

    let (portnum, payload) = data::decode_data(&plain)?;
    Ok((header, portnum, payload.to_vec()))
}
