//! CTR-mode keystream generation.
//!
//! Two constructions, both XOR streams of AES-encrypted counter blocks
//! into data of arbitrary length (the final partial block uses only the
//! matching number of keystream bytes):
//!
//! - the simple incrementing-nonce scheme used for Meshtastic payloads,
//!   where the whole 16-byte nonce advances as one big-endian integer
//! - the LoRaWAN `A_i` counter-block scheme, where each block is rebuilt
//!   from (direction, device address, frame counter, block index)
//!
//! Both are symmetric: applying the same operation twice with identical
//! parameters restores the plaintext. No separate decrypt path exists
//! because the relay only ever encrypts uplinks.

use crate::{
    aes::{Aes128, BLOCK_SIZE},
    keys::Aes128Key,
};

/// LoRaWAN frame direction, encoded into the `A_i` counter blocks and the
/// MIC preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    /// Device to network. The only direction this relay transmits.
    Uplink = 0,
    /// Network to device. Unused here; kept for the wire constant.
    Downlink = 1,
}

/// Build the initial 16-byte nonce for the simple CTR scheme.
///
/// Layout: packet id (4 bytes LE) at offset 0, zeros at 4..8, sender id
/// (4 bytes LE) at offset 8, zeros at 12..16.
pub fn packet_nonce(packet_id: u32, sender_id: u32) -> [u8; BLOCK_SIZE] {
    let mut nonce = [0u8; BLOCK_SIZE];
    nonce[..4].copy_from_slice(&packet_id.to_le_bytes());
    nonce[8..12].copy_from_slice(&sender_id.to_le_bytes());
    nonce
}

/// XOR the simple incrementing-nonce keystream into `data`, in place.
///
/// The nonce is built from the packet and sender identifiers, then
/// advanced as a single 128-bit big-endian integer between blocks (carry
/// propagates from byte 15 toward byte 0).
pub fn apply_packet_ctr(key: &Aes128Key, packet_id: u32, sender_id: u32, data: &mut [u8]) {
    let cipher = Aes128::new(key);
    let mut counter = packet_nonce(packet_id, sender_id);

    for chunk in data.chunks_mut(BLOCK_SIZE) {
        let keystream = cipher.encrypt_block(counter);
        for (byte, k) in chunk.iter_mut().zip(keystream) {
            *byte ^= k;
        }
        increment(&mut counter);
    }
}

/// XOR the LoRaWAN counter-block keystream into `data`, in place.
///
/// For block index i = 1.., the counter block is
/// `0x01 || 0x00*4 || dir || dev_addr(4 LE) || fcnt(4 LE) || 0x00 || i`.
/// The 16-bit frame counter is carried in the low half of the 4-byte
/// field; the upper 16 bits stay zero.
pub fn apply_frame_ctr(
    key: &Aes128Key,
    direction: Direction,
    dev_addr: u32,
    fcnt: u32,
    data: &mut [u8],
) {
    // Block index is a single byte; one radio frame never comes close.
    debug_assert!(data.len() <= 255 * BLOCK_SIZE);

    let cipher = Aes128::new(key);

    for (index, chunk) in data.chunks_mut(BLOCK_SIZE).enumerate() {
        let block = counter_block(direction, dev_addr, fcnt, (index + 1) as u8);
        let keystream = cipher.encrypt_block(block);
        for (byte, k) in chunk.iter_mut().zip(keystream) {
            *byte ^= k;
        }
    }
}

fn counter_block(direction: Direction, dev_addr: u32, fcnt: u32, index: u8) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block[0] = 0x01;
    block[5] = direction as u8;
    block[6..10].copy_from_slice(&dev_addr.to_le_bytes());
    block[10..14].copy_from_slice(&fcnt.to_le_bytes());
    block[15] = index;
    block
}

/// Advance a 128-bit big-endian counter by one.
fn increment(counter: &mut [u8; BLOCK_SIZE]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn test_key() -> Aes128Key {
        let mut key = [0u8; 16];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        Aes128Key::from(key)
    }

    #[test]
    fn packet_nonce_layout() {
        let nonce = packet_nonce(0x0403_0201, 0x0807_0605);
        assert_eq!(&nonce[..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&nonce[4..8], &[0; 4]);
        assert_eq!(&nonce[8..12], &[0x05, 0x06, 0x07, 0x08]);
        assert_eq!(&nonce[12..], &[0; 4]);
    }

    #[test]
    fn counter_block_layout() {
        let block = counter_block(Direction::Uplink, 0x0403_0201, 7, 3);
        assert_eq!(block[0], 0x01);
        assert_eq!(&block[1..5], &[0; 4]);
        assert_eq!(block[5], 0);
        assert_eq!(&block[6..10], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&block[10..14], &[0x07, 0x00, 0x00, 0x00]);
        assert_eq!(block[14], 0x00);
        assert_eq!(block[15], 3);
    }

    #[test]
    fn downlink_direction_changes_keystream() {
        let key = test_key();
        let mut up = [0u8; 16];
        let mut down = [0u8; 16];
        apply_frame_ctr(&key, Direction::Uplink, 1, 0, &mut up);
        apply_frame_ctr(&key, Direction::Downlink, 1, 0, &mut down);
        assert_ne!(up, down);
    }

    #[test]
    fn increment_carries_through_trailing_ff() {
        let mut counter = [0u8; 16];
        counter[14] = 0x01;
        counter[15] = 0xFF;
        increment(&mut counter);
        assert_eq!(counter[14], 0x02);
        assert_eq!(counter[15], 0x00);
    }

    #[test]
    fn increment_wraps_all_ones() {
        let mut counter = [0xFFu8; 16];
        increment(&mut counter);
        assert_eq!(counter, [0u8; 16]);
    }

    #[test]
    fn consecutive_blocks_use_distinct_keystream() {
        let key = test_key();
        let mut data = [0u8; 32];
        apply_packet_ctr(&key, 1, 2, &mut data);
        assert_ne!(&data[..16], &data[16..], "keystream blocks must differ");
    }

    #[test]
    fn partial_final_block() {
        let key = test_key();
        let mut long = [0u8; 20];
        let mut short = [0u8; 17];
        apply_packet_ctr(&key, 9, 9, &mut long);
        apply_packet_ctr(&key, 9, 9, &mut short);
        // A shorter message is a strict prefix of the same keystream.
        assert_eq!(&long[..17], &short[..]);
    }

    #[test]
    fn different_packet_ids_different_ciphertext() {
        let key = test_key();
        let mut a = *b"identical plain!";
        let mut b = *b"identical plain!";
        apply_packet_ctr(&key, 1, 7, &mut a);
        apply_packet_ctr(&key, 2, 7, &mut b);
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn packet_ctr_is_its_own_inverse(
            data in prop::collection::vec(any::<u8>(), 0..96),
            packet_id in any::<u32>(),
            sender in any::<u32>(),
        ) {
            let key = test_key();
            let mut buf = data.clone();
            apply_packet_ctr(&key, packet_id, sender, &mut buf);
            apply_packet_ctr(&key, packet_id, sender, &mut buf);
            prop_assert_eq!(buf, data);
        }

        #[test]
        fn frame_ctr_is_its_own_inverse(
            data in prop::collection::vec(any::<u8>(), 0..96),
            dev_addr in any::<u32>(),
            fcnt in any::<u16>(),
        ) {
            let key = test_key();
            let mut buf = data.clone();
            apply_frame_ctr(&key, Direction::Uplink, dev_addr, u32::from(fcnt), &mut buf);
            apply_frame_ctr(&key, Direction::Uplink, dev_addr, u32::from(fcnt), &mut buf);
            prop_assert_eq!(buf, data);
        }
    }
}
