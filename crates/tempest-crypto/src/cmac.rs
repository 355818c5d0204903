//! AES-CMAC, RFC 4493.
//!
//! Produces the 16-byte tag the LoRaWAN frame builder truncates into a
//! MIC. Truncation policy lives with the caller; this module always
//! returns the full tag.
//!
//! Subkeys K1 and K2 are derived fresh on every invocation from the given
//! key and never cached across calls.

use crate::{
    aes::{Aes128, BLOCK_SIZE},
    keys::Aes128Key,
};

/// XOR of the irreducible polynomial into the low byte after a shifted-out
/// high bit (RFC 4493 §2.3).
const SUBKEY_POLY: u8 = 0x87;

/// Compute the CMAC tag of `message` under `key`.
///
/// Handles any message length, including empty: an empty message is a
/// single 0x80-padded block folded with K2.
pub fn cmac(key: &Aes128Key, message: &[u8]) -> [u8; BLOCK_SIZE] {
    let cipher = Aes128::new(key);

    let l = cipher.encrypt_block([0u8; BLOCK_SIZE]);
    let k1 = left_shift_subkey(l);
    let k2 = left_shift_subkey(k1);

    let blocks = message.len().div_ceil(BLOCK_SIZE).max(1);
    let last_complete = !message.is_empty() && message.len() % BLOCK_SIZE == 0;

    let mut x = [0u8; BLOCK_SIZE];
    for i in 0..blocks {
        let start = i * BLOCK_SIZE;
        let mut m = [0u8; BLOCK_SIZE];

        if i + 1 < blocks {
            m.copy_from_slice(&message[start..start + BLOCK_SIZE]);
        } else {
            let rest = &message[start..];
            m[..rest.len()].copy_from_slice(rest);
            if last_complete {
                xor_in_place(&mut m, &k1);
            } else {
                m[rest.len()] = 0x80;
                xor_in_place(&mut m, &k2);
            }
        }

        xor_in_place(&mut x, &m);
        x = cipher.encrypt_block(x);
    }

    x
}

/// One subkey derivation step: shift left one bit, fold the polynomial in
/// if the vacated top bit was set.
fn left_shift_subkey(block: [u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    let mut carry = 0;
    for i in (0..BLOCK_SIZE).rev() {
        out[i] = (block[i] << 1) | carry;
        carry = block[i] >> 7;
    }
    if block[0] & 0x80 != 0 {
        out[BLOCK_SIZE - 1] ^= SUBKEY_POLY;
    }
    out
}

fn xor_in_place(dst: &mut [u8; BLOCK_SIZE], src: &[u8; BLOCK_SIZE]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}
