//! Key material for the relay's three symmetric constructions.

use thiserror::Error;
use zeroize::Zeroize;

/// Errors from key construction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Key material has the wrong length (must be exactly 16 bytes).
    #[error("invalid key length: expected 16 bytes, got {actual}")]
    InvalidLength {
        /// Length of the rejected key material
        actual: usize,
    },
}

/// A 128-bit AES key.
///
/// Immutable for the lifetime of the process. The relay holds three of
/// these (network session key, application session key, mesh channel key),
/// each used only by its designated construction.
#[derive(Clone, PartialEq, Eq)]
pub struct Aes128Key([u8; 16]);

impl Aes128Key {
    /// Size of the key in bytes.
    pub const SIZE: usize = 16;

    /// Key bytes, for handing to the cipher.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl From<[u8; 16]> for Aes128Key {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Aes128Key {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 16] =
            bytes.try_into().map_err(|_| KeyError::InvalidLength { actual: bytes.len() })?;
        Ok(Self(arr))
    }
}

// Key bytes never appear in logs or panic messages.
impl core::fmt::Debug for Aes128Key {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Aes128Key(..)")
    }
}

impl Drop for Aes128Key {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_array() {
        let key = Aes128Key::from([0x42u8; 16]);
        assert_eq!(key.as_bytes(), &[0x42u8; 16]);
    }

    #[test]
    fn key_from_slice_roundtrip() {
        let bytes = [7u8; 16];
        let key = Aes128Key::try_from(&bytes[..]).unwrap();
        assert_eq!(key.as_bytes(), &bytes);
    }

    #[test]
    fn short_slice_rejected() {
        let result = Aes128Key::try_from(&[0u8; 15][..]);
        assert_eq!(result.unwrap_err(), KeyError::InvalidLength { actual: 15 });
    }

    #[test]
    fn long_slice_rejected() {
        let result = Aes128Key::try_from(&[0u8; 32][..]);
        assert_eq!(result.unwrap_err(), KeyError::InvalidLength { actual: 32 });
    }

    #[test]
    fn debug_does_not_leak_key_bytes() {
        let key = Aes128Key::from([0xAAu8; 16]);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("170"));
        assert!(!rendered.to_lowercase().contains("aa"));
    }
}
