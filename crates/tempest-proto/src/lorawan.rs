//! LoRaWAN unconfirmed uplink frame builder.
//!
//! Assembles `MHDR || DevAddr || FCtrl || FCnt || FPort || FRMPayload ||
//! MIC`. The payload is encrypted in place with the application session
//! key's counter-block keystream; the MIC is the first four bytes of the
//! CMAC (network session key) over the `B0` preamble block concatenated
//! with the frame built so far.
//!
//! Only "unconfirmed data up" exists here. Downlinks, confirmed traffic,
//! MAC commands, and frame options are the network's concern, not the
//! relay's.

use bytes::{BufMut, Bytes, BytesMut};
use tempest_crypto::{Aes128Key, Direction, apply_frame_ctr, cmac};

use crate::errors::{ProtocolError, Result};

/// MHDR for unconfirmed data up, LoRaWAN R1.
pub const MHDR_UNCONFIRMED_UP: u8 = 0x40;

/// FCtrl with no ADR, no ACK, and no frame options.
pub const FCTRL_NONE: u8 = 0x00;

/// FPort carrying application data.
pub const FPORT_APP: u8 = 0x01;

/// Bytes of the CMAC tag appended as the MIC.
pub const MIC_LEN: usize = 4;

/// MHDR + DevAddr + FCtrl + FCnt + FPort.
pub const HEADER_LEN: usize = 9;

/// Fixed header byte of the MIC preamble block.
const B0_HEADER: u8 = 0x49;

/// Largest FRMPayload a single 255-byte radio frame can carry once the
/// 9-byte header and 4-byte MIC are accounted for. Callers must reject or
/// truncate above this before building.
pub const MAX_FRM_PAYLOAD: usize = 242;

/// An unconfirmed uplink awaiting encoding.
///
/// `fcnt` is the low 16 bits of the frame counter; the upper bits are
/// zero both on the wire and inside the keystream and MIC computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UplinkFrame<'a> {
    /// Device address, a fixed network-provisioning constant.
    pub dev_addr: u32,
    /// Frame counter for this transmission.
    pub fcnt: u16,
    /// Application payload (the relayed bytes, unmodified).
    pub payload: &'a [u8],
}

impl UplinkFrame<'_> {
    /// Total encoded frame length for a payload of `payload_len` bytes.
    pub const fn encoded_len(payload_len: usize) -> usize {
        HEADER_LEN + payload_len + MIC_LEN
    }

    /// Encode the frame, encrypting the payload and appending the MIC.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if the payload exceeds [`MAX_FRM_PAYLOAD`]
    pub fn encode(&self, nwk_skey: &Aes128Key, app_skey: &Aes128Key) -> Result<Bytes> {
        if self.payload.len() > MAX_FRM_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_FRM_PAYLOAD,
            });
        }

        let mut buf = BytesMut::with_capacity(Self::encoded_len(self.payload.len()));
        buf.put_u8(MHDR_UNCONFIRMED_UP);
        buf.put_u32_le(self.dev_addr);
        buf.put_u8(FCTRL_NONE);
        buf.put_u16_le(self.fcnt);
        buf.put_u8(FPORT_APP);

        buf.put_slice(self.payload);
        apply_frame_ctr(
            app_skey,
            Direction::Uplink,
            self.dev_addr,
            u32::from(self.fcnt),
            &mut buf[HEADER_LEN..],
        );

        let mic = self.mic(nwk_skey, &buf);
        buf.put_slice(&mic);

        debug_assert_eq!(buf.len(), Self::encoded_len(self.payload.len()));
        Ok(buf.freeze())
    }

    /// CMAC over `B0 || frame`, truncated to the four MIC bytes.
    fn mic(&self, nwk_skey: &Aes128Key, frame: &[u8]) -> [u8; MIC_LEN] {
        let mut input = Vec::with_capacity(16 + frame.len());
        input.extend_from_slice(&self.b0_block(frame.len()));
        input.extend_from_slice(frame);

        let tag = cmac(nwk_skey, &input);
        [tag[0], tag[1], tag[2], tag[3]]
    }

    /// The 16-byte MIC preamble: `0x49 || 0x00*4 || Dir || DevAddr(LE) ||
    /// FCnt(2 LE) || 0x00*2 || 0x00 || len`.
    fn b0_block(&self, frame_len: usize) -> [u8; 16] {
        let mut b0 = [0u8; 16];
        b0[0] = B0_HEADER;
        b0[5] = Direction::Uplink as u8;
        b0[6..10].copy_from_slice(&self.dev_addr.to_le_bytes());
        b0[10..12].copy_from_slice(&self.fcnt.to_le_bytes());
        b0[15] = frame_len as u8;
        b0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nwk_key() -> Aes128Key {
        Aes128Key::from([0x11u8; 16])
    }

    fn app_key() -> Aes128Key {
        Aes128Key::from([0x22u8; 16])
    }

    #[test]
    fn header_fields_in_order() {
        let frame = UplinkFrame { dev_addr: 0x0403_0201, fcnt: 0x1234, payload: b"Hi" }
            .encode(&nwk_key(), &app_key())
            .unwrap();

        assert_eq!(frame[0], MHDR_UNCONFIRMED_UP);
        assert_eq!(&frame[1..5], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(frame[5], FCTRL_NONE);
        assert_eq!(&frame[6..8], &[0x34, 0x12]);
        assert_eq!(frame[8], FPORT_APP);
        assert_eq!(frame.len(), UplinkFrame::encoded_len(2));
    }

    #[test]
    fn payload_decrypts_back() {
        let frame = UplinkFrame { dev_addr: 7, fcnt: 42, payload: b"sensor reading" }
            .encode(&nwk_key(), &app_key())
            .unwrap();

        let mut body = frame[HEADER_LEN..frame.len() - MIC_LEN].to_vec();
        apply_frame_ctr(&app_key(), Direction::Uplink, 7, 42, &mut body);
        assert_eq!(body, b"sensor reading");
    }

    #[test]
    fn mic_matches_recomputation() {
        let uplink = UplinkFrame { dev_addr: 9, fcnt: 3, payload: b"abc" };
        let frame = uplink.encode(&nwk_key(), &app_key()).unwrap();

        let body = &frame[..frame.len() - MIC_LEN];
        let mut input = uplink.b0_block(body.len()).to_vec();
        input.extend_from_slice(body);
        let tag = cmac(&nwk_key(), &input);

        assert_eq!(&frame[frame.len() - MIC_LEN..], &tag[..MIC_LEN]);
    }

    #[test]
    fn mic_covers_the_payload() {
        let a = UplinkFrame { dev_addr: 1, fcnt: 0, payload: b"aa" }
            .encode(&nwk_key(), &app_key())
            .unwrap();
        let b = UplinkFrame { dev_addr: 1, fcnt: 0, payload: b"ab" }
            .encode(&nwk_key(), &app_key())
            .unwrap();
        assert_ne!(&a[a.len() - MIC_LEN..], &b[b.len() - MIC_LEN..]);
    }

    #[test]
    fn empty_payload_is_a_valid_frame() {
        let frame =
            UplinkFrame { dev_addr: 1, fcnt: 1, payload: &[] }.encode(&nwk_key(), &app_key()).unwrap();
        assert_eq!(frame.len(), HEADER_LEN + MIC_LEN);
    }

    #[test]
    fn oversize_payload_rejected() {
        let payload = [0u8; MAX_FRM_PAYLOAD + 1];
        let result =
            UplinkFrame { dev_addr: 1, fcnt: 0, payload: &payload }.encode(&nwk_key(), &app_key());
        assert_eq!(
            result,
            Err(ProtocolError::PayloadTooLarge { size: MAX_FRM_PAYLOAD + 1, max: MAX_FRM_PAYLOAD })
        );
    }

    #[test]
    fn max_payload_accepted() {
        let payload = [0xA5u8; MAX_FRM_PAYLOAD];
        let frame =
            UplinkFrame { dev_addr: 1, fcnt: 0, payload: &payload }.encode(&nwk_key(), &app_key()).unwrap();
        assert_eq!(frame.len(), 255);
    }

    #[test]
    fn b0_length_byte_tracks_frame() {
        let uplink = UplinkFrame { dev_addr: 0, fcnt: 0, payload: b"xyz" };
        let b0 = uplink.b0_block(12);
        assert_eq!(b0[0], 0x49);
        assert_eq!(b0[15], 12);
        assert_eq!(&b0[1..6], &[0; 5]);
    }
}
