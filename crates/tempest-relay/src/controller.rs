//! Relay cycle controller.
//!
//! Sans-IO state machine driving one receive → encode → transmit(×2) →
//! resume-listening cycle. Events come from the runtime; the controller
//! returns the ordered radio actions to execute. It owns the three
//! rotating counters (LoRaWAN frame counter, Meshtastic packet
//! identifier, LoRaWAN channel index) and nothing else mutable.
//!
//! # Flow
//!
//! 1. **`ReceiveComplete`**: build the LoRaWAN uplink with the current
//!    frame counter and channel, build the Meshtastic packet with the
//!    next packet identifier, advance all counters, and emit
//!    configure/transmit pairs for both protocols followed by the
//!    return to the listening configuration.
//! 2. **`ReadFailed`**: skip both relay phases, consume no counter
//!    values, and resume listening.
//!
//! Counters advance when the frames are handed off for transmission; the
//! transmit outcome never rolls them back (fire-and-forget relay
//! semantics).

use bytes::Bytes;
use tempest_crypto::Aes128Key;
use tempest_proto::{MeshPacket, UplinkFrame, mesh};

use crate::{
    config::{LORAWAN_CHANNEL_COUNT, MESHTASTIC_TX, RadioConfig, TEMPEST_RX, lorawan_tx},
    error::RelayError,
    radio::ReceivedPacket,
};

/// The three provisioned keys, each bound to one construction.
#[derive(Clone)]
pub struct RelayKeys {
    /// LoRaWAN network session key (MIC computation).
    pub nwk_skey: Aes128Key,
    /// LoRaWAN application session key (payload keystream).
    pub app_skey: Aes128Key,
    /// Meshtastic channel key (payload keystream).
    pub mesh_key: Aes128Key,
}

/// Fixed identity of this relay on both networks.
#[derive(Debug, Clone, Copy)]
pub struct RelayIdentity {
    /// LoRaWAN device address (network-provisioned, ABP).
    pub dev_addr: u32,
    /// Meshtastic node identifier, the packet source address.
    pub node_id: u32,
}

/// Events the controller processes, produced by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    /// A packet was read out after a receive-complete notification.
    ReceiveComplete(ReceivedPacket),
    /// Reading the packet failed; the cycle is skipped.
    ReadFailed {
        /// Driver status code from the failed read.
        code: i16,
    },
}

/// Actions the controller emits, executed by the runtime in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RadioAction {
    /// Apply a radio parameter set.
    Configure(RadioConfig),
    /// Transmit one frame under the configuration applied last.
    Transmit(Bytes),
    /// Re-enter receive mode.
    StartReceive,
}

/// Controller state: keys, identity, and the rotating counters.
pub struct RelayController {
    keys: RelayKeys,
    identity: RelayIdentity,
    fcnt: u16,
    packet_id: u32,
    channel_index: u8,
    relayed: u64,
}

impl RelayController {
    /// Controller with counters at their boot values (frame counter 0,
    /// packet identifier 1, channel index 0).
    pub fn new(keys: RelayKeys, identity: RelayIdentity) -> Self {
        Self::with_counters(keys, identity, 0, 1, 0)
    }

    /// Controller with explicit initial counters.
    ///
    /// Lets tests start at wrap boundaries or mid-ring.
    pub fn with_counters(
        keys: RelayKeys,
        identity: RelayIdentity,
        fcnt: u16,
        packet_id: u32,
        channel_index: u8,
    ) -> Self {
        Self {
            keys,
            identity,
            fcnt,
            packet_id,
            channel_index: channel_index % LORAWAN_CHANNEL_COUNT,
            relayed: 0,
        }
    }

    /// Current LoRaWAN frame counter (next uplink's value).
    pub fn fcnt(&self) -> u16 {
        self.fcnt
    }

    /// Next packet identifier to be allocated.
    pub fn packet_id(&self) -> u32 {
        self.packet_id
    }

    /// Current LoRaWAN channel index (next uplink's channel).
    pub fn channel_index(&self) -> u8 {
        self.channel_index
    }

    /// Cycles relayed since construction.
    pub fn relayed(&self) -> u64 {
        self.relayed
    }

    /// Process one event into the ordered actions for the runtime.
    ///
    /// # Errors
    ///
    /// - `RelayError::Frame` if the received payload violates a builder
    ///   precondition (oversize); no counter value is consumed
    pub fn handle_event(&mut self, event: RadioEvent) -> Result<Vec<RadioAction>, RelayError> {
        match event {
            RadioEvent::ReceiveComplete(packet) => self.relay(&packet),
            RadioEvent::ReadFailed { .. } => Ok(self.listen_actions()),
        }
    }

    /// One full relay cycle for a received packet.
    fn relay(&mut self, packet: &ReceivedPacket) -> Result<Vec<RadioAction>, RelayError> {
        // Build both frames before touching any counter, so a
        // precondition failure consumes nothing.
        let uplink = UplinkFrame {
            dev_addr: self.identity.dev_addr,
            fcnt: self.fcnt,
            payload: &packet.bytes,
        }
        .encode(&self.keys.nwk_skey, &self.keys.app_skey)?;

        let mesh_packet = MeshPacket {
            to: mesh::BROADCAST_ADDR,
            from: self.identity.node_id,
            packet_id: self.packet_id,
            payload: &packet.bytes,
        }
        .encode(&self.keys.mesh_key)?;

        let lorawan_config = lorawan_tx(self.channel_index);

        // Hand-off is the commit point: the counters advance now,
        // whatever the transmit outcome turns out to be.
        self.fcnt = self.fcnt.wrapping_add(1);
        self.channel_index = (self.channel_index + 1) % LORAWAN_CHANNEL_COUNT;
        self.packet_id = self.packet_id.wrapping_add(1);
        self.relayed += 1;

        let mut actions = vec![
            RadioAction::Configure(lorawan_config),
            RadioAction::Transmit(uplink),
            RadioAction::Configure(MESHTASTIC_TX),
            RadioAction::Transmit(mesh_packet),
        ];
        actions.extend(self.listen_actions());
        Ok(actions)
    }

    /// Actions returning the radio to the TEMPEST listening phase.
    pub(crate) fn listen_actions(&self) -> Vec<RadioAction> {
        vec![RadioAction::Configure(TEMPEST_RX), RadioAction::StartReceive]
    }
}

#[cfg(test)]
mod tests {
    use tempest_proto::ProtocolError;

    use super::*;

    fn test_keys() -> RelayKeys {
        RelayKeys {
            nwk_skey: Aes128Key::from([0x11u8; 16]),
            app_skey: Aes128Key::from([0x22u8; 16]),
            mesh_key: Aes128Key::from([0x33u8; 16]),
        }
    }

    fn test_identity() -> RelayIdentity {
        RelayIdentity { dev_addr: 0x0099_AABB, node_id: 0x27C8_2356 }
    }

    fn received(bytes: &[u8]) -> RadioEvent {
        RadioEvent::ReceiveComplete(ReceivedPacket {
            bytes: Bytes::copy_from_slice(bytes),
            rssi: -80.0,
            snr: 9.5,
        })
    }

    fn controller() -> RelayController {
        RelayController::new(test_keys(), test_identity())
    }

    #[test]
    fn cycle_emits_both_transmits_then_resumes_listening() {
        let mut controller = controller();
        let actions = controller.handle_event(received(b"Hi")).unwrap();

        assert_eq!(actions.len(), 6);
        assert_eq!(actions[0], RadioAction::Configure(lorawan_tx(0)));
        assert!(matches!(actions[1], RadioAction::Transmit(_)));
        assert_eq!(actions[2], RadioAction::Configure(MESHTASTIC_TX));
        assert!(matches!(actions[3], RadioAction::Transmit(_)));
        assert_eq!(actions[4], RadioAction::Configure(TEMPEST_RX));
        assert_eq!(actions[5], RadioAction::StartReceive);
    }

    #[test]
    fn counters_advance_once_per_cycle() {
        let mut controller = controller();
        controller.handle_event(received(b"a")).unwrap();
        controller.handle_event(received(b"b")).unwrap();

        assert_eq!(controller.fcnt(), 2);
        assert_eq!(controller.packet_id(), 3); // started at 1
        assert_eq!(controller.channel_index(), 2);
        assert_eq!(controller.relayed(), 2);
    }

    #[test]
    fn channel_index_cycles_through_all_eight() {
        let mut controller = controller();
        let mut seen = Vec::new();
        for _ in 0..9 {
            seen.push(controller.channel_index());
            controller.handle_event(received(b"x")).unwrap();
        }
        assert_eq!(seen, [0, 1, 2, 3, 4, 5, 6, 7, 0]);
    }

    #[test]
    fn fcnt_wraps_silently() {
        let mut controller =
            RelayController::with_counters(test_keys(), test_identity(), u16::MAX, 1, 0);
        controller.handle_event(received(b"x")).unwrap();
        assert_eq!(controller.fcnt(), 0);
    }

    #[test]
    fn packet_id_wraps_silently() {
        let mut controller =
            RelayController::with_counters(test_keys(), test_identity(), 0, u32::MAX, 0);
        controller.handle_event(received(b"x")).unwrap();
        assert_eq!(controller.packet_id(), 0);
    }

    #[test]
    fn read_failure_skips_relay_and_preserves_counters() {
        let mut controller = controller();
        let actions = controller.handle_event(RadioEvent::ReadFailed { code: -6 }).unwrap();

        assert_eq!(
            actions,
            vec![RadioAction::Configure(TEMPEST_RX), RadioAction::StartReceive]
        );
        assert_eq!(controller.fcnt(), 0);
        assert_eq!(controller.packet_id(), 1);
        assert_eq!(controller.channel_index(), 0);
        assert_eq!(controller.relayed(), 0);
    }

    #[test]
    fn oversize_payload_aborts_without_consuming_counters() {
        let mut controller = controller();
        let oversize = vec![0u8; mesh::MAX_TEXT_PAYLOAD + 1];
        let result = controller.handle_event(received(&oversize));

        assert!(matches!(result, Err(RelayError::Frame(ProtocolError::PayloadTooLarge { .. }))));
        assert_eq!(controller.fcnt(), 0);
        assert_eq!(controller.packet_id(), 1);
        assert_eq!(controller.channel_index(), 0);
    }

    #[test]
    fn uplink_uses_pre_advance_counters() {
        let mut controller =
            RelayController::with_counters(test_keys(), test_identity(), 7, 40, 5);
        let actions = controller.handle_event(received(b"Hi")).unwrap();

        // The frame on the wire carries FCnt 7 on channel 5; the packet
        // identifier consumed is 40.
        assert_eq!(actions[0], RadioAction::Configure(lorawan_tx(5)));
        let RadioAction::Transmit(frame) = &actions[1] else {
            unreachable!("second action is the uplink transmit");
        };
        assert_eq!(&frame[6..8], &7u16.to_le_bytes());

        let RadioAction::Transmit(packet) = &actions[3] else {
            unreachable!("fourth action is the mesh transmit");
        };
        assert_eq!(&packet[8..12], &40u32.to_le_bytes());

        assert_eq!(controller.fcnt(), 8);
        assert_eq!(controller.packet_id(), 41);
        assert_eq!(controller.channel_index(), 6);
    }

    #[test]
    fn with_counters_reduces_channel_index() {
        let controller =
            RelayController::with_counters(test_keys(), test_identity(), 0, 1, 11);
        assert_eq!(controller.channel_index(), 3);
    }
}
