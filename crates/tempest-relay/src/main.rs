//! Relay simulation binary.
//!
//! Feeds scripted TEMPEST receptions through full relay cycles against a
//! simulated radio and logs every frame that would go over the air,
//! decoding its own Meshtastic transmissions back to text the way the
//! bench monitor does. Useful for eyeballing wire formats and counter
//! behavior without hardware.
//!
//! # Usage
//!
//! ```bash
//! # Relay two messages with the default (development) keys
//! tempest-relay --message "Hi" --message "second frame"
//!
//! # Provisioned keys and identifiers
//! tempest-relay --dev-addr 260b1f2a --nwk-skey <32 hex> --app-skey <32 hex>
//! ```

use clap::Parser;
use tempest_crypto::Aes128Key;
use tempest_proto::{mesh, open_text};
use tempest_relay::{
    CycleOutcome, Radio, RadioConfig, RadioError, ReceivedPacket, RelayController, RelayIdentity,
    RelayKeys, RelayRuntime, ReceiveSignal, config,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Meshtastic default channel key (PSK #1, "AQ==").
const DEFAULT_MESH_KEY: [u8; 16] = [
    0xd4, 0xf1, 0xbb, 0x3a, 0x20, 0x29, 0x07, 0x59, 0xf0, 0xbc, 0xff, 0xab, 0xcf, 0x4e, 0x69, 0x01,
];

/// TEMPEST relay simulator
#[derive(Parser, Debug)]
#[command(name = "tempest-relay")]
#[command(about = "Simulate TEMPEST->LoRaWAN/Meshtastic relay cycles")]
#[command(version)]
struct Args {
    /// Message(s) to feed through the relay, one cycle each
    #[arg(short, long, default_value = "Hi")]
    message: Vec<String>,

    /// Meshtastic node identifier (hex)
    #[arg(long, default_value = "27c82356", value_parser = parse_u32_hex)]
    node_id: u32,

    /// LoRaWAN device address (hex)
    #[arg(long, default_value = "00000000", value_parser = parse_u32_hex)]
    dev_addr: u32,

    /// LoRaWAN network session key (32 hex chars)
    #[arg(long, default_value = "00000000000000000000000000000000", value_parser = parse_key)]
    nwk_skey: Aes128Key,

    /// LoRaWAN application session key (32 hex chars)
    #[arg(long, default_value = "00000000000000000000000000000000", value_parser = parse_key)]
    app_skey: Aes128Key,

    /// Meshtastic channel key (32 hex chars), defaults to the default
    /// channel key
    #[arg(long, value_parser = parse_key)]
    mesh_key: Option<Aes128Key>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_u32_hex(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|err| err.to_string())
}

fn parse_key(s: &str) -> Result<Aes128Key, String> {
    let bytes = hex::decode(s).map_err(|err| err.to_string())?;
    Aes128Key::try_from(bytes.as_slice()).map_err(|err| err.to_string())
}

/// Scripted radio: receptions come from the message list, transmissions
/// go to the log.
struct SimRadio {
    script: Vec<ReceivedPacket>,
    next: usize,
    active: Option<RadioConfig>,
    mesh_key: Aes128Key,
    signal: ReceiveSignal,
}

impl SimRadio {
    fn new(messages: &[String], mesh_key: Aes128Key, signal: ReceiveSignal) -> Self {
        let script = messages
            .iter()
            .map(|m| ReceivedPacket {
                bytes: m.clone().into_bytes().into(),
                rssi: -82.5,
                snr: 8.75,
            })
            .collect();
        Self { script, next: 0, active: None, mesh_key, signal }
    }
}

impl Radio for SimRadio {
    fn configure(&mut self, radio_config: &RadioConfig) -> Result<(), RadioError> {
        tracing::debug!(
            frequency_mhz = radio_config.frequency_mhz,
            bandwidth_khz = radio_config.bandwidth_khz,
            spreading_factor = radio_config.spreading_factor,
            "configure"
        );
        self.active = Some(*radio_config);
        Ok(())
    }

    fn start_receive(&mut self) -> Result<(), RadioError> {
        // The next scripted reception is immediately "in the air".
        if self.next < self.script.len() {
            self.signal.notify();
        }
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        let sync_word = self.active.map_or(0, |c| c.sync_word);
        match sync_word {
            config::SYNC_WORD_LORAWAN => {
                tracing::info!(len = frame.len(), "lorawan uplink: {}", hex::encode(frame));
            },
            config::SYNC_WORD_MESHTASTIC => {
                tracing::info!(len = frame.len(), "meshtastic packet: {}", hex::encode(frame));
                match open_text(&self.mesh_key, frame) {
                    Ok((header, portnum, payload)) if portnum == mesh::PORT_TEXT_MESSAGE => {
                        tracing::info!(
                            packet_id = header.packet_id,
                            "decoded own transmission from !{:08x}: {}",
                            header.from,
                            String::from_utf8_lossy(&payload)
                        );
                    },
                    Ok((_, portnum, _)) => tracing::info!(portnum, "decoded non-text port"),
                    Err(err) => tracing::warn!(%err, "could not decode own transmission"),
                }
            },
            other => tracing::warn!(sync_word = other, "transmit under unexpected sync word"),
        }
        Ok(())
    }

    fn read(&mut self) -> Result<ReceivedPacket, RadioError> {
        let packet = self.script.get(self.next).cloned().ok_or(RadioError::new("read", -1))?;
        self.next += 1;
        Ok(packet)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(cycles = args.message.len(), "TEMPEST relay simulation starting");

    let keys = RelayKeys {
        nwk_skey: args.nwk_skey,
        app_skey: args.app_skey,
        mesh_key: args.mesh_key.unwrap_or_else(|| Aes128Key::from(DEFAULT_MESH_KEY)),
    };
    let identity = RelayIdentity { dev_addr: args.dev_addr, node_id: args.node_id };

    let signal = ReceiveSignal::new();
    let radio = SimRadio::new(&args.message, keys.mesh_key.clone(), signal.clone());
    let controller = RelayController::new(keys, identity);
    let mut runtime = RelayRuntime::with_signal(controller, radio, signal.clone());

    runtime.start()?;

    let cycles = args.message.len();
    for cycle in 0..cycles {
        if !signal.is_pending() {
            tracing::warn!(cycle, "no reception pending, stopping early");
            break;
        }
        match runtime.poll()? {
            CycleOutcome::Relayed => tracing::info!(cycle, "cycle complete"),
            CycleOutcome::ReadFailed => tracing::warn!(cycle, "cycle skipped on read failure"),
            CycleOutcome::Idle => {},
        }
    }

    tracing::info!(
        relayed = runtime.controller().relayed(),
        fcnt = runtime.controller().fcnt(),
        next_packet_id = runtime.controller().packet_id(),
        "simulation finished"
    );

    Ok(())
}
