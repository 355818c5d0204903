//! Runtime loop executing controller actions against a radio.
//!
//! The runtime owns the radio exclusively: it drains the single-slot
//! receive signal, reads the packet out, feeds the controller, and
//! executes the returned actions in order. Transmit and reconfiguration
//! failures are logged and never retried; a failed cycle still ends with
//! the radio back in the listening configuration.

use crate::{
    config::TEMPEST_RX,
    controller::{RadioAction, RadioEvent, RelayController},
    error::RelayError,
    radio::Radio,
    signal::ReceiveSignal,
};

/// What one `poll` call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No reception pending.
    Idle,
    /// A packet was relayed onto both networks.
    Relayed,
    /// The pending reception could not be read; relay phases skipped.
    ReadFailed,
}

/// Drives a [`RelayController`] against a [`Radio`] implementation.
pub struct RelayRuntime<R: Radio> {
    controller: RelayController,
    radio: R,
    signal: ReceiveSignal,
}

impl<R: Radio> RelayRuntime<R> {
    /// Pair a controller with a radio. The returned runtime starts with
    /// an empty receive signal; call [`start`](Self::start) to enter the
    /// listening phase.
    pub fn new(controller: RelayController, radio: R) -> Self {
        Self::with_signal(controller, radio, ReceiveSignal::new())
    }

    /// Pair a controller with a radio sharing an existing signal slot,
    /// for radios that were handed their interrupt-side clone up front.
    pub fn with_signal(controller: RelayController, radio: R, signal: ReceiveSignal) -> Self {
        Self { controller, radio, signal }
    }

    /// Handle for the radio's interrupt context to signal completions.
    pub fn signal(&self) -> ReceiveSignal {
        self.signal.clone()
    }

    /// Counter state, for status reporting.
    pub fn controller(&self) -> &RelayController {
        &self.controller
    }

    /// Tear down the runtime and hand the radio back, for simulations
    /// that inspect what was transmitted.
    pub fn into_radio(self) -> R {
        self.radio
    }

    /// Configure the listening phase and enter receive mode.
    ///
    /// # Errors
    ///
    /// - `RelayError::Radio` if bring-up fails; unlike in-cycle failures
    ///   this is not swallowed, there is nothing to fall back to
    pub fn start(&mut self) -> Result<(), RelayError> {
        self.radio.configure(&TEMPEST_RX)?;
        self.radio.start_receive()?;
        tracing::info!(
            frequency_mhz = TEMPEST_RX.frequency_mhz,
            bandwidth_khz = TEMPEST_RX.bandwidth_khz,
            spreading_factor = TEMPEST_RX.spreading_factor,
            "listening"
        );
        Ok(())
    }

    /// Run one iteration: drain the signal, process at most one cycle.
    ///
    /// # Errors
    ///
    /// - `RelayError::Frame` if the received payload violates a builder
    ///   precondition; the radio is returned to listening first
    pub fn poll(&mut self) -> Result<CycleOutcome, RelayError> {
        if !self.signal.take() {
            return Ok(CycleOutcome::Idle);
        }

        let (event, outcome) = match self.radio.read() {
            Ok(packet) => {
                tracing::info!(
                    len = packet.bytes.len(),
                    rssi = packet.rssi,
                    snr = packet.snr,
                    "received packet"
                );
                (RadioEvent::ReceiveComplete(packet), CycleOutcome::Relayed)
            },
            Err(err) => {
                tracing::warn!(code = err.code, "read failed, skipping relay");
                (RadioEvent::ReadFailed { code: err.code }, CycleOutcome::ReadFailed)
            },
        };

        match self.controller.handle_event(event) {
            Ok(actions) => {
                self.execute(actions);
                Ok(outcome)
            },
            Err(err) => {
                tracing::error!(%err, "relay cycle aborted");
                self.execute(self.controller.listen_actions());
                Err(err)
            },
        }
    }

    /// Execute actions in order, logging failures without retrying.
    fn execute(&mut self, actions: Vec<RadioAction>) {
        for action in actions {
            match action {
                RadioAction::Configure(config) => {
                    if let Err(err) = self.radio.configure(&config) {
                        tracing::warn!(%err, frequency_mhz = config.frequency_mhz, "configure failed");
                    }
                },
                RadioAction::Transmit(frame) => match self.radio.transmit(&frame) {
                    Ok(()) => tracing::debug!(len = frame.len(), "transmitted"),
                    Err(err) => tracing::warn!(%err, len = frame.len(), "transmit failed, no retry"),
                },
                RadioAction::StartReceive => {
                    if let Err(err) = self.radio.start_receive() {
                        tracing::warn!(%err, "start receive failed");
                    }
                },
            }
        }
    }
}
