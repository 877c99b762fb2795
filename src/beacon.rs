//! Transmit context (Core 1).
//!
//! Each cycle: snapshot the latest fix, encode it, transmit, then sleep
//! the broadcast interval. The sleep is the only rate limit on the link.
//! Every `health_every` cycles a link health line summarizes the fault
//! record.

use crate::clock::Clock;
use crate::config::BroadcastConfig;
use crate::logging::DiagStream;
use crate::radio::{RadioError, RadioHal, RadioTransmitter};
use crate::store::SharedFixStore;
use crate::telemetry::TelemetryFrame;
use crate::{diag_info, diag_warn};

pub struct Broadcaster<'a, H: RadioHal, C: Clock> {
    store: &'a SharedFixStore,
    radio: RadioTransmitter<'a, H, C>,
    config: BroadcastConfig,
    log: &'a DiagStream,
    sequence: u16,
    last_generation: u32,
    cycles: u32,
}

impl<'a, H: RadioHal, C: Clock> Broadcaster<'a, H, C> {
    pub fn new(
        store: &'a SharedFixStore,
        radio: RadioTransmitter<'a, H, C>,
        config: BroadcastConfig,
        log: &'a DiagStream,
    ) -> Self {
        Self {
            store,
            radio,
            config,
            log,
            sequence: 0,
            last_generation: 0,
            cycles: 0,
        }
    }

    /// Snapshot, encode and transmit one frame.
    ///
    /// The sequence counter advances on every call, successful or not.
    pub fn broadcast(&mut self) -> Result<TelemetryFrame, RadioError> {
        let (fix, generation) = self.store.snapshot_with_generation();
        if generation != 0 && generation == self.last_generation {
            diag_warn!(self.log, self.radio.clock().now_us(), "[TX] No new fix since last frame");
        }
        self.last_generation = generation;

        self.sequence = self.sequence.wrapping_add(1);
        let frame = TelemetryFrame::encode(&fix, self.sequence);

        self.radio.send(frame.as_bytes())?;

        diag_info!(
            self.log,
            self.radio.clock().now_us(),
            "[TX] #{} sent | fix={} sats={} | total {}",
            self.sequence,
            fix.raw.fix_valid as u8,
            fix.raw.satellites,
            self.radio.completed()
        );
        Ok(frame)
    }

    /// `broadcast`, then sleep the configured interval.
    ///
    /// Failures are already logged and recorded in the fault state; the
    /// next cycle simply tries again.
    pub fn cycle(&mut self) -> Result<TelemetryFrame, RadioError> {
        let result = self.broadcast();

        self.cycles = self.cycles.wrapping_add(1);
        let every = self.config.health_every;
        if every != 0 && self.cycles % every == 0 {
            self.report_health();
        }

        let interval = self.config.interval_ms;
        self.radio.clock_mut().delay_ms(interval);
        result
    }

    fn report_health(&self) {
        let faults = self.radio.faults();
        let now_us = self.radio.clock().now_us();
        let sent = self.radio.completed();
        let attempts = self.radio.attempts();
        if faults.is_active() {
            diag_warn!(self.log, now_us, "[TX] link {} | sent {}/{}", faults, sent, attempts);
        } else {
            diag_info!(self.log, now_us, "[TX] link {} | sent {}/{}", faults, sent, attempts);
        }
    }

    #[inline]
    pub fn radio(&self) -> &RadioTransmitter<'a, H, C> {
        &self.radio
    }

    #[inline]
    pub fn radio_mut(&mut self) -> &mut RadioTransmitter<'a, H, C> {
        &mut self.radio
    }

    /// Counter carried by the last frame.
    #[inline]
    pub fn sequence(&self) -> u16 {
        self.sequence
    }
}
