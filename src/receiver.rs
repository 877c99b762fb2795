//! Positioning receiver bring-up.
//!
//! The receiver powers up at its factory rate (9600) unless a previous
//! session already switched it. Listen at the target rate first; if no
//! sentence start shows up, fall back, send the baud switch, and return.
//! Output selection and fix rate are then sent unconditionally. The
//! receiver never acknowledges, so each command is repeated.

use core::fmt;

use crate::acquisition::ByteSource;
use crate::clock::Clock;
use crate::config::{
    ReceiverConfig, PMTK_SET_BAUD_57600, PMTK_SET_OUTPUT_RMC_GGA, PMTK_SET_RATE_5HZ,
};
use crate::logging::DiagStream;
use crate::nmea::SENTINEL;
use crate::{diag_info, diag_warn};

/// Receiver UART: non-blocking reads plus rate control and writes.
pub trait SerialPort: ByteSource {
    type Error: fmt::Debug;

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error>;

    /// Blocking write of the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Bring-up phase, reported on failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupStep {
    FallbackBaud,
    BaudCommand,
    TargetBaud,
    OutputCommand,
    RateCommand,
}

impl SetupStep {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupStep::FallbackBaud => "set fallback baud",
            SetupStep::BaudCommand => "send baud switch",
            SetupStep::TargetBaud => "set target baud",
            SetupStep::OutputCommand => "send output selection",
            SetupStep::RateCommand => "send fix rate",
        }
    }
}

/// A UART operation failed during bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupError<E> {
    pub step: SetupStep,
    pub source: E,
}

impl<E: fmt::Debug> fmt::Display for SetupError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "receiver setup: {} failed: {:?}", self.step.as_str(), self.source)
    }
}

/// How the receiver was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Sentences were already arriving at the target rate.
    AlreadySynced,
    /// The fallback sequence was run.
    Reconfigured,
}

pub struct ReceiverSetup<'a> {
    config: ReceiverConfig,
    log: &'a DiagStream,
}

impl<'a> ReceiverSetup<'a> {
    pub fn new(config: ReceiverConfig, log: &'a DiagStream) -> Self {
        Self { config, log }
    }

    /// Run the full bring-up. The port is expected to be open at
    /// `target_baud` already.
    pub fn run<P, C>(&self, port: &mut P, clock: &mut C) -> Result<SyncOutcome, SetupError<P::Error>>
    where
        P: SerialPort + ?Sized,
        C: Clock + ?Sized,
    {
        diag_info!(self.log, clock.now_us(), "[GPS] Probing at {} baud", self.config.target_baud);

        let outcome = if self.probe(port, clock) {
            diag_info!(self.log, clock.now_us(), "[GPS] Already synced");
            SyncOutcome::AlreadySynced
        } else {
            diag_warn!(
                self.log,
                clock.now_us(),
                "[GPS] Not synced, switching {} -> {}",
                self.config.fallback_baud,
                self.config.target_baud
            );
            self.resync(port, clock)?;
            SyncOutcome::Reconfigured
        };

        self.send_repeated(port, clock, PMTK_SET_OUTPUT_RMC_GGA, SetupStep::OutputCommand)?;
        self.send_repeated(port, clock, PMTK_SET_RATE_5HZ, SetupStep::RateCommand)?;

        diag_info!(self.log, clock.now_us(), "[GPS] Configured (5 Hz, RMC+GGA)");
        Ok(outcome)
    }

    /// Listen for a sentence start for at most `probe_window_ms`.
    ///
    /// Bytes read here are consumed and never reach the assembler; the
    /// first full sentence after bring-up is picked up normally.
    pub fn probe<P, C>(&self, port: &mut P, clock: &mut C) -> bool
    where
        P: ByteSource + ?Sized,
        C: Clock + ?Sized,
    {
        let start = clock.now_ms();
        while clock.now_ms().wrapping_sub(start) < self.config.probe_window_ms {
            if port.is_readable() {
                if port.read_byte() == Some(SENTINEL) {
                    return true;
                }
            } else {
                clock.delay_ms(1);
            }
        }
        false
    }

    fn resync<P, C>(&self, port: &mut P, clock: &mut C) -> Result<(), SetupError<P::Error>>
    where
        P: SerialPort + ?Sized,
        C: Clock + ?Sized,
    {
        let cfg = &self.config;

        port.set_baud_rate(cfg.fallback_baud)
            .map_err(at(SetupStep::FallbackBaud))?;
        clock.delay_ms(cfg.fallback_settle_ms);

        port.write_all(PMTK_SET_BAUD_57600.as_bytes())
            .map_err(at(SetupStep::BaudCommand))?;
        clock.delay_ms(cfg.baud_switch_ms);

        port.set_baud_rate(cfg.target_baud)
            .map_err(at(SetupStep::TargetBaud))?;
        clock.delay_ms(cfg.resync_settle_ms);
        Ok(())
    }

    fn send_repeated<P, C>(
        &self,
        port: &mut P,
        clock: &mut C,
        command: &str,
        step: SetupStep,
    ) -> Result<(), SetupError<P::Error>>
    where
        P: SerialPort + ?Sized,
        C: Clock + ?Sized,
    {
        for _ in 0..self.config.repeat {
            port.write_all(command.as_bytes()).map_err(at(step))?;
            clock.delay_ms(self.config.command_gap_ms);
        }
        Ok(())
    }

    #[inline]
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }
}

#[inline]
fn at<E>(step: SetupStep) -> impl Fn(E) -> SetupError<E> {
    move |source| SetupError { step, source }
}
