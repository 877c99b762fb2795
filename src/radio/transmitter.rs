//! Per-attempt LoRa transmit sequence.
//!
//! ```text
//! Idle ─▶ Configuring ─▶ BufferLoaded ─▶ Transmitting ─▶ Done
//!              │               │               │
//!              └───────────────┴──▶ Failed     └──▶ TimedOut
//! ```
//!
//! The radio may drop to standby between sends and lose its volatile
//! configuration, so every attempt re-runs the full configuration. There is
//! no retry inside `send`; a failed attempt is retried by the next
//! broadcast cycle.

use crate::clock::Clock;
use crate::config::RadioConfig;
use crate::fault::{FaultSnapshot, FaultState};
use crate::logging::DiagStream;
use crate::{diag_error, diag_info, diag_warn};

use super::irq::TxDoneFlag;
use super::{HalStatus, IrqMask, RadioError, RadioHal, TxStep};

/// Largest payload the radio buffer accepts.
pub const MAX_RADIO_PAYLOAD: usize = 255;

/// Transmitter state. Terminal states persist until the next `send`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Configuring,
    BufferLoaded,
    Transmitting,
    Done,
    TimedOut,
    Failed,
}

/// Drives one radio through the transmit sequence.
pub struct RadioTransmitter<'a, H: RadioHal, C: Clock> {
    hal: H,
    clock: C,
    config: RadioConfig,
    tx_done: &'a TxDoneFlag,
    fault: &'a FaultState,
    log: &'a DiagStream,
    state: TxState,
    attempts: u32,
    completed: u32,
}

impl<'a, H: RadioHal, C: Clock> RadioTransmitter<'a, H, C> {
    pub fn new(
        hal: H,
        clock: C,
        config: RadioConfig,
        tx_done: &'a TxDoneFlag,
        fault: &'a FaultState,
        log: &'a DiagStream,
    ) -> Self {
        Self {
            hal,
            clock,
            config,
            tx_done,
            fault,
            log,
            state: TxState::Idle,
            attempts: 0,
            completed: 0,
        }
    }

    /// One-time setup: route only TX_DONE to the interrupt line and clear
    /// anything pending.
    pub fn init(&mut self) -> Result<(), RadioError> {
        self.hal
            .set_dio_irq_params(IrqMask::TX_DONE, IrqMask::NONE)
            .map_err(command(TxStep::DioIrqParams))?;
        self.hal
            .clear_irq_status(IrqMask::ALL)
            .map_err(command(TxStep::ClearIrq))?;

        diag_info!(self.log, self.clock.now_us(), "[LORA] TX initialization complete");
        Ok(())
    }

    /// Transmit one payload and block until done, failed or timed out.
    ///
    /// The payload is zero-padded to the configured frame width. Payloads
    /// wider than that are rejected before any radio command and do not
    /// count as an attempt.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        self.state = TxState::Idle;

        let width = self.frame_width();
        if payload.len() > width {
            let err = RadioError::Oversized {
                len: payload.len(),
                max: width,
            };
            self.record_fault(&err);
            diag_error!(self.log, self.clock.now_us(), "[LORA] {}", err);
            return Err(err);
        }

        self.attempts = self.attempts.wrapping_add(1);
        self.tx_done.reset();

        let result = self.attempt(payload, width);
        match result {
            Ok(()) => {
                self.state = TxState::Done;
                self.completed = self.completed.wrapping_add(1);
                self.fault.record_success();
            }
            Err(err) => {
                // The timeout path has already cleared the latches
                if let RadioError::Timeout { .. } = err {
                    self.state = TxState::TimedOut;
                } else {
                    self.state = TxState::Failed;
                    self.clear_latches();
                }
                self.record_fault(&err);
                diag_error!(self.log, self.clock.now_us(), "[LORA] TX #{} {}", self.attempts, err);
            }
        }
        result
    }

    fn attempt(&mut self, payload: &[u8], width: usize) -> Result<(), RadioError> {
        self.state = TxState::Configuring;
        self.configure()?;

        let mut buffer = [0u8; MAX_RADIO_PAYLOAD];
        buffer[..payload.len()].copy_from_slice(payload);
        self.hal
            .write_buffer(&buffer[..width])
            .map_err(command(TxStep::WriteBuffer))?;
        self.state = TxState::BufferLoaded;

        let errors = self.hal.get_errors().map_err(command(TxStep::GetErrors))?;
        if errors != 0 {
            diag_warn!(self.log, self.clock.now_us(), "[LORA] Pre-TX SysErr: 0x{:04X}", errors);
            self.hal.clear_errors().map_err(command(TxStep::ClearErrors))?;
        }

        self.hal.set_tx(0).map_err(command(TxStep::StartTx))?;
        self.state = TxState::Transmitting;

        self.wait_tx_done()
    }

    /// Bring the radio from whatever state it fell back to into LoRa TX
    /// configuration.
    fn configure(&mut self) -> Result<(), RadioError> {
        let cfg = self.config;

        self.hal.clear_errors().map_err(command(TxStep::ClearErrors))?;
        self.hal
            .clear_irq_status(IrqMask::ALL)
            .map_err(command(TxStep::ClearIrq))?;

        // TCXO may have stopped in standby
        self.hal
            .set_tcxo_mode(cfg.tcxo_voltage, cfg.tcxo_timeout_steps)
            .map_err(command(TxStep::Tcxo))?;
        self.clock.delay_ms(cfg.tcxo_settle_ms);

        // TCXO start-up latches errors of its own
        self.hal.clear_errors().map_err(command(TxStep::ClearErrors))?;

        self.hal
            .set_packet_type(cfg.packet_type)
            .map_err(command(TxStep::PacketType))?;
        self.hal
            .set_rf_frequency(cfg.rf_freq_hz)
            .map_err(command(TxStep::RfFrequency))?;
        self.hal
            .set_lora_mod_params(&cfg.modulation)
            .map_err(command(TxStep::ModParams))?;
        self.hal
            .set_lora_pkt_params(&cfg.packet)
            .map_err(command(TxStep::PktParams))?;
        Ok(())
    }

    fn wait_tx_done(&mut self) -> Result<(), RadioError> {
        let start = self.clock.now_ms();

        loop {
            if self.tx_done.is_set() {
                break;
            }

            // Backstop for a missed interrupt edge
            let irq = self.hal.get_irq_status().map_err(command(TxStep::PollIrq))?;
            if irq.contains(IrqMask::TX_DONE) {
                self.tx_done.signal();
                break;
            }

            let elapsed_ms = self.clock.now_ms().wrapping_sub(start);
            if elapsed_ms > self.config.tx_timeout_ms {
                self.clear_latches();
                return Err(RadioError::Timeout { elapsed_ms, irq });
            }

            self.clock.delay_ms(self.config.poll_interval_ms);
        }

        self.hal
            .clear_irq_status(IrqMask::ALL)
            .map_err(command(TxStep::ClearIrq))
    }

    #[inline]
    fn record_fault(&self, err: &RadioError) {
        let (code, data) = err.fault();
        self.fault.record_failure(code, data);
    }

    /// Best-effort cleanup after an aborted attempt.
    fn clear_latches(&mut self) {
        let _ = self.hal.clear_errors();
        let _ = self.hal.clear_irq_status(IrqMask::ALL);
    }

    #[inline]
    fn frame_width(&self) -> usize {
        (self.config.packet.payload_len as usize).min(MAX_RADIO_PAYLOAD)
    }

    /// State after the last `send` (or `Idle` before the first).
    #[inline]
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Attempts started (oversized payloads excluded).
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempts that reached Done.
    #[inline]
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Current link fault record.
    #[inline]
    pub fn faults(&self) -> FaultSnapshot {
        self.fault.snapshot()
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[inline]
    pub fn hal(&self) -> &H {
        &self.hal
    }

    #[inline]
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }
}

#[inline]
fn command(step: TxStep) -> impl Fn(HalStatus) -> RadioError {
    move |status| RadioError::Command { step, status }
}
