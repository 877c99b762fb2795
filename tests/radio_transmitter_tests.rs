//! LoRa transmit sequence tests against a scripted radio

use gps_lora_beacon::logging::LogLevel;
use gps_lora_beacon::radio::{
    HalStatus, IrqMask, LoraModParams, LoraPktParams, PacketType, TcxoVoltage, TxStep,
};
use gps_lora_beacon::{
    Clock, DiagStream, FaultState, RadioConfig, RadioError, RadioHal, RadioTransmitter, TxDoneFlag,
    TxFault, TxState,
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Call {
    Tcxo(TcxoVoltage, u32),
    ClearErrors,
    GetErrors,
    PacketType(PacketType),
    RfFrequency(u32),
    ModParams,
    PktParams(u8),
    WriteBuffer(usize),
    SetTx(u32),
    GetIrq,
    ClearIrq(u32),
    DioIrq(u32, u32),
}

/// Records every command. Completion comes either from the "ISR" (the
/// flag is set inside `set_tx`) or from the IRQ register after N polls.
#[derive(Default)]
struct MockRadio<'a> {
    calls: Vec<Call>,
    written: Vec<u8>,
    isr: Option<&'a TxDoneFlag>,
    tx_done_after_polls: Option<u32>,
    polls: u32,
    sys_errors: u16,
    fail_on: Option<TxStep>,
}

impl<'a> MockRadio<'a> {
    fn with_isr(flag: &'a TxDoneFlag) -> Self {
        Self {
            isr: Some(flag),
            ..Self::default()
        }
    }

    fn polled(after: u32) -> Self {
        Self {
            tx_done_after_polls: Some(after),
            ..Self::default()
        }
    }

    fn silent() -> Self {
        Self::default()
    }

    fn check(&self, step: TxStep) -> Result<(), HalStatus> {
        if self.fail_on == Some(step) {
            Err(HalStatus(-7))
        } else {
            Ok(())
        }
    }

    fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|&&c| c == call).count()
    }

    fn has_set_tx(&self) -> bool {
        self.calls.iter().any(|c| matches!(c, Call::SetTx(_)))
    }
}

impl RadioHal for MockRadio<'_> {
    fn set_tcxo_mode(&mut self, voltage: TcxoVoltage, timeout_steps: u32) -> Result<(), HalStatus> {
        self.calls.push(Call::Tcxo(voltage, timeout_steps));
        self.check(TxStep::Tcxo)
    }

    fn clear_errors(&mut self) -> Result<(), HalStatus> {
        self.calls.push(Call::ClearErrors);
        self.check(TxStep::ClearErrors)
    }

    fn get_errors(&mut self) -> Result<u16, HalStatus> {
        self.calls.push(Call::GetErrors);
        self.check(TxStep::GetErrors)?;
        Ok(std::mem::take(&mut self.sys_errors))
    }

    fn set_packet_type(&mut self, packet_type: PacketType) -> Result<(), HalStatus> {
        self.calls.push(Call::PacketType(packet_type));
        self.check(TxStep::PacketType)
    }

    fn set_rf_frequency(&mut self, freq_hz: u32) -> Result<(), HalStatus> {
        self.calls.push(Call::RfFrequency(freq_hz));
        self.check(TxStep::RfFrequency)
    }

    fn set_lora_mod_params(&mut self, _params: &LoraModParams) -> Result<(), HalStatus> {
        self.calls.push(Call::ModParams);
        self.check(TxStep::ModParams)
    }

    fn set_lora_pkt_params(&mut self, params: &LoraPktParams) -> Result<(), HalStatus> {
        self.calls.push(Call::PktParams(params.payload_len));
        self.check(TxStep::PktParams)
    }

    fn write_buffer(&mut self, data: &[u8]) -> Result<(), HalStatus> {
        self.calls.push(Call::WriteBuffer(data.len()));
        self.check(TxStep::WriteBuffer)?;
        self.written = data.to_vec();
        Ok(())
    }

    fn set_tx(&mut self, timeout_steps: u32) -> Result<(), HalStatus> {
        self.calls.push(Call::SetTx(timeout_steps));
        self.check(TxStep::StartTx)?;
        if let Some(flag) = self.isr {
            flag.signal();
        }
        Ok(())
    }

    fn get_irq_status(&mut self) -> Result<IrqMask, HalStatus> {
        self.calls.push(Call::GetIrq);
        self.check(TxStep::PollIrq)?;
        self.polls += 1;
        match self.tx_done_after_polls {
            Some(n) if self.polls >= n => Ok(IrqMask::TX_DONE),
            _ => Ok(IrqMask::NONE),
        }
    }

    fn clear_irq_status(&mut self, mask: IrqMask) -> Result<(), HalStatus> {
        self.calls.push(Call::ClearIrq(mask.bits()));
        self.check(TxStep::ClearIrq)
    }

    fn set_dio_irq_params(&mut self, irq1: IrqMask, irq2: IrqMask) -> Result<(), HalStatus> {
        self.calls.push(Call::DioIrq(irq1.bits(), irq2.bits()));
        self.check(TxStep::DioIrqParams)
    }
}

/// Time only moves when someone sleeps.
#[derive(Default)]
struct MockClock {
    now_ms: u32,
    delays: Vec<u32>,
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now_ms
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now_ms = self.now_ms.wrapping_add(ms);
    }
}

struct Fixture {
    flag: TxDoneFlag,
    fault: FaultState,
    log: DiagStream,
}

impl Fixture {
    fn new() -> Self {
        Self {
            flag: TxDoneFlag::new(),
            fault: FaultState::new(),
            log: DiagStream::new(),
        }
    }

    fn transmitter<'a>(&'a self, radio: MockRadio<'a>) -> RadioTransmitter<'a, MockRadio<'a>, MockClock> {
        RadioTransmitter::new(
            radio,
            MockClock::default(),
            RadioConfig::default(),
            &self.flag,
            &self.fault,
            &self.log,
        )
    }

    fn has_log(&self, level: LogLevel) -> bool {
        let mut found = false;
        while let Some(entry) = self.log.drain() {
            found |= entry.level == level;
        }
        found
    }
}

const ALL: u32 = 0x0BF8_0FFC;

#[test]
fn test_init_routes_only_tx_done() {
    let fx = Fixture::new();
    let mut tx = fx.transmitter(MockRadio::silent());

    tx.init().unwrap();
    assert_eq!(tx.hal().calls, vec![Call::DioIrq(1 << 2, 0), Call::ClearIrq(ALL)]);
}

#[test]
fn test_send_full_sequence_via_interrupt() {
    let fx = Fixture::new();
    let mut tx = fx.transmitter(MockRadio::with_isr(&fx.flag));

    assert_eq!(tx.send(&[0xAA; 22]), Ok(()));
    assert_eq!(
        tx.hal().calls,
        vec![
            Call::ClearErrors,
            Call::ClearIrq(ALL),
            Call::Tcxo(TcxoVoltage::V3_0, 500),
            Call::ClearErrors,
            Call::PacketType(PacketType::Lora),
            Call::RfFrequency(915_000_000),
            Call::ModParams,
            Call::PktParams(22),
            Call::WriteBuffer(22),
            Call::GetErrors,
            Call::SetTx(0),
            Call::ClearIrq(ALL),
        ]
    );
    assert_eq!(tx.state(), TxState::Done);
    assert_eq!(tx.attempts(), 1);
    assert_eq!(tx.completed(), 1);
    assert!(tx.clock().delays.contains(&5), "TCXO settle delay");
    assert!(!tx.faults().is_active());
}

#[test]
fn test_send_completes_via_polled_irq() {
    let fx = Fixture::new();
    let mut tx = fx.transmitter(MockRadio::polled(3));

    assert_eq!(tx.send(&[1, 2, 3]), Ok(()));
    assert_eq!(tx.state(), TxState::Done);
    assert_eq!(tx.completed(), 1);
    assert_eq!(tx.hal().count(Call::GetIrq), 3);
    assert_eq!(tx.hal().count(Call::SetTx(0)), 1);
    assert!(fx.flag.is_set());
}

#[test]
fn test_payload_zero_padded_to_frame_width() {
    let fx = Fixture::new();
    let mut tx = fx.transmitter(MockRadio::with_isr(&fx.flag));

    tx.send(&[9, 8, 7, 6, 5]).unwrap();

    let written = &tx.hal().written;
    assert_eq!(written.len(), 22);
    assert_eq!(&written[..5], &[9, 8, 7, 6, 5]);
    assert!(written[5..].iter().all(|&b| b == 0));
}

#[test]
fn test_oversized_payload_rejected_before_hardware() {
    let fx = Fixture::new();
    let mut tx = fx.transmitter(MockRadio::with_isr(&fx.flag));

    let err = tx.send(&[0u8; 23]).unwrap_err();
    assert_eq!(err, RadioError::Oversized { len: 23, max: 22 });
    assert!(tx.hal().calls.is_empty());
    assert_eq!(tx.attempts(), 0);
    let faults = tx.faults();
    assert_eq!(faults.last, TxFault::Oversized);
    assert_eq!(faults.detail, 23);
    assert_eq!(tx.state(), TxState::Idle);
}

#[test]
fn test_write_buffer_failure_skips_transmit() {
    let fx = Fixture::new();
    let mut radio = MockRadio::with_isr(&fx.flag);
    radio.fail_on = Some(TxStep::WriteBuffer);
    let mut tx = fx.transmitter(radio);

    let err = tx.send(&[1; 22]).unwrap_err();
    assert_eq!(
        err,
        RadioError::Command {
            step: TxStep::WriteBuffer,
            status: HalStatus(-7)
        }
    );
    assert!(!tx.hal().has_set_tx());
    assert_eq!(tx.state(), TxState::Failed);
    assert_eq!(tx.attempts(), 1);
    assert_eq!(tx.completed(), 0);
    let faults = fx.fault.snapshot();
    assert!(faults.is_active());
    assert_eq!(faults.last, TxFault::Command);
    assert_eq!(faults.detail, TxStep::WriteBuffer.code() as u32);
    assert!(fx.has_log(LogLevel::Error));
}

#[test]
fn test_config_failure_aborts_and_clears_latches() {
    let fx = Fixture::new();
    let mut radio = MockRadio::with_isr(&fx.flag);
    radio.fail_on = Some(TxStep::Tcxo);
    let mut tx = fx.transmitter(radio);

    let err = tx.send(&[1; 22]).unwrap_err();
    assert!(matches!(err, RadioError::Command { step: TxStep::Tcxo, .. }));

    let calls = &tx.hal().calls;
    assert!(!calls.iter().any(|c| matches!(c, Call::WriteBuffer(_))));
    assert_eq!(calls[calls.len() - 2..], [Call::ClearErrors, Call::ClearIrq(ALL)]);
}

#[test]
fn test_timeout_without_tx_done() {
    let fx = Fixture::new();
    let mut tx = fx.transmitter(MockRadio::silent());

    let err = tx.send(&[1; 22]).unwrap_err();
    match err {
        RadioError::Timeout { elapsed_ms, irq } => {
            assert!(elapsed_ms > 2000);
            assert!(elapsed_ms <= 2002);
            assert_eq!(irq, IrqMask::NONE);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(tx.state(), TxState::TimedOut);
    assert_eq!(tx.attempts(), 1);
    assert_eq!(tx.completed(), 0);
    assert_eq!(tx.faults().last, TxFault::Timeout);
    assert_eq!(tx.faults().detail, IrqMask::NONE.bits());
    assert_eq!(tx.hal().count(Call::SetTx(0)), 1);
    // Latches cleared after giving up
    assert_eq!(tx.hal().calls.last(), Some(&Call::ClearIrq(ALL)));
}

#[test]
fn test_pre_tx_errors_are_cleared_and_logged() {
    let fx = Fixture::new();
    let mut radio = MockRadio::with_isr(&fx.flag);
    radio.sys_errors = 0x0020;
    let mut tx = fx.transmitter(radio);

    assert_eq!(tx.send(&[1; 22]), Ok(()));

    let calls = &tx.hal().calls;
    let get = calls.iter().position(|c| *c == Call::GetErrors).unwrap();
    assert_eq!(calls[get + 1], Call::ClearErrors);
    assert_eq!(calls[get + 2], Call::SetTx(0));
    assert!(fx.has_log(LogLevel::Warn));
}

#[test]
fn test_flag_from_previous_attempt_does_not_complete_next() {
    let fx = Fixture::new();
    fx.flag.signal();
    let mut tx = fx.transmitter(MockRadio::silent());

    assert!(matches!(tx.send(&[1; 22]), Err(RadioError::Timeout { .. })));
}

#[test]
fn test_success_after_failure_clears_fault() {
    let fx = Fixture::new();
    let mut radio = MockRadio::polled(1);
    radio.fail_on = Some(TxStep::StartTx);
    let mut tx = fx.transmitter(radio);

    assert!(tx.send(&[1; 22]).is_err());
    assert_eq!(tx.faults().streak, 1);

    tx.hal_mut().fail_on = None;
    assert_eq!(tx.send(&[1; 22]), Ok(()));

    assert_eq!(tx.attempts(), 2);
    assert_eq!(tx.completed(), 1);
    let faults = fx.fault.snapshot();
    assert!(!faults.is_active());
    assert_eq!(faults.streak, 0);
    assert_eq!(faults.total, 1);
    assert_eq!(faults.last, TxFault::Command);
}
