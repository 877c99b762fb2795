//! Broadcast cycle tests: store snapshot to radio buffer

use gps_lora_beacon::radio::{HalStatus, IrqMask, LoraModParams, LoraPktParams, PacketType, TcxoVoltage};
use gps_lora_beacon::{
    BroadcastConfig, Broadcaster, Clock, DiagStream, DisplayFix, FaultState, RadioConfig, RadioError,
    RadioHal, RadioTransmitter, RawFix, SharedFixStore, TelemetryFrame, TxDoneFlag,
};

/// Completes every transmit on the first IRQ poll and keeps the last
/// buffer written.
#[derive(Default)]
struct LoopbackRadio {
    last_buffer: Vec<u8>,
    sent: u32,
    fail_start: bool,
}

impl RadioHal for LoopbackRadio {
    fn set_tcxo_mode(&mut self, _: TcxoVoltage, _: u32) -> Result<(), HalStatus> {
        Ok(())
    }
    fn clear_errors(&mut self) -> Result<(), HalStatus> {
        Ok(())
    }
    fn get_errors(&mut self) -> Result<u16, HalStatus> {
        Ok(0)
    }
    fn set_packet_type(&mut self, _: PacketType) -> Result<(), HalStatus> {
        Ok(())
    }
    fn set_rf_frequency(&mut self, _: u32) -> Result<(), HalStatus> {
        Ok(())
    }
    fn set_lora_mod_params(&mut self, _: &LoraModParams) -> Result<(), HalStatus> {
        Ok(())
    }
    fn set_lora_pkt_params(&mut self, _: &LoraPktParams) -> Result<(), HalStatus> {
        Ok(())
    }
    fn write_buffer(&mut self, data: &[u8]) -> Result<(), HalStatus> {
        self.last_buffer.clear();
        self.last_buffer.extend_from_slice(data);
        Ok(())
    }
    fn set_tx(&mut self, _: u32) -> Result<(), HalStatus> {
        if self.fail_start {
            return Err(HalStatus(-1));
        }
        self.sent += 1;
        Ok(())
    }
    fn get_irq_status(&mut self) -> Result<IrqMask, HalStatus> {
        Ok(IrqMask::TX_DONE)
    }
    fn clear_irq_status(&mut self, _: IrqMask) -> Result<(), HalStatus> {
        Ok(())
    }
    fn set_dio_irq_params(&mut self, _: IrqMask, _: IrqMask) -> Result<(), HalStatus> {
        Ok(())
    }
}

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
    store: SharedFixStore,
    flag: TxDoneFlag,
    fault: FaultState,
    log: DiagStream,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: SharedFixStore::new(),
            flag: TxDoneFlag::new(),
            fault: FaultState::new(),
            log: DiagStream::new(),
        }
    }

    fn broadcaster(&self) -> Broadcaster<'_, LoopbackRadio, MockClock> {
        self.broadcaster_with(BroadcastConfig::default())
    }

    fn broadcaster_with(&self, config: BroadcastConfig) -> Broadcaster<'_, LoopbackRadio, MockClock> {
        let radio = RadioTransmitter::new(
            LoopbackRadio::default(),
            MockClock::default(),
            RadioConfig::default(),
            &self.flag,
            &self.fault,
            &self.log,
        );
        Broadcaster::new(&self.store, radio, config, &self.log)
    }
}

fn moving_fix() -> DisplayFix {
    DisplayFix {
        raw: RawFix {
            fix_valid: true,
            latitude: 48.125,
            longitude: 11.525,
            altitude: 550.0,
            speed_kph: 10.0,
            course: 90.0,
            hdop: 1.0,
            satellites: 9,
        },
        display_latitude: 48.125,
        display_longitude: 11.525,
        is_moving: true,
    }
}

#[test]
fn test_broadcast_before_first_fix_sends_empty_frame() {
    let fx = Fixture::new();
    let mut bc = fx.broadcaster();

    let frame = bc.broadcast().unwrap();
    assert_eq!(frame, TelemetryFrame::encode(&DisplayFix::EMPTY, 1));
    assert_eq!(bc.radio().hal().last_buffer, frame.as_bytes().to_vec());
}

#[test]
fn test_broadcast_sends_latest_snapshot() {
    let fx = Fixture::new();
    let mut publisher = fx.store.take_publisher().unwrap();
    let mut bc = fx.broadcaster();

    publisher.publish(moving_fix());
    let frame = bc.broadcast().unwrap();

    assert_eq!(frame, TelemetryFrame::encode(&moving_fix(), 1));
    assert_eq!(bc.radio().hal().last_buffer, frame.as_bytes().to_vec());
    assert_eq!(bc.radio().completed(), 1);
}

#[test]
fn test_cycle_sleeps_broadcast_interval() {
    let fx = Fixture::new();
    let mut bc = fx.broadcaster();

    bc.cycle().unwrap();
    bc.cycle().unwrap();

    let delays = &bc.radio().clock().delays;
    assert_eq!(delays.iter().filter(|&&d| d == 1000).count(), 2);
    assert_eq!(*delays.last().unwrap(), 1000);
}

#[test]
fn test_failed_send_still_advances_sequence() {
    let fx = Fixture::new();
    let mut bc = fx.broadcaster();

    bc.radio_mut().hal_mut().fail_start = true;
    assert!(matches!(bc.cycle(), Err(RadioError::Command { .. })));
    assert_eq!(bc.sequence(), 1);
    assert!(fx.fault.snapshot().is_active());

    bc.radio_mut().hal_mut().fail_start = false;
    let frame = bc.cycle().unwrap();
    assert_eq!(frame.counter(), 2);
    assert!(!bc.radio().faults().is_active());
}

fn link_lines(log: &DiagStream) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(entry) = log.drain() {
        if entry.message().starts_with("[TX] link") {
            out.push(entry.message().to_string());
        }
    }
    out
}

#[test]
fn test_link_health_reported_periodically() {
    let fx = Fixture::new();
    let mut bc = fx.broadcaster_with(BroadcastConfig {
        interval_ms: 1000,
        health_every: 3,
    });

    bc.radio_mut().hal_mut().fail_start = true;
    for _ in 0..2 {
        assert!(bc.cycle().is_err());
    }
    assert!(link_lines(&fx.log).is_empty());

    assert!(bc.cycle().is_err());
    let faults = bc.radio().faults();
    assert_eq!(faults.streak, 3);
    assert_eq!(faults.total, 3);
    let lines = link_lines(&fx.log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[TX] link DOWN Command x3"), "{}", lines[0]);
    assert!(lines[0].ends_with("| sent 0/3"), "{}", lines[0]);

    bc.radio_mut().hal_mut().fail_start = false;
    for _ in 0..3 {
        bc.cycle().unwrap();
    }
    assert_eq!(
        link_lines(&fx.log),
        vec!["[TX] link ok (3 faults since boot) | sent 3/6".to_string()]
    );
}

#[test]
fn test_link_health_disabled() {
    let fx = Fixture::new();
    let mut bc = fx.broadcaster_with(BroadcastConfig {
        interval_ms: 1000,
        health_every: 0,
    });

    for _ in 0..5 {
        bc.cycle().unwrap();
    }
    assert!(link_lines(&fx.log).is_empty());
}

#[test]
fn test_sequence_wraps() {
    let fx = Fixture::new();
    let mut bc = fx.broadcaster();

    for _ in 0..u16::MAX {
        bc.broadcast().unwrap();
        while fx.log.drain().is_some() {}
    }
    assert_eq!(bc.sequence(), u16::MAX);

    let frame = bc.broadcast().unwrap();
    assert_eq!(frame.counter(), 0);
    assert_eq!(bc.radio().hal().sent, u16::MAX as u32 + 1);
}
