//! GpsLoraBeacon firmware entry point.
//!
//! 1. Bring up peripherals (receiver UART, LR1121 on SPI2)
//! 2. Start the log drain (low priority)
//! 3. Start acquisition on Core 0: receiver bring-up, then the input loop
//! 4. Start the broadcaster on Core 1
//!
//! The only data the two cores share is the fix store.

#[cfg(target_os = "espidf")]
mod hal;

#[cfg(target_os = "espidf")]
fn main() {
    firmware::run();
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("beacon: firmware image, build for an ESP-IDF target (ESP32-S3)");
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::io::Write;

    use esp_idf_svc::hal::cpu::Core;
    use esp_idf_svc::hal::gpio::{AnyIOPin, IOPin, InputPin, OutputPin, PinDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
    use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
    use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartDriver};
    use esp_idf_svc::hal::units::{FromValueType, Hertz};

    use gps_lora_beacon::config::AcquisitionConfig;
    use gps_lora_beacon::log_drain::{DrainSource, LogDrain};
    use gps_lora_beacon::{
        diag_error, diag_info, Acquisition, BroadcastConfig, Broadcaster, Clock, FaultState,
        FilterConfig, RadioConfig, RadioTransmitter, ReceiverConfig, ReceiverSetup,
        SharedFixStore, TxDoneFlag, ACQ_LOG_STREAM, TX_LOG_STREAM,
    };

    use crate::hal::{EspClock, GpsUart, Lr1121};

    const ACQ_PRIORITY: u8 = 10;
    const TX_PRIORITY: u8 = 9;
    const LOG_PRIORITY: u8 = 2;
    const TASK_STACK: usize = 8 * 1024;
    const LOG_DRAIN_PERIOD_MS: u32 = 20;

    /// State shared between the two cores and the radio ISR. Allocated once
    /// and never freed.
    struct Shared {
        fixes: SharedFixStore,
        fault: FaultState,
        tx_done: TxDoneFlag,
    }

    pub fn run() {
        esp_idf_svc::sys::link_patches();

        let shared: &'static Shared = Box::leak(Box::new(Shared {
            fixes: SharedFixStore::new(),
            fault: FaultState::new(),
            tx_done: TxDoneFlag::new(),
        }));

        let peripherals = Peripherals::take().expect("peripherals already taken");
        let pins = peripherals.pins;

        // Receiver UART: TX GPIO17, RX GPIO18
        let uart = UartDriver::new(
            peripherals.uart1,
            pins.gpio17,
            pins.gpio18,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &UartConfig::default().baudrate(Hertz(ReceiverConfig::default().target_baud)),
        )
        .expect("receiver UART init");
        let gps = GpsUart::new(uart);

        // LR1121: SCK 12, MOSI 11, MISO 13, NSS 10, BUSY 4, DIO9 6, NRESET 5
        let spi = SpiDriver::new(
            peripherals.spi2,
            pins.gpio12,
            pins.gpio11,
            Some(pins.gpio13),
            &SpiDriverConfig::new(),
        )
        .expect("SPI bus init");
        let device = SpiDeviceDriver::new(spi, Some(pins.gpio10), &SpiConfig::new().baudrate(8.MHz().into()))
            .expect("SPI device init");
        let radio = Lr1121::new(
            device,
            PinDriver::input(pins.gpio4.downgrade_input()).expect("BUSY pin"),
            PinDriver::input(pins.gpio6.downgrade()).expect("DIO9 pin"),
            PinDriver::output(pins.gpio5.downgrade_output()).expect("NRESET pin"),
            &shared.tx_done,
        )
        .expect("radio init");

        spawn(b"log_drain\0", LOG_PRIORITY, None, log_task);
        spawn(b"gps_acq\0", ACQ_PRIORITY, Some(Core::Core0), move || acquisition_task(gps, shared));
        spawn(b"lora_tx\0", TX_PRIORITY, Some(Core::Core1), move || transmit_task(radio, shared));

        ThreadSpawnConfiguration::default()
            .set()
            .expect("reset thread config");
        println!("beacon {} ({})", env!("VERSION_STRING"), env!("GIT_HASH"));
    }

    fn spawn<F>(name: &'static [u8], priority: u8, core: Option<Core>, body: F)
    where
        F: FnOnce() + Send + 'static,
    {
        ThreadSpawnConfiguration {
            name: Some(name),
            stack_size: TASK_STACK,
            priority,
            pin_to_core: core,
            ..Default::default()
        }
        .set()
        .expect("thread config");

        std::thread::Builder::new()
            .stack_size(TASK_STACK)
            .spawn(body)
            .expect("thread spawn");
    }

    fn acquisition_task(mut gps: GpsUart<'static>, shared: &'static Shared) {
        let mut clock = EspClock;

        let setup = ReceiverSetup::new(ReceiverConfig::default(), &ACQ_LOG_STREAM);
        if let Err(err) = setup.run(&mut gps, &mut clock) {
            // Keep going: the receiver may still be talking at the target rate.
            diag_error!(ACQ_LOG_STREAM, clock.now_us(), "[GPS] {}", err);
        }

        let Some(publisher) = shared.fixes.take_publisher() else {
            diag_error!(ACQ_LOG_STREAM, clock.now_us(), "[GPS] Fix store already has a writer");
            return;
        };
        let mut acquisition = Acquisition::new(
            publisher,
            &ACQ_LOG_STREAM,
            FilterConfig::default(),
            AcquisitionConfig::default(),
        );
        acquisition.reset_input();
        diag_info!(ACQ_LOG_STREAM, clock.now_us(), "[GPS] Waiting for fix...");

        loop {
            acquisition.step(&mut gps, clock.now_us());
            // Yield so the idle task can feed the watchdog.
            clock.delay_ms(1);
        }
    }

    fn transmit_task(radio: Lr1121<'static>, shared: &'static Shared) {
        let clock = EspClock;
        let mut transmitter = RadioTransmitter::new(
            radio,
            clock,
            RadioConfig::default(),
            &shared.tx_done,
            &shared.fault,
            &TX_LOG_STREAM,
        );
        if let Err(err) = transmitter.init() {
            diag_error!(TX_LOG_STREAM, clock.now_us(), "[TX] Radio init: {}", err);
        }

        let mut broadcaster = Broadcaster::new(&shared.fixes, transmitter, BroadcastConfig::default(), &TX_LOG_STREAM);
        loop {
            // Failures are logged and recorded in the fault state.
            let _ = broadcaster.cycle();
        }
    }

    fn log_task() {
        let mut clock = EspClock;
        let mut drain = LogDrain::new([
            DrainSource { name: "ACQ", stream: &ACQ_LOG_STREAM },
            DrainSource { name: "TX", stream: &TX_LOG_STREAM },
        ]);

        loop {
            {
                let mut out = std::io::stdout().lock();
                drain.drain(clock.now_us(), |line| {
                    let _ = out.write_all(line);
                });
                let _ = out.flush();
            }
            clock.delay_ms(LOG_DRAIN_PERIOD_MS);
        }
    }
}
