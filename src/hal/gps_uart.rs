//! Receiver UART.

use esp_idf_svc::hal::delay::{BLOCK, NON_BLOCK};
use esp_idf_svc::hal::uart::UartDriver;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use gps_lora_beacon::{ByteSource, SerialPort};

pub struct GpsUart<'d> {
    uart: UartDriver<'d>,
}

impl<'d> GpsUart<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl ByteSource for GpsUart<'_> {
    fn is_readable(&mut self) -> bool {
        matches!(self.uart.remaining_read(), Ok(n) if n > 0)
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, NON_BLOCK) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

impl SerialPort for GpsUart<'_> {
    type Error = EspError;

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), EspError> {
        self.uart.change_baudrate(Hertz(baud))?;
        Ok(())
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), EspError> {
        while !bytes.is_empty() {
            let written = self.uart.write(bytes)?;
            bytes = &bytes[written..];
        }
        // A baud change may follow; the last byte must be on the wire.
        self.uart.wait_tx_done(BLOCK)
    }
}
