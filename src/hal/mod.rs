//! Board layer for the ESP32-S3 beacon.
//!
//! Thin wrappers around ESP-IDF peripherals implementing the library's
//! I/O traits. Business logic stays in the library, HAL is just I/O.

pub mod clock;
pub mod gps_uart;
pub mod lr1121;

pub use clock::EspClock;
pub use gps_uart::GpsUart;
pub use lr1121::Lr1121;
