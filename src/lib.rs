//! # GpsLoraBeacon
//!
//! Dual-core GPS telemetry beacon with a single shared fix record.
//!
//! ## Architecture
//!
//! ```text
//! Core 0 (acquisition)                          Core 1 (transmit)
//! ────────────────────                          ─────────────────
//! UART ─▶ SentenceAssembler ─▶ checksum ─▶      SharedFixStore::snapshot()
//!         FixParser ─▶ StabilityFilter ─▶ ─────▶   ─▶ TelemetryFrame::encode()
//!         SharedFixStore::publish()                ─▶ RadioTransmitter::send()
//! ```
//!
//! - The only data shared between cores is [`SharedFixStore`]
//! - Each core logs to its own [`DiagStream`], drained by a background task
//! - Nothing here touches hardware directly: the binary supplies
//!   [`ByteSource`], [`Clock`] and [`RadioHal`] implementations

#![cfg_attr(not(test), no_std)]

pub mod acquisition;
pub mod beacon;
pub mod clock;
pub mod config;
pub mod fault;
pub mod filter;
pub mod fix;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod nmea;
pub mod radio;
pub mod receiver;
pub mod store;
pub mod telemetry;

pub use acquisition::{Acquisition, AcquisitionStats, ByteSource};
pub use beacon::Broadcaster;
pub use clock::Clock;
pub use config::{AcquisitionConfig, BroadcastConfig, FilterConfig, RadioConfig, ReceiverConfig};
pub use fault::{FaultSnapshot, FaultState, TxFault};
pub use filter::{FilterEvent, StabilityFilter};
pub use fix::{DisplayFix, RawFix};
pub use log_globals::{ACQ_LOG_STREAM, TX_LOG_STREAM};
pub use logging::DiagStream;
pub use radio::{RadioError, RadioHal, RadioTransmitter, TxDoneFlag, TxState};
pub use receiver::{ReceiverSetup, SerialPort, SetupError, SyncOutcome};
pub use store::SharedFixStore;
pub use telemetry::TelemetryFrame;
