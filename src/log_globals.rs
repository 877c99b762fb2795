//! Global diagnostic stream instances.
//!
//! One stream per core, each with a single producer, drained by the
//! background log task.

use crate::logging::DiagStream;

/// Acquisition context (Core 0): receiver bring-up, sentence and filter events.
pub static ACQ_LOG_STREAM: DiagStream = DiagStream::new();

/// Transmit context (Core 1): radio results and faults.
pub static TX_LOG_STREAM: DiagStream = DiagStream::new();
