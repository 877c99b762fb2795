//! NMEA 0183 sentence handling.
//!
//! ```text
//! bytes ─▶ SentenceAssembler ─▶ validate() ─▶ Sentence ─▶ parser::apply() ─▶ RawFix
//! ```
//!
//! Only GGA and RMC (GP and GN talkers) are consumed. Anything malformed
//! is dropped silently: the next sentence is at most 200 ms away.

pub mod assembler;
pub mod checksum;
pub mod parser;

pub use assembler::{SentenceAssembler, SENTENCE_CAPACITY};
pub use checksum::{checksum, validate, Sentence, CHECKSUM_DELIMITER, FIELD_SEPARATOR, SENTINEL};
pub use parser::{apply, nmea_to_decimal, SentenceKind};
