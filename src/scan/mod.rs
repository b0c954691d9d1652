//! Badge scan ingestion.
//!
//! An RFID badge reader presents as a keyboard: each scan arrives as a burst
//! of keystrokes, usually terminated by Enter. The [`TokenAssembler`] turns
//! that raw stream back into discrete badge tokens, and the [`ScanIngestor`]
//! resolves each token into a clock-in or clock-out against the store, with
//! a per-badge duplicate guard. Token assembly is a pure state machine over
//! explicit timestamps; [`ScanIngestor::run`] is the timer-driven wrapper
//! for a live reader session.

mod ingestor;
mod token;

pub use ingestor::{ScanIngestor, ScanOutcome, ScanRejection};
pub use token::{ScanKey, TokenAssembler};
