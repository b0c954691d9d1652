//! Badge token assembly.

use chrono::{DateTime, Duration, Utc};

/// One keystroke from the badge reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKey {
    /// A printable character of the badge token.
    Char(char),
    /// The terminator key.
    Enter,
}

/// Reassembles badge tokens from a keystroke stream.
///
/// State machine per reader session: `Idle → Accumulating → Emit | Discard`.
/// Characters arriving within the inter-key gap of the previous one extend
/// the current token; a longer pause or the Enter terminator closes it.
/// Tokens shorter than the minimum length are discarded and the machine
/// returns to idle.
///
/// The assembler is deterministic: callers pass the arrival instant of every
/// keystroke, so tests drive it without timers. A live session closes
/// pause-terminated tokens through [`flush`](TokenAssembler::flush), driven
/// by a real timer in [`ScanIngestor::run`](super::ScanIngestor::run).
#[derive(Debug)]
pub struct TokenAssembler {
    buffer: String,
    last_key_at: Option<DateTime<Utc>>,
    gap: Duration,
    min_len: usize,
}

impl TokenAssembler {
    /// Creates an assembler with the given inter-key gap and minimum token
    /// length.
    pub fn new(gap: Duration, min_len: usize) -> Self {
        Self {
            buffer: String::new(),
            last_key_at: None,
            gap,
            min_len,
        }
    }

    /// True while a token is being accumulated.
    pub fn is_accumulating(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Feeds one keystroke, returning a completed token if this keystroke
    /// closed one.
    ///
    /// A character arriving after a pause longer than the gap closes the
    /// previous token (emitting it if valid) and starts a new one.
    pub fn push_key(&mut self, key: ScanKey, at: DateTime<Utc>) -> Option<String> {
        match key {
            ScanKey::Enter => self.flush(),
            ScanKey::Char(c) => {
                let emitted = match self.last_key_at {
                    Some(last) if at - last > self.gap => self.take_token(),
                    _ => None,
                };
                self.buffer.push(c);
                self.last_key_at = Some(at);
                emitted
            }
        }
    }

    /// Closes the current token, emitting it if valid. Used on Enter and
    /// when the pause timer fires.
    pub fn flush(&mut self) -> Option<String> {
        self.last_key_at = None;
        self.take_token()
    }

    fn take_token(&mut self) -> Option<String> {
        let token = std::mem::take(&mut self.buffer);
        (token.chars().count() >= self.min_len).then_some(token)
    }
}
