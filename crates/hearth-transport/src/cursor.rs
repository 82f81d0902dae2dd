//! Buffer-driven fragmentation of logical messages
//!
//! A transport delivers one logical message across however many receive
//! calls the caller's buffer size dictates. [`FragmentCursor`] is that
//! bookkeeping in one place, shared by the production WebSocket client and
//! the test double so both fragment identically.

/// Tracks how much of the message currently being drained has already been
/// copied out, plus how many messages have completed.
#[derive(Debug, Default)]
pub struct FragmentCursor {
    read_offset: usize,
    completed: usize,
}

impl FragmentCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a message has been partially drained.
    pub fn in_progress(&self) -> bool {
        self.read_offset > 0
    }

    /// Number of messages fully delivered through this cursor.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Copy the next fragment of `payload` into `buf`.
    ///
    /// Returns `(count, end_of_message)`. On the final fragment the offset
    /// resets and the completed count advances; until then the same payload
    /// must be passed back in on the next call.
    pub fn drain_into(&mut self, payload: &[u8], buf: &mut [u8]) -> (usize, bool) {
        let remaining = payload.len() - self.read_offset;
        if remaining > buf.len() {
            let len = buf.len();
            buf.copy_from_slice(&payload[self.read_offset..self.read_offset + len]);
            self.read_offset += len;
            (len, false)
        } else {
            buf[..remaining].copy_from_slice(&payload[self.read_offset..]);
            self.read_offset = 0;
            self.completed += 1;
            (remaining, true)
        }
    }
}
