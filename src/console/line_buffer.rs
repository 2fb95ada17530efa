//! Line buffer for console input

use heapless::String;

/// Maximum line length. Long enough for a `write samsung_param/command_line`
/// with a typical boot command line.
pub const LINE_SIZE: usize = 256;

/// Line input buffer
pub struct LineBuffer {
    buf: String<LINE_SIZE>,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Append a printable ASCII byte. Returns `false` when full.
    pub fn push(&mut self, c: u8) -> bool {
        self.buf.push(char::from(c)).is_ok()
    }

    /// Remove last character
    pub fn backspace(&mut self) -> bool {
        self.buf.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
