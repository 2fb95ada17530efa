//! Byte-at-a-time console over a serial line

use core::fmt::Write;

use super::{execute, parse_line, Context, ConsoleError, LineBuffer};

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");

/// Console state machine
pub struct Console {
    line: LineBuffer,
}

impl Console {
    pub const fn new() -> Self {
        Self {
            line: LineBuffer::new(),
        }
    }

    /// Process a single input byte
    ///
    /// Returns Some(result) if a command ran, None if more input is needed.
    pub fn process_byte(
        &mut self,
        byte: u8,
        ctx: &mut Context<'_, '_>,
        out: &mut dyn Write,
    ) -> Option<Result<(), ConsoleError>> {
        match byte {
            // Enter
            b'\r' | b'\n' => {
                let _ = writeln!(out);
                if self.line.is_empty() {
                    self.print_prompt(out);
                    return None;
                }

                let result = execute(&parse_line(self.line.as_str()), ctx, out);
                if let Err(e) = result {
                    let _ = writeln!(out, "{}", e);
                }
                self.line.clear();
                self.print_prompt(out);
                Some(result)
            }

            // Backspace
            0x7F | 0x08 => {
                if self.line.backspace() {
                    let _ = write!(out, "\x08 \x08");
                }
                None
            }

            // Ctrl+C
            0x03 => {
                let _ = writeln!(out, "^C");
                self.line.clear();
                self.print_prompt(out);
                None
            }

            // Ctrl+U (clear line)
            0x15 => {
                for _ in 0..self.line.len() {
                    let _ = write!(out, "\x08 \x08");
                }
                self.line.clear();
                None
            }

            // Printable character
            0x20..=0x7E => {
                if self.line.push(byte) {
                    let _ = write!(out, "{}", char::from(byte));
                }
                None
            }

            _ => None,
        }
    }

    /// Current unterminated input.
    pub fn pending_line(&self) -> &str {
        self.line.as_str()
    }

    pub fn print_prompt(&self, out: &mut dyn Write) {
        let _ = write!(out, "atlas> ");
    }

    /// Print welcome banner
    pub fn print_banner(&self, out: &mut dyn Write) {
        let _ = writeln!(out, "\r\n{}", VERSION);
        let _ = writeln!(out, "Type 'help' for commands.\r");
        self.print_prompt(out);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
