//! Serial console over the attribute groups
//!
//! `ls`, `cat` and `write` address attributes as `group/attr`, the way the
//! sysfs files would be named under the device directory.
//! Zero heap allocation - all static buffers.

pub mod commands;
#[allow(clippy::module_inception)]
pub mod console;
pub mod error;
pub mod line_buffer;
pub mod parser;

pub use commands::{command_names, execute, CommandDescriptor, Context, COMMANDS};
pub use console::Console;
pub use error::ConsoleError;
pub use line_buffer::LineBuffer;
pub use parser::{parse_line, ParsedCommand};

/// Parse and run one line.
pub fn run_line(
    line: &str,
    ctx: &mut Context<'_, '_>,
    out: &mut dyn core::fmt::Write,
) -> Result<(), ConsoleError> {
    execute(&parse_line(line), ctx, out)
}
