//! Command line parser
//!
//! Whitespace split, max 3 arguments. The text after the first argument is
//! also kept verbatim so attribute values may contain spaces.

/// Parsed command with up to 3 arguments
#[derive(Debug, Clone)]
pub struct ParsedCommand<'a> {
    /// The command name (first token)
    pub command: &'a str,
    /// Up to 3 arguments
    pub args: [Option<&'a str>; 3],
    /// Everything after the first argument, leading whitespace removed
    pub rest: &'a str,
}

impl<'a> ParsedCommand<'a> {
    pub const fn empty() -> Self {
        Self {
            command: "",
            args: [None, None, None],
            rest: "",
        }
    }

    /// Get argument by index (0-based)
    pub fn arg(&self, idx: usize) -> Option<&'a str> {
        self.args.get(idx).copied().flatten()
    }
}

/// Split the first whitespace-delimited token off `s`.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], s[end..].trim_start()),
        None => (s, ""),
    }
}

/// Parse a command line into command and arguments
pub fn parse_line(line: &str) -> ParsedCommand<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (command, tail) = split_token(line);
    let (first, rest) = split_token(tail);

    let mut args = [None, None, None];
    if !first.is_empty() {
        args[0] = Some(first);
        for (i, arg) in rest.split_whitespace().take(2).enumerate() {
            args[i + 1] = Some(arg);
        }
    }

    ParsedCommand {
        command,
        args,
        rest,
    }
}
