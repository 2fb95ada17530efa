//! Command handlers

use core::fmt::{self, Write};

use super::parser::ParsedCommand;
use super::ConsoleError;
use crate::attr::AttributeGroup;
use crate::logging::{LogLevel, LogRing};

/// What the commands operate on.
pub struct Context<'c, 'g> {
    /// Published attribute groups, in `ls` order.
    pub groups: &'c mut [&'g mut dyn AttributeGroup],
    /// Log ring for `status` and `log`, if the embedder exposes it.
    pub log: Option<&'c LogRing>,
}

impl<'c, 'g> Context<'c, 'g> {
    pub fn new(groups: &'c mut [&'g mut dyn AttributeGroup]) -> Self {
        Self { groups, log: None }
    }

    pub fn with_log(mut self, ring: &'c LogRing) -> Self {
        self.log = Some(ring);
        self
    }

    fn group(&mut self, name: &str) -> Result<&mut (dyn AttributeGroup + 'g), ConsoleError> {
        self.groups
            .iter_mut()
            .find(|g| g.name() == name)
            .map(|g| &mut **g)
            .ok_or(ConsoleError::NoSuchGroup)
    }
}

type Handler = fn(&ParsedCommand<'_>, &mut Context<'_, '_>, &mut dyn Write) -> Result<(), ConsoleError>;

/// Command descriptor
pub struct CommandDescriptor {
    pub name: &'static str,
    pub brief: &'static str,
    pub handler: Handler,
}

/// All available commands
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor { name: "help", brief: "List commands", handler: cmd_help },
    CommandDescriptor { name: "ls", brief: "List groups or attributes", handler: cmd_ls },
    CommandDescriptor { name: "cat", brief: "Read group/attr", handler: cmd_cat },
    CommandDescriptor { name: "write", brief: "Write group/attr value", handler: cmd_write },
    CommandDescriptor { name: "status", brief: "Dump readable attributes and log state", handler: cmd_status },
    CommandDescriptor { name: "log", brief: "Show or set log level", handler: cmd_log },
];

/// Execute a parsed command
pub fn execute(
    cmd: &ParsedCommand<'_>,
    ctx: &mut Context<'_, '_>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if cmd.command.is_empty() {
        return Ok(()); // Empty line, do nothing
    }

    let handler = COMMANDS
        .iter()
        .find(|c| c.name == cmd.command)
        .ok_or(ConsoleError::UnknownCommand)?;

    (handler.handler)(cmd, ctx, out)
}

/// Get all command names
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|c| c.name)
}

/// Split `group/attr`.
fn split_path(path: &str) -> Result<(&str, &str), ConsoleError> {
    match path.split_once('/') {
        Some((group, attr)) if !group.is_empty() && !attr.is_empty() => Ok((group, attr)),
        _ => Err(ConsoleError::InvalidValue),
    }
}

/// Forwards to the console output and remembers whether the last byte
/// written was a newline.
struct LineTracker<'w> {
    inner: &'w mut dyn Write,
    at_line_start: bool,
}

impl<'w> LineTracker<'w> {
    fn new(inner: &'w mut dyn Write) -> Self {
        Self {
            inner,
            at_line_start: true,
        }
    }

    /// Terminate a value that did not end in a newline.
    fn finish(self) -> fmt::Result {
        if self.at_line_start {
            Ok(())
        } else {
            writeln!(self.inner)
        }
    }
}

impl Write for LineTracker<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Some(last) = s.chars().last() {
            self.at_line_start = last == '\n';
        }
        self.inner.write_str(s)
    }
}

// --- Command Implementations ---

fn cmd_help(cmd: &ParsedCommand<'_>, _ctx: &mut Context<'_, '_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    if let Some(name) = cmd.arg(0) {
        let c = COMMANDS
            .iter()
            .find(|c| c.name == name)
            .ok_or(ConsoleError::UnknownCommand)?;
        let _ = writeln!(out, "{}: {}", c.name, c.brief);
    } else {
        for c in COMMANDS {
            let _ = writeln!(out, "  {:<8} {}", c.name, c.brief);
        }
    }
    Ok(())
}

fn cmd_ls(cmd: &ParsedCommand<'_>, ctx: &mut Context<'_, '_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    match cmd.arg(0) {
        None => {
            for g in ctx.groups.iter() {
                let _ = writeln!(out, "{}/", g.name());
            }
        }
        Some(name) => {
            let group = ctx.group(name.trim_end_matches('/'))?;
            for d in group.attributes() {
                let _ = writeln!(out, "{} {}", d.mode.as_str(), d.name);
            }
        }
    }
    Ok(())
}

fn cmd_cat(cmd: &ParsedCommand<'_>, ctx: &mut Context<'_, '_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let (group, attr) = split_path(cmd.arg(0).ok_or(ConsoleError::MissingArg)?)?;
    let group = ctx.group(group)?;

    let mut tracker = LineTracker::new(out);
    group.show(attr, &mut tracker)?;
    tracker.finish().map_err(crate::attr::AttrError::from)?;
    Ok(())
}

fn cmd_write(cmd: &ParsedCommand<'_>, ctx: &mut Context<'_, '_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let (group_name, attr) = split_path(cmd.arg(0).ok_or(ConsoleError::MissingArg)?)?;
    if cmd.rest.is_empty() {
        return Err(ConsoleError::MissingArg);
    }

    let group = ctx.group(group_name)?;
    let consumed = group.store(attr, cmd.rest)?;
    let _ = writeln!(out, "{}/{}: {} bytes", group_name, attr, consumed);
    Ok(())
}

fn cmd_status(_cmd: &ParsedCommand<'_>, ctx: &mut Context<'_, '_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    for group in ctx.groups.iter_mut() {
        let name = group.name();
        for d in group.attributes().iter().filter(|d| d.mode.readable()) {
            let _ = write!(out, "{}/{} = ", name, d.name);
            let mut tracker = LineTracker::new(&mut *out);
            if let Err(e) = group.show(d.name, &mut tracker) {
                let _ = write!(tracker, "<{}>", e);
            }
            let _ = tracker.finish();
        }
    }

    if let Some(ring) = ctx.log {
        let _ = writeln!(
            out,
            "log: level={} pending={} dropped={}",
            ring.level().as_str(),
            ring.pending(),
            ring.dropped()
        );
    }
    Ok(())
}

fn cmd_log(cmd: &ParsedCommand<'_>, ctx: &mut Context<'_, '_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let ring = ctx.log.ok_or(ConsoleError::UnknownCommand)?;

    if let Some(level) = cmd.arg(0) {
        let level = match level {
            "err" | "error" => LogLevel::Err,
            "warn" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            _ => return Err(ConsoleError::InvalidValue),
        };
        ring.set_level(level);
    }

    let _ = writeln!(out, "log level: {}", ring.level().as_str());
    Ok(())
}
