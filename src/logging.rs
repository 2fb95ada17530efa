//! Lock-free kernel-style logging.
//!
//! ```text
//! IRQ thread / attr write        LogRing               drain task
//! ───────────────────────        ───────               ──────────
//!
//! dev_err!(log, ts, ..) ──────▶ [E0][E1][E2] ───────▶ log_sink::drain_into()
//! non-blocking                   bounded, lock-free    blocking ok
//! ```
//!
//! Producers never block: when the ring is full the entry is dropped and
//! counted. A single consumer drains entries in order.
//!
//! Every entry carries the tag of the driver that produced it
//! (`cypress-touchkey`, `samsung_param`, ...), the same way `dev_err()`
//! prefixes kernel messages with the device name.

use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Maximum message length in bytes. Longer messages are truncated.
pub const MAX_MSG_LEN: usize = 96;

/// Default ring capacity (entries).
pub const LOG_RING_SIZE: usize = 128;

/// Log level, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Err = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Level name used in formatted output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Err => "ERR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Err,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Timestamp in microseconds (driver clock).
    pub timestamp_us: u64,
    pub level: LogLevel,
    /// Producing driver.
    pub tag: &'static str,
    /// Valid bytes in `msg`.
    pub len: u8,
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        timestamp_us: 0,
        level: LogLevel::Info,
        tag: "",
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text. Truncation may split a UTF-8 sequence; the valid
    /// prefix is returned in that case.
    pub fn message(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

struct Slot {
    /// `index + 1` once the entry for `index` is fully written.
    seq: AtomicU32,
    entry: UnsafeCell<LogEntry>,
}

impl Slot {
    const EMPTY: Slot = Slot {
        seq: AtomicU32::new(0),
        entry: UnsafeCell::new(LogEntry::EMPTY),
    };
}

/// Bounded multi-producer, single-consumer log ring.
pub struct LogRing<const N: usize = LOG_RING_SIZE> {
    slots: [Slot; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    threshold: AtomicU8,
}

// SAFETY: a slot is written only by the producer that reserved its index via
// CAS on `write_idx`, and read only by the single consumer after observing the
// slot's `seq` publish. A producer cannot reserve a slot before the consumer
// has released it (`read_idx` is advanced after the copy).
unsafe impl<const N: usize> Sync for LogRing<N> {}
unsafe impl<const N: usize> Send for LogRing<N> {}

impl<const N: usize> LogRing<N> {
    /// Create an empty ring. Entries up to `LogLevel::Info` are kept.
    pub const fn new() -> Self {
        assert!(N > 0, "log ring must hold at least one entry");

        Self {
            slots: [Slot::EMPTY; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            threshold: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Set the most verbose level that is still recorded.
    pub fn set_level(&self, level: LogLevel) {
        self.threshold.store(level as u8, Ordering::Relaxed);
    }

    /// Current recording threshold.
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    /// True if entries at `level` are recorded.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level as u8 <= self.threshold.load(Ordering::Relaxed)
    }

    /// Push an entry. Never blocks.
    ///
    /// Returns `false` if the ring was full and the entry was dropped.
    pub fn push(&self, timestamp_us: u64, level: LogLevel, tag: &'static str, msg: &[u8]) -> bool {
        let mut write = self.write_idx.load(Ordering::Acquire);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) as usize >= N {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let slot = &self.slots[write as usize % N];
        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: index `write` is exclusively ours until `seq` is published.
        unsafe {
            let entry = &mut *slot.entry.get();
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.tag = tag;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }
        slot.seq.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest published entry (single consumer).
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let slot = &self.slots[read as usize % N];

        if slot.seq.load(Ordering::Acquire) != read.wrapping_add(1) {
            return None;
        }

        // SAFETY: published by the producer, not reusable until read_idx moves.
        let entry = unsafe { *slot.entry.get() };
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Entries dropped because the ring was full.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Number of reserved entries not yet drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format `args` into `buf`, truncating. Returns bytes written.
pub fn format_to_buffer(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl fmt::Write for BufWriter<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let bytes = s.as_bytes();
            let to_write = bytes.len().min(self.buf.len() - self.pos);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = fmt::write(&mut writer, args);
    writer.pos
}

/// Timestamp source for drivers without their own platform clock.
pub type ClockFn = fn() -> u64;

/// Clock for hosts and tests that do not care about timestamps.
pub fn zero_clock() -> u64 {
    0
}

/// A ring plus the tag of the driver writing to it.
///
/// Cheap to copy; every driver keeps one.
#[derive(Clone, Copy)]
pub struct Logger<'a> {
    ring: &'a LogRing,
    tag: &'static str,
}

impl<'a> Logger<'a> {
    pub const fn new(ring: &'a LogRing, tag: &'static str) -> Self {
        Self { ring, tag }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn ring(&self) -> &'a LogRing {
        self.ring
    }

    /// Format and record a message. Formatting is skipped when `level`
    /// is filtered out.
    pub fn log(&self, timestamp_us: u64, level: LogLevel, args: fmt::Arguments<'_>) -> bool {
        if !self.ring.enabled(level) {
            return false;
        }
        let mut buf = [0u8; MAX_MSG_LEN];
        let len = format_to_buffer(&mut buf, args);
        self.ring.push(timestamp_us, level, self.tag, &buf[..len])
    }
}

/// Log through a [`Logger`] at an explicit level.
#[macro_export]
macro_rules! dev_log {
    ($logger:expr, $level:expr, $ts:expr, $($arg:tt)*) => {
        $logger.log($ts, $level, format_args!($($arg)*))
    };
}

/// Error message (`dev_err()` equivalent).
#[macro_export]
macro_rules! dev_err {
    ($logger:expr, $ts:expr, $($arg:tt)*) => {
        $crate::dev_log!($logger, $crate::logging::LogLevel::Err, $ts, $($arg)*)
    };
}

/// Warning message.
#[macro_export]
macro_rules! dev_warn {
    ($logger:expr, $ts:expr, $($arg:tt)*) => {
        $crate::dev_log!($logger, $crate::logging::LogLevel::Warn, $ts, $($arg)*)
    };
}

/// Informational message.
#[macro_export]
macro_rules! dev_info {
    ($logger:expr, $ts:expr, $($arg:tt)*) => {
        $crate::dev_log!($logger, $crate::logging::LogLevel::Info, $ts, $($arg)*)
    };
}

/// Debug message, recorded only when the ring level is `Debug`.
#[macro_export]
macro_rules! dev_dbg {
    ($logger:expr, $ts:expr, $($arg:tt)*) => {
        $crate::dev_log!($logger, $crate::logging::LogLevel::Debug, $ts, $($arg)*)
    };
}
