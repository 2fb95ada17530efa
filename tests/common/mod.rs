//! Shared mocks for the touchkey integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use atlas_drivers::config::{PlatformData, TouchkeyConfig};
use atlas_drivers::logging::LogRing;
use atlas_drivers::touchkey::{KeySink, Power, TouchkeyDevice, TouchkeyPlatform};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

// --- I2C ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockI2cError;

impl i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

#[derive(Debug, Clone)]
pub enum Response {
    Bytes(Vec<u8>),
    Nack,
}

#[derive(Default)]
pub struct BusState {
    /// Scripted read responses, consumed in order
    pub reads: VecDeque<Response>,
    /// Answer once the script is exhausted (`None` = NACK)
    pub idle_status: Option<u8>,
    /// Number of upcoming writes to NACK
    pub fail_writes: usize,
    /// Command bytes successfully written
    pub writes: Vec<u8>,
    pub read_attempts: usize,
}

/// Scripted touchkey bus. Clones share state.
#[derive(Clone, Default)]
pub struct MockI2c {
    pub state: Rc<RefCell<BusState>>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_read(&self, bytes: &[u8]) {
        self.state.borrow_mut().reads.push_back(Response::Bytes(bytes.to_vec()));
    }

    pub fn push_nack(&self, count: usize) {
        let mut s = self.state.borrow_mut();
        for _ in 0..count {
            s.reads.push_back(Response::Nack);
        }
    }

    pub fn set_idle_status(&self, status: Option<u8>) {
        self.state.borrow_mut().idle_status = status;
    }

    pub fn fail_writes(&self, count: usize) {
        self.state.borrow_mut().fail_writes = count;
    }

    pub fn writes(&self) -> Vec<u8> {
        self.state.borrow().writes.clone()
    }

    pub fn read_attempts(&self) -> usize {
        self.state.borrow().read_attempts
    }
}

impl ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl i2c::I2c for MockI2c {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let mut s = self.state.borrow_mut();
        for op in operations.iter_mut() {
            match op {
                Operation::Read(buf) => {
                    s.read_attempts += 1;
                    let response = match s.reads.pop_front() {
                        Some(r) => r,
                        None => match s.idle_status {
                            Some(b) => Response::Bytes(vec![b]),
                            None => Response::Nack,
                        },
                    };
                    match response {
                        Response::Bytes(bytes) => {
                            for (dst, src) in buf.iter_mut().zip(bytes.iter()) {
                                *dst = *src;
                            }
                        }
                        Response::Nack => return Err(MockI2cError),
                    }
                }
                Operation::Write(bytes) => {
                    if s.fail_writes > 0 {
                        s.fail_writes -= 1;
                        return Err(MockI2cError);
                    }
                    s.writes.extend_from_slice(bytes);
                }
            }
        }
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// --- Platform and key sink ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Power(Power),
    ForceRelease,
    Key(u16, bool),
    Sync,
    HoldPower,
    ReleasePower,
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub struct MockPlatform {
    pub events: EventLog,
    pub clock: Rc<Cell<u64>>,
    pub busy: Rc<Cell<bool>>,
    pub notification: Rc<Cell<bool>>,
}

impl TouchkeyPlatform for MockPlatform {
    fn set_power(&mut self, power: Power) {
        self.events.borrow_mut().push(Event::Power(power));
    }

    fn now_us(&self) -> u64 {
        self.clock.get()
    }

    fn touch_panel_busy(&self) -> bool {
        self.busy.get()
    }

    fn force_touch_release(&mut self) {
        self.events.borrow_mut().push(Event::ForceRelease);
    }

    fn notification_ongoing(&self) -> bool {
        self.notification.get()
    }

    fn hold_power(&mut self) {
        self.events.borrow_mut().push(Event::HoldPower);
    }

    fn release_power(&mut self) {
        self.events.borrow_mut().push(Event::ReleasePower);
    }
}

pub struct MockKeys {
    pub events: EventLog,
}

impl KeySink for MockKeys {
    fn report_key(&mut self, code: u16, pressed: bool) {
        self.events.borrow_mut().push(Event::Key(code, pressed));
    }

    fn sync(&mut self) {
        self.events.borrow_mut().push(Event::Sync);
    }
}

// --- Fixture ---

pub type TestDevice = TouchkeyDevice<'static, MockI2c, NoDelay, MockPlatform, MockKeys>;

pub const KEYS: [u16; 4] = [139, 102, 158, 217];

pub struct Rig {
    pub bus: MockI2c,
    pub events: EventLog,
    pub clock: Rc<Cell<u64>>,
    pub busy: Rc<Cell<bool>>,
    pub notification: Rc<Cell<bool>>,
    pub ring: &'static LogRing,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            bus: MockI2c::new(),
            events: Rc::new(RefCell::new(Vec::new())),
            clock: Rc::new(Cell::new(0)),
            busy: Rc::new(Cell::new(false)),
            notification: Rc::new(Cell::new(false)),
            ring: Box::leak(Box::new(LogRing::new())),
        }
    }

    /// Fast policy: no bus retries, no delays.
    pub fn config() -> TouchkeyConfig {
        TouchkeyConfig {
            bus_retries: 0,
            bus_retry_delay_ms: 0,
            probe_settle_ms: 0,
            resume_delay_ms: 0,
            ..TouchkeyConfig::default()
        }
    }

    pub fn probe_with(&self, version: [u8; 3], pdata: &PlatformData, config: TouchkeyConfig) -> TestDevice {
        self.bus.push_read(&version);
        let platform = MockPlatform {
            events: Rc::clone(&self.events),
            clock: Rc::clone(&self.clock),
            busy: Rc::clone(&self.busy),
            notification: Rc::clone(&self.notification),
        };
        let keys = MockKeys {
            events: Rc::clone(&self.events),
        };
        match TouchkeyDevice::probe(self.bus.clone(), NoDelay, platform, keys, pdata, config, self.ring) {
            Ok(dev) => dev,
            Err(e) => panic!("probe failed: {}", e),
        }
    }

    /// Probe a legacy-encoding controller with the four Atlas keys.
    pub fn probe_legacy(&self) -> TestDevice {
        self.probe_with([0, 0x05, 0x00], &PlatformData::with_keycodes(&KEYS), Self::config())
    }

    /// Probe a bitmask-encoding controller with the four Atlas keys.
    pub fn probe_bitmask(&self) -> TestDevice {
        self.probe_with([0, 0x0A, 0x00], &PlatformData::with_keycodes(&KEYS), Self::config())
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn key_events(&self) -> Vec<(u16, bool)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Key(code, pressed) => Some((*code, *pressed)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.events.borrow().iter().filter(|e| **e == event).count()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.clock.set(self.clock.get() + ms * 1000);
    }

    /// Drained log messages
    pub fn log_messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(entry) = self.ring.drain() {
            out.push(entry.message().to_string());
        }
        out
    }
}
