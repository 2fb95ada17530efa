//! Log output: drains a [`LogRing`] into a text sink.
//!
//! On the board the sink is UART1 TX (GPIO6, TX-only); on the host any
//! `core::fmt::Write` works, which is how the tests read the driver logs.
//!
//! ```text
//! ESP32-S3 GPIO6 (TX) ──────▶ USB-UART RX
//!                              └─▶ PC Serial Monitor
//! ```

use core::fmt::{self, Write};

use crate::logging::{LogEntry, LogRing};

#[cfg(all(target_os = "espidf", feature = "firmware"))]
use esp_idf_svc::hal::{
    gpio,
    peripheral::Peripheral,
    uart::{self, UartTxDriver},
};

/// UART configuration for log output.
pub struct UartLogConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for UartLogConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            tx_pin: 6,
        }
    }
}

/// Write one entry as `[timestamp_us] LEVEL tag: message\n`.
pub fn write_entry(out: &mut dyn Write, entry: &LogEntry) -> fmt::Result {
    writeln!(
        out,
        "[{:10}] {}: {}: {}",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.tag,
        entry.message()
    )
}

/// Drain every pending entry into `out`, then report drops once.
///
/// Returns the number of entries written.
pub fn drain_into<const N: usize>(ring: &LogRing<N>, out: &mut dyn Write) -> usize {
    let mut written = 0;
    while let Some(entry) = ring.drain() {
        if write_entry(out, &entry).is_err() {
            break;
        }
        written += 1;
    }

    let dropped = ring.dropped();
    if dropped > 0 {
        let _ = writeln!(out, "[WARN] log: dropped {} entries", dropped);
        ring.reset_dropped();
    }
    written
}

/// `core::fmt::Write` adapter over the UART TX driver.
#[cfg(all(target_os = "espidf", feature = "firmware"))]
pub struct UartSink<'d> {
    uart: UartTxDriver<'d>,
}

#[cfg(all(target_os = "espidf", feature = "firmware"))]
impl<'d> UartSink<'d> {
    /// Bring up UART1 TX-only for log output.
    pub fn new(
        uart: impl Peripheral<P = uart::UART1> + 'd,
        tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
        config: &UartLogConfig,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        let uart_config = uart::config::Config::default()
            .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

        let uart = UartTxDriver::new(
            uart,
            tx_pin,
            Option::<gpio::AnyIOPin>::None, // CTS
            Option::<gpio::AnyIOPin>::None, // RTS
            &uart_config,
        )?;
        Ok(Self { uart })
    }
}

#[cfg(all(target_os = "espidf", feature = "firmware"))]
impl Write for UartSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.uart.write(s.as_bytes()).map(|_| ()).map_err(|_| fmt::Error)
    }
}
