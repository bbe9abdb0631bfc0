//! Driver and serial line configuration.

use std::time::Duration;

use serial2::{CharSize, Parity, StopBits};

/// The default time to wait for a single packet.
///
/// The meter sends about two packets per second.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// The serial port opened when none is configured.
#[cfg(target_os = "windows")]
pub const DEFAULT_PORT: &str = "COM1";

/// The serial port opened when none is configured.
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Serial line settings of the ES51922 optical interface.
///
/// Only the port is configurable, the line settings are fixed by the meter.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PortConfig {
	pub port: String,
}

impl PortConfig {
	pub const BAUD_RATE: u32 = 19_200;
	pub const CHAR_SIZE: CharSize = CharSize::Bits7;
	pub const PARITY: Parity = Parity::Odd;
	pub const STOP_BITS: StopBits = StopBits::One;

	/// DTR is held high for the whole session.
	pub const DTR: bool = true;

	/// RTS is held low for the whole session.
	pub const RTS: bool = false;

	pub fn new(port: impl Into<String>) -> Self {
		Self { port: port.into() }
	}
}

/// Configuration of a [`crate::Driver`].
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
	/// The serial port the meter is connected to.
	pub port: String,

	/// Use a synthetic data source instead of the serial port.
	pub simulate: bool,

	/// The time to wait for a single packet.
	pub timeout: Duration,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			port: DEFAULT_PORT.to_owned(),
			simulate: false,
			timeout: DEFAULT_TIMEOUT,
		}
	}
}

impl DriverConfig {
	/// Create a configuration for the given serial port.
	pub fn new(port: impl Into<String>) -> Self {
		Self {
			port: port.into(),
			..Self::default()
		}
	}

	pub fn with_simulate(mut self, simulate: bool) -> Self {
		self.simulate = simulate;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// The serial line settings for the configured port.
	pub fn port_config(&self) -> PortConfig {
		PortConfig::new(self.port.as_str())
	}
}
