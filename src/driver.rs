//! The public measurement driver.
//!
//! A [`Driver`] owns the connection to one meter, either a serial port or the simulator,
//! and exposes the measurement procedures with caller-facing errors.

use std::time::Duration;

use serial2::{CharSize, Parity, StopBits};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, ModeMismatchError};
use crate::procedures::{AveragedReading, Procedures};
use crate::{DriverConfig, FrameSource, Mode, PortConfig, Reading, Simulator, Transport, Unit};

/// The delay between samples of [`Driver::read_resistance()`].
pub const RESISTANCE_SAMPLE_DELAY: Duration = Duration::from_millis(300);

type BoxedSource = Box<dyn FrameSource + Send>;

/// The lifecycle state of a [`Driver`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DriverState {
	Closed,
	Open,
}

/// A snapshot of the driver configuration and state.
#[derive(Debug, Clone)]
pub struct PortInfo {
	pub port: String,
	pub baud_rate: u32,
	pub char_size: CharSize,
	pub parity: Parity,
	pub stop_bits: StopBits,

	/// The time to wait for a single packet.
	pub timeout: Duration,
	pub simulate: bool,
	pub state: DriverState,
}

/// Driver for an ES51922 based multimeter.
///
/// The driver is created closed.
/// Call [`Self::initialize()`] to open the serial port (or the simulator) before taking measurements.
/// The port is closed again by [`Self::shutdown()`] or when the driver is dropped.
pub struct Driver<C = SystemClock> {
	config: DriverConfig,
	clock: C,
	procedures: Option<Procedures<BoxedSource, C>>,
}

impl<C> std::fmt::Debug for Driver<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Driver")
			.field("config", &self.config)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}

impl Driver<SystemClock> {
	/// Create a new driver for the given configuration.
	///
	/// This does not open the serial port.
	pub fn new(config: DriverConfig) -> Self {
		Self::with_clock(config, SystemClock)
	}

	/// List the serial ports visible to the operating system.
	///
	/// Failure to enumerate the ports is logged and results in an empty list.
	pub fn list_serial_ports() -> Vec<String> {
		match crate::serial_port::serial2::available_ports() {
			Ok(ports) => {
				debug!("found {} serial ports", ports.len());
				ports
			},
			Err(_e) => {
				warn!("failed to list serial ports: {}", _e);
				Vec::new()
			},
		}
	}
}

impl<C> Driver<C> {
	pub fn config(&self) -> &DriverConfig {
		&self.config
	}

	pub fn state(&self) -> DriverState {
		match self.procedures {
			Some(_) => DriverState::Open,
			None => DriverState::Closed,
		}
	}

	/// Close the serial port.
	///
	/// Does nothing if the driver is already closed.
	pub fn shutdown(&mut self) {
		if let Some(mut procedures) = self.procedures.take() {
			procedures.source_mut().close();
			info!("driver shut down");
		}
	}

	/// Get a snapshot of the configuration and state of the driver.
	pub fn get_port_info(&self) -> PortInfo {
		PortInfo {
			port: self.config.port.clone(),
			baud_rate: PortConfig::BAUD_RATE,
			char_size: PortConfig::CHAR_SIZE,
			parity: PortConfig::PARITY,
			stop_bits: PortConfig::STOP_BITS,
			timeout: self.config.timeout,
			simulate: self.config.simulate,
			state: self.state(),
		}
	}
}

impl<C> Driver<C>
where
	C: Clock + Clone,
{
	/// Create a new driver that waits using a custom clock.
	pub fn with_clock(config: DriverConfig, clock: C) -> Self {
		Self {
			config,
			clock,
			procedures: None,
		}
	}

	/// Open the serial port, or the simulator in simulate mode.
	///
	/// Does nothing if the driver is already open.
	/// If opening fails, the driver stays closed.
	pub fn initialize(&mut self) -> Result<(), Error> {
		if self.procedures.is_some() {
			debug!("driver already initialized");
			return Ok(());
		}

		if self.config.simulate {
			info!("simulate mode: using synthetic resistance readings");
			self.bind(Box::new(Simulator::new()));
		} else {
			let transport = Transport::open(&self.config.port_config())?;
			info!("connected to {}", self.config.port);
			self.bind(Box::new(transport));
		}
		Ok(())
	}

	/// Use a custom frame source instead of the configured serial port.
	///
	/// A previously opened source is closed first.
	pub fn attach(&mut self, source: impl FrameSource + Send + 'static) {
		self.shutdown();
		self.bind(Box::new(source));
		debug!("attached custom frame source");
	}

	/// Read a single value, retrying up to `max_retries` times on failure.
	pub fn read_value(&mut self, max_retries: u32) -> Result<Reading, Error> {
		Ok(self.procedures()?.read_value(max_retries)?)
	}

	/// Read `sample_count` values with `delay` in between and average them.
	pub fn read_averaged(&mut self, sample_count: usize, delay: Duration) -> Result<AveragedReading, Error> {
		Ok(self.procedures()?.read_averaged(sample_count, delay)?)
	}

	/// Wait until the reading is stable within `stability_threshold`, for at most `timeout`.
	pub fn wait_for_stable(&mut self, timeout: Duration, stability_threshold: f64) -> Result<Reading, Error> {
		Ok(self.procedures()?.wait_for_stable(timeout, stability_threshold)?)
	}

	/// Measure a resistance in Ohm as the average of `average_count` samples.
	///
	/// Fails with [`Error::ModeMismatch`] if the meter is not in resistance mode.
	pub fn read_resistance(&mut self, average_count: usize) -> Result<f64, Error> {
		let averaged = self.read_averaged(average_count, RESISTANCE_SAMPLE_DELAY)?;
		ModeMismatchError::check(averaged.mode, Mode::Resistance)?;
		let ohm = averaged.unit.convert(averaged.mean, Unit::Ohm).ok_or(ModeMismatchError {
			expected: Mode::Resistance,
			actual: averaged.mode,
		})?;
		info!("resistance: {:.3} Ohm", ohm);
		Ok(ohm)
	}

	fn bind(&mut self, source: BoxedSource) {
		self.procedures = Some(Procedures::with_clock(source, self.clock.clone(), self.config.timeout));
	}

	fn procedures(&mut self) -> Result<&mut Procedures<BoxedSource, C>, Error> {
		self.procedures.as_mut().ok_or(Error::NotInitialized)
	}
}

impl<C> Drop for Driver<C> {
	fn drop(&mut self) {
		self.shutdown();
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	#[test]
	fn test_closed_driver() {
		let mut driver = Driver::new(DriverConfig::default());
		assert!(driver.state() == DriverState::Closed);
		assert!(let Err(Error::NotInitialized) = driver.read_value(0));
		assert!(let Err(Error::NotInitialized) = driver.read_resistance(5));
		driver.shutdown();
		driver.shutdown();
		assert!(driver.state() == DriverState::Closed);
	}

	#[test]
	fn test_port_info() {
		let driver = Driver::new(DriverConfig::new("/dev/ttyACM7").with_simulate(true));
		let info = driver.get_port_info();
		assert!(info.port == "/dev/ttyACM7");
		assert!(info.baud_rate == 19_200);
		assert!(info.simulate);
		assert!(info.state == DriverState::Closed);
		assert!(info.timeout == Duration::from_secs(2));
	}

	#[test]
	fn test_simulate_initialize_twice() {
		let mut driver = Driver::new(DriverConfig::default().with_simulate(true));
		let_assert!(Ok(()) = driver.initialize());
		let_assert!(Ok(()) = driver.initialize());
		assert!(driver.state() == DriverState::Open);
		let_assert!(Ok(reading) = driver.read_value(0));
		assert!(reading.mode() == Mode::Resistance);
		driver.shutdown();
		assert!(driver.state() == DriverState::Closed);
	}
}
