//! Trait implementation and port management using the `serial2` crate.

use std::time::{Duration, Instant};

use crate::error::{ConnectionError, ConnectionStage};
use crate::PortConfig;

/// Re-exported `serial2` crate in case you need to inspect serial port settings.
pub use serial2;

/// Open and configure a serial port for an ES51922 meter.
///
/// The port is put in raw mode with the fixed [`PortConfig`] line settings,
/// DTR is raised and RTS is lowered.
pub fn open(config: &PortConfig) -> Result<serial2::SerialPort, ConnectionError> {
	let error = |stage| {
		move |io| ConnectionError {
			port: config.port.clone(),
			stage,
			io,
		}
	};

	let mut port = serial2::SerialPort::open(&config.port, PortConfig::BAUD_RATE).map_err(error(ConnectionStage::Open))?;

	let mut settings = port.get_configuration().map_err(error(ConnectionStage::Configure))?;
	settings.set_raw();
	settings
		.set_baud_rate(PortConfig::BAUD_RATE)
		.map_err(error(ConnectionStage::Configure))?;
	settings.set_char_size(PortConfig::CHAR_SIZE);
	settings.set_parity(PortConfig::PARITY);
	settings.set_stop_bits(PortConfig::STOP_BITS);
	settings.set_flow_control(serial2::FlowControl::None);
	port.set_configuration(&settings).map_err(error(ConnectionStage::Configure))?;

	port.set_dtr(PortConfig::DTR).map_err(error(ConnectionStage::ControlLines))?;
	port.set_rts(PortConfig::RTS).map_err(error(ConnectionStage::ControlLines))?;

	debug!(
		"opened serial port {} ({} baud, {:?}, {:?}, {:?})",
		config.port,
		PortConfig::BAUD_RATE,
		PortConfig::CHAR_SIZE,
		PortConfig::PARITY,
		PortConfig::STOP_BITS
	);
	Ok(port)
}

/// List the serial ports visible to the OS.
pub fn available_ports() -> std::io::Result<Vec<String>> {
	let ports = serial2::SerialPort::available_ports()?;
	Ok(ports.iter().map(|path| path.display().to_string()).collect())
}

impl crate::SerialPort for serial2::SerialPort {
	type Instant = std::time::Instant;

	fn discard_input_buffer(&mut self) -> std::io::Result<()> {
		serial2::SerialPort::discard_input_buffer(self)
	}

	fn read(&mut self, buffer: &mut [u8], deadline: &Self::Instant) -> std::io::Result<usize> {
		let timeout = deadline
			.checked_duration_since(Instant::now())
			.ok_or(std::io::ErrorKind::TimedOut)?;
		self.set_read_timeout(timeout)?;
		serial2::SerialPort::read(self, buffer)
	}

	fn make_deadline(&self, timeout: Duration) -> Self::Instant {
		Instant::now() + timeout
	}

	fn is_timeout_error(error: &std::io::Error) -> bool {
		error.kind() == std::io::ErrorKind::TimedOut
	}
}
