//! [`SerialPort`] trait to support reading from different serial port implementations.

use core::time::Duration;

pub mod serial2;

/// [`SerialPort`]s deliver the raw byte stream of the meter.
///
/// The implementor of the trait must configure the serial line to use 19200 baud, 7 bit characters,
/// odd parity and 1 stop bit, and must keep DTR high and RTS low to power the optical receiver.
/// See [`crate::PortConfig`].
pub trait SerialPort {
	/// A point in time that can be used as a deadline for a I/O operations.
	type Instant: Copy;

	/// Discard the input buffer of the serial port. Maybe a no-op on some platforms.
	fn discard_input_buffer(&mut self) -> std::io::Result<()>;

	/// Returns available bytes to read, blocking until at least one byte is available or the deadline expires.
	fn read(&mut self, buffer: &mut [u8], deadline: &Self::Instant) -> std::io::Result<usize>;

	/// Make a deadline to expire after the given timeout.
	fn make_deadline(&self, timeout: Duration) -> Self::Instant;

	/// Check if an error indicates a timeout.
	fn is_timeout_error(error: &std::io::Error) -> bool;
}
