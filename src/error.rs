use std::time::Duration;

use crate::packet::PACKET_LEN;
use crate::{Mode, Packet, Reading};

/// The caller-facing error returned by [`crate::Driver`] operations.
#[derive(Debug)]
pub enum Error {
	/// The driver is closed: call [`crate::Driver::initialize()`] first.
	NotInitialized,
	Connection(ConnectionError),
	Measurement(MeasurementError),
	ModeMismatch(ModeMismatchError),
	StabilityTimeout(StabilityTimeoutError),
}

/// The serial port could not be opened or configured.
#[derive(Debug)]
pub struct ConnectionError {
	pub port: String,
	pub stage: ConnectionStage,
	pub io: std::io::Error,
}

/// The step of opening a serial port that failed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConnectionStage {
	Open,
	Configure,
	ControlLines,
	DiscardInput,
}

/// An error that can occur while reading a frame from a [`crate::FrameSource`].
#[derive(Debug)]
pub enum ReadError {
	Timeout(TimeoutError),
	Io(std::io::Error),
	/// The frame source was already closed.
	Closed,
}

/// No complete frame arrived within the read timeout.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TimeoutError {
	pub timeout: Duration,

	/// Bytes received without completing a frame.
	pub buffered: usize,
}

/// A received packet is malformed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DecodeError {
	/// Index of the offending byte in the packet.
	pub offset: usize,
	pub kind: DecodeErrorKind,
}

/// The reason a packet was rejected by the decoder.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DecodeErrorKind {
	BadLength { actual: usize },
	BadTerminator { actual: [u8; 2] },
	InvalidMarker { byte: u8 },
	InvalidDigit { nibble: u8 },
	UnknownMode { byte: u8 },
	UnknownRange { mode: Mode, range: u8 },
}

/// A single sample attempt failed.
#[derive(Debug)]
pub enum SampleError {
	Read(ReadError),
	Decode(DecodeError),
}

/// A measurement procedure exhausted its retry or sample budget.
#[derive(Debug)]
pub enum MeasurementError {
	RetriesExhausted {
		attempts: u32,
		last_error: SampleError,
		/// The last packet received, if any arrived at all.
		last_packet: Option<Packet>,
	},
	InsufficientSamples {
		valid: usize,
		required: usize,
		last_reading: Option<Reading>,
	},
	InconsistentSamples {
		expected: Mode,
		actual: Mode,
	},
}

/// The meter is not in the mode the operation requires.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ModeMismatchError {
	pub expected: Mode,
	pub actual: Mode,
}

/// Readings did not settle within the time budget.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityTimeoutError {
	pub timeout: Duration,
	pub last_reading: Option<Reading>,
	pub last_variation: Option<f64>,
}

impl Error {
	/// Check if the error was caused by a time budget running out.
	pub fn is_timeout(&self) -> bool {
		match self {
			Self::StabilityTimeout(_) => true,
			Self::Measurement(MeasurementError::RetriesExhausted { last_error, .. }) => last_error.is_timeout(),
			_ => false,
		}
	}
}

impl SampleError {
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Read(ReadError::Timeout(_)))
	}
}

impl DecodeError {
	pub(crate) fn new(offset: usize, kind: DecodeErrorKind) -> Self {
		Self { offset, kind }
	}

	pub(crate) fn check_length(actual: usize) -> Result<(), Self> {
		if actual == PACKET_LEN {
			Ok(())
		} else {
			Err(Self::new(actual.min(PACKET_LEN), DecodeErrorKind::BadLength { actual }))
		}
	}
}

impl ModeMismatchError {
	pub fn check(actual: Mode, expected: Mode) -> Result<(), Self> {
		if actual == expected {
			Ok(())
		} else {
			Err(Self { expected, actual })
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::NotInitialized => None,
			Self::Connection(e) => Some(e),
			Self::Measurement(e) => Some(e),
			Self::ModeMismatch(e) => Some(e),
			Self::StabilityTimeout(e) => Some(e),
		}
	}
}

impl std::error::Error for ConnectionError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.io)
	}
}

impl std::error::Error for ReadError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Timeout(e) => Some(e),
			Self::Io(e) => Some(e),
			Self::Closed => None,
		}
	}
}

impl std::error::Error for SampleError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Read(e) => Some(e),
			Self::Decode(e) => Some(e),
		}
	}
}

impl std::error::Error for MeasurementError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::RetriesExhausted { last_error, .. } => Some(last_error),
			_ => None,
		}
	}
}

impl std::error::Error for TimeoutError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for ModeMismatchError {}
impl std::error::Error for StabilityTimeoutError {}

impl From<ConnectionError> for Error {
	fn from(other: ConnectionError) -> Self {
		Self::Connection(other)
	}
}

impl From<MeasurementError> for Error {
	fn from(other: MeasurementError) -> Self {
		Self::Measurement(other)
	}
}

impl From<ModeMismatchError> for Error {
	fn from(other: ModeMismatchError) -> Self {
		Self::ModeMismatch(other)
	}
}

impl From<StabilityTimeoutError> for Error {
	fn from(other: StabilityTimeoutError) -> Self {
		Self::StabilityTimeout(other)
	}
}

impl From<TimeoutError> for ReadError {
	fn from(other: TimeoutError) -> Self {
		Self::Timeout(other)
	}
}

impl From<std::io::Error> for ReadError {
	fn from(other: std::io::Error) -> Self {
		Self::Io(other)
	}
}

impl From<ReadError> for SampleError {
	fn from(other: ReadError) -> Self {
		Self::Read(other)
	}
}

impl From<DecodeError> for SampleError {
	fn from(other: DecodeError) -> Self {
		Self::Decode(other)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::NotInitialized => write!(f, "driver is not initialized"),
			Self::Connection(e) => write!(f, "{}", e),
			Self::Measurement(e) => write!(f, "{}", e),
			Self::ModeMismatch(e) => write!(f, "{}", e),
			Self::StabilityTimeout(e) => write!(f, "{}", e),
		}
	}
}

impl std::fmt::Display for ConnectionError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.stage {
			ConnectionStage::Open => write!(f, "failed to open serial port {}: {}", self.port, self.io),
			ConnectionStage::Configure => write!(f, "failed to configure serial port {}: {}", self.port, self.io),
			ConnectionStage::ControlLines => write!(f, "failed to set DTR/RTS on serial port {}: {}", self.port, self.io),
			ConnectionStage::DiscardInput => write!(f, "failed to discard input buffer of serial port {}: {}", self.port, self.io),
		}
	}
}

impl std::fmt::Display for ReadError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Timeout(e) => write!(f, "{}", e),
			Self::Io(e) => write!(f, "failed to read from serial port: {}", e),
			Self::Closed => write!(f, "frame source is closed"),
		}
	}
}

impl std::fmt::Display for TimeoutError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"no complete packet received within {:?} ({} bytes buffered)",
			self.timeout, self.buffered
		)
	}
}

impl std::fmt::Display for DecodeError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "invalid packet at byte {}: {}", self.offset, self.kind)
	}
}

impl std::fmt::Display for DecodeErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::BadLength { actual } => write!(f, "bad length, expected {}, got {}", PACKET_LEN, actual),
			Self::BadTerminator { actual } => write!(f, "bad terminator, expected [0D, 0A], got {:02X?}", actual),
			Self::InvalidMarker { byte } => write!(f, "invalid marker nibble in byte {:#04X}", byte),
			Self::InvalidDigit { nibble } => write!(f, "invalid digit nibble {:#X}", nibble),
			Self::UnknownMode { byte } => write!(f, "unknown mode {:#04X}", byte),
			Self::UnknownRange { mode, range } => write!(f, "unknown range {} for mode {}", range, mode),
		}
	}
}

impl std::fmt::Display for SampleError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Read(e) => write!(f, "{}", e),
			Self::Decode(e) => write!(f, "{}", e),
		}
	}
}

impl std::fmt::Display for MeasurementError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::RetriesExhausted { attempts, last_error, last_packet } => {
				write!(f, "failed to read a value after {} attempts: {}", attempts, last_error)?;
				if let Some(packet) = last_packet {
					write!(f, " (last packet: {:02X?})", packet)?;
				}
				Ok(())
			},
			Self::InsufficientSamples { valid, required, .. } => {
				write!(f, "not enough valid samples, need at least {}, got {}", required, valid)
			},
			Self::InconsistentSamples { expected, actual } => {
				write!(f, "meter mode changed during measurement from {} to {}", expected, actual)
			},
		}
	}
}

impl std::fmt::Display for ModeMismatchError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "meter is in {} mode, expected {} mode", self.actual, self.expected)
	}
}

impl std::fmt::Display for StabilityTimeoutError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "reading did not stabilize within {:?}", self.timeout)?;
		if let Some(variation) = self.last_variation {
			write!(f, " (last variation: {:.2}%)", variation * 100.0)?;
		}
		Ok(())
	}
}
