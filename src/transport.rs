//! Framing of the raw serial byte stream into packets.

use std::time::Duration;

use crate::error::{ConnectionError, ConnectionStage, ReadError, TimeoutError};
use crate::packet::{Packet, PACKET_LEN, TERMINATOR};
use crate::{PortConfig, SerialPort};

const READ_BUFFER_LEN: usize = 4 * PACKET_LEN;

/// A source of raw packets.
///
/// Implemented by [`Transport`] for real serial ports and by [`crate::Simulator`].
pub trait FrameSource {
	/// Read the next complete packet, waiting at most `timeout`.
	fn read_frame(&mut self, timeout: Duration) -> Result<Packet, ReadError>;

	/// Release the underlying resources.
	///
	/// Closing an already closed source does nothing.
	fn close(&mut self);

	fn is_open(&self) -> bool;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
	fn read_frame(&mut self, timeout: Duration) -> Result<Packet, ReadError> {
		(**self).read_frame(timeout)
	}

	fn close(&mut self) {
		(**self).close()
	}

	fn is_open(&self) -> bool {
		(**self).is_open()
	}
}

/// Splits the byte stream of a serial port into packets.
///
/// The transport has no knowledge of the packet contents.
/// It only uses the terminator to find packet boundaries.
pub struct Transport<S> {
	/// The underlying serial port, `None` once closed.
	serial_port: Option<S>,

	/// The buffer for reading incoming bytes.
	read_buffer: [u8; READ_BUFFER_LEN],

	/// The total number of valid bytes in the read buffer.
	read_len: usize,
}

impl<S> std::fmt::Debug for Transport<S>
where
	S: std::fmt::Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Transport")
			.field("serial_port", &self.serial_port)
			.field("buffered", &self.read_len)
			.finish()
	}
}

impl Transport<serial2::SerialPort> {
	/// Open and configure the serial port described by `config`.
	pub fn open(config: &PortConfig) -> Result<Self, ConnectionError> {
		let serial_port = crate::serial_port::serial2::open(config)?;
		let mut transport = Self::new(serial_port);
		transport.discard_input_buffer().map_err(|io| ConnectionError {
			port: config.port.clone(),
			stage: ConnectionStage::DiscardInput,
			io,
		})?;
		info!("opened {} for reading ES51922 packets", config.port);
		Ok(transport)
	}
}

impl<S> Transport<S>
where
	S: SerialPort,
{
	/// Create a transport for an already configured serial port.
	pub fn new(serial_port: S) -> Self {
		Self {
			serial_port: Some(serial_port),
			read_buffer: [0; READ_BUFFER_LEN],
			read_len: 0,
		}
	}

	/// Get a reference to the underlying serial port, if the transport is still open.
	pub fn serial_port(&self) -> Option<&S> {
		self.serial_port.as_ref()
	}

	/// Read the next packet from the serial port.
	///
	/// Bytes before a terminator that do not belong to the packet are discarded,
	/// as are packets that are too short.
	pub fn read_frame(&mut self, timeout: Duration) -> Result<Packet, ReadError> {
		let deadline = match &self.serial_port {
			Some(serial_port) => serial_port.make_deadline(timeout),
			None => return Err(ReadError::Closed),
		};

		loop {
			if let Some(packet) = self.take_packet() {
				trace!("read packet: {:02X?}", packet);
				return Ok(packet);
			}

			let serial_port = self.serial_port.as_mut().ok_or(ReadError::Closed)?;
			match serial_port.read(&mut self.read_buffer[self.read_len..], &deadline) {
				Ok(0) => continue,
				Ok(new_data) => self.read_len += new_data,
				Err(e) if S::is_timeout_error(&e) => {
					trace!(
						"timeout reading packet, data in buffer: {:02X?}",
						&self.read_buffer[..self.read_len]
					);
					return Err(TimeoutError {
						timeout,
						buffered: self.read_len,
					}
					.into());
				},
				Err(e) => return Err(e.into()),
			}
		}
	}

	/// Discard all buffered data, both in the transport and in the serial port.
	///
	/// Does nothing if the transport is closed.
	pub fn discard_input_buffer(&mut self) -> std::io::Result<()> {
		self.read_len = 0;
		match &mut self.serial_port {
			Some(serial_port) => serial_port.discard_input_buffer(),
			None => Ok(()),
		}
	}

	/// Close the serial port.
	pub fn close(&mut self) {
		if self.serial_port.take().is_some() {
			debug!("closed serial port");
		}
		self.read_len = 0;
	}

	/// Take the first complete packet out of the read buffer.
	fn take_packet(&mut self) -> Option<Packet> {
		loop {
			let buffer = &self.read_buffer[..self.read_len];
			let end = match find_terminator(buffer) {
				Some(end) => end,
				None => {
					// Garbage without a terminator, keep only what could be the start of a packet.
					if self.read_len == READ_BUFFER_LEN {
						let garbage_len = self.read_len - (PACKET_LEN - 1);
						debug!("skipping {} bytes without packet terminator", garbage_len);
						self.consume_read_bytes(garbage_len);
					}
					return None;
				},
			};

			if end < PACKET_LEN {
				debug!("skipping truncated packet of {} bytes", end);
				trace!("truncated packet: {:02X?}", &buffer[..end]);
				self.consume_read_bytes(end);
				continue;
			}

			let start = end - PACKET_LEN;
			if start > 0 {
				debug!("skipping {} bytes of leading garbage", start);
				trace!("skipped garbage: {:02X?}", &buffer[..start]);
			}

			let mut packet = [0; PACKET_LEN];
			packet.copy_from_slice(&buffer[start..end]);
			self.consume_read_bytes(end);
			return Some(packet);
		}
	}

	fn consume_read_bytes(&mut self, len: usize) {
		debug_assert!(len <= self.read_len);
		self.read_buffer.copy_within(len..self.read_len, 0);
		self.read_len -= len;
	}
}

impl<S> FrameSource for Transport<S>
where
	S: SerialPort,
{
	fn read_frame(&mut self, timeout: Duration) -> Result<Packet, ReadError> {
		Transport::read_frame(self, timeout)
	}

	fn close(&mut self) {
		Transport::close(self)
	}

	fn is_open(&self) -> bool {
		self.serial_port.is_some()
	}
}

/// Find the end of the first packet terminator.
///
/// Returns the index just past the terminator, or `None` if the buffer holds no complete terminator.
fn find_terminator(buffer: &[u8]) -> Option<usize> {
	buffer
		.windows(TERMINATOR.len())
		.position(|window| *window == TERMINATOR)
		.map(|start| start + TERMINATOR.len())
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::assert;

	#[test]
	fn test_find_terminator() {
		assert!(find_terminator(&[]) == None);
		assert!(find_terminator(&[0x0D]) == None);
		assert!(find_terminator(&[0x0D, 0x0A]) == Some(2));
		assert!(find_terminator(&[0x30, 0x31, 0x0D, 0x0A]) == Some(4));
		assert!(find_terminator(&[0x30, 0x0A, 0x0D]) == None);
		assert!(find_terminator(&[0x0D, 0x0D, 0x0A, 0x0D, 0x0A]) == Some(3));
	}
}
