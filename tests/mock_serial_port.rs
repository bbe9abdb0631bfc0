#![allow(dead_code)]

use es51922::SerialPort;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// An in-memory serial port.
///
/// Clones share the same buffer, so a test can keep a handle to feed data to the transport.
#[derive(Default, Clone)]
pub struct MockSerialPort {
	pub read_buffer: Arc<Mutex<VecDeque<u8>>>,
}

impl MockSerialPort {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn feed(&self, data: &[u8]) {
		self.read_buffer.lock().unwrap().extend(data);
	}

	pub fn buffered(&self) -> usize {
		self.read_buffer.lock().unwrap().len()
	}
}

impl SerialPort for MockSerialPort {
	type Instant = std::time::Instant;

	fn discard_input_buffer(&mut self) -> std::io::Result<()> {
		self.read_buffer.lock().unwrap().clear();
		Ok(())
	}

	fn read(&mut self, buffer: &mut [u8], deadline: &Self::Instant) -> std::io::Result<usize> {
		loop {
			{
				let mut data = self.read_buffer.lock().unwrap();
				if !data.is_empty() {
					let len = buffer.len().min(data.len());
					for (target, byte) in buffer.iter_mut().zip(data.drain(..len)) {
						*target = byte;
					}
					return Ok(len);
				}
			}
			if Instant::now() > *deadline {
				return Err(std::io::ErrorKind::TimedOut.into());
			}
			std::thread::sleep(Duration::from_millis(1));
		}
	}

	fn make_deadline(&self, timeout: Duration) -> Self::Instant {
		Instant::now() + timeout
	}

	fn is_timeout_error(error: &std::io::Error) -> bool {
		error.kind() == std::io::ErrorKind::TimedOut
	}
}
