//! Synthetic packet source for running without a meter.

use std::time::Duration;

use crate::error::ReadError;
use crate::packet::{self, Packet};
use crate::{Flags, FrameSource, Mode, Unit};

/// A [`FrameSource`] producing resistance packets without any I/O.
///
/// The simulated resistance sweeps from [`Simulator::MIN_RESISTANCE`] towards [`Simulator::MAX_RESISTANCE`]
/// in steps of [`Simulator::STEP`] and then wraps around.
#[derive(Debug, Clone)]
pub struct Simulator {
	step: u32,
	open: bool,
}

impl Simulator {
	/// The lowest simulated resistance in Ohm.
	pub const MIN_RESISTANCE: f64 = 100.0;

	/// The upper bound of the simulated resistance in Ohm (exclusive).
	pub const MAX_RESISTANCE: f64 = 150.0;

	/// The difference between consecutive packets in Ohm.
	pub const STEP: f64 = 0.1;

	pub fn new() -> Self {
		Self { step: 0, open: true }
	}

	fn next_resistance(&mut self) -> f64 {
		let steps = ((Self::MAX_RESISTANCE - Self::MIN_RESISTANCE) / Self::STEP).round() as u32;
		let resistance = Self::MIN_RESISTANCE + f64::from(self.step) * Self::STEP;
		self.step = (self.step + 1) % steps;
		resistance
	}
}

impl Default for Simulator {
	fn default() -> Self {
		Self::new()
	}
}

impl FrameSource for Simulator {
	fn read_frame(&mut self, _timeout: Duration) -> Result<Packet, ReadError> {
		if !self.open {
			return Err(ReadError::Closed);
		}

		let resistance = self.next_resistance();
		let flags = Flags {
			dc: true,
			auto_range: true,
			..Flags::default()
		};
		let packet = packet::encode(resistance, Unit::Ohm, Mode::Resistance, &flags).ok_or_else(|| {
			std::io::Error::new(
				std::io::ErrorKind::InvalidData,
				format!("simulated resistance {} can not be encoded", resistance),
			)
		})?;
		trace!("simulated packet: {:02X?}", packet);
		Ok(packet)
	}

	fn close(&mut self) {
		self.open = false;
	}

	fn is_open(&self) -> bool {
		self.open
	}
}
