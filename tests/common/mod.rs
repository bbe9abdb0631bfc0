#![allow(dead_code)]

use es51922::error::{ReadError, TimeoutError};
use es51922::{packet, Clock, Flags, FrameSource, Mode, Packet, Unit};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Build a DC packet for the given value.
pub fn dc_packet(value: f64, unit: Unit, mode: Mode) -> Packet {
	let flags = Flags {
		dc: true,
		..Flags::default()
	};
	packet_with_flags(value, unit, mode, &flags)
}

pub fn packet_with_flags(value: f64, unit: Unit, mode: Mode, flags: &Flags) -> Packet {
	match packet::encode(value, unit, mode, flags) {
		Some(packet) => packet,
		None => panic!("failed to encode {} {} in {} mode", value, unit, mode),
	}
}

pub fn ohm(value: f64) -> Packet {
	dc_packet(value, Unit::Ohm, Mode::Resistance)
}

pub fn overload() -> Packet {
	let flags = Flags {
		overload: true,
		..Flags::default()
	};
	packet_with_flags(0.0, Unit::Megaohm, Mode::Resistance, &flags)
}

/// A clock that only advances when slept on.
///
/// Clones share the same time, so a test can keep a handle to inspect it.
#[derive(Debug, Clone)]
pub struct ManualClock {
	start: Instant,
	elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
	pub fn new() -> Self {
		Self {
			start: Instant::now(),
			elapsed: Rc::new(Cell::new(Duration::ZERO)),
		}
	}

	pub fn elapsed(&self) -> Duration {
		self.elapsed.get()
	}

	pub fn advance(&self, duration: Duration) {
		self.elapsed.set(self.elapsed.get() + duration);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		self.start + self.elapsed.get()
	}

	fn sleep(&mut self, duration: Duration) {
		self.advance(duration);
	}
}

/// One scripted response of a [`ScriptedSource`].
#[derive(Debug, Clone)]
pub enum Frame {
	Packet(Packet),
	Raw(Vec<u8>),
	Timeout,
}

/// A frame source that replays a fixed script.
///
/// The last frame is repeated forever once the script runs out.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
	state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug)]
struct ScriptState {
	frames: VecDeque<Frame>,
	last: Option<Frame>,
	reads: usize,
	open: bool,
}

impl ScriptedSource {
	pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
		Self {
			state: Arc::new(Mutex::new(ScriptState {
				frames: frames.into_iter().collect(),
				last: None,
				reads: 0,
				open: true,
			})),
		}
	}

	pub fn packets(packets: impl IntoIterator<Item = Packet>) -> Self {
		Self::new(packets.into_iter().map(Frame::Packet))
	}

	pub fn ohms(values: &[f64]) -> Self {
		Self::packets(values.iter().map(|&value| ohm(value)))
	}

	/// The number of frames read so far.
	pub fn reads(&self) -> usize {
		self.state.lock().unwrap().reads
	}
}

impl FrameSource for ScriptedSource {
	fn read_frame(&mut self, timeout: Duration) -> Result<Packet, ReadError> {
		let mut state = self.state.lock().unwrap();
		if !state.open {
			return Err(ReadError::Closed);
		}
		state.reads += 1;

		let frame = match state.frames.pop_front() {
			Some(frame) => {
				state.last = Some(frame.clone());
				frame
			},
			None => state.last.clone().unwrap_or(Frame::Timeout),
		};

		match frame {
			Frame::Packet(packet) => Ok(packet),
			Frame::Raw(data) => {
				// Deliver malformed data as a packet, like a transport would after framing.
				let mut frame = [0; packet::PACKET_LEN];
				let len = data.len().min(packet::PACKET_LEN);
				frame[..len].copy_from_slice(&data[..len]);
				Ok(frame)
			},
			Frame::Timeout => Err(TimeoutError { timeout, buffered: 0 }.into()),
		}
	}

	fn close(&mut self) {
		self.state.lock().unwrap().open = false;
	}

	fn is_open(&self) -> bool {
		self.state.lock().unwrap().open
	}
}

/// A frame source for a silent port: every read uses up its full timeout on the shared clock.
#[derive(Debug, Clone)]
pub struct SilentSource {
	clock: ManualClock,
	reads: Rc<Cell<usize>>,
}

impl SilentSource {
	pub fn new(clock: &ManualClock) -> Self {
		Self {
			clock: clock.clone(),
			reads: Rc::new(Cell::new(0)),
		}
	}

	pub fn reads(&self) -> usize {
		self.reads.get()
	}
}

impl FrameSource for SilentSource {
	fn read_frame(&mut self, timeout: Duration) -> Result<Packet, ReadError> {
		self.reads.set(self.reads.get() + 1);
		self.clock.advance(timeout);
		Err(TimeoutError { timeout, buffered: 0 }.into())
	}

	fn close(&mut self) {}

	fn is_open(&self) -> bool {
		true
	}
}
