//! Time source for the measurement procedures.

use std::time::{Duration, Instant};

/// A source of time that the procedures poll and sleep with.
///
/// Tests substitute a manual clock to run timeouts without real delays.
pub trait Clock {
	fn now(&self) -> Instant;

	fn sleep(&mut self, duration: Duration);
}

/// The system clock, sleeping the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}

	fn sleep(&mut self, duration: Duration) {
		std::thread::sleep(duration)
	}
}
