//! Multi-sample measurement procedures.
//!
//! The procedures read packets from a [`FrameSource`], decode them and combine the readings.
//! All waiting goes through a [`Clock`], so the procedures can be tested without real delays.

use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::error::{MeasurementError, SampleError, StabilityTimeoutError};
use crate::packet::{self, Packet};
use crate::{FrameSource, Mode, Reading, Unit};

/// The number of retries used for every sample of the multi-sample procedures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// The minimum number of non-overloaded samples needed for an average.
pub const MIN_VALID_SAMPLES: usize = 2;

/// The number of consecutive readings compared when waiting for a stable reading.
pub const STABILITY_WINDOW: usize = 2;

/// The time between two polls when waiting for a stable reading.
pub const STABILITY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The result of averaging multiple readings.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedReading {
	/// The mean of all valid samples, in `unit`.
	pub mean: f64,

	/// The sample standard deviation of all valid samples, in `unit`.
	pub std_dev: f64,

	/// The unit of the most recent sample.
	pub unit: Unit,

	/// The mode of the most recent sample.
	pub mode: Mode,

	/// The number of samples that contributed to the mean.
	pub valid_samples: usize,

	/// The number of samples that were skipped because the meter showed an overload.
	pub overloaded_samples: usize,
}

/// Measurement procedures on top of a [`FrameSource`].
pub struct Procedures<S, C = SystemClock> {
	source: S,
	clock: C,
	read_timeout: Duration,
}

impl<S, C> std::fmt::Debug for Procedures<S, C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Procedures")
			.field("read_timeout", &self.read_timeout)
			.finish_non_exhaustive()
	}
}

impl<S, C> Procedures<S, C> {
	pub fn source(&self) -> &S {
		&self.source
	}

	pub fn source_mut(&mut self) -> &mut S {
		&mut self.source
	}

	/// Consume the procedures to get ownership of the frame source.
	pub fn into_source(self) -> S {
		self.source
	}

	pub fn clock(&self) -> &C {
		&self.clock
	}

	/// The time to wait for a single packet.
	pub fn read_timeout(&self) -> Duration {
		self.read_timeout
	}
}

impl<S> Procedures<S, SystemClock>
where
	S: FrameSource,
{
	/// Create procedures that wait for up to `read_timeout` for each packet.
	pub fn new(source: S, read_timeout: Duration) -> Self {
		Self::with_clock(source, SystemClock, read_timeout)
	}
}

impl<S, C> Procedures<S, C>
where
	S: FrameSource,
	C: Clock,
{
	/// Create procedures using a custom clock.
	pub fn with_clock(source: S, clock: C, read_timeout: Duration) -> Self {
		Self {
			source,
			clock,
			read_timeout,
		}
	}

	/// Read and decode a single packet.
	///
	/// A failed read or an invalid packet is retried up to `max_retries` more times.
	/// There is no delay between attempts other than the read timeout itself.
	pub fn read_value(&mut self, max_retries: u32) -> Result<Reading, MeasurementError> {
		self.read_value_until(max_retries, None)
	}

	/// Read and decode a single packet, giving up at `deadline`.
	///
	/// Every frame read is limited to the time left until the deadline,
	/// and no further attempts are made once it has passed.
	fn read_value_until(&mut self, max_retries: u32, deadline: Option<Instant>) -> Result<Reading, MeasurementError> {
		let attempts = max_retries.saturating_add(1);
		let mut last_packet = None;
		let mut attempt = 1;
		loop {
			let timeout = match deadline {
				Some(deadline) => self.read_timeout.min(deadline.saturating_duration_since(self.clock.now())),
				None => self.read_timeout,
			};
			let error = match self.read_sample(timeout, &mut last_packet) {
				Ok(reading) => {
					debug!("read {}", reading);
					return Ok(reading);
				},
				Err(e) => e,
			};

			let expired = deadline.map_or(false, |deadline| self.clock.now() >= deadline);
			if attempt >= attempts || expired {
				error!("failed to read a value after {} attempts: {}", attempt, error);
				return Err(MeasurementError::RetriesExhausted {
					attempts: attempt,
					last_error: error,
					last_packet,
				});
			}
			warn!("attempt {}/{} failed: {}", attempt, attempts, error);
			attempt += 1;
		}
	}

	/// Read `sample_count` values and compute their mean and standard deviation.
	///
	/// The procedure sleeps for `delay` between samples.
	/// Overloaded samples are skipped, but at least [`MIN_VALID_SAMPLES`] must remain.
	/// Samples taken in a different range than the last one are converted to its unit.
	pub fn read_averaged(&mut self, sample_count: usize, delay: Duration) -> Result<AveragedReading, MeasurementError> {
		debug!("reading {} samples for averaging", sample_count);

		let mut samples = Vec::with_capacity(sample_count);
		let mut last = None;
		for i in 0..sample_count {
			if i > 0 {
				self.clock.sleep(delay);
			}

			let reading = self.read_value(DEFAULT_MAX_RETRIES)?;
			match reading.value() {
				Some(value) => samples.push((value, reading.unit(), reading.mode())),
				None => warn!("sample {}/{} is an overload, skipping", i + 1, sample_count),
			}
			last = Some(reading);
		}

		let last = match last {
			Some(last) if samples.len() >= MIN_VALID_SAMPLES => last,
			last_reading => {
				return Err(MeasurementError::InsufficientSamples {
					valid: samples.len(),
					required: MIN_VALID_SAMPLES,
					last_reading,
				})
			},
		};

		let values = samples
			.iter()
			.map(|&(value, unit, mode)| {
				let inconsistent = MeasurementError::InconsistentSamples {
					expected: last.mode(),
					actual: mode,
				};
				if mode != last.mode() {
					return Err(inconsistent);
				}
				unit.convert(value, last.unit()).ok_or(inconsistent)
			})
			.collect::<Result<Vec<_>, _>>()?;

		let (mean, std_dev) = mean_and_std_dev(&values);
		info!(
			"averaged {} samples: {:.3} {} (std dev {:.3})",
			values.len(),
			mean,
			last.unit(),
			std_dev
		);

		Ok(AveragedReading {
			mean,
			std_dev,
			unit: last.unit(),
			mode: last.mode(),
			valid_samples: values.len(),
			overloaded_samples: sample_count - values.len(),
		})
	}

	/// Poll the meter until two consecutive readings differ by at most `stability_threshold`.
	///
	/// The variation is relative to the mean of the readings, so a threshold of `0.05` allows 5% variation.
	/// The latest reading is returned as soon as it is stable.
	/// Overloads and failed reads restart the comparison.
	/// Reads are cut short at the deadline, so the procedure never blocks much longer than `timeout`.
	pub fn wait_for_stable(&mut self, timeout: Duration, stability_threshold: f64) -> Result<Reading, StabilityTimeoutError> {
		debug!(
			"waiting up to {:?} for a stable reading (threshold {}%)",
			timeout,
			stability_threshold * 100.0
		);

		let deadline = self.clock.now() + timeout;
		let mut window = Vec::with_capacity(STABILITY_WINDOW + 1);
		let mut last_reading = None;
		let mut last_variation = None;

		loop {
			match self.read_value_until(DEFAULT_MAX_RETRIES, Some(deadline)) {
				Ok(reading) => {
					match reading.value() {
						Some(value) => {
							window.push(value);
							if window.len() > STABILITY_WINDOW {
								window.remove(0);
							}
						},
						None => {
							warn!("overload while waiting for a stable reading");
							window.clear();
						},
					}

					if window.len() == STABILITY_WINDOW {
						let variation = relative_variation(&window);
						last_variation = Some(variation);
						if variation <= stability_threshold {
							info!("reading stable at {} (variation {:.2}%)", reading, variation * 100.0);
							return Ok(reading);
						}
					}
					last_reading = Some(reading);
				},
				Err(e) => {
					warn!("read failed while waiting for a stable reading: {}", e);
					window.clear();
				},
			}

			let now = self.clock.now();
			if now >= deadline {
				return Err(StabilityTimeoutError {
					timeout,
					last_reading,
					last_variation,
				});
			}
			self.clock.sleep(STABILITY_POLL_INTERVAL.min(deadline - now));
		}
	}

	fn read_sample(&mut self, timeout: Duration, last_packet: &mut Option<Packet>) -> Result<Reading, SampleError> {
		let packet = self.source.read_frame(timeout)?;
		*last_packet = Some(packet);
		Ok(packet::decode(&packet)?)
	}
}

/// Compute the mean and the sample standard deviation.
///
/// The standard deviation of less than two values is zero.
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
	if values.is_empty() {
		return (0.0, 0.0);
	}

	let count = values.len() as f64;
	let mean = values.iter().sum::<f64>() / count;
	if values.len() < 2 {
		return (mean, 0.0);
	}

	let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (count - 1.0);
	(mean, variance.sqrt())
}

/// Compute the spread of the values relative to their mean.
fn relative_variation(values: &[f64]) -> f64 {
	let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let min = values.iter().copied().fold(f64::INFINITY, f64::min);
	let mean = values.iter().sum::<f64>() / values.len() as f64;

	if mean == 0.0 {
		if max == min {
			0.0
		} else {
			f64::INFINITY
		}
	} else {
		(max - min) / mean.abs()
	}
}
