use assert2::{assert, let_assert};
use es51922::error::{ConnectionStage, MeasurementError};
use es51922::{Driver, DriverConfig, DriverState, Error, FrameSource, Mode, Simulator, Unit};
use std::time::Duration;
use test_log::test;

mod common;
use common::{Frame, ManualClock, ScriptedSource};

fn driver() -> Driver<ManualClock> {
	Driver::with_clock(DriverConfig::default().with_timeout(Duration::from_millis(100)), ManualClock::new())
}

fn simulator() -> Driver<ManualClock> {
	Driver::with_clock(DriverConfig::default().with_simulate(true), ManualClock::new())
}

#[test]
fn shutdown_before_initialize() {
	let mut driver = driver();
	driver.shutdown();
	driver.shutdown();
	assert!(driver.state() == DriverState::Closed);
}

#[test]
fn shutdown_twice() {
	let mut driver = simulator();
	let_assert!(Ok(()) = driver.initialize());
	assert!(driver.state() == DriverState::Open);
	driver.shutdown();
	driver.shutdown();
	assert!(driver.state() == DriverState::Closed);
	assert!(let Err(Error::NotInitialized) = driver.read_value(0));
}

#[test]
fn operations_require_initialize() {
	let mut driver = driver();
	assert!(let Err(Error::NotInitialized) = driver.read_value(3));
	assert!(let Err(Error::NotInitialized) = driver.read_averaged(5, Duration::ZERO));
	assert!(let Err(Error::NotInitialized) = driver.wait_for_stable(Duration::from_secs(1), 0.05));
	assert!(let Err(Error::NotInitialized) = driver.read_resistance(5));
}

#[test]
fn simulated_resistance_in_range() {
	let mut driver = simulator();
	let_assert!(Ok(()) = driver.initialize());
	for _ in 0..20 {
		let_assert!(Ok(ohm) = driver.read_resistance(5));
		assert!(ohm >= Simulator::MIN_RESISTANCE);
		assert!(ohm < Simulator::MAX_RESISTANCE);
	}
}

#[test]
fn read_resistance_converts_to_ohm() {
	let mut driver = driver();
	driver.attach(ScriptedSource::packets([common::dc_packet(1.5, Unit::Kiloohm, Mode::Resistance)]));
	let_assert!(Ok(ohm) = driver.read_resistance(3));
	assert!((ohm - 1500.0).abs() < 1e-9);

	driver.attach(ScriptedSource::packets([common::dc_packet(2.0, Unit::Megaohm, Mode::Resistance)]));
	let_assert!(Ok(ohm) = driver.read_resistance(3));
	assert!((ohm - 2e6).abs() < 1e-6);
}

#[test]
fn read_resistance_in_voltage_mode() {
	let mut driver = driver();
	driver.attach(ScriptedSource::packets([common::dc_packet(5.0, Unit::Volt, Mode::Voltage)]));
	let_assert!(Err(Error::ModeMismatch(e)) = driver.read_resistance(3));
	assert!(e.expected == Mode::Resistance);
	assert!(e.actual == Mode::Voltage);
}

#[test]
fn read_failure_is_timeout() {
	let mut driver = driver();
	driver.attach(ScriptedSource::new([Frame::Timeout]));
	let_assert!(Err(e) = driver.read_value(1));
	assert!(e.is_timeout());
	let_assert!(Error::Measurement(MeasurementError::RetriesExhausted { attempts, .. }) = e);
	assert!(attempts == 2);
}

#[test]
fn unstable_reading_is_timeout() {
	let mut driver = driver();
	driver.attach(ScriptedSource::ohms(&[100.0, 200.0, 100.0, 200.0, 100.0, 200.0]));
	let_assert!(Err(e) = driver.wait_for_stable(Duration::from_secs(1), 0.05));
	assert!(e.is_timeout());
	let_assert!(Error::StabilityTimeout(e) = e);
	assert!(e.last_reading.is_some());
}

#[test]
fn attach_replaces_source() {
	let mut driver = driver();
	let first = ScriptedSource::ohms(&[1.0]);
	let second = ScriptedSource::ohms(&[2.0]);
	driver.attach(first.clone());
	driver.attach(second.clone());
	assert!(!first.is_open());
	assert!(second.is_open());
	let_assert!(Ok(reading) = driver.read_value(0));
	assert!(reading.value() == Some(2.0));
}

#[test]
fn drop_closes_source() {
	let source = ScriptedSource::ohms(&[1.0]);
	let mut driver = driver();
	driver.attach(source.clone());
	drop(driver);
	assert!(!source.is_open());
}

#[test]
fn initialize_missing_port() {
	let mut driver = Driver::new(DriverConfig::new("/dev/es51922-does-not-exist"));
	let_assert!(Err(Error::Connection(e)) = driver.initialize());
	assert!(e.stage == ConnectionStage::Open);
	assert!(e.port == "/dev/es51922-does-not-exist");
	assert!(driver.state() == DriverState::Closed);
}

#[test]
fn port_info_reflects_state() {
	let mut driver = simulator();
	assert!(driver.get_port_info().state == DriverState::Closed);
	let_assert!(Ok(()) = driver.initialize());
	let info = driver.get_port_info();
	assert!(info.state == DriverState::Open);
	assert!(info.simulate);
	assert!(info.baud_rate == 19_200);
}

#[test]
fn list_serial_ports_never_fails() {
	let ports = Driver::list_serial_ports();
	assert!(ports.iter().all(|port| !port.is_empty()));
}
