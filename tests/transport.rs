use assert2::{assert, let_assert};
use es51922::error::ReadError;
use es51922::{packet, FrameSource, Mode, Transport, Unit};
use std::time::Duration;
use test_log::test;

mod common;
mod mock_serial_port;
use mock_serial_port::MockSerialPort;

const TIMEOUT: Duration = Duration::from_millis(50);

fn setup() -> (Transport<MockSerialPort>, MockSerialPort) {
	let serial_port = MockSerialPort::new();
	(Transport::new(serial_port.clone()), serial_port)
}

#[test]
fn read_single_packet() {
	let (mut transport, serial_port) = setup();
	let expected = common::ohm(123.4);
	serial_port.feed(&expected);

	let_assert!(Ok(frame) = transport.read_frame(TIMEOUT));
	assert!(frame == expected);
	let_assert!(Ok(reading) = packet::decode(&frame));
	assert!(reading.value() == Some(123.4));
}

#[test]
fn read_consecutive_packets() {
	let (mut transport, serial_port) = setup();
	let first = common::ohm(100.0);
	let second = common::dc_packet(5.0, Unit::Volt, Mode::Voltage);
	serial_port.feed(&first);
	serial_port.feed(&second);

	let_assert!(Ok(packet) = transport.read_frame(TIMEOUT));
	assert!(packet == first);
	let_assert!(Ok(packet) = transport.read_frame(TIMEOUT));
	assert!(packet == second);
}

#[test]
fn skip_leading_garbage() {
	let (mut transport, serial_port) = setup();
	let expected = common::ohm(42.0);
	serial_port.feed(&[0x12, 0x34, 0x0D]);
	serial_port.feed(&expected);

	let_assert!(Ok(packet) = transport.read_frame(TIMEOUT));
	assert!(packet == expected);
}

#[test]
fn skip_truncated_packet() {
	let (mut transport, serial_port) = setup();
	let expected = common::ohm(42.0);
	serial_port.feed(&expected[..6]);
	serial_port.feed(&packet::TERMINATOR);
	serial_port.feed(&expected);

	let_assert!(Ok(packet) = transport.read_frame(TIMEOUT));
	assert!(packet == expected);
}

#[test]
fn skip_long_garbage_without_terminator() {
	let (mut transport, serial_port) = setup();
	let expected = common::ohm(149.9);
	serial_port.feed(&[0x30; 100]);
	serial_port.feed(&expected);

	let_assert!(Ok(packet) = transport.read_frame(TIMEOUT));
	assert!(packet == expected);
}

#[test]
fn timeout_on_empty_port() {
	let (mut transport, _serial_port) = setup();
	let_assert!(Err(ReadError::Timeout(e)) = transport.read_frame(TIMEOUT));
	assert!(e.timeout == TIMEOUT);
	assert!(e.buffered == 0);
}

#[test]
fn timeout_on_incomplete_packet() {
	let (mut transport, serial_port) = setup();
	serial_port.feed(&common::ohm(1.0)[..5]);
	let_assert!(Err(ReadError::Timeout(e)) = transport.read_frame(TIMEOUT));
	assert!(e.buffered == 5);
}

#[test]
fn close_is_idempotent() {
	let (mut transport, serial_port) = setup();
	serial_port.feed(&common::ohm(1.0));
	assert!(transport.is_open());

	FrameSource::close(&mut transport);
	FrameSource::close(&mut transport);
	assert!(!transport.is_open());
	assert!(transport.serial_port().is_none());
	assert!(let Err(ReadError::Closed) = transport.read_frame(TIMEOUT));
}

#[test]
fn discard_input_buffer() {
	let (mut transport, serial_port) = setup();
	serial_port.feed(&common::ohm(1.0)[..8]);
	assert!(let Err(ReadError::Timeout(_)) = transport.read_frame(TIMEOUT));

	serial_port.feed(&[0x31, 0x32]);
	let_assert!(Ok(()) = transport.discard_input_buffer());
	assert!(serial_port.buffered() == 0);

	let expected = common::ohm(2.0);
	serial_port.feed(&expected);
	let_assert!(Ok(frame) = transport.read_frame(TIMEOUT));
	assert!(frame == expected);
}
