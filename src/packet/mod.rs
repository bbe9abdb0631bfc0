//! ES51922 packet format.
//!
//! The meter continuously transmits 14 byte packets describing the display:
//!
//! | byte  | content                                        |
//! |-------|------------------------------------------------|
//! | 0     | range code (bits 0-2)                          |
//! | 1-5   | display digits, most significant first         |
//! | 6     | function (measurement mode)                    |
//! | 7     | status: percent, sign, low battery, overload   |
//! | 8     | option 1: max, min, relative                   |
//! | 9     | option 2: underflow, limit high, limit low     |
//! | 10    | option 3: DC, AC, auto range, Hz               |
//! | 11    | option 4: bar graph, hold, low pass filter     |
//! | 12-13 | terminator `\r\n`                              |
//!
//! Bytes 0 to 11 all carry `0x3` in the upper nibble.
//! The data is sent as 7 bit characters, so the high bit is always clear.

use crate::error::{DecodeError, DecodeErrorKind};
use crate::{Flags, Mode, Reading, Unit};

mod tables;
pub use tables::RangeInfo;

/// The length of a packet in bytes, including the terminator.
pub const PACKET_LEN: usize = 14;

/// The two bytes that end every packet.
pub const TERMINATOR: [u8; 2] = [0x0D, 0x0A];

/// A raw packet as received from the meter.
pub type Packet = [u8; PACKET_LEN];

const MARKER: u8 = 0x30;
const DIGITS: std::ops::Range<usize> = 1..6;
const FUNCTION: usize = 6;
const STATUS: usize = 7;
const OPTION_1: usize = 8;
const OPTION_2: usize = 9;
const OPTION_3: usize = 10;
const OPTION_4: usize = 11;

/// Decode a raw packet into a [`Reading`].
///
/// The packet must be exactly [`PACKET_LEN`] bytes, including the terminator.
/// On an overload the digits are not inspected at all, since the meter does not display a number.
pub fn decode(packet: &[u8]) -> Result<Reading, DecodeError> {
	DecodeError::check_length(packet.len())?;
	check_terminator(packet)?;

	check_marker(packet, 0)?;
	let range = packet[0] & 0x07;

	check_marker(packet, FUNCTION)?;
	let (mode, ranges) = tables::function(packet[FUNCTION])
		.ok_or_else(|| DecodeError::new(FUNCTION, DecodeErrorKind::UnknownMode { byte: packet[FUNCTION] }))?;
	let range_info = ranges
		.get(usize::from(range))
		.ok_or_else(|| DecodeError::new(0, DecodeErrorKind::UnknownRange { mode, range }))?;

	for offset in STATUS..=OPTION_4 {
		check_marker(packet, offset)?;
	}
	let flags = decode_flags(packet);

	let value = if flags.overload {
		None
	} else {
		let magnitude = decode_digits(packet)?;
		let value = f64::from(magnitude) / 10f64.powi(i32::from(range_info.decimals));
		Some(if flags.negative { -value } else { value })
	};

	Ok(Reading::new(value, range_info.unit, mode, range, flags))
}

/// Encode a value into a packet.
///
/// The range with the highest resolution that can still display the value is selected.
/// Returns `None` if no range of `mode` uses `unit`, or if the value does not fit any range.
pub fn encode(value: f64, unit: Unit, mode: Mode, flags: &Flags) -> Option<Packet> {
	let function = tables::function_byte(mode, unit)?;
	let (_, ranges) = tables::function(function)?;

	let (range, range_info, magnitude) = ranges
		.iter()
		.enumerate()
		.filter(|(_, info)| info.unit == unit)
		.map(|(range, info)| (range, info, (value.abs() * 10f64.powi(i32::from(info.decimals))).round()))
		.filter(|(_, _, magnitude)| *magnitude <= 99_999.0)
		.max_by_key(|(_, info, _)| info.decimals)?;
	debug_assert!(range_info.unit == unit);

	let mut packet = [MARKER; PACKET_LEN];
	packet[0] = MARKER | range as u8;

	let mut magnitude = magnitude as u32;
	for offset in DIGITS.rev() {
		packet[offset] = MARKER | (magnitude % 10) as u8;
		magnitude /= 10;
	}

	packet[FUNCTION] = function;
	packet[STATUS] |= bits([flags.percent, flags.negative || value < 0.0, flags.low_battery, flags.overload]);
	packet[OPTION_1] |= bits([flags.max, flags.min, flags.relative, false]);
	packet[OPTION_2] |= bits([flags.underflow, flags.limit_hi, flags.limit_lo, false]);
	packet[OPTION_3] |= bits([flags.dc, flags.ac, flags.auto_range, flags.hz]);
	packet[OPTION_4] |= bits([false, flags.bar_graph, flags.hold, flags.low_pass]);
	packet[12..].copy_from_slice(&TERMINATOR);
	Some(packet)
}

fn check_terminator(packet: &[u8]) -> Result<(), DecodeError> {
	let actual = [packet[12], packet[13]];
	match actual.iter().zip(TERMINATOR).position(|(a, b)| *a != b) {
		None => Ok(()),
		Some(index) => Err(DecodeError::new(12 + index, DecodeErrorKind::BadTerminator { actual })),
	}
}

fn check_marker(packet: &[u8], offset: usize) -> Result<(), DecodeError> {
	let byte = packet[offset];
	if byte & 0xF0 == MARKER {
		Ok(())
	} else {
		Err(DecodeError::new(offset, DecodeErrorKind::InvalidMarker { byte }))
	}
}

fn decode_digits(packet: &[u8]) -> Result<u32, DecodeError> {
	let mut magnitude = 0;
	for offset in DIGITS {
		check_marker(packet, offset)?;
		let nibble = packet[offset] & 0x0F;
		if nibble > 9 {
			return Err(DecodeError::new(offset, DecodeErrorKind::InvalidDigit { nibble }));
		}
		magnitude = magnitude * 10 + u32::from(nibble);
	}
	Ok(magnitude)
}

fn decode_flags(packet: &[u8]) -> Flags {
	let bit = |offset: usize, index: u8| packet[offset] & (1 << index) != 0;
	Flags {
		percent: bit(STATUS, 3),
		negative: bit(STATUS, 2),
		low_battery: bit(STATUS, 1),
		overload: bit(STATUS, 0),
		max: bit(OPTION_1, 3),
		min: bit(OPTION_1, 2),
		relative: bit(OPTION_1, 1),
		underflow: bit(OPTION_2, 3),
		limit_hi: bit(OPTION_2, 2),
		limit_lo: bit(OPTION_2, 1),
		dc: bit(OPTION_3, 3),
		ac: bit(OPTION_3, 2),
		auto_range: bit(OPTION_3, 1),
		hz: bit(OPTION_3, 0),
		bar_graph: bit(OPTION_4, 2),
		hold: bit(OPTION_4, 1),
		low_pass: bit(OPTION_4, 0),
	}
}

/// Pack four flags into the lower nibble, most significant bit first.
fn bits(flags: [bool; 4]) -> u8 {
	flags.iter().fold(0, |acc, &flag| (acc << 1) | u8::from(flag))
}
