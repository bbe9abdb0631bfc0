//! Static ES51922 lookup tables.

use crate::{Mode, Unit};

/// The display format of one range: its unit and the number of digits after the decimal point.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RangeInfo {
	pub unit: Unit,
	pub decimals: u8,
}

const fn range(unit: Unit, decimals: u8) -> RangeInfo {
	RangeInfo { unit, decimals }
}

/// Function byte values and the modes and ranges they select, indexed by range code.
pub static FUNCTIONS: [(u8, Mode, &[RangeInfo]); 9] = [
	(0x3B, Mode::Voltage, &VOLTAGE),
	(0x3D, Mode::Current, &MICROAMPERE),
	(0x3F, Mode::Current, &MILLIAMPERE),
	(0x30, Mode::Current, &AMPERE),
	(0x33, Mode::Resistance, &RESISTANCE),
	(0x35, Mode::Continuity, &CONTINUITY),
	(0x31, Mode::Diode, &DIODE),
	(0x32, Mode::Frequency, &FREQUENCY),
	(0x36, Mode::Capacitance, &CAPACITANCE),
];

static VOLTAGE: [RangeInfo; 5] = [
	range(Unit::Volt, 4),
	range(Unit::Volt, 3),
	range(Unit::Volt, 2),
	range(Unit::Volt, 1),
	range(Unit::Millivolt, 2),
];

static MICROAMPERE: [RangeInfo; 2] = [
	range(Unit::Microampere, 2),
	range(Unit::Microampere, 1),
];

static MILLIAMPERE: [RangeInfo; 2] = [
	range(Unit::Milliampere, 3),
	range(Unit::Milliampere, 2),
];

static AMPERE: [RangeInfo; 1] = [
	range(Unit::Ampere, 3),
];

static RESISTANCE: [RangeInfo; 7] = [
	range(Unit::Ohm, 2),
	range(Unit::Kiloohm, 4),
	range(Unit::Kiloohm, 3),
	range(Unit::Kiloohm, 2),
	range(Unit::Megaohm, 4),
	range(Unit::Megaohm, 3),
	range(Unit::Megaohm, 2),
];

static CONTINUITY: [RangeInfo; 1] = [
	range(Unit::Ohm, 2),
];

static DIODE: [RangeInfo; 1] = [
	range(Unit::Volt, 4),
];

static FREQUENCY: [RangeInfo; 8] = [
	range(Unit::Hertz, 3),
	range(Unit::Hertz, 2),
	range(Unit::Kilohertz, 4),
	range(Unit::Kilohertz, 3),
	range(Unit::Kilohertz, 2),
	range(Unit::Megahertz, 4),
	range(Unit::Megahertz, 3),
	range(Unit::Megahertz, 2),
];

static CAPACITANCE: [RangeInfo; 8] = [
	range(Unit::Nanofarad, 3),
	range(Unit::Nanofarad, 2),
	range(Unit::Microfarad, 4),
	range(Unit::Microfarad, 3),
	range(Unit::Microfarad, 2),
	range(Unit::Millifarad, 4),
	range(Unit::Millifarad, 3),
	range(Unit::Millifarad, 2),
];

/// Find the mode and range table for a function byte.
pub fn function(byte: u8) -> Option<(Mode, &'static [RangeInfo])> {
	FUNCTIONS
		.iter()
		.find(|(code, _, _)| *code == byte)
		.map(|&(_, mode, ranges)| (mode, ranges))
}

/// The function byte that selects the given mode and unit.
///
/// Used to build packets, for example by the simulator.
pub fn function_byte(mode: Mode, unit: Unit) -> Option<u8> {
	FUNCTIONS
		.iter()
		.find(|(_, m, ranges)| *m == mode && ranges.iter().any(|r| r.unit == unit))
		.map(|&(code, _, _)| code)
}
