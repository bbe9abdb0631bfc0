//! Decoded measurements.

/// The measurement function selected on the meter.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Mode {
	Voltage,
	Current,
	Resistance,
	Continuity,
	Diode,
	Capacitance,
	Frequency,
}

/// The unit of a decoded value.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Unit {
	Volt,
	Millivolt,
	Ampere,
	Milliampere,
	Microampere,
	Ohm,
	Kiloohm,
	Megaohm,
	Nanofarad,
	Microfarad,
	Millifarad,
	Hertz,
	Kilohertz,
	Megahertz,
}

/// The physical quantity a [`Unit`] measures.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Quantity {
	Voltage,
	Current,
	Resistance,
	Capacitance,
	Frequency,
}

impl Unit {
	/// The display symbol of the unit.
	pub fn symbol(self) -> &'static str {
		match self {
			Self::Volt => "V",
			Self::Millivolt => "mV",
			Self::Ampere => "A",
			Self::Milliampere => "mA",
			Self::Microampere => "uA",
			Self::Ohm => "Ohm",
			Self::Kiloohm => "kOhm",
			Self::Megaohm => "MOhm",
			Self::Nanofarad => "nF",
			Self::Microfarad => "uF",
			Self::Millifarad => "mF",
			Self::Hertz => "Hz",
			Self::Kilohertz => "kHz",
			Self::Megahertz => "MHz",
		}
	}

	pub fn quantity(self) -> Quantity {
		match self {
			Self::Volt | Self::Millivolt => Quantity::Voltage,
			Self::Ampere | Self::Milliampere | Self::Microampere => Quantity::Current,
			Self::Ohm | Self::Kiloohm | Self::Megaohm => Quantity::Resistance,
			Self::Nanofarad | Self::Microfarad | Self::Millifarad => Quantity::Capacitance,
			Self::Hertz | Self::Kilohertz | Self::Megahertz => Quantity::Frequency,
		}
	}

	/// The factor that converts a value in this unit to the SI base unit of its quantity.
	pub fn scale(self) -> f64 {
		match self {
			Self::Volt | Self::Ampere | Self::Ohm | Self::Hertz => 1.0,
			Self::Millivolt | Self::Milliampere | Self::Millifarad => 1e-3,
			Self::Microampere | Self::Microfarad => 1e-6,
			Self::Nanofarad => 1e-9,
			Self::Kiloohm | Self::Kilohertz => 1e3,
			Self::Megaohm | Self::Megahertz => 1e6,
		}
	}

	/// Convert a value in this unit to the given unit of the same quantity.
	///
	/// Returns `None` if the units measure different quantities.
	pub fn convert(self, value: f64, to: Unit) -> Option<f64> {
		if self == to {
			Some(value)
		} else if self.quantity() == to.quantity() {
			Some(value * self.scale() / to.scale())
		} else {
			None
		}
	}
}

/// Status indicators shown on the meter display.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Flags {
	pub percent: bool,
	pub negative: bool,
	pub low_battery: bool,
	pub overload: bool,
	pub max: bool,
	pub min: bool,
	pub relative: bool,
	pub underflow: bool,
	pub limit_hi: bool,
	pub limit_lo: bool,
	pub dc: bool,
	pub ac: bool,
	pub auto_range: bool,
	pub hz: bool,
	pub bar_graph: bool,
	pub hold: bool,
	pub low_pass: bool,
}

impl Flags {
	/// Iterate over all flags by name.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> {
		[
			("percent", self.percent),
			("negative", self.negative),
			("low_battery", self.low_battery),
			("overload", self.overload),
			("max", self.max),
			("min", self.min),
			("relative", self.relative),
			("underflow", self.underflow),
			("limit_hi", self.limit_hi),
			("limit_lo", self.limit_lo),
			("dc", self.dc),
			("ac", self.ac),
			("auto_range", self.auto_range),
			("hz", self.hz),
			("bar_graph", self.bar_graph),
			("hold", self.hold),
			("low_pass", self.low_pass),
		]
		.into_iter()
	}

	/// Look up a flag by name.
	pub fn get(&self, name: &str) -> Option<bool> {
		self.iter().find(|(flag, _)| *flag == name).map(|(_, value)| value)
	}
}

/// A single decoded measurement.
///
/// An overloaded reading never carries a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
	value: Option<f64>,
	unit: Unit,
	mode: Mode,
	range: u8,
	flags: Flags,
}

impl Reading {
	pub(crate) fn new(value: Option<f64>, unit: Unit, mode: Mode, range: u8, flags: Flags) -> Self {
		let value = if flags.overload { None } else { value };
		Self {
			value,
			unit,
			mode,
			range,
			flags,
		}
	}

	/// The displayed value, or `None` if the meter shows an overload.
	pub fn value(&self) -> Option<f64> {
		self.value
	}

	pub fn unit(&self) -> Unit {
		self.unit
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	/// The raw range code of the packet.
	pub fn range(&self) -> u8 {
		self.range
	}

	pub fn flags(&self) -> &Flags {
		&self.flags
	}

	pub fn is_overload(&self) -> bool {
		self.flags.overload
	}

	pub fn is_negative(&self) -> bool {
		self.flags.negative
	}
}

impl std::fmt::Display for Mode {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let name = match self {
			Self::Voltage => "Voltage",
			Self::Current => "Current",
			Self::Resistance => "Resistance",
			Self::Continuity => "Continuity",
			Self::Diode => "Diode",
			Self::Capacitance => "Capacitance",
			Self::Frequency => "Frequency",
		};
		f.write_str(name)
	}
}

impl std::fmt::Display for Unit {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(self.symbol())
	}
}

impl std::fmt::Display for Reading {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.value {
			Some(value) => write!(f, "{} {} ({})", value, self.unit, self.mode),
			None => write!(f, "OL {} ({})", self.unit, self.mode),
		}
	}
}
