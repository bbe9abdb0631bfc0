use std::path::PathBuf;
use std::time::Duration;

/// Read measurements from an ES51922 based multimeter, such as the UNI-T UT61E.
///
/// The meter must have its serial output enabled.
/// Without a meter, use --simulate to get synthetic resistance readings.
#[derive(clap::Parser)]
#[command(version)]
pub struct Options {
	/// Print more verbose messages. Can be used multiple times.
	#[arg(long, short)]
	#[arg(global = true)]
	#[arg(action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// The serial port the meter is connected to.
	#[arg(long, short)]
	#[arg(global = true)]
	#[cfg_attr(target_os = "windows", arg(default_value = "COM1"))]
	#[cfg_attr(not(target_os = "windows"), arg(default_value = "/dev/ttyUSB0"))]
	pub serial_port: String,

	/// The time to wait for a single packet, in seconds.
	#[arg(long, short)]
	#[arg(global = true)]
	#[arg(default_value = "2")]
	#[arg(value_parser = parse_seconds)]
	pub timeout: Duration,

	/// Use synthetic resistance readings instead of a serial port.
	#[arg(long)]
	#[arg(global = true)]
	pub simulate: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
	/// List the available serial ports.
	Ports,

	/// Show the serial line settings.
	Info,

	/// Read a single value.
	Read {
		/// The number of times to retry a failed read.
		#[arg(long, short)]
		#[arg(default_value = "3")]
		retries: u32,

		/// Print all display flags of the reading.
		#[arg(long)]
		flags: bool,
	},

	/// Read multiple values and print their average.
	Average {
		/// The number of samples to average.
		#[arg(long, short)]
		#[arg(default_value = "5")]
		count: usize,

		/// The delay between samples, in seconds.
		#[arg(long, short)]
		#[arg(default_value = "0.5")]
		#[arg(value_parser = parse_seconds)]
		delay: Duration,
	},

	/// Wait until the reading is stable.
	Stable {
		/// The maximum time to wait, in seconds.
		#[arg(long)]
		#[arg(default_value = "10")]
		#[arg(value_parser = parse_seconds)]
		wait: Duration,

		/// The maximum variation between two readings, relative to their mean.
		#[arg(long)]
		#[arg(default_value = "0.05")]
		threshold: f64,
	},

	/// Measure a resistance in Ohm.
	Resistance {
		/// The number of samples to average.
		#[arg(long, short)]
		#[arg(default_value = "5")]
		count: usize,
	},

	/// Write shell completions to a file or stdout.
	ShellCompletion {
		/// The shell for which to generate completions.
		#[arg(long)]
		shell: clap_complete::Shell,

		/// The file to write the generated completion file to.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
}

fn parse_seconds(input: &str) -> Result<Duration, String> {
	let seconds: f64 = input.parse().map_err(|e| format!("invalid number of seconds: {}", e))?;
	Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid duration: {}", e))
}
