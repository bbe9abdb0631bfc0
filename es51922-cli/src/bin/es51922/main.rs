use std::path::Path;
use std::time::Instant;

use es51922::{Driver, DriverConfig};

mod logging;
mod options;

use options::{Command, Options};

fn main() {
	if let Err(()) = do_main(clap::Parser::parse()) {
		std::process::exit(1);
	}
}

fn do_main(options: Options) -> Result<(), ()> {
	logging::init(module_path!(), options.verbose);
	match &options.command {
		Command::Ports => {
			let ports = Driver::list_serial_ports();
			if ports.is_empty() {
				log::warn!("No serial ports found");
			}
			for port in ports {
				println!("{}", port);
			}
		},
		Command::Info => {
			let driver = Driver::new(driver_config(&options));
			let info = driver.get_port_info();
			log::info!("Port: {}", info.port);
			log::info!(" ├─ Baud rate: {}", info.baud_rate);
			log::info!(" ├─ Data bits: {:?}", info.char_size);
			log::info!(" ├─ Parity: {:?}", info.parity);
			log::info!(" ├─ Stop bits: {:?}", info.stop_bits);
			log::info!(" ├─ Timeout: {:?}", info.timeout);
			log::info!(" └─ Simulate: {}", info.simulate);
		},
		Command::Read { retries, flags } => {
			let mut driver = open_driver(&options)?;
			let start = Instant::now();
			let reading = driver.read_value(*retries).map_err(|e| log::error!("Read failed: {}", e))?;
			log::debug!("Read took {:?}", start.elapsed());
			if reading.is_overload() {
				log::warn!("Meter shows an overload");
			}
			println!("{}", reading);
			if *flags {
				for (name, set) in reading.flags().iter().filter(|(_, set)| *set) {
					log::info!(" - {}: {}", name, set);
				}
			}
		},
		Command::Average { count, delay } => {
			let mut driver = open_driver(&options)?;
			let averaged = driver
				.read_averaged(*count, *delay)
				.map_err(|e| log::error!("Measurement failed: {}", e))?;
			if averaged.overloaded_samples > 0 {
				log::warn!("Skipped {} overloaded samples", averaged.overloaded_samples);
			}
			println!("{} {} ({})", averaged.mean, averaged.unit, averaged.mode);
			log::info!(
				"Standard deviation: {} {} over {} samples",
				averaged.std_dev,
				averaged.unit,
				averaged.valid_samples
			);
		},
		Command::Stable { wait, threshold } => {
			let mut driver = open_driver(&options)?;
			let start = Instant::now();
			let reading = driver
				.wait_for_stable(*wait, *threshold)
				.map_err(|e| log::error!("Measurement failed: {}", e))?;
			log::debug!("Reading stabilized after {:?}", start.elapsed());
			println!("{}", reading);
		},
		Command::Resistance { count } => {
			let mut driver = open_driver(&options)?;
			let ohm = driver
				.read_resistance(*count)
				.map_err(|e| log::error!("Measurement failed: {}", e))?;
			println!("{} Ohm", ohm);
		},
		Command::ShellCompletion { shell, output } => {
			write_shell_completion(*shell, output.as_deref())?;
		},
	}

	Ok(())
}

fn driver_config(options: &Options) -> DriverConfig {
	DriverConfig::new(options.serial_port.as_str())
		.with_simulate(options.simulate)
		.with_timeout(options.timeout)
}

fn open_driver(options: &Options) -> Result<Driver, ()> {
	let mut driver = Driver::new(driver_config(options));
	driver.initialize().map_err(|e| log::error!("{}", e))?;
	if options.simulate {
		log::debug!("Using simulated meter");
	} else {
		log::debug!("Using serial port {} with timeout {:?}", options.serial_port, options.timeout);
	}
	Ok(driver)
}

fn write_shell_completion(shell: clap_complete::Shell, path: Option<&Path>) -> Result<(), ()> {
	use clap::CommandFactory;
	use std::io::Write;

	let mut buffer = Vec::with_capacity(4 * 1024);

	let mut command = Options::command();
	clap_complete::generate(shell, &mut command, env!("CARGO_BIN_NAME"), &mut buffer);
	if !buffer.ends_with(b"\n") {
		buffer.push(b'\n');
	}

	let path = path.unwrap_or_else(|| Path::new("-"));
	if path == Path::new("-") {
		log::debug!("Writing shell completion for {} to stdout", shell);
		let stdout = std::io::stdout();
		stdout
			.lock()
			.write_all(&buffer)
			.map_err(|e| log::error!("Failed to write to stdout: {}", e))?;
	} else {
		log::debug!("Writing shell completion for {} to {}", shell, path.display());
		let mut output = std::fs::File::create(path).map_err(|e| log::error!("Failed to create {}: {}", path.display(), e))?;
		output
			.write_all(&buffer)
			.map_err(|e| log::error!("Failed to write to {}: {}", path.display(), e))?;
	}

	Ok(())
}
