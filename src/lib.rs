//! Driver for multimeters based on the Cyrustek ES51922 chip, such as the UNI-T UT61E.
//!
//! The meter continuously streams 14 byte packets describing its display over an optical serial link.
//! This crate decodes those packets into [`Reading`]s and builds retrying, averaging and stability detection on top.
//!
//! The main entry point is the [`Driver`]:
//!
//! ```no_run
//! # fn main() -> Result<(), es51922::Error> {
//! use es51922::{Driver, DriverConfig};
//!
//! let mut driver = Driver::new(DriverConfig::new("/dev/ttyUSB0"));
//! driver.initialize()?;
//! let ohm = driver.read_resistance(5)?;
//! println!("{:.1} Ohm", ohm);
//! driver.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! Lower layers are available too:
//! [`packet::decode()`] decodes a single packet, a [`Transport`] splits a serial byte stream into packets
//! and [`Procedures`] implements the measurement algorithms on any [`FrameSource`].
//!
//! # Optional features
//!
//! * `log`: emit log messages using the `log` crate.

#[macro_use]
mod log;

pub mod clock;
pub mod config;
pub mod error;
pub mod packet;
pub mod procedures;
pub mod serial_port;
pub mod simulator;
pub mod transport;

mod driver;
mod reading;

pub use clock::{Clock, SystemClock};
pub use config::{DriverConfig, PortConfig};
pub use driver::{Driver, DriverState, PortInfo, RESISTANCE_SAMPLE_DELAY};
pub use error::Error;
pub use packet::Packet;
pub use procedures::{AveragedReading, Procedures};
pub use reading::{Flags, Mode, Quantity, Reading, Unit};
pub use serial_port::SerialPort;
pub use simulator::Simulator;
pub use transport::{FrameSource, Transport};
