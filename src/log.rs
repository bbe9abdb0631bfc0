//! Internal logging macros.
//!
//! With the `log` feature enabled these forward to the `log` crate.
//! Without it they expand to a format check that is never executed,
//! so arguments are still type checked and do not trigger unused warnings.

#[cfg(feature = "log")]
#[allow(unused)]
#[macro_use]
mod log {
	macro_rules! trace {
		($($args:tt)*) => { ::log::trace!($($args)*) }
	}

	macro_rules! debug {
		($($args:tt)*) => { ::log::debug!($($args)*) }
	}

	macro_rules! info {
		($($args:tt)*) => { ::log::info!($($args)*) }
	}

	macro_rules! warn {
		($($args:tt)*) => { ::log::warn!($($args)*) }
	}

	macro_rules! error {
		($($args:tt)*) => { ::log::error!($($args)*) }
	}
}

#[cfg(not(feature = "log"))]
#[allow(unused)]
#[macro_use]
mod log {
	macro_rules! discard {
		($($args:tt)*) => {
			if false {
				let _ = format_args!($($args)*);
			}
		}
	}

	macro_rules! trace {
		($($args:tt)*) => { discard!($($args)*) }
	}

	macro_rules! debug {
		($($args:tt)*) => { discard!($($args)*) }
	}

	macro_rules! info {
		($($args:tt)*) => { discard!($($args)*) }
	}

	macro_rules! warn {
		($($args:tt)*) => { discard!($($args)*) }
	}

	macro_rules! error {
		($($args:tt)*) => { discard!($($args)*) }
	}
}
