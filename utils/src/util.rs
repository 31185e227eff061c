//! This module implements utility functions.

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Returns the current timestamp since the Unix epoch.
pub fn get_timestamp() -> Duration {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock panic!")
}

/// Divides `a` by `b`, rounding the result up instead of truncating.
pub fn ceil_division(a: u64, b: u64) -> u64 {
	(a + b - 1) / b
}
