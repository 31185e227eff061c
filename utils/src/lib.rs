//! This module implements features common to several commands.

pub mod disk;
pub mod util;

use std::fmt;
use std::process::exit;

/// Writes an error to stderr prefixed with the binary's name, then exits
/// with status 1. Used by every command-line tool to report a fatal
/// error the same way.
pub fn error<M: fmt::Display>(bin: &str, msg: M) -> ! {
    eprintln!("{bin}: {msg}");
    exit(1);
}
