//! The error taxonomy shared by every core operation.
//!
//! Mirrors the codes a C implementation would return as negative integers,
//! but as a proper sum type so `read`'s byte count and an error can never be
//! confused at the type level.

use std::fmt;
use std::io;

/// Something went wrong while running a core operation.
#[derive(Debug)]
pub enum Error {
	/// A precondition was violated: wrong entity type, a non-absolute path,
	/// a write starting past the current end of file, deleting the root.
	Argument,
	/// The superblock's magic or version did not match on mount.
	InitInvalidFs,
	/// A directory is full, a write would exceed `MAX_FILESIZE`, or
	/// `read_dir`'s offset is past the last child.
	Limit,
	/// A path component, or an intermediate non-directory, was not found.
	NotFound,
	/// The bitmap allocator has no free block left.
	Full,
	/// A directory delete or replace target still has children.
	NotEmpty,
	/// The device is too small to hold even an empty filesystem.
	TooSmall,
	/// The block device returned an I/O error.
	Io(io::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::Argument => write!(f, "invalid argument"),
			Error::InitInvalidFs => write!(f, "not a CrowFS filesystem"),
			Error::Limit => write!(f, "limit reached"),
			Error::NotFound => write!(f, "not found"),
			Error::Full => write!(f, "no space left on device"),
			Error::NotEmpty => write!(f, "directory not empty"),
			Error::TooSmall => write!(f, "device too small"),
			Error::Io(e) => write!(f, "I/O error: {e}"),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		Error::Io(e)
	}
}

/// Shorthand for `Result<T, crate::error::Error>`, the return type of every
/// fallible core operation.
pub type Result<T> = std::result::Result<T, Error>;
