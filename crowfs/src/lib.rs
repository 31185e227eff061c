//! CrowFS: a small block-structured on-disk filesystem for read-mostly
//! workloads on a simple block device.
//!
//! The on-disk layout, free-space allocator, path resolver, directory
//! operations, and direct/single-indirect file addressing are described
//! module by module below; [`fs::CrowFs`] ties them together into the
//! namespace operations (`open`, `stat`, `read_dir`, `delete`,
//! `move_entity`) a caller actually drives.

pub mod bitmap;
pub mod device;
pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod layout;
pub mod path;

pub use device::{BlockDevice, FileDevice, MemDevice};
pub use error::{Error, Result};
pub use fs::{CrowFs, OpenFlags, Stat};
pub use layout::{EntityType, BLOCK_SIZE, MAX_FILESIZE, M};
