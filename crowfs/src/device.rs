//! The block-device abstraction the core reads and writes through.
//!
//! `FileDevice` backs a filesystem image by a regular file or block device
//! via `seek`/`read_exact`/`write_all`, the same pattern the host CLI's
//! sibling tools use to address disks by byte offset. `MemDevice` is the
//! in-memory stand-in used by the test harness.

use crate::layout::{Block, BLOCK_SIZE};
use std::fs::File;
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

/// A fixed-size block store: read and write one [`BLOCK_SIZE`]-byte block
/// at a time by index, and report the total number of blocks it holds.
pub trait BlockDevice {
	/// Reads the block at `index` into `buf`.
	fn read_block(&mut self, index: u32, buf: &mut Block) -> io::Result<()>;

	/// Writes `buf` to the block at `index`.
	fn write_block(&mut self, index: u32, buf: &Block) -> io::Result<()>;

	/// Returns the total number of blocks the device holds.
	fn total_blocks(&self) -> u32;
}

/// A device backed by a regular file or a block device file.
pub struct FileDevice {
	file: File,
	total_blocks: u32,
}

impl FileDevice {
	/// Opens `file` as a device of `total_blocks` fixed-size blocks.
	pub fn new(file: File, total_blocks: u32) -> Self {
		Self { file, total_blocks }
	}
}

impl BlockDevice for FileDevice {
	fn read_block(&mut self, index: u32, buf: &mut Block) -> io::Result<()> {
		self.file.seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
		self.file.read_exact(buf)
	}

	fn write_block(&mut self, index: u32, buf: &Block) -> io::Result<()> {
		self.file.seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
		self.file.write_all(buf)
	}

	fn total_blocks(&self) -> u32 {
		self.total_blocks
	}
}

/// An in-memory device used by tests: a flat vector of zero-filled blocks.
pub struct MemDevice {
	blocks: Vec<Block>,
}

impl MemDevice {
	/// Creates a device with `total_blocks` zero-filled blocks.
	pub fn new(total_blocks: u32) -> Self {
		Self {
			blocks: vec![[0u8; BLOCK_SIZE]; total_blocks as usize],
		}
	}
}

impl BlockDevice for MemDevice {
	fn read_block(&mut self, index: u32, buf: &mut Block) -> io::Result<()> {
		let block = self.blocks.get(index as usize).ok_or_else(|| {
			io::Error::new(io::ErrorKind::InvalidInput, "block index out of range")
		})?;
		buf.copy_from_slice(block);
		Ok(())
	}

	fn write_block(&mut self, index: u32, buf: &Block) -> io::Result<()> {
		let block = self.blocks.get_mut(index as usize).ok_or_else(|| {
			io::Error::new(io::ErrorKind::InvalidInput, "block index out of range")
		})?;
		block.copy_from_slice(buf);
		Ok(())
	}

	fn total_blocks(&self) -> u32 {
		self.blocks.len() as u32
	}
}
