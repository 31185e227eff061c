//! File data I/O through direct and single-indirect addressing.

use crate::bitmap::BitmapAllocator;
use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::layout::{Block, FileEntity, IndirectBlock, BLOCK_SIZE, D, MAX_FILESIZE};

/// One block-sized fragment of a read or write, in file-relative terms.
struct Fragment {
	/// Index of the data block this fragment falls in (`offset / BLOCK_SIZE`).
	block_index: u32,
	/// Offset within that block.
	in_block: usize,
	/// Number of bytes of the fragment.
	len: usize,
	/// Offset into the caller's buffer this fragment maps to.
	buf_off: usize,
}

fn fragments(offset: u32, len: usize) -> impl Iterator<Item = Fragment> {
	let block_size = BLOCK_SIZE as u32;
	let mut remaining = len;
	let mut cur = offset;
	let mut buf_off = 0usize;
	std::iter::from_fn(move || {
		if remaining == 0 {
			return None;
		}
		let in_block = (cur % block_size) as usize;
		let this_len = remaining.min(BLOCK_SIZE - in_block);
		let frag = Fragment {
			block_index: cur / block_size,
			in_block,
			len: this_len,
			buf_off,
		};
		cur += this_len as u32;
		buf_off += this_len;
		remaining -= this_len;
		Some(frag)
	})
}

/// Returns the data block index holding block number `i` of `file`, or
/// `0` if it has never been allocated.
fn existing_block(dev: &mut dyn BlockDevice, file: &FileEntity, i: u32) -> Result<u32> {
	if (i as usize) < D {
		Ok(file.direct[i as usize])
	} else if file.indirect == 0 {
		Ok(0)
	} else {
		let mut buf: Block = [0; BLOCK_SIZE];
		dev.read_block(file.indirect, &mut buf)?;
		Ok(IndirectBlock::decode(&buf).ptrs[i as usize - D])
	}
}

/// Ensures block number `i` of `file` is allocated, allocating the data
/// block (and, if necessary, the indirect block) on demand. Returns the
/// allocated block's index.
fn ensure_block(dev: &mut dyn BlockDevice, alloc: &BitmapAllocator, file: &mut FileEntity, i: u32) -> Result<u32> {
	if (i as usize) < D {
		if file.direct[i as usize] == 0 {
			let b = alloc.allocate(dev)?;
			if b == 0 {
				return Err(Error::Full);
			}
			file.direct[i as usize] = b;
		}
		return Ok(file.direct[i as usize]);
	}

	if file.indirect == 0 {
		let ib = alloc.allocate(dev)?;
		if ib == 0 {
			return Err(Error::Full);
		}
		file.indirect = ib;
		let zeroed: Block = [0; BLOCK_SIZE];
		dev.write_block(ib, &zeroed)?;
	}
	let mut ib_buf: Block = [0; BLOCK_SIZE];
	dev.read_block(file.indirect, &mut ib_buf)?;
	let mut indirect = IndirectBlock::decode(&ib_buf);
	let slot = i as usize - D;
	if indirect.ptrs[slot] == 0 {
		let b = alloc.allocate(dev)?;
		if b == 0 {
			return Err(Error::Full);
		}
		indirect.ptrs[slot] = b;
		indirect.encode(&mut ib_buf);
		dev.write_block(file.indirect, &ib_buf)?;
	}
	Ok(indirect.ptrs[slot])
}

/// Reads at most `buf.len()` bytes of `file`'s data starting at `offset`
/// into `buf`, returning the number of bytes actually read.
///
/// Returns `0` once `offset` reaches or passes the file's current size.
pub fn read(dev: &mut dyn BlockDevice, file: &FileEntity, buf: &mut [u8], offset: u32) -> Result<usize> {
	if offset >= file.size {
		return Ok(0);
	}
	let available = (file.size - offset) as usize;
	let len = buf.len().min(available);
	let mut data: Block = [0; BLOCK_SIZE];
	for frag in fragments(offset, len) {
		let block = existing_block(dev, file, frag.block_index)?;
		// The dense-prefix invariant guarantees this is nonzero for any
		// block within the current size.
		dev.read_block(block, &mut data)?;
		buf[frag.buf_off..frag.buf_off + frag.len]
			.copy_from_slice(&data[frag.in_block..frag.in_block + frag.len]);
	}
	Ok(len)
}

/// Overwrites bytes `[offset, offset + buf.len())` of `file`'s data with
/// `buf`, allocating new data (and indirect) blocks as needed, and grows
/// `file.size` to `max(file.size, offset + buf.len())`.
///
/// `offset` must not exceed the file's current size: growing writes must
/// append contiguously, never skip ahead and leave a hole.
pub fn write(
	dev: &mut dyn BlockDevice,
	alloc: &BitmapAllocator,
	file: &mut FileEntity,
	buf: &[u8],
	offset: u32,
) -> Result<()> {
	if offset > file.size {
		return Err(Error::Argument);
	}
	let end = offset
		.checked_add(buf.len() as u32)
		.ok_or(Error::Limit)?;
	if end > MAX_FILESIZE {
		return Err(Error::Limit);
	}

	let mut data: Block = [0; BLOCK_SIZE];
	for frag in fragments(offset, buf.len()) {
		let block = ensure_block(dev, alloc, file, frag.block_index)?;
		let partial = frag.in_block != 0 || frag.len < BLOCK_SIZE;
		if partial {
			dev.read_block(block, &mut data)?;
		}
		data[frag.in_block..frag.in_block + frag.len]
			.copy_from_slice(&buf[frag.buf_off..frag.buf_off + frag.len]);
		dev.write_block(block, &data)?;
	}

	file.size = file.size.max(end);
	Ok(())
}
