//! Directory child-list operations over an in-memory directory block copy.
//!
//! Order is insertion order, not lexicographic: the child list is the
//! dense prefix `content_dnodes[0..count]`, terminated by the first zero
//! slot (or full at `M` entries with no terminator).

use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::layout::{header_name, Block, DirEntity, BLOCK_SIZE, M};

/// Returns the index of the first zero slot in `dir.children`, or `M` if
/// the directory is full.
pub fn count(dir: &DirEntity) -> usize {
	dir.children.iter().position(|&c| c == 0).unwrap_or(M)
}

/// Searches `dir`'s children for one named `name`, reading each child's
/// header block to compare. Returns the matching child's slot index and
/// dnode number.
pub fn find(dev: &mut dyn BlockDevice, dir: &DirEntity, name: &[u8]) -> Result<Option<(usize, u32)>> {
	let mut block: Block = [0; BLOCK_SIZE];
	for (slot, &child) in dir.children.iter().enumerate() {
		if child == 0 {
			break;
		}
		dev.read_block(child, &mut block)?;
		if header_name(&block) == name {
			return Ok(Some((slot, child)));
		}
	}
	Ok(None)
}

/// Places `dnode` at the first free slot. Fails with [`Error::Limit`] if
/// the directory is already at capacity.
pub fn insert(dir: &mut DirEntity, dnode: u32) -> Result<()> {
	let slot = count(dir);
	if slot >= M {
		return Err(Error::Limit);
	}
	dir.children[slot] = dnode;
	Ok(())
}

/// Removes `dnode` from `dir`'s children, swapping the last occupied slot
/// into the freed one so the prefix stays dense.
///
/// Does nothing if `dnode` is not a child of `dir`.
pub fn remove(dir: &mut DirEntity, dnode: u32) {
	let Some(slot) = dir.children.iter().position(|&c| c == dnode) else {
		return;
	};
	let last = count(dir) - 1;
	dir.children[slot] = dir.children[last];
	dir.children[last] = 0;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::MemDevice;
	use crate::layout::FileEntity;

	fn dir_with(children: &[u32]) -> DirEntity {
		let mut dir = DirEntity::new(b"d", 0, 0);
		for (i, &c) in children.iter().enumerate() {
			dir.children[i] = c;
		}
		dir
	}

	#[test]
	fn count_reports_first_zero_slot() {
		assert_eq!(count(&dir_with(&[])), 0);
		assert_eq!(count(&dir_with(&[5, 6, 7])), 3);
	}

	#[test]
	fn count_reports_m_when_full() {
		let full = [7u32; M];
		assert_eq!(count(&dir_with(&full)), M);
	}

	#[test]
	fn insert_fails_when_full() {
		let mut dir = dir_with(&[7u32; M]);
		assert!(matches!(insert(&mut dir, 99), Err(Error::Limit)));
	}

	#[test]
	fn remove_swaps_last_into_freed_slot() {
		let mut dir = dir_with(&[10, 11, 12]);
		remove(&mut dir, 10);
		assert_eq!(&dir.children[..2], &[12, 11]);
		assert_eq!(dir.children[2], 0);
	}

	#[test]
	fn remove_of_last_slot_just_zeroes_it() {
		let mut dir = dir_with(&[10, 11, 12]);
		remove(&mut dir, 12);
		assert_eq!(&dir.children[..2], &[10, 11]);
		assert_eq!(dir.children[2], 0);
	}

	#[test]
	fn find_matches_by_name() {
		let mut dev = MemDevice::new(8);
		let mut buf: Block = [0; BLOCK_SIZE];
		FileEntity::new(b"a", 0).encode(&mut buf);
		dev.write_block(3, &buf).unwrap();
		FileEntity::new(b"b", 0).encode(&mut buf);
		dev.write_block(4, &buf).unwrap();

		let dir = dir_with(&[3, 4]);
		assert_eq!(find(&mut dev, &dir, b"b").unwrap(), Some((1, 4)));
		assert_eq!(find(&mut dev, &dir, b"missing").unwrap(), None);
	}
}
