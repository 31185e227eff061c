//! Namespace operations: format, mount, `open`, `stat`, `read_dir`,
//! `delete`, `move_entity`, and the free-block count utility.
//!
//! `CrowFs` is the single mounted-filesystem handle: it caches the
//! superblock and the derived bitmap/root layout, and owns the device for
//! the duration of the mount.

use crate::bitmap::{bitmap_blocks, BitmapAllocator, BITMAP_START};
use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::layout::{
	header_name, header_type, set_header_name, Block, DirEntity, EntityType, FileEntity,
	IndirectBlock, Superblock, BLOCK_SIZE, M, MAGIC, VERSION,
};
use crate::{dir, file, path};

/// Flags accepted by [`CrowFs::open`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
	/// Create the entity if the path does not resolve to an existing one.
	pub create: bool,
	/// When creating, create a directory instead of a file.
	pub dir: bool,
}

impl OpenFlags {
	pub const NONE: Self = Self { create: false, dir: false };
	pub const CREATE: Self = Self { create: true, dir: false };
	pub const CREATE_DIR: Self = Self { create: true, dir: true };
}

/// The information returned by [`CrowFs::stat`] and [`CrowFs::read_dir`].
#[derive(Debug, Clone)]
pub struct Stat {
	pub dnode: u32,
	pub parent: u32,
	pub kind: EntityType,
	pub name: Vec<u8>,
	pub creation_time: i64,
	/// Byte size for files, child count for directories.
	pub size: u32,
}

/// A mounted CrowFS filesystem: a device plus the cached superblock and
/// the layout values derived from it.
pub struct CrowFs<Dev: BlockDevice> {
	dev: Dev,
	superblock: Superblock,
	allocator: BitmapAllocator,
	/// Dnode of the root directory.
	root: u32,
}

impl<Dev: BlockDevice> CrowFs<Dev> {
	/// Dnode of the root directory.
	pub fn root(&self) -> u32 {
		self.root
	}

	/// Total block count recorded in the superblock at format time.
	pub fn total_blocks(&self) -> u32 {
		self.superblock.total_blocks
	}

	/// Formats `dev` as a fresh, empty CrowFS filesystem and mounts it.
	///
	/// `total_blocks` is normally read from the device's own
	/// `total_blocks()`, required only at format time; `now` is the
	/// creation time stamped on the root directory.
	pub fn format(mut dev: Dev, total_blocks: u32, now: i64) -> Result<Self> {
		let bb = bitmap_blocks(total_blocks);
		let metadata_end = 3 + bb; // bootloader + superblock + bitmap + root
		if total_blocks <= metadata_end {
			return Err(Error::TooSmall);
		}

		let all_free: Block = [0xff; BLOCK_SIZE];
		for i in 0..bb {
			dev.write_block(BITMAP_START + i, &all_free)?;
		}
		let allocator = BitmapAllocator::new(bb);
		for dnode in 0..metadata_end {
			allocator.reserve(&mut dev, dnode)?;
		}
		let bitmap_capacity = bb * crate::bitmap::BITS_PER_BLOCK;
		for dnode in total_blocks..bitmap_capacity {
			allocator.reserve(&mut dev, dnode)?;
		}

		let root = metadata_end - 1;
		let root_dir = DirEntity::new(b"", now, root);
		let mut root_buf: Block = [0; BLOCK_SIZE];
		root_dir.encode(&mut root_buf);
		dev.write_block(root, &root_buf)?;

		let superblock = Superblock {
			magic: *MAGIC,
			version: VERSION,
			total_blocks,
		};
		let mut sb_buf: Block = [0; BLOCK_SIZE];
		superblock.encode(&mut sb_buf);
		dev.write_block(1, &sb_buf)?;

		Ok(Self {
			dev,
			superblock,
			allocator,
			root,
		})
	}

	/// Mounts an already-formatted device, validating the superblock.
	pub fn mount(mut dev: Dev) -> Result<Self> {
		let mut sb_buf: Block = [0; BLOCK_SIZE];
		dev.read_block(1, &mut sb_buf)?;
		let superblock = Superblock::decode(&sb_buf);
		if &superblock.magic != MAGIC || superblock.version != VERSION {
			return Err(Error::InitInvalidFs);
		}
		let bb = bitmap_blocks(superblock.total_blocks);
		let root = 2 + bb;
		Ok(Self {
			dev,
			superblock,
			allocator: BitmapAllocator::new(bb),
			root,
		})
	}

	fn read_block(&mut self, index: u32) -> Result<Block> {
		let mut buf: Block = [0; BLOCK_SIZE];
		self.dev.read_block(index, &mut buf)?;
		Ok(buf)
	}

	/// Resolves `path` to a dnode, optionally creating it.
	///
	/// Returns `(dnode, parent_dnode)`. The root resolves to `(root, 0)`,
	/// `0` being the reserved "no parent" sentinel.
	pub fn open(&mut self, path: &[u8], flags: OpenFlags, now: i64) -> Result<(u32, u32)> {
		let mut components = path::Components::new(path)?;
		let mut current = self.root;
		let mut parent = 0u32;
		loop {
			let Some(comp) = components.next() else {
				return Ok((current, parent));
			};
			let (name, is_last) = comp?;
			let mut dir_buf = self.read_block(current)?;
			let dir = DirEntity::decode(&dir_buf);

			match dir::find(&mut self.dev, &dir, name)? {
				Some((_, child)) => {
					if is_last {
						return Ok((child, current));
					}
					let child_buf = self.read_block(child)?;
					if header_type(&child_buf) != EntityType::Folder as u8 {
						return Err(Error::NotFound);
					}
					parent = current;
					current = child;
				}
				None => {
					if !(flags.create && is_last) {
						return Err(Error::NotFound);
					}
					let new_dnode = self.allocator.allocate(&mut self.dev)?;
					if new_dnode == 0 {
						return Err(Error::Full);
					}
					let mut new_buf: Block = [0; BLOCK_SIZE];
					if flags.dir {
						DirEntity::new(name, now, current).encode(&mut new_buf);
					} else {
						FileEntity::new(name, now).encode(&mut new_buf);
					}
					self.dev.write_block(new_dnode, &new_buf)?;

					let mut dir = dir;
					dir::insert(&mut dir, new_dnode)?;
					dir.encode(&mut dir_buf);
					self.dev.write_block(current, &dir_buf)?;
					return Ok((new_dnode, current));
				}
			}
		}
	}

	/// Returns the stat information of `dnode`, whose parent is `parent`
	/// (files carry no parent pointer of their own, so callers — which
	/// always reach an entity through its parent — supply it; see
	/// [`CrowFs::open`]).
	pub fn stat(&mut self, dnode: u32, parent: u32) -> Result<Stat> {
		let buf = self.read_block(dnode)?;
		let kind = EntityType::from_u8(header_type(&buf))?;
		let name = header_name(&buf).to_vec();
		let creation_time = crate::layout::header_creation_time(&buf);
		let size = match kind {
			EntityType::File => FileEntity::decode(&buf).size,
			EntityType::Folder => dir::count(&DirEntity::decode(&buf)) as u32,
		};
		Ok(Stat {
			dnode,
			parent,
			kind,
			name,
			creation_time,
			size,
		})
	}

	/// Returns the stat of the child at `offset` in `dnode`'s (a
	/// directory's) child list.
	pub fn read_dir(&mut self, dnode: u32, offset: usize) -> Result<Stat> {
		let buf = self.read_block(dnode)?;
		if EntityType::from_u8(header_type(&buf))? != EntityType::Folder {
			return Err(Error::Argument);
		}
		if offset >= M {
			return Err(Error::Limit);
		}
		let dir = DirEntity::decode(&buf);
		let child = dir.children[offset];
		if child == 0 {
			return Err(Error::Limit);
		}
		self.stat(child, dnode)
	}

	/// Reads up to `buf.len()` bytes of `dnode`'s data at `offset`.
	pub fn read(&mut self, dnode: u32, buf: &mut [u8], offset: u32) -> Result<usize> {
		let block = self.read_block(dnode)?;
		if EntityType::from_u8(header_type(&block))? != EntityType::File {
			return Err(Error::Argument);
		}
		let entity = FileEntity::decode(&block);
		file::read(&mut self.dev, &entity, buf, offset)
	}

	/// Writes `buf` into `dnode`'s data at `offset`.
	pub fn write(&mut self, dnode: u32, buf: &[u8], offset: u32) -> Result<()> {
		let block = self.read_block(dnode)?;
		if EntityType::from_u8(header_type(&block))? != EntityType::File {
			return Err(Error::Argument);
		}
		let mut entity = FileEntity::decode(&block);
		file::write(&mut self.dev, &self.allocator, &mut entity, buf, offset)?;
		let mut new_block: Block = [0; BLOCK_SIZE];
		entity.encode(&mut new_block);
		self.dev.write_block(dnode, &new_block)?;
		Ok(())
	}

	/// Deletes `dnode`, a child of `parent`, freeing its data.
	///
	/// Rejects deleting the root, or any call with `parent == 0` (the
	/// reserved "no parent" sentinel), with [`Error::Argument`].
	pub fn delete(&mut self, dnode: u32, parent: u32) -> Result<()> {
		if parent == 0 || dnode == self.root {
			return Err(Error::Argument);
		}
		let buf = self.read_block(dnode)?;
		match EntityType::from_u8(header_type(&buf))? {
			EntityType::File => {
				let file = FileEntity::decode(&buf);
				for &d in file.direct.iter() {
					if d == 0 {
						break;
					}
					self.allocator.free(&mut self.dev, d)?;
				}
				if file.indirect != 0 {
					let ib_buf = self.read_block(file.indirect)?;
					let indirect = IndirectBlock::decode(&ib_buf);
					for &p in indirect.ptrs.iter() {
						if p == 0 {
							break;
						}
						self.allocator.free(&mut self.dev, p)?;
					}
					self.allocator.free(&mut self.dev, file.indirect)?;
				}
			}
			EntityType::Folder => {
				let dir = DirEntity::decode(&buf);
				if dir.children[0] != 0 {
					return Err(Error::NotEmpty);
				}
			}
		}

		let mut parent_buf = self.read_block(parent)?;
		let mut parent_dir = DirEntity::decode(&parent_buf);
		dir::remove(&mut parent_dir, dnode);
		parent_dir.encode(&mut parent_buf);
		self.dev.write_block(parent, &parent_buf)?;

		self.allocator.free(&mut self.dev, dnode)?;
		Ok(())
	}

	/// Moves and/or renames `dnode`.
	///
	/// - Pure rename (`old_parent == new_parent`, `new_name: Some`):
	///   renames `dnode` in place, replacing any other existing sibling
	///   that already has that name.
	/// - Cross-directory move (`old_parent != new_parent`): inserts
	///   `dnode` into `new_parent` (after replacing any existing sibling
	///   with the same resulting name) then removes it from `old_parent`.
	///   Fails with [`Error::Limit`] before any change if `new_parent` is
	///   full and no sibling is replaced.
	///
	/// Replacing a non-empty directory target yields [`Error::NotEmpty`]
	/// and leaves the filesystem unchanged.
	pub fn move_entity(
		&mut self,
		dnode: u32,
		old_parent: u32,
		new_parent: u32,
		new_name: Option<&[u8]>,
	) -> Result<()> {
		if old_parent == new_parent {
			let Some(name) = new_name else {
				return Ok(());
			};
			return self.rename_in_place(dnode, old_parent, name);
		}
		self.move_across(dnode, old_parent, new_parent, new_name)
	}

	fn rename_in_place(&mut self, dnode: u32, parent: u32, name: &[u8]) -> Result<()> {
		let mut buf = self.read_block(dnode)?;
		if header_name(&buf) == name {
			return Ok(());
		}
		self.replace_sibling(parent, name, dnode)?;
		set_header_name(&mut buf, name)?;
		self.dev.write_block(dnode, &buf)?;
		Ok(())
	}

	fn move_across(
		&mut self,
		dnode: u32,
		old_parent: u32,
		new_parent: u32,
		new_name: Option<&[u8]>,
	) -> Result<()> {
		let mut buf = self.read_block(dnode)?;
		let current_name = header_name(&buf).to_vec();
		let target_name: &[u8] = new_name.unwrap_or(&current_name);

		let new_parent_buf = self.read_block(new_parent)?;
		let new_parent_dir = DirEntity::decode(&new_parent_buf);
		let existing = dir::find(&mut self.dev, &new_parent_dir, target_name)?;
		if existing.is_none() && dir::count(&new_parent_dir) >= M {
			return Err(Error::Limit);
		}
		if let Some((_, sibling)) = existing {
			if sibling != dnode {
				self.delete(sibling, new_parent)?;
			}
		}

		if new_name.is_some() && target_name != current_name.as_slice() {
			set_header_name(&mut buf, target_name)?;
		}
		if header_type(&buf) == EntityType::Folder as u8 {
			let mut folder = DirEntity::decode(&buf);
			folder.parent = new_parent;
			folder.encode(&mut buf);
		}
		self.dev.write_block(dnode, &buf)?;

		let mut new_parent_buf = self.read_block(new_parent)?;
		let mut new_parent_dir = DirEntity::decode(&new_parent_buf);
		dir::insert(&mut new_parent_dir, dnode)?;
		new_parent_dir.encode(&mut new_parent_buf);
		self.dev.write_block(new_parent, &new_parent_buf)?;

		let mut old_parent_buf = self.read_block(old_parent)?;
		let mut old_parent_dir = DirEntity::decode(&old_parent_buf);
		dir::remove(&mut old_parent_dir, dnode);
		old_parent_dir.encode(&mut old_parent_buf);
		self.dev.write_block(old_parent, &old_parent_buf)?;

		Ok(())
	}

	/// Replaces the sibling of `dnode` in `parent` named `name`, if one
	/// exists and is not `dnode` itself. No-op if there is no such
	/// sibling; propagates [`Error::NotEmpty`] from [`CrowFs::delete`]
	/// without side effects otherwise.
	fn replace_sibling(&mut self, parent: u32, name: &[u8], excluding: u32) -> Result<()> {
		let parent_buf = self.read_block(parent)?;
		let parent_dir = DirEntity::decode(&parent_buf);
		if let Some((_, sibling)) = dir::find(&mut self.dev, &parent_dir, name)? {
			if sibling != excluding {
				self.delete(sibling, parent)?;
			}
		}
		Ok(())
	}

	/// Sums the free blocks across the bitmap.
	pub fn free_blocks(&mut self) -> Result<u32> {
		self.allocator.count_free(&mut self.dev)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::MemDevice;

	fn formatted(total_blocks: u32) -> CrowFs<MemDevice> {
		let dev = MemDevice::new(total_blocks);
		CrowFs::format(dev, total_blocks, 0).unwrap()
	}

	#[test]
	fn format_rejects_too_small_device() {
		let dev = MemDevice::new(4);
		assert!(matches!(CrowFs::format(dev, 4, 0), Err(Error::TooSmall)));
	}

	#[test]
	fn root_resolves_with_sentinel_parent() {
		let mut fs = formatted(256);
		let (dnode, parent) = fs.open(b"/", OpenFlags::NONE, 0).unwrap();
		assert_eq!(dnode, fs.root());
		assert_eq!(parent, 0);
	}

	#[test]
	fn create_then_stat_a_file() {
		let mut fs = formatted(256);
		let (a, parent) = fs.open(b"/a", OpenFlags::CREATE, 0).unwrap();
		assert_eq!(parent, fs.root());
		let st = fs.stat(a, parent).unwrap();
		assert_eq!(st.kind, EntityType::File);
		assert_eq!(st.size, 0);
		assert_eq!(st.name, b"a");
	}

	#[test]
	fn open_create_is_idempotent() {
		let mut fs = formatted(256);
		let (d, _) = fs.open(b"/d", OpenFlags::CREATE_DIR, 0).unwrap();
		let (f1, _) = fs.open(b"/d/f", OpenFlags::CREATE, 0).unwrap();
		let (f2, _) = fs.open(b"/d/f", OpenFlags::NONE, 0).unwrap();
		assert_eq!(f1, f2);
		let st = fs.stat(d, fs.root()).unwrap();
		assert_eq!(st.size, 1);
	}

	#[test]
	fn descending_through_a_file_is_not_found() {
		let mut fs = formatted(256);
		fs.open(b"/f", OpenFlags::CREATE, 0).unwrap();
		assert!(matches!(fs.open(b"/f/x", OpenFlags::NONE, 0), Err(Error::NotFound)));
	}

	#[test]
	fn directory_fills_up_at_m_children() {
		let mut fs = formatted(2048);
		for i in 0..M {
			let path = format!("/file{i}");
			fs.open(path.as_bytes(), OpenFlags::CREATE, 0).unwrap();
		}
		assert!(matches!(fs.open(b"/x", OpenFlags::CREATE, 0), Err(Error::Limit)));

		let (file956, root) = fs.open(b"/file956", OpenFlags::NONE, 0).unwrap();
		fs.delete(file956, root).unwrap();
		fs.open(b"/x", OpenFlags::CREATE_DIR, 0).unwrap();
	}

	#[test]
	fn delete_root_is_rejected() {
		let mut fs = formatted(256);
		let root = fs.root();
		assert!(matches!(fs.delete(root, 0), Err(Error::Argument)));
	}

	#[test]
	fn delete_non_empty_directory_is_rejected() {
		let mut fs = formatted(256);
		let (d, root) = fs.open(b"/d", OpenFlags::CREATE_DIR, 0).unwrap();
		fs.open(b"/d/f", OpenFlags::CREATE, 0).unwrap();
		assert!(matches!(fs.delete(d, root), Err(Error::NotEmpty)));
	}

	#[test]
	fn move_across_directories() {
		let mut fs = formatted(256);
		let (d1, root) = fs.open(b"/d1", OpenFlags::CREATE_DIR, 0).unwrap();
		let (d2, _) = fs.open(b"/d2", OpenFlags::CREATE_DIR, 0).unwrap();
		let (f, _) = fs.open(b"/d1/f", OpenFlags::CREATE, 0).unwrap();

		fs.move_entity(f, d1, d2, None).unwrap();

		assert!(matches!(fs.open(b"/d1/f", OpenFlags::NONE, 0), Err(Error::NotFound)));
		let (f2, parent) = fs.open(b"/d2/f", OpenFlags::NONE, 0).unwrap();
		assert_eq!(f2, f);
		assert_eq!(parent, d2);
		let _ = root;
	}

	#[test]
	fn rename_in_place_replaces_existing_sibling() {
		let mut fs = formatted(256);
		let (a, root) = fs.open(b"/a", OpenFlags::CREATE, 0).unwrap();
		fs.write(a, b"AAA", 0).unwrap();
		let (b, _) = fs.open(b"/b", OpenFlags::CREATE, 0).unwrap();
		fs.write(b, b"BB", 0).unwrap();

		fs.move_entity(b, root, root, Some(b"a")).unwrap();

		let (resolved, _) = fs.open(b"/a", OpenFlags::NONE, 0).unwrap();
		assert_eq!(resolved, b);
		let st = fs.stat(resolved, root).unwrap();
		assert_eq!(st.size, 2);
	}

	#[test]
	fn free_blocks_decreases_on_allocation() {
		let mut fs = formatted(256);
		let before = fs.free_blocks().unwrap();
		fs.open(b"/a", OpenFlags::CREATE, 0).unwrap();
		let after = fs.free_blocks().unwrap();
		assert_eq!(after, before - 1);
	}

	#[test]
	fn tiny_device_exhausts_and_existing_files_stay_intact() {
		// 16 blocks: 1 bitmap block (bb=1) covers blocks up to 32768, so
		// metadata is 0..4 (boot, superblock, 1 bitmap block, root), and
		// 12 data blocks remain free before the allocator returns FULL.
		let mut fs = formatted(16);
		let mut created = Vec::new();
		loop {
			let path = format!("/f{}", created.len());
			match fs.open(path.as_bytes(), OpenFlags::CREATE, 0) {
				Ok((dnode, _)) => created.push(dnode),
				Err(Error::Full) => break,
				Err(e) => panic!("unexpected error: {e}"),
			}
		}
		assert!(!created.is_empty());
		let first = created[0];
		let st = fs.stat(first, fs.root()).unwrap();
		assert_eq!(st.size, 0);
		assert!(matches!(fs.open(b"/x", OpenFlags::CREATE, 0), Err(Error::Full)));
	}
}
