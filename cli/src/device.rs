//! Opens the image file backing a `crowfs` invocation as a [`FileDevice`].

use crowfs::device::FileDevice;
use crowfs::BLOCK_SIZE;
use std::fs::OpenOptions;
use std::path::Path;

/// Opens `path` for reading and writing and wraps it in a [`FileDevice`],
/// sizing it from the file/device's own length the way `mkfs` derives a
/// device's block count (`utils::disk::get_disk_size`).
pub fn open(bin: &str, path: &Path) -> FileDevice {
	let file = OpenOptions::new()
		.read(true)
		.write(true)
		.open(path)
		.unwrap_or_else(|e| utils::error(bin, format!("{}: {e}", path.display())));

	let sectors = utils::disk::get_disk_size(path)
		.unwrap_or_else(|e| utils::error(bin, format!("{}: {e}", path.display())));
	let total_blocks = (sectors * 512) / BLOCK_SIZE as u64;
	if total_blocks == 0 || total_blocks > u32::MAX as u64 {
		utils::error(bin, format!("{}: invalid device size", path.display()));
	}

	FileDevice::new(file, total_blocks as u32)
}
