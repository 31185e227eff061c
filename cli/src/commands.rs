//! The four subcommands the `crowfs` binary exposes: `new`, `copyin`,
//! `copyout`, `ls`.

use crate::device;
use crowfs::{CrowFs, Error, FileDevice, OpenFlags};
use std::fs;
use std::path::Path;

fn now() -> i64 {
	utils::util::get_timestamp().as_secs() as i64
}

fn open_fs(bin: &str, image: &Path) -> CrowFs<FileDevice> {
	let dev = device::open(bin, image);
	CrowFs::mount(dev).unwrap_or_else(|e| die(bin, image, e))
}

fn die(bin: &str, image: &Path, e: Error) -> ! {
	utils::error(bin, format!("{}: {e}", image.display()))
}

/// `new <image>`: formats `image` as a fresh, empty CrowFS filesystem sized
/// from the image file's own length.
pub fn new(bin: &str, image: &Path) {
	let dev = device::open(bin, image);
	let total_blocks = dev.total_blocks();
	let fs = CrowFs::format(dev, total_blocks, now()).unwrap_or_else(|e| die(bin, image, e));
	println!("File system created with {} blocks", fs.total_blocks());
}

/// `copyin <image> <host_src> <fs_dst>`: creates `fs_dst` inside `image` and
/// copies the bytes of `host_src` into it.
pub fn copyin(bin: &str, image: &Path, host_src: &Path, fs_dst: &[u8]) {
	let mut fs = open_fs(bin, image);
	let data = fs::read(host_src).unwrap_or_else(|e| {
		utils::error(bin, format!("{}: {e}", host_src.display()))
	});

	let (dnode, _) = fs
		.open(fs_dst, OpenFlags::CREATE, now())
		.unwrap_or_else(|e| die(bin, image, e));
	fs.write(dnode, &data, 0).unwrap_or_else(|e| die(bin, image, e));
}

/// `copyout <image> <fs_src> <host_dst>`: opens `fs_src` inside `image` and
/// copies its bytes to `host_dst`.
pub fn copyout(bin: &str, image: &Path, fs_src: &[u8], host_dst: &Path) {
	let mut fs = open_fs(bin, image);
	let (dnode, parent) = fs
		.open(fs_src, OpenFlags::NONE, now())
		.unwrap_or_else(|e| die(bin, image, e));
	let st = fs.stat(dnode, parent).unwrap_or_else(|e| die(bin, image, e));

	let mut data = vec![0u8; st.size as usize];
	let n = fs.read(dnode, &mut data, 0).unwrap_or_else(|e| die(bin, image, e));
	fs::write(host_dst, &data[..n]).unwrap_or_else(|e| {
		utils::error(bin, format!("{}: {e}", host_dst.display()))
	});
}

/// `ls <image> <fs_dir>`: lists `fs_dir`'s children as
/// `<F|D>\t<name>\t<size>\t<creation_epoch>`, one per line.
pub fn ls(bin: &str, image: &Path, fs_dir: &[u8]) {
	let mut fs = open_fs(bin, image);
	let (dnode, _) = fs
		.open(fs_dir, OpenFlags::NONE, now())
		.unwrap_or_else(|e| die(bin, image, e));

	let mut offset = 0usize;
	loop {
		let st = match fs.read_dir(dnode, offset) {
			Ok(st) => st,
			Err(Error::Limit) => break,
			Err(e) => die(bin, image, e),
		};
		let tag = match st.kind {
			crowfs::EntityType::File => 'F',
			crowfs::EntityType::Folder => 'D',
		};
		println!(
			"{tag}\t{}\t{}\t{}",
			String::from_utf8_lossy(&st.name),
			st.size,
			st.creation_time
		);
		offset += 1;
	}
}
