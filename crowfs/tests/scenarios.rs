//! End-to-end scenarios run against a freshly formatted 1 MiB image (256
//! blocks), clock frozen at `t = 0`, mirroring the walkthroughs a reviewer
//! would run by hand against a mounted filesystem.

use crowfs::{CrowFs, EntityType, Error, MemDevice, OpenFlags, M};

fn formatted(total_blocks: u32) -> CrowFs<MemDevice> {
	let dev = MemDevice::new(total_blocks);
	CrowFs::format(dev, total_blocks, 0).unwrap()
}

#[test]
fn create_a_file_at_root() {
	let mut fs = formatted(256);
	let (a, parent) = fs.open(b"/a", OpenFlags::CREATE, 0).unwrap();
	assert_eq!(parent, fs.root());

	let st = fs.stat(a, parent).unwrap();
	assert_eq!(st.kind, EntityType::File);
	assert_eq!(st.size, 0);
	assert_eq!(st.name, b"a");
}

#[test]
fn nested_create_and_idempotent_reopen() {
	let mut fs = formatted(256);
	let (d, root) = fs.open(b"/d", OpenFlags::CREATE_DIR, 0).unwrap();
	let (f, _) = fs.open(b"/d/f", OpenFlags::CREATE, 0).unwrap();
	let (f_again, _) = fs.open(b"/d/f", OpenFlags::NONE, 0).unwrap();
	assert_eq!(f, f_again);

	let st = fs.stat(d, root).unwrap();
	assert_eq!(st.size, 1);
}

#[test]
fn append_then_read_back_at_two_offsets() {
	let mut fs = formatted(256);
	let (f, _) = fs.open(b"/f", OpenFlags::CREATE, 0).unwrap();

	fs.write(f, b"Hello world!", 0).unwrap();
	fs.write(f, b"Hello world!", 12).unwrap();

	let mut out = [0u8; 1024];
	let n = fs.read(f, &mut out, 0).unwrap();
	assert_eq!(&out[..n], b"Hello world!Hello world!");

	let n = fs.read(f, &mut out, 5).unwrap();
	assert_eq!(&out[..n], b" world!Hello world!");
}

#[test]
fn directory_fills_at_957_then_a_delete_makes_room() {
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
fn move_across_directories_updates_lookup_and_parent() {
	let mut fs = formatted(256);
	let (d1, _) = fs.open(b"/d1", OpenFlags::CREATE_DIR, 0).unwrap();
	let (d2, _) = fs.open(b"/d2", OpenFlags::CREATE_DIR, 0).unwrap();
	let (f, _) = fs.open(b"/d1/f", OpenFlags::CREATE, 0).unwrap();

	fs.move_entity(f, d1, d2, None).unwrap();

	assert!(matches!(fs.open(b"/d1/f", OpenFlags::NONE, 0), Err(Error::NotFound)));
	let (f2, parent) = fs.open(b"/d2/f", OpenFlags::NONE, 0).unwrap();
	assert_eq!(f2, f);
	assert_eq!(parent, d2);
}

#[test]
fn exhausting_a_tiny_device_leaves_existing_files_intact() {
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
