//! `crowfs`: a host-side tool to format a CrowFS image and move files in
//! and out of it.

mod commands;
mod device;

use std::env;
use std::path::Path;
use std::process::exit;

fn usage(prog: &str) -> ! {
	eprintln!("usage:");
	eprintln!("\t{prog} new <image>");
	eprintln!("\t{prog} copyin <image> <host_src> <fs_dst>");
	eprintln!("\t{prog} copyout <image> <fs_src> <host_dst>");
	eprintln!("\t{prog} ls <image> <fs_dir>");
	exit(1);
}

fn main() {
	let mut args = env::args();
	let prog = args.next().unwrap_or_else(|| "crowfs".to_owned());
	let rest: Vec<String> = args.collect();

	let Some((cmd, rest)) = rest.split_first() else {
		usage(&prog);
	};

	match (cmd.as_str(), rest) {
		("new", [image]) => commands::new(&prog, Path::new(image)),
		("copyin", [image, host_src, fs_dst]) => commands::copyin(
			&prog,
			Path::new(image),
			Path::new(host_src),
			fs_dst.as_bytes(),
		),
		("copyout", [image, fs_src, host_dst]) => commands::copyout(
			&prog,
			Path::new(image),
			fs_src.as_bytes(),
			Path::new(host_dst),
		),
		("ls", [image, fs_dir]) => commands::ls(&prog, Path::new(image), fs_dir.as_bytes()),
		_ => usage(&prog),
	}
}
