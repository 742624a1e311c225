extern crate anyhow;
extern crate bincode;
extern crate bitvec;
extern crate byte_unit;
extern crate clap;
extern crate crc32fast;
extern crate serde;

mod minivsfs;
mod mkfs;

use byte_unit::Byte;
use clap::{value_parser, Arg, Command};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("image")
                .long("image")
                .takes_value(true)
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Location of the new file system image"),
        )
        .arg(
            Arg::new("size-kib")
                .long("size-kib")
                .takes_value(true)
                .required(true)
                .value_parser(value_parser!(u64))
                .help("Total image size in KiB, a multiple of 4 between 180 and 4096"),
        )
        .arg(
            Arg::new("inodes")
                .long("inodes")
                .takes_value(true)
                .required(true)
                .value_parser(value_parser!(u64))
                .help("Number of inodes, between 128 and 512"),
        )
        .arg(
            Arg::new("timestamp")
                .long("timestamp")
                .takes_value(true)
                .value_parser(value_parser!(u64))
                .help("Unix time stamped on the superblock and root inode instead of now. Makes the image reproducible."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every region as it is written"),
        )
        .get_matches();

    env_logger::Builder::new()
        .filter_level(if matches.is_present("verbose") {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .format_timestamp(None)
        .format_target(false)
        .init();

    let image = matches.get_one::<PathBuf>("image").unwrap();
    let size_kib = *matches.get_one::<u64>("size-kib").unwrap();
    let inodes = *matches.get_one::<u64>("inodes").unwrap();

    let layout = match matches.get_one::<u64>("timestamp") {
        Some(created_at) => mkfs::make_at(image, size_kib, inodes, *created_at)?,
        None => mkfs::make(image, size_kib, inodes)?,
    };

    println!("File system created successfully: {}", image.display());
    println!("Total blocks: {}", layout.total_blocks);
    println!("Inodes: {}", layout.inode_count);
    println!("Data region blocks: {}", layout.data_region.blocks);
    println!(
        "Image size: {}",
        Byte::from_bytes(layout.image_size() as _).get_appropriate_unit(true)
    );

    Ok(())
}
