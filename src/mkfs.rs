use crate::minivsfs::{
    layout::Layout,
    types::{Bitmap, DirEntry, Inode, Superblock},
    util, INODE_SIZE, ROOT_INODE,
};
use anyhow::Context;
use log::{debug, info};
use std::{
    fs::{File, OpenOptions},
    io::{prelude::*, BufWriter, SeekFrom},
    path::Path,
};

/// Formats `path` stamped with the current time.
pub fn make<P>(path: P, size_kib: u64, inode_count: u64) -> anyhow::Result<Layout>
where
    P: AsRef<Path>,
{
    make_at(path, size_kib, inode_count, util::now())
}

/// Formats `path` with every timestamp set to `created_at`. The same inputs
/// always produce the same image.
pub fn make_at<P>(
    path: P,
    size_kib: u64,
    inode_count: u64,
    created_at: u64,
) -> anyhow::Result<Layout>
where
    P: AsRef<Path>,
{
    let layout = Layout::plan(size_kib, inode_count)?;
    debug!("Planned layout: {:?}", layout);

    let file = create_file(path.as_ref())
        .with_context(|| format!("creating image {}", path.as_ref().display()))?;
    let mut buf = BufWriter::new(file);

    write_superblock(&mut buf, &layout, created_at).context("writing superblock")?;
    write_bitmaps(&mut buf, &layout).context("writing bitmaps")?;
    write_inode_table(&mut buf, &layout, created_at).context("writing inode table")?;
    write_root_directory(&mut buf, &layout).context("writing root directory")?;

    let file = buf.into_inner().map_err(|e| e.into_error())?;
    finalize_image(&file, &layout).context("setting image size")?;

    info!(
        "Formatted {}: {} blocks, {} inodes",
        path.as_ref().display(),
        layout.total_blocks,
        layout.inode_count
    );

    Ok(layout)
}

pub fn write_superblock<W>(mut w: W, layout: &Layout, created_at: u64) -> anyhow::Result<()>
where
    W: Write + Seek,
{
    let mut sb = Superblock::new(layout, created_at);
    let offset = layout.superblock.byte_offset(layout.block_size);
    w.seek(SeekFrom::Start(offset))?;
    sb.serialize_into(&mut w)?;

    debug!("Superblock at {} (checksum {:#010x})", offset, sb.checksum);
    Ok(())
}

pub fn write_bitmaps<W>(mut w: W, layout: &Layout) -> anyhow::Result<()>
where
    W: Write + Seek,
{
    // bit 0 of each map: the root inode and the root directory's data block
    for region in &[layout.inode_bitmap, layout.data_bitmap] {
        let mut bitmap = Bitmap::new(region, layout.block_size);
        bitmap.reserve(0)?;

        let offset = region.byte_offset(layout.block_size);
        w.seek(SeekFrom::Start(offset))?;
        w.write_all(bitmap.as_bytes())?;

        debug!("Bitmap at {} ({} bytes)", offset, bitmap.as_bytes().len());
    }

    Ok(())
}

pub fn write_inode_table<W>(mut w: W, layout: &Layout, created_at: u64) -> anyhow::Result<()>
where
    W: Write + Seek,
{
    let table_len = layout.inode_table.byte_len(layout.block_size) as usize;
    let mut table = vec![0u8; table_len];

    let mut root = Inode::root(created_at);
    let slot = (ROOT_INODE as usize - 1) * INODE_SIZE;
    root.serialize_into(&mut table[slot..slot + INODE_SIZE])?;

    let offset = layout.inode_table.byte_offset(layout.block_size);
    w.seek(SeekFrom::Start(offset))?;
    w.write_all(&table)?;

    debug!("Inode table at {} ({} bytes)", offset, table_len);
    Ok(())
}

pub fn write_root_directory<W>(mut w: W, layout: &Layout) -> anyhow::Result<()>
where
    W: Write + Seek,
{
    let offset = layout.data_region.byte_offset(layout.block_size);
    w.seek(SeekFrom::Start(offset))?;

    for name in &[".", ".."] {
        let mut entry = DirEntry::dir(ROOT_INODE, name)?;
        entry.serialize_into(&mut w)?;
    }

    debug!("Root directory at {}", offset);
    Ok(())
}

/// Sizes the image to its full length. Bytes never written read as zero.
pub fn finalize_image(file: &File, layout: &Layout) -> anyhow::Result<()> {
    Ok(file.set_len(layout.image_size())?)
}

fn create_file<P: AsRef<Path>>(name: P) -> anyhow::Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(name)?;

    Ok(file)
}
