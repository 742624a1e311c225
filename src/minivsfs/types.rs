use super::{
    layout::{Layout, Region},
    util, DIRENT_NAME_LEN, DIRENT_SIZE, DIRENT_TYPE_DIR, INODE_SIZE, MINIVSFS_MAGIC,
    ROOT_INODE, ROOT_PROJECT_ID, SUPERBLOCK_SIZE, S_IFDIR, VERSION,
};
use anyhow::anyhow;
use bitvec::{order::Lsb0, vec::BitVec};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use std::io::prelude::*;

const SUPERBLOCK_CHECKSUM_LEN: usize = 4;
const INODE_CRC_OFFSET: usize = INODE_SIZE - 8;
const DIRENT_CHECKSUM_OFFSET: usize = DIRENT_SIZE - 1;

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub magic: u32,
    pub version: u32,
    pub block_size: u32,
    pub total_blocks: u64,
    pub inode_count: u64,
    pub inode_bitmap_start: u64,
    pub inode_bitmap_blocks: u64,
    pub data_bitmap_start: u64,
    pub data_bitmap_blocks: u64,
    pub inode_table_start: u64,
    pub inode_table_blocks: u64,
    pub data_region_start: u64,
    pub data_region_blocks: u64,
    pub root_inode: u64,
    pub mtime_epoch: u64,
    pub flags: u32,
    // crc32 of block[0..block_size - 4] with this field zeroed
    pub checksum: u32,
}

impl Superblock {
    pub fn new(layout: &Layout, created_at: u64) -> Self {
        Self {
            magic: MINIVSFS_MAGIC,
            version: VERSION,
            block_size: layout.block_size,
            total_blocks: layout.total_blocks,
            inode_count: layout.inode_count,
            inode_bitmap_start: layout.inode_bitmap.start,
            inode_bitmap_blocks: layout.inode_bitmap.blocks,
            data_bitmap_start: layout.data_bitmap.start,
            data_bitmap_blocks: layout.data_bitmap.blocks,
            inode_table_start: layout.inode_table.start,
            inode_table_blocks: layout.inode_table.blocks,
            data_region_start: layout.data_region.start,
            data_region_blocks: layout.data_region.blocks,
            root_inode: ROOT_INODE as u64,
            mtime_epoch: created_at,
            flags: 0,
            checksum: 0,
        }
    }

    /// Must run after every other field is final.
    pub fn checksum(&mut self) -> anyhow::Result<()> {
        self.checksum = 0;
        let block = self.padded_block()?;
        self.checksum = util::crc32(&block[..block.len() - SUPERBLOCK_CHECKSUM_LEN]);
        Ok(())
    }

    /// Writes the record zero-padded to a whole block.
    pub fn serialize_into<W>(&mut self, mut w: W) -> anyhow::Result<()>
    where
        W: Write,
    {
        self.checksum()?;
        w.write_all(&self.padded_block()?)?;
        Ok(())
    }

    fn padded_block(&self) -> anyhow::Result<Vec<u8>> {
        let mut block = bincode::serialize(self)?;
        if block.len() != SUPERBLOCK_SIZE || self.block_size as usize <= SUPERBLOCK_SIZE {
            return Err(anyhow!(
                "Superblock record of {} bytes does not fit a {} byte block",
                block.len(),
                self.block_size
            ));
        }
        block.resize(self.block_size as usize, 0);
        Ok(block)
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Inode {
    pub mode: u16,
    pub links: u16,
    pub uid: u32,
    pub gid: u32,
    pub size_bytes: u64,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
    pub direct_blocks: [u32; 12],
    pub reserved_0: u32,
    pub reserved_1: u32,
    pub reserved_2: u32,
    pub proj_id: u32,
    pub uid16_gid16: u32,
    pub xattr_ptr: u64,
    // low 4 bytes carry crc32 of bytes [0..120], high 4 bytes stay zero
    pub inode_crc: u64,
}

impl Inode {
    /// Root directory inode holding "." and ".." in the first data block.
    pub fn root(created_at: u64) -> Self {
        Self {
            mode: S_IFDIR,
            links: 2,
            size_bytes: 2 * DIRENT_SIZE as u64,
            atime: created_at,
            mtime: created_at,
            ctime: created_at,
            proj_id: ROOT_PROJECT_ID,
            ..Self::default()
        }
    }

    /// Must run after every other field is final.
    pub fn checksum(&mut self) -> anyhow::Result<()> {
        self.inode_crc = 0;
        let buf = bincode::serialize(&*self)?;
        self.inode_crc = util::crc32(&buf[..INODE_CRC_OFFSET]) as u64;
        Ok(())
    }

    pub fn serialize_into<W>(&mut self, w: W) -> anyhow::Result<()>
    where
        W: Write,
    {
        self.checksum()?;
        bincode::serialize_into(w, &*self).map_err(|e| e.into())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_no: u32,
    pub kind: u8,
    // null padded, unterminated when the name fills the field
    #[serde(with = "BigArray")]
    pub name: [u8; DIRENT_NAME_LEN],
    pub checksum: u8,
}

impl DirEntry {
    pub fn new(inode_no: u32, kind: u8, name: &str) -> anyhow::Result<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > DIRENT_NAME_LEN {
            return Err(anyhow!(
                "Directory entry name must be 1 to {} bytes, got {}",
                DIRENT_NAME_LEN,
                bytes.len()
            ));
        }

        let mut entry = Self {
            inode_no,
            kind,
            name: [0; DIRENT_NAME_LEN],
            checksum: 0,
        };
        entry.name[..bytes.len()].copy_from_slice(bytes);
        Ok(entry)
    }

    pub fn dir(inode_no: u32, name: &str) -> anyhow::Result<Self> {
        Self::new(inode_no, DIRENT_TYPE_DIR, name)
    }

    /// Must run after every other field is final.
    pub fn checksum(&mut self) -> anyhow::Result<()> {
        let buf = bincode::serialize(&*self)?;
        self.checksum = util::xor_fold(&buf[..DIRENT_CHECKSUM_OFFSET]);
        Ok(())
    }

    pub fn serialize_into<W>(&mut self, w: W) -> anyhow::Result<()>
    where
        W: Write,
    {
        self.checksum()?;
        bincode::serialize_into(w, &*self).map_err(|e| e.into())
    }

    #[cfg(test)]
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(DIRENT_NAME_LEN);
        &self.name[..len]
    }
}

/// Allocation map covering a whole bitmap region.
#[derive(Debug)]
pub struct Bitmap {
    bits: BitVec<u8, Lsb0>,
}

impl Bitmap {
    pub fn new(region: &Region, blk_size: u32) -> Self {
        let len = region.byte_len(blk_size) as usize * 8;
        Self {
            bits: BitVec::repeat(false, len),
        }
    }

    pub fn reserve(&mut self, index: usize) -> anyhow::Result<()> {
        if index >= self.bits.len() {
            return Err(anyhow!(
                "Bit {} is outside a bitmap of {} bits",
                index,
                self.bits.len()
            ));
        }
        self.bits.set(index, true);
        Ok(())
    }

    #[cfg(test)]
    pub fn is_reserved(&self, index: usize) -> bool {
        self.bits.get(index).map_or(false, |bit| *bit)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}

#[cfg(test)]
impl Superblock {
    pub fn deserialize_from<R>(mut r: R) -> anyhow::Result<Self>
    where
        R: Read,
    {
        let mut block = vec![0u8; super::BLOCK_SIZE as usize];
        r.read_exact(&mut block)?;
        let sb: Self = bincode::deserialize(&block)?;

        block[SUPERBLOCK_SIZE - SUPERBLOCK_CHECKSUM_LEN..SUPERBLOCK_SIZE].fill(0);
        if sb.checksum != util::crc32(&block[..block.len() - SUPERBLOCK_CHECKSUM_LEN]) {
            return Err(anyhow!("Superblock checksum verification failed"));
        }

        Ok(sb)
    }
}

#[cfg(test)]
impl Inode {
    pub fn deserialize_from<R>(mut r: R) -> anyhow::Result<Self>
    where
        R: Read,
    {
        let mut buf = [0u8; INODE_SIZE];
        r.read_exact(&mut buf)?;
        let inode: Self = bincode::deserialize(&buf)?;

        if inode.inode_crc != util::crc32(&buf[..INODE_CRC_OFFSET]) as u64 {
            return Err(anyhow!("Inode checksum verification failed"));
        }

        Ok(inode)
    }
}

#[cfg(test)]
impl DirEntry {
    pub fn deserialize_from<R>(mut r: R) -> anyhow::Result<Self>
    where
        R: Read,
    {
        let mut buf = [0u8; DIRENT_SIZE];
        r.read_exact(&mut buf)?;
        let entry: Self = bincode::deserialize(&buf)?;

        if entry.checksum != util::xor_fold(&buf[..DIRENT_CHECKSUM_OFFSET]) {
            return Err(anyhow!("Directory entry checksum verification failed"));
        }

        Ok(entry)
    }
}
