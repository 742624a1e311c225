use super::{
    error::FormatError, util, BLOCK_SIZE, INODE_SIZE, MAX_INODES, MAX_SIZE_KIB, MIN_INODES,
    MIN_SIZE_KIB,
};

/// A contiguous run of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: u64,
    pub blocks: u64,
}

impl Region {
    fn after(prev: &Region, blocks: u64) -> Self {
        Self {
            start: prev.end(),
            blocks,
        }
    }

    /// First block past the region.
    pub fn end(&self) -> u64 {
        self.start + self.blocks
    }

    pub fn byte_offset(&self, blk_size: u32) -> u64 {
        self.start * blk_size as u64
    }

    pub fn byte_len(&self, blk_size: u32) -> u64 {
        self.blocks * blk_size as u64
    }
}

/// Block placement of every region of an image:
/// `[superblock][inode bitmap][data bitmap][inode table][data region]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub block_size: u32,
    pub total_blocks: u64,
    pub inode_count: u64,
    pub superblock: Region,
    pub inode_bitmap: Region,
    pub data_bitmap: Region,
    pub inode_table: Region,
    pub data_region: Region,
}

impl Layout {
    pub fn plan(size_kib: u64, inode_count: u64) -> Result<Self, FormatError> {
        validate(size_kib, inode_count)?;

        let block_size = BLOCK_SIZE;
        let total_blocks = size_kib * 1024 / block_size as u64;

        let superblock = Region {
            start: 0,
            blocks: 1,
        };
        let inode_bitmap = Region::after(&superblock, 1);
        let data_bitmap = Region::after(&inode_bitmap, 1);
        let inode_table = Region::after(
            &data_bitmap,
            util::blocks_for(inode_count * INODE_SIZE as u64, block_size),
        );

        let data_start = inode_table.end();
        if data_start >= total_blocks {
            return Err(FormatError::NoDataRegion {
                data_start,
                total_blocks,
            });
        }
        let data_region = Region {
            start: data_start,
            blocks: total_blocks - data_start,
        };

        Ok(Self {
            block_size,
            total_blocks,
            inode_count,
            superblock,
            inode_bitmap,
            data_bitmap,
            inode_table,
            data_region,
        })
    }

    pub fn image_size(&self) -> u64 {
        self.total_blocks * self.block_size as u64
    }
}

fn validate(size_kib: u64, inode_count: u64) -> Result<(), FormatError> {
    if !(MIN_SIZE_KIB..=MAX_SIZE_KIB).contains(&size_kib) {
        return Err(FormatError::SizeOutOfRange(size_kib));
    }

    let blk_kib = BLOCK_SIZE as u64 / 1024;
    if size_kib % blk_kib != 0 {
        return Err(FormatError::SizeMisaligned(size_kib, blk_kib));
    }

    if !(MIN_INODES..=MAX_INODES).contains(&inode_count) {
        return Err(FormatError::InodeCountOutOfRange(inode_count));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_minimum_image() -> anyhow::Result<()> {
        let layout = Layout::plan(180, 128)?;

        assert_eq!(layout.total_blocks, 45);
        assert_eq!(layout.inode_bitmap, Region { start: 1, blocks: 1 });
        assert_eq!(layout.data_bitmap, Region { start: 2, blocks: 1 });
        assert_eq!(layout.inode_table, Region { start: 3, blocks: 4 });
        assert_eq!(layout.data_region, Region { start: 7, blocks: 38 });
        assert_eq!(layout.image_size(), 184320);

        Ok(())
    }

    #[test]
    fn plan_largest_inode_table() -> anyhow::Result<()> {
        let layout = Layout::plan(4096, 512)?;

        assert_eq!(layout.total_blocks, 1024);
        assert_eq!(layout.inode_table, Region { start: 3, blocks: 16 });
        assert_eq!(layout.data_region.start, 19);
        assert_eq!(layout.data_region.blocks, 1005);

        Ok(())
    }

    #[test]
    fn partial_inode_table_block_rounds_up() -> anyhow::Result<()> {
        // 129 * 128 bytes spills one inode into a fifth block
        let layout = Layout::plan(180, 129)?;
        assert_eq!(layout.inode_table.blocks, 5);
        assert_eq!(layout.data_region.start, 8);

        Ok(())
    }

    #[test]
    fn regions_are_contiguous_for_every_valid_input() -> anyhow::Result<()> {
        for size_kib in (MIN_SIZE_KIB..=MAX_SIZE_KIB).step_by(4) {
            for inode_count in MIN_INODES..=MAX_INODES {
                let layout = Layout::plan(size_kib, inode_count)?;

                assert_eq!(layout.superblock.end(), layout.inode_bitmap.start);
                assert_eq!(layout.inode_bitmap.end(), layout.data_bitmap.start);
                assert_eq!(layout.data_bitmap.end(), layout.inode_table.start);
                assert_eq!(layout.inode_table.end(), layout.data_region.start);
                assert_eq!(layout.data_region.end(), layout.total_blocks);
                assert!(layout.data_region.blocks >= 1);
            }
        }

        Ok(())
    }

    #[test]
    fn boundaries_accepted() {
        for (size_kib, inodes) in &[(180, 128), (180, 512), (4096, 128), (4096, 512)] {
            assert!(Layout::plan(*size_kib, *inodes).is_ok());
        }
    }

    #[test]
    fn out_of_bounds_rejected() {
        assert_eq!(Layout::plan(179, 128), Err(FormatError::SizeOutOfRange(179)));
        assert_eq!(Layout::plan(4100, 128), Err(FormatError::SizeOutOfRange(4100)));
        assert_eq!(Layout::plan(181, 128), Err(FormatError::SizeMisaligned(181, 4)));
        assert_eq!(Layout::plan(180, 127), Err(FormatError::InodeCountOutOfRange(127)));
        assert_eq!(Layout::plan(180, 513), Err(FormatError::InodeCountOutOfRange(513)));
    }

    #[test]
    fn region_byte_geometry() {
        let region = Region { start: 3, blocks: 4 };
        assert_eq!(region.end(), 7);
        assert_eq!(region.byte_offset(4096), 12288);
        assert_eq!(region.byte_len(4096), 16384);
    }
}
