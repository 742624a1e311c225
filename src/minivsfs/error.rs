use super::{MAX_INODES, MAX_SIZE_KIB, MIN_INODES, MIN_SIZE_KIB};

/// Rejected format parameters. Raised before the image file is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("size must be between {} and {} KiB, got {0} KiB", MIN_SIZE_KIB, MAX_SIZE_KIB)]
    SizeOutOfRange(u64),

    #[error("size must be a multiple of {1} KiB, got {0} KiB")]
    SizeMisaligned(u64, u64),

    #[error("inode count must be between {} and {}, got {0}", MIN_INODES, MAX_INODES)]
    InodeCountOutOfRange(u64),

    #[error("inode table ends at block {data_start} but the image only has {total_blocks} blocks")]
    NoDataRegion { data_start: u64, total_blocks: u64 },
}
