pub mod error;
pub mod layout;
pub mod types;
pub mod util;

pub const MINIVSFS_MAGIC: u32 = 0x4D565346;
pub const VERSION: u32 = 1;
pub const BLOCK_SIZE: u32 = 4096;
pub const ROOT_INODE: u32 = 1;

pub const SUPERBLOCK_SIZE: usize = 116;
pub const INODE_SIZE: usize = 128;
pub const DIRENT_SIZE: usize = 64;
pub const DIRENT_NAME_LEN: usize = 58;

pub const MIN_SIZE_KIB: u64 = 180;
pub const MAX_SIZE_KIB: u64 = 4096;
pub const MIN_INODES: u64 = 128;
pub const MAX_INODES: u64 = 512;

pub const S_IFDIR: u16 = 0x4000;
pub const DIRENT_TYPE_DIR: u8 = 2;
pub const ROOT_PROJECT_ID: u32 = 8;
