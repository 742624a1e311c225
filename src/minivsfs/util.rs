use std::time::{self, SystemTime};

/// Reflected CRC-32 (polynomial 0xEDB88320, initial and final XOR 0xFFFFFFFF).
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

pub fn xor_fold(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Number of `blk_size` blocks needed to hold `bytes`.
pub fn blocks_for(bytes: u64, blk_size: u32) -> u64 {
    (bytes + blk_size as u64 - 1) / blk_size as u64
}
