pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_HASH: &str = "0";
pub const DEFAULT_DIFFICULTY: u32 = 2;
/// Leading byte of every digest preimage. Bump when the layout changes.
pub const DIGEST_ENCODING_VERSION: u8 = 1;
/// How many nonces the sequential miner tries between progress logs.
pub const PROGRESS_LOG_INTERVAL: u64 = 1 << 20;
