use crate::{
    constants::{DIGEST_ENCODING_VERSION, GENESIS_HASH, PROGRESS_LOG_INTERVAL},
    pow::{meets_difficulty, MiningLimit},
    sha256_hex, MiningError, Transfer,
};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Nanoseconds since the Unix epoch, or 0 if the clock is before it.
pub(crate) fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn put_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u64).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

/// One unit of the ledger. Unsealed until mined; read-only from outside the crate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Block {
    pub(crate) data: Transfer,
    pub(crate) hash: String,
    pub(crate) previous_hash: String,
    pub(crate) timestamp: u64,
    pub(crate) nonce: u64,
}

impl Block {
    /// An unsealed block linked to `previous_hash`, stamped with the current time.
    pub fn new(data: Transfer, previous_hash: impl Into<String>) -> Self {
        Self::with_timestamp(data, previous_hash, now_nanos())
    }

    pub fn with_timestamp(data: Transfer, previous_hash: impl Into<String>, timestamp: u64) -> Self {
        Self {
            data,
            hash: String::new(),
            previous_hash: previous_hash.into(),
            timestamp,
            nonce: 0,
        }
    }

    /// The chain root. Its hash is the sentinel and is never computed.
    pub fn genesis() -> Self {
        Self {
            data: Transfer::default(),
            hash: GENESIS_HASH.to_string(),
            previous_hash: String::new(),
            timestamp: now_nanos(),
            nonce: 0,
        }
    }

    pub fn data(&self) -> &Transfer {
        &self.data
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Creation time in nanoseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn is_sealed(&self) -> bool {
        !self.hash.is_empty()
    }

    /// Everything hashed except the nonce:
    /// version, then length-prefixed previous hash, from and to, then the amount's
    /// IEEE-754 bits and the timestamp, all little-endian u64.
    pub fn preimage_prefix(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            1 + 8 * 6 + self.previous_hash.len() + self.data.from.len() + self.data.to.len(),
        );
        bytes.push(DIGEST_ENCODING_VERSION);
        put_str(&mut bytes, &self.previous_hash);
        put_str(&mut bytes, &self.data.from);
        put_str(&mut bytes, &self.data.to);
        bytes.extend_from_slice(&self.data.amount.to_bits().to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes
    }

    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = self.preimage_prefix();
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Digest of the current field values. Never cached.
    pub fn calculate_digest(&self) -> String {
        sha256_hex(&self.hash_bytes())
    }

    /// Seal the block: search nonces from 0 until the digest has
    /// `difficulty` leading zero hex digits. Does not return before it finds one.
    pub fn mine(&mut self, difficulty: u32) {
        let mut bytes = self.preimage_prefix();
        let prefix_len = bytes.len();
        self.nonce = 0;
        while !self.try_nonce(&mut bytes, prefix_len, difficulty) {
            self.nonce = self.nonce.wrapping_add(1);
            if self.nonce % PROGRESS_LOG_INTERVAL == 0 {
                debug!(attempts = self.nonce, difficulty, "still mining");
            }
        }
    }

    /// Like [`Block::mine`], giving up once `limit` is exhausted.
    /// Returns the number of digests computed. On abort the block is left unsealed.
    pub fn mine_with(&mut self, difficulty: u32, limit: &MiningLimit) -> Result<u64, MiningError> {
        let mut bytes = self.preimage_prefix();
        let prefix_len = bytes.len();
        let mut attempts = 0u64;
        self.nonce = 0;
        loop {
            if limit.exhausted(attempts) {
                self.hash.clear();
                debug!(attempts, difficulty, "mining aborted");
                return Err(MiningError::Aborted { attempts });
            }
            attempts += 1;
            if self.try_nonce(&mut bytes, prefix_len, difficulty) {
                return Ok(attempts);
            }
            if attempts % PROGRESS_LOG_INTERVAL == 0 {
                debug!(attempts, difficulty, "still mining");
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Hash the current nonce onto the shared prefix in `bytes`; true if it meets the target.
    fn try_nonce(&mut self, bytes: &mut Vec<u8>, prefix_len: usize, difficulty: u32) -> bool {
        bytes.truncate(prefix_len);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        self.hash = sha256_hex(bytes);
        meets_difficulty(&self.hash, difficulty)
    }

    /// Install a nonce found elsewhere (e.g. by the parallel miner) and recompute the hash.
    pub(crate) fn seal_with(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.hash = self.calculate_digest();
    }
}
