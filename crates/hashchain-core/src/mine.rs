use crate::{
    pow::{meets_difficulty, MiningLimit},
    sha256_hex, Block, MiningError,
};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Seals `block` by searching nonces in parallel on the rayon pool.
///
/// Any qualifying nonce may win, so the result is not necessarily the smallest
/// one the sequential [`Block::mine`] would find; it satisfies the same target.
/// With a `max_attempts` cap only nonces below the cap are tried.
pub fn mine_block_parallel(
    mut block: Block,
    difficulty: u32,
    limit: &MiningLimit,
) -> Result<Block, MiningError> {
    // Only the nonce varies per attempt.
    let prefix = block.preimage_prefix();
    let attempts = AtomicU64::new(0);
    let end = limit.max_attempts().unwrap_or(u64::MAX);

    let found = (0u64..end).into_par_iter().find_any(|nonce| {
        if limit.is_cancelled() {
            return true;
        }
        attempts.fetch_add(1, Ordering::Relaxed);
        let mut bytes = Vec::with_capacity(prefix.len() + 8);
        bytes.extend_from_slice(&prefix);
        bytes.extend_from_slice(&nonce.to_le_bytes());
        meets_difficulty(&sha256_hex(&bytes), difficulty)
    });
    let attempts = attempts.into_inner();

    let Some(nonce) = found else {
        return Err(MiningError::Aborted { attempts });
    };
    block.seal_with(nonce);
    // a hit on the cancellation branch is not a solution
    if !meets_difficulty(block.hash(), difficulty) {
        return Err(MiningError::Aborted { attempts });
    }

    info!(
        "Mined block in parallel with nonce {} and hash {} after {} attempts",
        nonce,
        block.hash(),
        attempts
    );
    Ok(block)
}
