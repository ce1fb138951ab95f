//! Thread-safe handle over a [`Blockchain`].
//!
//! Appends are serialized by a writer mutex held from reading the tip until the
//! sealed block is published, so every tip gets exactly one successor. The
//! nonce search runs outside the chain lock; readers see the chain as of the
//! last completed append.

use crate::{
    chain::seal, pow::MiningLimit, Block, Blockchain, LedgerError, MiningError, Transfer,
    ValidationError,
};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct SharedLedger {
    chain: Arc<RwLock<Blockchain>>,
    writer: Arc<Mutex<()>>,
}

impl SharedLedger {
    pub fn new(chain: Blockchain) -> Self {
        Self {
            chain: Arc::new(RwLock::new(chain)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn create(difficulty: u32) -> Self {
        Self::new(Blockchain::create(difficulty))
    }

    fn read(&self) -> RwLockReadGuard<'_, Blockchain> {
        // a panic can only interrupt a Vec::push, which leaves the chain intact
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Blockchain> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mine and append, blocking until a nonce is found. Returns the sealed block.
    pub fn append(&self, from: impl Into<String>, to: impl Into<String>, amount: f64) -> Block {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut block, difficulty) = {
            let chain = self.read();
            (chain.candidate(Transfer::new(from, to, amount)), chain.difficulty())
        };
        block.mine(difficulty);
        self.write().push_sealed(block).clone()
    }

    /// Bounded append using the ledger's search strategy. On abort nothing is published.
    pub fn try_append(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
        limit: &MiningLimit,
    ) -> Result<Block, MiningError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let (block, config) = {
            let chain = self.read();
            (chain.candidate(Transfer::new(from, to, amount)), chain.config().clone())
        };
        let block = seal(block, &config, limit).inspect_err(|e| debug!("append aborted: {e}"))?;
        Ok(self.write().push_sealed(block).clone())
    }

    pub fn is_valid(&self) -> bool {
        self.read().is_valid()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.read().validate()
    }

    pub fn get_block_data(&self, index: isize) -> Result<Transfer, LedgerError> {
        self.read().get_block_data(index)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.read().difficulty()
    }

    /// A consistent copy of the chain as of the last completed append.
    pub fn snapshot(&self) -> Blockchain {
        self.read().clone()
    }
}

impl From<Blockchain> for SharedLedger {
    fn from(chain: Blockchain) -> Self {
        Self::new(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinerConfig;
    use std::thread;

    #[test]
    fn shared_append_and_lookup() {
        let ledger = SharedLedger::create(2);
        let block = ledger.append("Alice", "Bob", 0.5);
        assert_eq!(block.data(), &Transfer::new("Alice", "Bob", 0.5));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get_block_data(1).unwrap(), Transfer::new("Alice", "Bob", 0.5));
        assert!(ledger.is_valid());
    }

    #[test]
    fn concurrent_appends_form_a_single_chain() {
        let ledger = SharedLedger::create(1);
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for j in 0..5u64 {
                        ledger.append(format!("user{i}"), "pool", (i * 10 + j) as f64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let chain = ledger.snapshot();
        assert_eq!(chain.len(), 41);
        assert!(chain.validate().is_ok());
        // no two blocks extend the same tip
        let mut prevs: Vec<_> = chain.blocks()[1..].iter().map(|b| b.previous_hash()).collect();
        prevs.sort_unstable();
        prevs.dedup();
        assert_eq!(prevs.len(), 40);
    }

    #[test]
    fn readers_run_during_append() {
        let ledger = SharedLedger::create(1);
        ledger.append("a", "b", 1.0);
        let writer = {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for i in 0..20u32 {
                    ledger.append("a", "b", f64::from(i));
                }
            })
        };
        for _ in 0..50 {
            let snapshot = ledger.snapshot();
            assert!(snapshot.is_valid());
            assert!(ledger.get_block_data(1).is_ok());
        }
        writer.join().unwrap();
        assert_eq!(ledger.len(), 22);
    }

    #[test]
    fn aborted_append_publishes_nothing() {
        let ledger = SharedLedger::new(Blockchain::with_config(MinerConfig {
            difficulty: 64,
            max_attempts: None,
            parallel: true,
        }));
        let err = ledger.try_append("a", "b", 1.0, &MiningLimit::attempts(256)).unwrap_err();
        assert_eq!(err, MiningError::Aborted { attempts: 256 });
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_valid());
    }
}
