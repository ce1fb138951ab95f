use crate::{
    config::MinerConfig,
    mine::mine_block_parallel,
    pow::MiningLimit,
    Block, LedgerError, MiningError, Transfer, ValidationError,
};
use tracing::{info, warn};

/// An in-memory, append-only chain of mined blocks.
///
/// `blocks()[0]` is always the genesis block. Blocks only enter through the
/// append methods and are never modified or removed afterwards.
#[derive(Clone, Debug)]
pub struct Blockchain {
    genesis: Block,
    chain: Vec<Block>,
    config: MinerConfig,
}

impl Blockchain {
    /// A ledger holding only the genesis block. Nothing is mined.
    pub fn create(difficulty: u32) -> Self {
        Self::with_config(MinerConfig::with_difficulty(difficulty))
    }

    pub fn with_config(config: MinerConfig) -> Self {
        let genesis = Block::genesis();
        info!(difficulty = config.difficulty, "created ledger");
        Self {
            chain: vec![genesis.clone()],
            genesis,
            config,
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    pub fn genesis(&self) -> &Block {
        &self.genesis
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Never true: the genesis block is always present.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn last(&self) -> &Block {
        // chain always holds at least the genesis block
        self.chain.last().unwrap_or(&self.genesis)
    }

    /// Return (height, tip_hash). Height 0 is the genesis block.
    pub fn tip(&self) -> (u64, &str) {
        ((self.chain.len() - 1) as u64, self.last().hash())
    }

    pub fn get_block(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    /// The transaction record stored at `index`.
    pub fn get_block_data(&self, index: isize) -> Result<Transfer, LedgerError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.chain.get(i))
            .map(|block| block.data().clone())
            .ok_or(LedgerError::IndexOutOfRange {
                index,
                len: self.chain.len(),
            })
    }

    /// An unsealed block carrying `data`, linked to the current tip.
    pub fn candidate(&self, data: Transfer) -> Block {
        Block::new(data, self.last().hash())
    }

    /// Mine a block for the transfer at the ledger's difficulty and append it.
    /// Blocks the caller until a nonce is found.
    pub fn append(&mut self, from: impl Into<String>, to: impl Into<String>, amount: f64) {
        let mut block = self.candidate(Transfer::new(from, to, amount));
        block.mine(self.difficulty());
        self.push_sealed(block);
    }

    /// Bounded [`Blockchain::append`]. On abort the chain is left unchanged.
    pub fn try_append(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
        limit: &MiningLimit,
    ) -> Result<&Block, MiningError> {
        let mut block = self.candidate(Transfer::new(from, to, amount));
        block.mine_with(self.difficulty(), limit)?;
        Ok(self.push_sealed(block))
    }

    /// Append using the attempt cap and search strategy from the ledger's [`MinerConfig`].
    pub fn append_configured(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
    ) -> Result<&Block, MiningError> {
        let block = self.candidate(Transfer::new(from, to, amount));
        let block = seal(block, &self.config, &self.config.limit())?;
        Ok(self.push_sealed(block))
    }

    /// Publish a block already sealed against the current tip.
    pub(crate) fn push_sealed(&mut self, block: Block) -> &Block {
        debug_assert_eq!(block.previous_hash(), self.last().hash());
        info!(
            "Mined block {} with nonce {} and hash {}",
            self.chain.len(),
            block.nonce(),
            block.hash()
        );
        self.chain.push(block);
        self.last()
    }

    /// Walk the chain from index 1, recomputing each digest and checking each link.
    /// The genesis block is the trusted root and is not itself checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (i, pair) in self.chain.windows(2).enumerate() {
            let (prev, cur) = (&pair[0], &pair[1]);
            let index = i + 1;
            let computed = cur.calculate_digest();
            if cur.hash() != computed {
                return Err(ValidationError::DigestMismatch {
                    index,
                    stored: cur.hash().to_string(),
                    computed,
                });
            }
            if cur.previous_hash() != prev.hash() {
                return Err(ValidationError::BrokenLink {
                    index,
                    expected: prev.hash().to_string(),
                    found: cur.previous_hash().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(index = e.index(), "chain invalid: {e}");
                false
            }
        }
    }
}

/// Seal a candidate according to `config`, sequentially or on the rayon pool.
pub(crate) fn seal(
    mut block: Block,
    config: &MinerConfig,
    limit: &MiningLimit,
) -> Result<Block, MiningError> {
    if config.parallel {
        mine_block_parallel(block, config.difficulty, limit)
    } else {
        block.mine_with(config.difficulty, limit)?;
        Ok(block)
    }
}
