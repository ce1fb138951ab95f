use thiserror::Error;

/// Failure of a ledger lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("index out of range: {index} (chain length {len})")]
    IndexOutOfRange { index: isize, len: usize },
}

/// Returned by the bounded mining paths when the search gives up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    #[error("mining aborted after {attempts} attempts")]
    Aborted { attempts: u64 },
}

/// First defect found while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {index}: stored hash {stored} does not match computed {computed}")]
    DigestMismatch {
        index: usize,
        stored: String,
        computed: String,
    },
    #[error("block {index}: previous hash {found} does not link to {expected}")]
    BrokenLink {
        index: usize,
        expected: String,
        found: String,
    },
}

impl ValidationError {
    pub fn index(&self) -> usize {
        match self {
            ValidationError::DigestMismatch { index, .. }
            | ValidationError::BrokenLink { index, .. } => *index,
        }
    }
}
