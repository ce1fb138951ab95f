use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod mine;
pub mod shared;

pub use block::Block;
pub use chain::Blockchain;
pub use config::MinerConfig;
pub use error::{LedgerError, MiningError, ValidationError};
pub use pow::{CancelToken, MiningLimit};
pub use shared::SharedLedger;

/// The transaction record carried by a block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl Transfer {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.amount)
    }
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub mod pow {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    /// Number of leading `'0'` characters in a hex digest.
    pub fn count_leading_zero_digits(hash: &str) -> usize {
        hash.bytes().take_while(|b| *b == b'0').count()
    }

    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        count_leading_zero_digits(hash) >= difficulty as usize
    }

    /// Shared flag that asks an in-flight search to stop.
    #[derive(Clone, Debug, Default)]
    pub struct CancelToken(Arc<AtomicBool>);

    impl CancelToken {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cancel(&self) {
            self.0.store(true, Ordering::Relaxed);
        }

        pub fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::Relaxed)
        }
    }

    /// External bound on a nonce search. The default is unbounded.
    #[derive(Clone, Debug, Default)]
    pub struct MiningLimit {
        max_attempts: Option<u64>,
        cancel: Option<CancelToken>,
    }

    impl MiningLimit {
        pub fn unbounded() -> Self {
            Self::default()
        }

        pub fn attempts(max_attempts: u64) -> Self {
            Self::default().with_max_attempts(max_attempts)
        }

        pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
            self.max_attempts = Some(max_attempts);
            self
        }

        pub fn with_cancel(mut self, token: CancelToken) -> Self {
            self.cancel = Some(token);
            self
        }

        pub fn max_attempts(&self) -> Option<u64> {
            self.max_attempts
        }

        pub fn is_unbounded(&self) -> bool {
            self.max_attempts.is_none() && self.cancel.is_none()
        }

        pub(crate) fn is_cancelled(&self) -> bool {
            self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
        }

        /// True once `attempts` hashes have been spent or the token fired.
        pub(crate) fn exhausted(&self, attempts: u64) -> bool {
            self.max_attempts.is_some_and(|max| attempts >= max) || self.is_cancelled()
        }
    }
}
