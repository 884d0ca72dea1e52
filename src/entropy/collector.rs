//! XOR-folding entropy pool, grounded on `EntropyPool` in
//! `examples/other_examples/...secure_rng.rs.rs`: entropy is mixed in
//! by XOR at a rolling position, extraction hashes the whole pool plus
//! a timestamp and folds the output back in as whitening feedback.

use super::{EntropyProvider, ProviderKind};
use crate::errors::CexError;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

const POOL_SIZE: usize = 512;

pub struct EntropyCollector {
    pool: Vec<u8>,
    position: usize,
}

impl EntropyCollector {
    pub fn new() -> Self {
        let mut pool = vec![0u8; POOL_SIZE];
        // Seed the pool with process-local, non-secret jitter so a
        // freshly-constructed collector isn't a block of zeros.
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        for (i, byte) in pool.iter_mut().enumerate() {
            *byte = (seed.wrapping_add(i as u128) & 0xff) as u8;
        }
        Self { pool, position: 0 }
    }

    pub fn add_entropy(&mut self, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let idx = (self.position + i) % self.pool.len();
            self.pool[idx] ^= byte;
        }
        self.position = (self.position + data.len()) % self.pool.len();
    }
}

impl Default for EntropyCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyProvider for EntropyCollector {
    fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        let mut hasher = Sha256::new();
        hasher.update(&self.pool);
        hasher.update(self.position.to_le_bytes());
        let time_bytes = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
            .to_le_bytes();
        hasher.update(time_bytes);
        let seed = hasher.finalize();

        let mut offset = 0;
        let mut counter = 0u64;
        while offset < out.len() {
            let mut block_hasher = Sha256::new();
            block_hasher.update(seed);
            block_hasher.update(counter.to_le_bytes());
            let block = block_hasher.finalize();
            let take = (out.len() - offset).min(block.len());
            out[offset..offset + take].copy_from_slice(&block[..take]);
            offset += take;
            counter = counter.wrapping_add(1);
        }

        // Fold output back into the pool as whitening feedback.
        let mut fold_hasher = Sha256::new();
        fold_hasher.update(&out[..]);
        let fold = fold_hasher.finalize();
        for (i, &b) in fold.iter().enumerate() {
            let idx = (self.position + i) % self.pool.len();
            self.pool[idx] ^= b;
        }
        self.position = (self.position + out.len()) % self.pool.len();
        Ok(())
    }

    fn reset(&mut self) {
        self.pool.fill(0);
        self.position = 0;
    }

    fn name(&self) -> &'static str {
        "EntropyCollector"
    }

    fn enumeral(&self) -> ProviderKind {
        ProviderKind::Ecp
    }
}
