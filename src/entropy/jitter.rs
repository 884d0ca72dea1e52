//! Timing-jitter entropy collector, grounded on the `JitterEntropy`
//! pattern in `examples/other_examples/...secure_rng.rs.rs`: nanosecond
//! timing noise from small CPU bursts, whitened through SHA-512.

use super::{EntropyProvider, ProviderKind};
use crate::errors::CexError;
use sha2::{Digest, Sha512};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub struct Jitter {
    last: u64,
}

impl Jitter {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    fn collect_raw(&mut self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(256 * 8);
        for _ in 0..256 {
            let start = Instant::now();
            let mut x = 1u64;
            for i in 1..100u64 {
                x = x.wrapping_mul(i).wrapping_add(i);
                std::hint::black_box(&x);
            }
            let elapsed = start.elapsed().as_nanos() as u64;
            let sys_time = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            let diff = elapsed ^ self.last ^ sys_time;
            self.last = elapsed;
            raw.extend_from_slice(&diff.to_le_bytes());
        }
        raw
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyProvider for Jitter {
    fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        let mut counter = 0u64;
        let mut offset = 0;
        while offset < out.len() {
            let raw = self.collect_raw();
            let mut hasher = Sha512::new();
            hasher.update(&raw);
            hasher.update(counter.to_le_bytes());
            let block = hasher.finalize();
            let take = (out.len() - offset).min(block.len());
            out[offset..offset + take].copy_from_slice(&block[..take]);
            offset += take;
            counter = counter.wrapping_add(1);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.last = 0;
    }

    fn name(&self) -> &'static str {
        "Jitter"
    }

    fn enumeral(&self) -> ProviderKind {
        ProviderKind::Cjp
    }
}
