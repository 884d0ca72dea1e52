//! Combined entropy source, grounded on `SecureRNG::new`'s
//! primary/secondary/tertiary fallback in
//! `examples/other_examples/...secure_rng.rs.rs`: tries the OS CSPRNG
//! first, falls back to jitter and the folding collector, and XORs
//! together whichever sources are available so a single source's
//! weakness cannot dominate the output.

use super::{EntropyCollector, EntropyProvider, Jitter, ProviderKind, SystemCsp};
use crate::errors::CexError;

pub struct Auto {
    system: SystemCsp,
    jitter: Jitter,
    collector: EntropyCollector,
}

impl Auto {
    pub fn new() -> Self {
        Self {
            system: SystemCsp::new(),
            jitter: Jitter::new(),
            collector: EntropyCollector::new(),
        }
    }
}

impl Default for Auto {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyProvider for Auto {
    fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        let mut combined = vec![0u8; out.len()];
        let mut any_ok = false;

        if self.system.is_available() {
            if self.system.fill(&mut combined).is_ok() {
                any_ok = true;
            }
        }

        let mut scratch = vec![0u8; out.len()];
        if self.jitter.fill(&mut scratch).is_ok() {
            for (c, s) in combined.iter_mut().zip(scratch.iter()) {
                *c ^= *s;
            }
            any_ok = true;
        }

        if self.collector.fill(&mut scratch).is_ok() {
            for (c, s) in combined.iter_mut().zip(scratch.iter()) {
                *c ^= *s;
            }
            any_ok = true;
        }

        if !any_ok {
            return Err(CexError::EntropyFailure);
        }
        out.copy_from_slice(&combined);
        Ok(())
    }

    fn reset(&mut self) {
        self.system.reset();
        self.jitter.reset();
        self.collector.reset();
    }

    fn name(&self) -> &'static str {
        "Auto"
    }

    fn enumeral(&self) -> ProviderKind {
        ProviderKind::Auto
    }
}
