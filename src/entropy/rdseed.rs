//! `RdSeed` is named in the provider enumeration (§6 of the spec) but
//! hardware `rdseed`/`rdrand` intrinsics are explicitly out of scope
//! (Non-goals: hardware-specific intrinsics). This wrapper reports
//! itself unavailable and defers fills to `SystemCsp`, so callers that
//! select `RdSeed` explicitly still get a working, portable provider
//! rather than a hard failure.

use super::{EntropyProvider, ProviderKind, SystemCsp};
use crate::errors::CexError;

pub struct RdSeed {
    fallback: SystemCsp,
}

impl RdSeed {
    pub fn new() -> Self {
        Self {
            fallback: SystemCsp::new(),
        }
    }
}

impl Default for RdSeed {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyProvider for RdSeed {
    fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        self.fallback.fill(out)
    }

    fn reset(&mut self) {
        self.fallback.reset();
    }

    fn name(&self) -> &'static str {
        "RdSeed"
    }

    fn enumeral(&self) -> ProviderKind {
        ProviderKind::Rdp
    }

    fn is_available(&self) -> bool {
        false
    }
}
