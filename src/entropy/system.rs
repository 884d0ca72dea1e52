//! OS CSPRNG entropy source, via the `getrandom` crate — already a
//! dependency across the pack's RustCrypto-family repos
//! (`examples/RustCrypto-signatures/*/Cargo.toml`).

use super::{EntropyProvider, ProviderKind};
use crate::errors::CexError;

#[derive(Default)]
pub struct SystemCsp;

impl SystemCsp {
    pub fn new() -> Self {
        Self
    }
}

impl EntropyProvider for SystemCsp {
    fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        getrandom::getrandom(out).map_err(|_| CexError::EntropyFailure)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "SystemCsp"
    }

    fn enumeral(&self) -> ProviderKind {
        ProviderKind::Csp
    }
}
