//! C4: BufferedPRNG. Each of the four DRBGs is wrapped by a buffered,
//! typed-integer sampler: a `BufferedPrng` refills a fixed-size buffer
//! from the wrapped [`Drbg`] and serves `u16`/`u32`/`u64` and
//! ranged-integer requests out of it, rejection-sampling to avoid
//! modulo bias — the same technique as the teacher's `Prf::indices`
//! rejection loop in `prf.rs`, generalized from subset-index selection
//! to arbitrary-bound integer sampling.

pub mod bcr;
pub mod csr;
pub mod dcr;
pub mod hcr;

use crate::drbg::{Drbg, DrbgVariant};
use crate::entropy::EntropyProvider;
use crate::errors::CexError;
use crate::key::KeyContainer;
use crate::parallel::ParallelOptions;
use crate::traits::UnsignedInt;

pub use bcr::Bcr;
pub use csr::Csr;
pub use dcr::Dcr;
pub use hcr::Hcr;

/// Default refill size (§4 "BufferedPRNG" Design Notes: "buffer >= 64
/// bytes, default 1024").
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
const MIN_BUFFER_SIZE: usize = 64;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PrngVariant {
    Bcr,
    Csr,
    Hcr,
    Dcr,
}

/// Shared buffered-refill machinery behind all four concrete samplers.
pub(crate) struct BufferedPrng {
    drbg: Drbg,
    buffer: Vec<u8>,
    position: usize,
    buffer_size: usize,
}

impl BufferedPrng {
    pub(crate) fn new(
        variant: DrbgVariant,
        provider: Option<Box<dyn EntropyProvider>>,
        parallel: ParallelOptions,
        buffer_size: usize,
    ) -> Self {
        let buffer_size = buffer_size.max(MIN_BUFFER_SIZE);
        Self {
            drbg: Drbg::new(variant, provider, parallel),
            buffer: vec![0u8; buffer_size],
            position: buffer_size,
            buffer_size,
        }
    }

    pub(crate) fn initialize(&mut self, kc: KeyContainer) -> Result<(), CexError> {
        self.drbg.initialize(kc)?;
        self.position = self.buffer_size;
        Ok(())
    }

    fn refill(&mut self) -> Result<(), CexError> {
        self.drbg.generate(&mut self.buffer)?;
        self.position = 0;
        Ok(())
    }

    pub(crate) fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        let mut filled = 0;
        while filled < out.len() {
            if self.position >= self.buffer_size {
                self.refill()?;
            }
            let take = (out.len() - filled).min(self.buffer_size - self.position);
            out[filled..filled + take].copy_from_slice(&self.buffer[self.position..self.position + take]);
            self.position += take;
            filled += take;
        }
        Ok(())
    }

    pub(crate) fn next_u16(&mut self) -> Result<u16, CexError> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub(crate) fn next_u32(&mut self) -> Result<u32, CexError> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub(crate) fn next_u64(&mut self) -> Result<u64, CexError> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn next_raw<T: UnsignedInt>(&mut self) -> Result<T, CexError> {
        let mut buf = vec![0u8; T::SIZE];
        self.fill(&mut buf)?;
        Ok(T::from_le_bytes(&buf))
    }

    /// Unbiased sample from `[0, bound)`. Draws full-width values and
    /// discards the top partial bucket that would bias `value % bound`,
    /// then retries — the rejection-sampling pattern the teacher's
    /// `Prf::indices` uses for bias-free subset selection.
    pub(crate) fn next_in_range<T: UnsignedInt>(&mut self, bound: T) -> Result<T, CexError> {
        if bound == T::ZERO {
            return Err(CexError::InvalidSize);
        }
        let threshold = T::MAX.wrapping_sub(T::MAX % bound);
        loop {
            let value = self.next_raw::<T>()?;
            if value < threshold {
                return Ok(value % bound);
            }
        }
    }

    /// Unbiased sample from `[min, max]` inclusive, via
    /// `next_in_range(max - min + 1) + min` (§4.4:
    /// `next_in_range_u32(min,max)`).
    pub(crate) fn next_in_range_bounds<T: UnsignedInt>(&mut self, min: T, max: T) -> Result<T, CexError> {
        if min > max {
            return Err(CexError::InvalidSize);
        }
        let span = max.wrapping_sub(min).wrapping_add(T::ONE);
        if span == T::ZERO {
            // max - min + 1 wrapped to zero only when the whole domain is
            // requested (min = T::ZERO, max = T::MAX); any raw sample qualifies.
            return self.next_raw::<T>();
        }
        let offset = self.next_in_range(span)?;
        Ok(min.wrapping_add(offset))
    }

    pub(crate) fn reset(&mut self) {
        use zeroize::Zeroize;
        self.buffer.zeroize();
        self.position = self.buffer_size;
    }
}

impl Drop for BufferedPrng {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.buffer.zeroize();
    }
}

/// A tagged-enum dispatch over the four buffered samplers, mirroring
/// [`crate::drbg::Drbg`]'s dispatch over the four generators.
pub enum Prng {
    Bcr(Bcr),
    Csr(Csr),
    Hcr(Hcr),
    Dcr(Dcr),
}

impl Prng {
    pub fn new(variant: PrngVariant, provider: Option<Box<dyn EntropyProvider>>, parallel: ParallelOptions) -> Self {
        match variant {
            PrngVariant::Bcr => Prng::Bcr(Bcr::new(provider, parallel)),
            PrngVariant::Csr => Prng::Csr(Csr::new(provider, parallel)),
            PrngVariant::Hcr => Prng::Hcr(Hcr::new(provider)),
            PrngVariant::Dcr => Prng::Dcr(Dcr::new(provider)),
        }
    }

    fn inner(&mut self) -> &mut BufferedPrng {
        match self {
            Prng::Bcr(p) => &mut p.inner,
            Prng::Csr(p) => &mut p.inner,
            Prng::Hcr(p) => &mut p.inner,
            Prng::Dcr(p) => &mut p.inner,
        }
    }

    pub fn initialize(&mut self, kc: KeyContainer) -> Result<(), CexError> {
        self.inner().initialize(kc)
    }

    pub fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        self.inner().fill(out)
    }

    pub fn next_u16(&mut self) -> Result<u16, CexError> {
        self.inner().next_u16()
    }

    pub fn next_u32(&mut self) -> Result<u32, CexError> {
        self.inner().next_u32()
    }

    pub fn next_u64(&mut self) -> Result<u64, CexError> {
        self.inner().next_u64()
    }

    pub fn next_in_range_u32(&mut self, bound: u32) -> Result<u32, CexError> {
        self.inner().next_in_range(bound)
    }

    pub fn next_in_range_u64(&mut self, bound: u64) -> Result<u64, CexError> {
        self.inner().next_in_range(bound)
    }

    pub fn next_in_range_u32_bounds(&mut self, min: u32, max: u32) -> Result<u32, CexError> {
        self.inner().next_in_range_bounds(min, max)
    }

    pub fn next_in_range_u64_bounds(&mut self, min: u64, max: u64) -> Result<u64, CexError> {
        self.inner().next_in_range_bounds(min, max)
    }

    /// `new` followed by `initialize(KeyContainer::new(seed))` in one
    /// call (§6: `Prng::new(variant, …)` / the DRBG `new_seeded` shape
    /// carried up to the buffered sampler).
    pub fn new_seeded(
        variant: PrngVariant,
        seed: Vec<u8>,
        provider: Option<Box<dyn EntropyProvider>>,
        parallel: ParallelOptions,
    ) -> Result<Self, CexError> {
        let mut prng = Self::new(variant, provider, parallel);
        prng.initialize(KeyContainer::new(seed))?;
        Ok(prng)
    }

    pub fn reset(&mut self) {
        self.inner().reset()
    }

    pub fn variant(&self) -> PrngVariant {
        match self {
            Prng::Bcr(_) => PrngVariant::Bcr,
            Prng::Csr(_) => PrngVariant::Csr,
            Prng::Hcr(_) => PrngVariant::Hcr,
            Prng::Dcr(_) => PrngVariant::Dcr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyContainer;

    #[test]
    fn rejection_sampling_stays_in_bounds() {
        let mut prng = Prng::new(PrngVariant::Hcr, None, ParallelOptions::sequential());
        prng.initialize(KeyContainer::new(vec![7u8; 32])).unwrap();
        for _ in 0..256 {
            let v = prng.next_in_range_u32(37).unwrap();
            assert!(v < 37);
        }
    }

    #[test]
    fn ranged_bounds_sampling_stays_within_closed_interval() {
        let mut prng = Prng::new(PrngVariant::Hcr, None, ParallelOptions::sequential());
        prng.initialize(KeyContainer::new(vec![7u8; 32])).unwrap();
        for _ in 0..256 {
            let v = prng.next_in_range_u32_bounds(10, 20).unwrap();
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn new_seeded_initializes_in_one_call() {
        let mut prng = Prng::new_seeded(PrngVariant::Hcr, vec![9u8; 32], None, ParallelOptions::sequential()).unwrap();
        let mut out = vec![0u8; 32];
        prng.fill(&mut out).unwrap();
        assert!(out.iter().any(|&b| b != 0));
    }

    #[test]
    fn buffer_refill_is_transparent_to_caller() {
        let mut prng = Prng::new(PrngVariant::Hcr, None, ParallelOptions::sequential());
        prng.initialize(KeyContainer::new(vec![7u8; 32])).unwrap();
        let mut out = vec![0u8; DEFAULT_BUFFER_SIZE * 3 + 17];
        prng.fill(&mut out).unwrap();
        assert!(out.iter().any(|&b| b != 0));
    }
}
