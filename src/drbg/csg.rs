//! CSG: cSHAKE Counter DRBG (§4.2.2).
//!
//! Absorbs `key || nonce` into a cSHAKE sponge at `initialize` (function
//! name `"CSG"`, customization = `info`), then squeezes the keystream
//! through [`XofAdapter`]'s persistent reader so a run of `generate`
//! calls draws from one continuous stream — the "extension
//! equivalence" testable property (§8): `generate(v, k, n)` is a prefix
//! of `generate(v, k, n')` for `n <= n'`, absent an intervening reseed.
//!
//! `sha3`'s `XofReader` is squeeze-once-consumed, so unlike BCG (whose
//! counter can just be re-derived), a CSG reseed must rebuild the
//! sponge from scratch: the new sponge absorbs the old key, fresh
//! entropy, and the reseed counter, and customization carries the
//! generator's `info` forward across the rebuild. See `DESIGN.md`.

use super::{DrbgAccounting, DrbgEngine, DrbgVariant, MAX_RESEED};
use crate::cshake::cshake;
use crate::entropy::EntropyProvider;
use crate::errors::CexError;
use crate::key::{KeyContainer, KeySize, LegalKeySizes};
use crate::parallel::{parallel_for_chunks, ParallelOptions};
use crate::permutation::xof::{XofAdapter, XofStrength};

const DEF_RESEED: usize = 100 * 1024 * 1024;
const MAX_REQUEST: usize = 100 * 1024 * 1024;
const MAX_OUTPUT: u64 = 10 * 1024 * 1024 * 1024;
const GEN_STRENGTH: usize = 256;

/// cSHAKE-256 sponge rate in bytes, used as the fork-join "natural
/// block size" for per-lane chunk sizing (CSG is fixed to Shake256).
const LANE_BLOCK: usize = 136;

pub struct Csg {
    acc: DrbgAccounting,
    provider: Option<Box<dyn EntropyProvider>>,
    parallel: ParallelOptions,
    xof: XofAdapter,
    key: Vec<u8>,
    nonce: Vec<u8>,
    customization: Vec<u8>,
    reseed_counter: u64,
}

impl Csg {
    pub fn new(provider: Option<Box<dyn EntropyProvider>>, parallel: ParallelOptions) -> Self {
        Self {
            acc: DrbgAccounting::new(DEF_RESEED, MAX_OUTPUT, MAX_REQUEST),
            provider,
            parallel,
            xof: XofAdapter::new(XofStrength::Shake256),
            key: Vec::new(),
            nonce: Vec::new(),
            customization: Vec::new(),
            reseed_counter: 0,
        }
    }

    fn legal_key_sizes_static() -> LegalKeySizes {
        LegalKeySizes(vec![
            KeySize::new(32, Some(16), None),
            KeySize::new(64, Some(16), None),
            KeySize::new(128, Some(16), None),
        ])
    }

    /// Rebuilds the sponge from `key || nonce`, absorbing the current
    /// reseed counter as an 8-byte big-endian suffix so a reseed (or
    /// the initial seeding) never repeats a prior sponge state even if
    /// the caller supplies the same seed material twice.
    fn seed_sponge(&mut self, seed: &[u8], nonce: &[u8]) {
        self.xof.initialize(b"CSG", &self.customization);
        self.xof.absorb(seed);
        self.xof.absorb(nonce);
        self.xof.absorb(&self.reseed_counter.to_be_bytes());
    }

    /// Expands `key` into an independent per-lane sub-key via
    /// cSHAKE-256, domain-separated by lane index (§4.2.2: "maintain P
    /// independent sponge states seeded by cSHAKE-expanding key into P
    /// sub-keys, each re-absorbed with its lane index").
    fn lane_subkey(key: &[u8], lane: usize) -> Vec<u8> {
        let mut custom = b"CSG-lane".to_vec();
        custom.extend_from_slice(&(lane as u32).to_be_bytes());
        cshake(256, b"", &custom, key, key.len())
    }

    /// Parallel variant: splits `out` into disjoint, contiguous
    /// per-lane chunks (the same fork-join shape BCG and
    /// `AuthenticatedStream` use, §5), each filled by its own
    /// lane-keyed sponge rather than one continuous stream — output
    /// necessarily differs from the sequential path, which is
    /// documented and expected (§5: "changing `parallel_max_degree`
    /// ... can alter output ... not a bug").
    fn generate_parallel(&self, out: &mut [u8], degree: usize) {
        let blocks_per_lane = out.len().div_ceil(LANE_BLOCK).div_ceil(degree).max(1);
        let chunk_bytes = blocks_per_lane * LANE_BLOCK;
        let key = self.key.clone();
        let nonce = self.nonce.clone();
        let customization = self.customization.clone();
        let reseed_counter = self.reseed_counter;

        parallel_for_chunks(out, degree, chunk_bytes, |lane, chunk| {
            let subkey = Self::lane_subkey(&key, lane);
            let mut lane_xof = XofAdapter::new(XofStrength::Shake256);
            lane_xof.initialize(b"CSG", &customization);
            lane_xof.absorb(&subkey);
            lane_xof.absorb(&nonce);
            lane_xof.absorb(&reseed_counter.to_be_bytes());
            lane_xof.absorb(&(lane as u32).to_be_bytes());
            lane_xof.squeeze(chunk);
        });
    }

    /// Squeezes exactly `out.len()` bytes from the live sponge (or its
    /// parallel-lane variant). Does not touch reseed accounting; see
    /// `generate`'s slicing loop.
    fn fill(&mut self, out: &mut [u8]) {
        if self.parallel.should_split(out.len()) {
            self.generate_parallel(out, self.parallel.max_degree);
        } else {
            self.xof.squeeze(out);
        }
    }

    /// Rebuilds the sponge from the running key, fresh
    /// `provider`-supplied entropy, and the advanced reseed counter
    /// (§4.2.2 "Reseed").
    fn reseed(&mut self) -> Result<(), CexError> {
        if let Some(provider) = self.provider.as_mut() {
            let mut seed = vec![0u8; self.key.len()];
            provider.fill(&mut seed)?;
            self.reseed_counter += 1;
            let mut ikm = self.key.clone();
            ikm.extend_from_slice(&seed);
            self.key = ikm;
            self.seed_sponge(&self.key.clone(), &[]);
            self.acc.record_reseed()?;
        }
        Ok(())
    }
}

impl DrbgEngine for Csg {
    fn initialize(&mut self, kc: KeyContainer) -> Result<(), CexError> {
        let sizes = Self::legal_key_sizes_static();
        sizes.validate(&kc)?;

        self.key = kc.key.to_vec();
        self.customization = kc.info_slice().to_vec();
        self.reseed_counter = 0;
        self.nonce = kc.nonce_slice().to_vec();
        self.seed_sponge(&self.key.clone(), &self.nonce.clone());

        self.acc = DrbgAccounting::new(self.acc.reseed_threshold, MAX_OUTPUT, MAX_REQUEST);
        self.acc.initialized = true;
        Ok(())
    }

    /// Squeezes `out` in slices no longer than the distance remaining
    /// to the next reseed threshold, rebuilding the sponge between
    /// slices so a single long request reseeds exactly as many times
    /// as crossing `reseed_threshold` repeatedly would (§8 property 5;
    /// scenario S6).
    fn generate(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        self.acc.check_generate(out.len())?;

        let mut remaining = &mut out[..];
        while !remaining.is_empty() {
            let to_threshold = (self.acc.reseed_threshold as u64).saturating_sub(self.acc.reseed_counter);
            let take = if to_threshold == 0 {
                remaining.len()
            } else {
                (to_threshold as usize).min(remaining.len())
            };
            let (chunk, rest) = remaining.split_at_mut(take);
            self.fill(chunk);
            remaining = rest;

            if self.acc.record_output(chunk.len()) {
                self.reseed()?;
            }
        }
        Ok(())
    }

    fn update(&mut self, key: &[u8]) -> Result<(), CexError> {
        if key.is_empty() {
            return Err(CexError::InvalidKey);
        }
        let mut ikm = self.key.clone();
        ikm.extend_from_slice(key);
        self.key = ikm;
        self.reseed_counter += 1;
        self.acc.reseed_counter = 0;
        self.seed_sponge(&self.key.clone(), &[]);
        Ok(())
    }

    fn reseed_threshold(&self) -> usize {
        self.acc.reseed_threshold
    }

    fn set_reseed_threshold(&mut self, threshold: usize) {
        self.acc.reseed_threshold = threshold;
    }

    fn is_initialized(&self) -> bool {
        self.acc.initialized && !self.acc.destroyed
    }

    fn security_strength(&self) -> usize {
        GEN_STRENGTH
    }

    fn legal_key_sizes(&self) -> LegalKeySizes {
        Self::legal_key_sizes_static()
    }

    fn max_output_size(&self) -> u64 {
        MAX_OUTPUT
    }

    fn max_request_size(&self) -> usize {
        MAX_REQUEST
    }

    fn max_reseed_count(&self) -> usize {
        MAX_RESEED
    }

    fn reseed_requests(&self) -> usize {
        self.acc.reseed_requests
    }

    fn name(&self) -> &'static str {
        "CSG"
    }

    fn enumeral(&self) -> DrbgVariant {
        DrbgVariant::Csg
    }
}

impl Drop for Csg {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.key.zeroize();
        self.nonce.zeroize();
        self.acc.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SystemCsp;

    fn init(len: usize) -> Csg {
        let mut csg = Csg::new(Some(Box::new(SystemCsp)), ParallelOptions::sequential());
        let kc = KeyContainer::new(vec![0x11u8; len]).with_nonce(vec![0x22u8; 16]);
        csg.initialize(kc).unwrap();
        csg
    }

    #[test]
    fn extension_equivalence() {
        let mut short = init(32);
        let mut long = init(32);

        let mut out_short = vec![0u8; 16];
        short.generate(&mut out_short).unwrap();

        let mut out_long = vec![0u8; 48];
        long.generate(&mut out_long).unwrap();

        assert_eq!(&out_long[..16], out_short.as_slice());
    }

    #[test]
    fn sequential_calls_continue_the_stream() {
        let mut csg = init(32);
        let mut a = vec![0u8; 16];
        let mut b = vec![0u8; 16];
        csg.generate(&mut a).unwrap();
        csg.generate(&mut b).unwrap();
        assert_ne!(a, b);

        let mut reference = init(32);
        let mut both = vec![0u8; 32];
        reference.generate(&mut both).unwrap();
        assert_eq!(&both[..16], a.as_slice());
        assert_eq!(&both[16..], b.as_slice());
    }

    #[test]
    fn rejects_bad_key_length() {
        let mut csg = Csg::new(None, ParallelOptions::sequential());
        let kc = KeyContainer::new(vec![0u8; 7]);
        assert_eq!(csg.initialize(kc), Err(CexError::InvalidKey));
    }

    fn init_parallel(len: usize, degree: usize) -> Csg {
        let parallel = ParallelOptions {
            parallel: true,
            max_degree: degree,
            min_size: 64,
        };
        let mut csg = Csg::new(None, parallel);
        let kc = KeyContainer::new(vec![0x11u8; len]).with_nonce(vec![0x22u8; 16]);
        csg.initialize(kc).unwrap();
        csg
    }

    // Universal invariant 7: a fixed lane count is internally deterministic,
    // and differs from both the sequential reference and a different lane
    // count (documented, not a bug — §5).
    #[test]
    fn parallel_generation_is_deterministic_per_lane_count() {
        let mut a = init_parallel(32, 4);
        let mut b = init_parallel(32, 4);
        let mut out_a = vec![0u8; 4096];
        let mut out_b = vec![0u8; 4096];
        a.generate(&mut out_a).unwrap();
        b.generate(&mut out_b).unwrap();
        assert_eq!(out_a, out_b);
        assert!(out_a.iter().any(|&b| b != 0));

        let mut sequential = init(32);
        let mut out_seq = vec![0u8; 4096];
        sequential.generate(&mut out_seq).unwrap();
        assert_ne!(out_a, out_seq);

        let mut two_lane = init_parallel(32, 2);
        let mut out_two = vec![0u8; 4096];
        two_lane.generate(&mut out_two).unwrap();
        assert_ne!(out_a, out_two);
    }
}
