//! HCG: HMAC Counter DRBG (§4.2.3).
//!
//! State is `(K, V, Sc, Kc)`: `K` the HMAC key, `V` a running
//! digest-sized chaining value, `Sc` an 8-byte state counter, `Kc` a
//! 4-byte seed counter incremented on each rekey. Each `generate` call
//! advances `Sc`, emits `HMAC_K(Sc || V || Dc)` into both `V` (chaining)
//! and the output buffer, where `Dc` is the distribution code derived
//! from `info` — generalizes the teacher's `Hmac::<D>::new_from_slice`
//! call sites in `prf.rs` into a persistent running-MAC generator.

use super::{DrbgAccounting, DrbgEngine, DrbgVariant, MAX_RESEED};
use crate::entropy::EntropyProvider;
use crate::errors::CexError;
use crate::key::{KeyContainer, KeySize, LegalKeySizes};
use crate::permutation::hash::HashChoice;
use crate::permutation::hmac_adapter::hmac_once;

const DEF_RESEED: usize = 100 * 1024 * 1024;
const MAX_REQUEST: usize = 10 * 1024 * 1024;
const MAX_OUTPUT: u64 = 10 * 1024 * 1024 * 1024;

pub struct Hcg {
    acc: DrbgAccounting,
    provider: Option<Box<dyn EntropyProvider>>,
    choice: HashChoice,
    k: Vec<u8>,
    v: Vec<u8>,
    sc: u64,
    kc: u32,
    dc: Vec<u8>,
}

impl Hcg {
    pub fn new(provider: Option<Box<dyn EntropyProvider>>) -> Self {
        Self {
            acc: DrbgAccounting::new(DEF_RESEED, MAX_OUTPUT, MAX_REQUEST),
            provider,
            choice: HashChoice::Sha512,
            k: Vec::new(),
            v: Vec::new(),
            sc: 0,
            kc: 0,
            dc: Vec::new(),
        }
    }

    fn choice_for_key_len(len: usize) -> HashChoice {
        if len <= 32 {
            HashChoice::Sha256
        } else {
            HashChoice::Sha512
        }
    }

    fn legal_key_sizes_static() -> LegalKeySizes {
        LegalKeySizes(vec![
            KeySize::new(32, Some(32), None),
            KeySize::new(64, Some(64), None),
            KeySize::new(128, Some(64), None),
        ])
    }

    /// `HMAC_K0(seed)`: seeds `K`/`V` from `key || nonce || info`, per
    /// the HMAC-DRBG update-function pattern in NIST SP800-90A §10.1.2,
    /// specialized (no separate `predictionResistance` input) since
    /// this contract has no caller-supplied additional input per call.
    fn seed(&mut self, ikm: &[u8]) {
        let digest_size = self.choice.digest_size();
        self.v = vec![0x01u8; digest_size];
        let mut k = vec![0u8; digest_size];

        let mut data = self.v.clone();
        data.push(0x00);
        data.extend_from_slice(ikm);
        k = hmac_once(self.choice, &k, &data);
        self.v = hmac_once(self.choice, &k, &self.v);

        let mut data = self.v.clone();
        data.push(0x01);
        data.extend_from_slice(ikm);
        k = hmac_once(self.choice, &k, &data);
        self.v = hmac_once(self.choice, &k, &self.v);

        self.k = k;
    }

    /// `Kc += 1`, rederives `(K, V)` from `HMAC_K(Kc || V || Dc ||
    /// provider.get(rate))` (§4.2.3 "Periodic rekey").
    fn reseed(&mut self) -> Result<(), CexError> {
        if let Some(provider) = self.provider.as_mut() {
            let mut seed_material = vec![0u8; self.choice.digest_size()];
            provider.fill(&mut seed_material)?;
            self.kc = self.kc.wrapping_add(1);
            seed_material.extend_from_slice(&self.kc.to_be_bytes());
            self.seed(&seed_material);
            self.acc.record_reseed()?;
        }
        Ok(())
    }
}

impl DrbgEngine for Hcg {
    fn initialize(&mut self, kc: KeyContainer) -> Result<(), CexError> {
        let sizes = Self::legal_key_sizes_static();
        sizes.validate(&kc)?;

        self.choice = Self::choice_for_key_len(kc.key.len());
        self.dc = kc.info_slice().to_vec();
        self.sc = 0;
        self.kc = 0;

        let mut ikm = kc.key.to_vec();
        ikm.extend_from_slice(kc.nonce_slice());
        ikm.extend_from_slice(&self.dc);
        self.seed(&ikm);

        self.acc = DrbgAccounting::new(self.acc.reseed_threshold, MAX_OUTPUT, MAX_REQUEST);
        self.acc.initialized = true;
        Ok(())
    }

    /// Emits one HMAC block (`digest_size` bytes, or fewer for the
    /// final partial block of a request) at a time, reseeding as soon
    /// as a block crosses the threshold rather than waiting for the
    /// whole request to finish, so a long request reseeds exactly as
    /// many times as crossing `reseed_threshold` repeatedly would (§8
    /// property 5; scenario S6).
    fn generate(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        self.acc.check_generate(out.len())?;

        let digest_size = self.choice.digest_size();
        let mut filled = 0;
        while filled < out.len() {
            self.sc = self.sc.wrapping_add(1);
            let mut data = self.sc.to_be_bytes().to_vec();
            data.extend_from_slice(&self.v);
            data.extend_from_slice(&self.dc);
            let block = hmac_once(self.choice, &self.k, &data);
            self.v = block.clone();

            let take = (out.len() - filled).min(digest_size);
            out[filled..filled + take].copy_from_slice(&block[..take]);
            filled += take;

            if self.acc.record_output(take) {
                self.reseed()?;
            }
        }
        Ok(())
    }

    fn update(&mut self, key: &[u8]) -> Result<(), CexError> {
        if key.is_empty() {
            return Err(CexError::InvalidKey);
        }
        self.kc = self.kc.wrapping_add(1);
        let mut ikm = key.to_vec();
        ikm.extend_from_slice(&self.kc.to_be_bytes());
        self.seed(&ikm);
        self.acc.reseed_counter = 0;
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
        self.choice.digest_size() * 4
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
        "HCG"
    }

    fn enumeral(&self) -> DrbgVariant {
        DrbgVariant::Hcg
    }
}

impl Drop for Hcg {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.k.zeroize();
        self.v.zeroize();
        self.acc.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() -> Hcg {
        let mut hcg = Hcg::new(None);
        let kc = KeyContainer::new(vec![0x5au8; 32]).with_nonce(vec![0xa5u8; 32]);
        hcg.initialize(kc).unwrap();
        hcg
    }

    #[test]
    fn stream_chunking_is_consistent() {
        let mut one_shot = init();
        let mut whole = vec![0u8; 97];
        one_shot.generate(&mut whole).unwrap();

        let mut chunked = init();
        let mut a = vec![0u8; 31];
        let mut b = vec![0u8; 40];
        let mut c = vec![0u8; 26];
        chunked.generate(&mut a).unwrap();
        chunked.generate(&mut b).unwrap();
        chunked.generate(&mut c).unwrap();

        let mut combined = Vec::new();
        combined.extend_from_slice(&a);
        combined.extend_from_slice(&b);
        combined.extend_from_slice(&c);
        assert_eq!(combined, whole);
    }

    #[test]
    fn distinct_info_gives_distinct_output() {
        let mut first = Hcg::new(None);
        first
            .initialize(KeyContainer::new(vec![1u8; 32]).with_info(vec![9u8; 4]))
            .unwrap();
        let mut second = Hcg::new(None);
        second
            .initialize(KeyContainer::new(vec![1u8; 32]).with_info(vec![8u8; 4]))
            .unwrap();

        let mut a = vec![0u8; 32];
        let mut b = vec![0u8; 32];
        first.generate(&mut a).unwrap();
        second.generate(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_bad_key_length() {
        let mut hcg = Hcg::new(None);
        let kc = KeyContainer::new(vec![0u8; 5]);
        assert_eq!(hcg.initialize(kc), Err(CexError::InvalidKey));
    }
}
