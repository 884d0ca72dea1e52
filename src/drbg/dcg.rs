//! DCG: Digest Counter DRBG (§4.2.4).
//!
//! The unkeyed-hash counterpart to HCG: state is `(V, K, Sc)` where
//! `K` is absorbed directly into every compression rather than used as
//! an HMAC key, so each step is `V := H(Sc || V || K || info)`. Built
//! on [`crate::permutation::hash`]'s one-shot `hash_once`, the same
//! adapter DCG's sibling HCG uses for its digest primitive.

use super::{DrbgAccounting, DrbgEngine, DrbgVariant, MAX_RESEED};
use crate::entropy::EntropyProvider;
use crate::errors::CexError;
use crate::key::{KeyContainer, KeySize, LegalKeySizes};
use crate::permutation::hash::{hash_once, HashChoice};

const DEF_RESEED: usize = 100 * 1024 * 1024;
const MAX_REQUEST: usize = 10 * 1024 * 1024;
const MAX_OUTPUT: u64 = 10 * 1024 * 1024 * 1024;

pub struct Dcg {
    acc: DrbgAccounting,
    provider: Option<Box<dyn EntropyProvider>>,
    choice: HashChoice,
    k: Vec<u8>,
    v: Vec<u8>,
    sc: u64,
    info: Vec<u8>,
}

impl Dcg {
    pub fn new(provider: Option<Box<dyn EntropyProvider>>) -> Self {
        Self {
            acc: DrbgAccounting::new(DEF_RESEED, MAX_OUTPUT, MAX_REQUEST),
            provider,
            choice: HashChoice::Sha256,
            k: Vec::new(),
            v: Vec::new(),
            sc: 0,
            info: Vec::new(),
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

    fn seed(&mut self, key: &[u8], nonce: &[u8]) {
        let digest_size = self.choice.digest_size();
        self.k = hash_once(self.choice, key);
        let mut seed_input = self.k.clone();
        seed_input.extend_from_slice(nonce);
        seed_input.extend_from_slice(&self.info);
        self.v = hash_once(self.choice, &seed_input);
        self.v.resize(digest_size, 0);
        self.sc = 0;
    }

    /// Rederives `(K, V)` from `K || provider.get(rate)` (§4.2.4,
    /// HCG's unkeyed-hash sibling reseed rule).
    fn reseed(&mut self) -> Result<(), CexError> {
        if let Some(provider) = self.provider.as_mut() {
            let mut seed_material = vec![0u8; self.choice.digest_size()];
            provider.fill(&mut seed_material)?;
            let mut new_key = self.k.clone();
            new_key.extend_from_slice(&seed_material);
            self.seed(&new_key, &[]);
            self.acc.record_reseed()?;
        }
        Ok(())
    }
}

impl DrbgEngine for Dcg {
    fn initialize(&mut self, kc: KeyContainer) -> Result<(), CexError> {
        let sizes = Self::legal_key_sizes_static();
        sizes.validate(&kc)?;

        self.choice = Self::choice_for_key_len(kc.key.len());
        self.info = kc.info_slice().to_vec();
        self.seed(&kc.key, kc.nonce_slice());

        self.acc = DrbgAccounting::new(self.acc.reseed_threshold, MAX_OUTPUT, MAX_REQUEST);
        self.acc.initialized = true;
        Ok(())
    }

    /// Emits one hash block at a time, reseeding as soon as a block
    /// crosses the threshold rather than waiting for the whole
    /// request to finish (§8 property 5; scenario S6), the same
    /// per-block accounting as `Hcg::generate`.
    fn generate(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        self.acc.check_generate(out.len())?;

        let digest_size = self.choice.digest_size();
        let mut filled = 0;
        while filled < out.len() {
            self.sc = self.sc.wrapping_add(1);
            let mut data = self.sc.to_be_bytes().to_vec();
            data.extend_from_slice(&self.v);
            data.extend_from_slice(&self.k);
            data.extend_from_slice(&self.info);
            let block = hash_once(self.choice, &data);
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
        let mut new_key = self.k.clone();
        new_key.extend_from_slice(key);
        self.seed(&new_key, &[]);
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
        "DCG"
    }

    fn enumeral(&self) -> DrbgVariant {
        DrbgVariant::Dcg
    }
}

impl Drop for Dcg {
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

    fn init() -> Dcg {
        let mut dcg = Dcg::new(None);
        let kc = KeyContainer::new(vec![0x3cu8; 32]).with_nonce(vec![0xc3u8; 32]);
        dcg.initialize(kc).unwrap();
        dcg
    }

    #[test]
    fn stream_chunking_is_consistent() {
        let mut one_shot = init();
        let mut whole = vec![0u8; 70];
        one_shot.generate(&mut whole).unwrap();

        let mut chunked = init();
        let mut a = vec![0u8; 20];
        let mut b = vec![0u8; 50];
        chunked.generate(&mut a).unwrap();
        chunked.generate(&mut b).unwrap();

        let mut combined = Vec::new();
        combined.extend_from_slice(&a);
        combined.extend_from_slice(&b);
        assert_eq!(combined, whole);
    }

    #[test]
    fn rejects_bad_key_length() {
        let mut dcg = Dcg::new(None);
        let kc = KeyContainer::new(vec![0u8; 5]);
        assert_eq!(dcg.initialize(kc), Err(CexError::InvalidKey));
    }
}
