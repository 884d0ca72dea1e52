//! BCG: Block-Cipher Counter DRBG (§4.2.1).
//!
//! Encrypts a monotonic big-endian counter with AES-CTR to produce a
//! key-stream, exactly the construction the teacher's
//! `Prf::next` uses for its own PRF step (`Aes128/192/256` +
//! `Ctr128BE`), generalized here into a standalone, reseedable
//! generator rather than a one-shot subkey-combination PRF.
//!
//! The spec's 256-bit logical counter is carried as a 32-byte
//! big-endian value; the active 16 low bytes drive the `ctr` crate's
//! own internal 128-bit counter increment (so a single `generate` call
//! can emit many blocks without re-initializing the cipher per block),
//! and the high 16 bytes are the carry extension that only changes
//! once the low half wraps — which, at 2^128 blocks per wrap, never
//! happens in practice. See `DESIGN.md` for why AES stands in for the
//! spec's unresolved "wide-Rijndael" variant.

use super::{DrbgAccounting, DrbgEngine, DrbgVariant, MAX_RESEED};
use crate::cshake::cshake;
use crate::entropy::EntropyProvider;
use crate::errors::CexError;
use crate::key::{KeyContainer, KeySize, LegalKeySizes};
use crate::parallel::{parallel_for_chunks, ParallelOptions};
use crate::permutation::block_cipher::BlockCipherAdapter;
use hkdf::Hkdf;
use sha2::{Sha256, Sha512};

const BLOCK_SIZE: usize = 32;
const CIPHER_BLOCK: usize = 16;
const DEF_RESEED: usize = 100 * 1024 * 1024;
const MAX_REQUEST: usize = 100 * 1024 * 1024;
const MAX_OUTPUT: u64 = 10 * 1024 * 1024 * 1024;
const GEN_STRENGTH: usize = 256;

/// Key-schedule choice for BCG's effective AES key (§6 "Block cipher
/// extensions"). `None` skips key derivation entirely (the raw key
/// material is truncated/cycled to the required length — a
/// deliberately weak option for callers who manage their own KDF
/// upstream, never the default). `Shake512`/`Kmac`-style "512" naming
/// follows the same precedent as `AuthenticatorChoice::Kmac512`: there
/// is no distinct 512-bit-rate cSHAKE, so it squeezes the same
/// cSHAKE-256 sponge to a different output length. `Shake1024` from
/// the spec's enumeration is omitted for the reason recorded for
/// `SHAKE1024` generally in `DESIGN.md`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum BlockCipherExtension {
    None,
    Hkdf256,
    Hkdf512,
    Shake128,
    #[default]
    Shake256,
    Shake512,
}

pub struct Bcg {
    acc: DrbgAccounting,
    provider: Option<Box<dyn EntropyProvider>>,
    parallel: ParallelOptions,
    extension: BlockCipherExtension,
    cipher: BlockCipherAdapter,
    key: Vec<u8>,
    counter: [u8; BLOCK_SIZE],
    customization: Vec<u8>,
}

impl Bcg {
    pub fn new(provider: Option<Box<dyn EntropyProvider>>, parallel: ParallelOptions) -> Self {
        Self {
            acc: DrbgAccounting::new(DEF_RESEED, MAX_OUTPUT, MAX_REQUEST),
            provider,
            parallel,
            extension: BlockCipherExtension::default(),
            cipher: BlockCipherAdapter::new(),
            key: Vec::new(),
            counter: [0u8; BLOCK_SIZE],
            customization: Vec::new(),
        }
    }

    pub fn with_extension(mut self, extension: BlockCipherExtension) -> Self {
        self.extension = extension;
        self
    }

    fn class_name() -> &'static [u8] {
        b"BCG"
    }

    fn hkdf_expand_sha256(ikm: &[u8], label: &[u8], out_len: usize) -> Vec<u8> {
        let hk = Hkdf::<Sha256>::new(None, ikm);
        let mut okm = vec![0u8; out_len.max(1)];
        hk.expand(label, &mut okm).expect("BCG key lengths stay within HKDF's 255*hash_len expand limit");
        okm.truncate(out_len);
        okm
    }

    fn hkdf_expand_sha512(ikm: &[u8], label: &[u8], out_len: usize) -> Vec<u8> {
        let hk = Hkdf::<Sha512>::new(None, ikm);
        let mut okm = vec![0u8; out_len.max(1)];
        hk.expand(label, &mut okm).expect("BCG key lengths stay within HKDF's 255*hash_len expand limit");
        okm.truncate(out_len);
        okm
    }

    /// Distinguishes an otherwise-identical primitive shared by two
    /// extension tags (`Shake256`/`Shake512`, both cSHAKE-256 under
    /// the hood) so each extension is still its own deterministic,
    /// non-colliding derivation.
    fn extension_tag(extension: BlockCipherExtension) -> &'static [u8] {
        match extension {
            BlockCipherExtension::None => b"-NONE",
            BlockCipherExtension::Hkdf256 => b"-HKDF256",
            BlockCipherExtension::Hkdf512 => b"-HKDF512",
            BlockCipherExtension::Shake128 => b"-SHAKE128",
            BlockCipherExtension::Shake256 => b"-SHAKE256",
            BlockCipherExtension::Shake512 => b"-SHAKE512",
        }
    }

    /// Expands `ikm` into `out_len` bytes of key material under the
    /// active [`BlockCipherExtension`], labeled with `label` (the
    /// per-call domain separator: initial schedule, reseed, or
    /// `update`) plus the extension's own tag.
    fn expand_key(extension: BlockCipherExtension, ikm: &[u8], label: &[u8], out_len: usize) -> Vec<u8> {
        let mut label = label.to_vec();
        label.extend_from_slice(Self::extension_tag(extension));

        match extension {
            BlockCipherExtension::None => {
                let mut out = vec![0u8; out_len];
                for (i, byte) in out.iter_mut().enumerate() {
                    *byte = ikm[i % ikm.len().max(1)];
                }
                out
            }
            BlockCipherExtension::Hkdf256 => Self::hkdf_expand_sha256(ikm, &label, out_len),
            BlockCipherExtension::Hkdf512 => Self::hkdf_expand_sha512(ikm, &label, out_len),
            BlockCipherExtension::Shake128 => cshake(128, b"", &label, ikm, out_len),
            BlockCipherExtension::Shake256 | BlockCipherExtension::Shake512 => cshake(256, b"", &label, ikm, out_len),
        }
    }

    /// Derives the effective AES key over `key || info` under the
    /// active extension; `Shake256` (the default) keeps the raw key
    /// untouched when `info` is empty and the key is already the
    /// recommended length, letting the `aes` crate perform its own
    /// standard key expansion (§4.2.1) — every other extension always
    /// runs its derivation, since opting into `Hkdf256` etc. is itself
    /// a request for that derivation to happen.
    fn schedule_key(extension: BlockCipherExtension, key: &[u8], info: &[u8], recommended_len: usize) -> Vec<u8> {
        if matches!(extension, BlockCipherExtension::Shake256) && info.is_empty() && key.len() != recommended_len {
            return key.to_vec();
        }
        let mut label = format!("BCG{}", key.len() * 8).into_bytes();
        label.extend_from_slice(Self::class_name());
        let mut ikm = key.to_vec();
        ikm.extend_from_slice(info);
        Self::expand_key(extension, &ikm, &label, key.len())
    }

    fn increment_counter(counter: &mut [u8; BLOCK_SIZE], blocks: u64) {
        let mut carry = blocks;
        for byte in counter.iter_mut().rev() {
            if carry == 0 {
                break;
            }
            let sum = *byte as u64 + (carry & 0xff);
            *byte = sum as u8;
            carry = (carry >> 8) + (sum >> 8);
        }
    }

    fn counter_at_offset(base: &[u8; BLOCK_SIZE], block_offset: u64) -> [u8; BLOCK_SIZE] {
        let mut c = *base;
        Self::increment_counter(&mut c, block_offset);
        c
    }

    fn low_block(counter: &[u8; BLOCK_SIZE]) -> [u8; CIPHER_BLOCK] {
        let mut out = [0u8; CIPHER_BLOCK];
        out.copy_from_slice(&counter[BLOCK_SIZE - CIPHER_BLOCK..]);
        out
    }
}

impl DrbgEngine for Bcg {
    fn initialize(&mut self, kc: KeyContainer) -> Result<(), CexError> {
        let sizes = Self::legal_key_sizes_static();
        let shape = sizes.validate(&kc)?;
        let recommended = sizes.recommended().map(|k| k.key_size).unwrap_or(shape.key_size);

        self.key = Self::schedule_key(self.extension, &kc.key, kc.info_slice(), recommended);
        self.customization = kc.info_slice().to_vec();
        self.counter = [0u8; BLOCK_SIZE];
        if let Some(nonce) = &kc.nonce {
            let n = nonce.len().min(BLOCK_SIZE);
            self.counter[..n].copy_from_slice(&nonce[..n]);
        }
        let low = Self::low_block(&self.counter);
        self.cipher.initialize(&self.key, low)?;

        self.acc = DrbgAccounting::new(self.acc.reseed_threshold, MAX_OUTPUT, MAX_REQUEST);
        self.acc.initialized = true;
        Ok(())
    }

    /// Fills `out` in slices no longer than the distance remaining to
    /// the next reseed threshold, reseeding between slices so a
    /// single long request reseeds exactly as many times as crossing
    /// `reseed_threshold` repeatedly would (§3 invariant 2; §8
    /// property 5 "reseed transparency"; scenario S6's
    /// `reseed_requests == 4` for a 256-byte request at threshold 64).
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
            self.fill(chunk)?;
            remaining = rest;

            if self.acc.record_output(chunk.len()) {
                self.reseed()?;
            }
        }
        Ok(())
    }

    fn update(&mut self, key: &[u8]) -> Result<(), CexError> {
        if key.len() < 16 {
            return Err(CexError::InvalidKey);
        }
        let out_len = self.key.len();
        let mut ikm = self.key.clone();
        ikm.extend_from_slice(key);
        self.key = Self::expand_key(self.extension, &ikm, b"BCG-update", out_len);
        self.acc.reseed_counter = 0;
        let low = Self::low_block(&self.counter);
        self.cipher.initialize(&self.key, low)?;
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
        "BCG"
    }

    fn enumeral(&self) -> DrbgVariant {
        DrbgVariant::Bcg
    }
}

impl Bcg {
    /// Encrypts exactly `out.len()` bytes of keystream at the current
    /// counter position, splitting across lanes when the parallel
    /// policy calls for it. Does not touch reseed accounting — callers
    /// slice `out` to the active reseed-threshold boundary first, so
    /// a rekey lands between two `fill` calls rather than inside one.
    fn fill(&mut self, out: &mut [u8]) -> Result<(), CexError> {
        let degree = if self.parallel.should_split(out.len()) {
            self.parallel.max_degree
        } else {
            1
        };

        if degree <= 1 {
            let low = Self::low_block(&self.counter);
            self.cipher.initialize(&self.key, low)?;
            self.cipher.encrypt_block(out)?;
            let blocks = out.len().div_ceil(CIPHER_BLOCK) as u64;
            Self::increment_counter(&mut self.counter, blocks);
        } else {
            let key = self.key.clone();
            let base = self.counter;
            let blocks_per_lane = out.len().div_ceil(CIPHER_BLOCK).div_ceil(degree).max(1);
            let chunk_bytes = blocks_per_lane * CIPHER_BLOCK;
            let total_blocks = out.len().div_ceil(CIPHER_BLOCK) as u64;

            parallel_for_chunks(out, degree, chunk_bytes, |lane, chunk| {
                let lane_counter = Self::counter_at_offset(&base, (lane * blocks_per_lane) as u64);
                let mut cipher = BlockCipherAdapter::new();
                let low = Self::low_block(&lane_counter);
                cipher.initialize(&key, low).expect("lane key is valid");
                cipher.encrypt_block(chunk).expect("lane cipher is initialized");
            });
            Self::increment_counter(&mut self.counter, total_blocks);
        }
        Ok(())
    }

    /// Derives a fresh AES key from the running key plus
    /// `provider`-supplied entropy and re-keys the cipher at the
    /// current counter position (§4.2.1 "Reseed"). Counter position is
    /// untouched — only the key changes — so the keystream never
    /// repeats a prior block under the old key.
    fn reseed(&mut self) -> Result<(), CexError> {
        if let Some(provider) = self.provider.as_mut() {
            let mut seed = vec![0u8; self.key.len()];
            provider.fill(&mut seed)?;
            let mut ikm = self.key.clone();
            ikm.extend_from_slice(&seed);
            let new_key = Self::expand_key(self.extension, &ikm, b"BCG-reseed", self.key.len());
            self.key = new_key;
            let low = Self::low_block(&self.counter);
            self.cipher.initialize(&self.key, low)?;
            self.acc.record_reseed()?;
        }
        Ok(())
    }
}

impl Bcg {
    fn legal_key_sizes_static() -> LegalKeySizes {
        LegalKeySizes(vec![
            KeySize::new(16, Some(32), None),
            KeySize::new(24, Some(32), None),
            KeySize::new(32, Some(32), None),
        ])
    }
}

impl Drop for Bcg {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.key.zeroize();
        self.counter.zeroize();
        self.acc.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 24 bytes is BCG's recommended key size (`legal_key_sizes_static`'s
    // second entry), so `schedule_key`'s "skip derivation" fast path
    // for `Shake256` does not trigger here — every extension below
    // actually runs its own derivation, which is what this test means
    // to compare.
    fn init_with(extension: BlockCipherExtension) -> Bcg {
        let mut bcg = Bcg::new(None, ParallelOptions::sequential()).with_extension(extension);
        let kc = KeyContainer::new(vec![0x11u8; 24]).with_nonce(vec![0x22u8; 32]);
        bcg.initialize(kc).unwrap();
        bcg
    }

    #[test]
    fn extensions_are_deterministic_and_mutually_distinct() {
        let extensions = [
            BlockCipherExtension::None,
            BlockCipherExtension::Hkdf256,
            BlockCipherExtension::Hkdf512,
            BlockCipherExtension::Shake128,
            BlockCipherExtension::Shake256,
            BlockCipherExtension::Shake512,
        ];

        let mut outputs = Vec::new();
        for ext in extensions {
            let mut a = init_with(ext);
            let mut b = init_with(ext);
            let mut out_a = vec![0u8; 48];
            let mut out_b = vec![0u8; 48];
            a.generate(&mut out_a).unwrap();
            b.generate(&mut out_b).unwrap();
            assert_eq!(out_a, out_b, "{ext:?} is not deterministic");
            outputs.push(out_a);
        }

        for i in 0..outputs.len() {
            for j in (i + 1)..outputs.len() {
                assert_ne!(outputs[i], outputs[j], "extensions {i} and {j} produced identical keystreams");
            }
        }
    }

    #[test]
    fn default_extension_is_shake256() {
        let bcg = Bcg::new(None, ParallelOptions::sequential());
        assert_eq!(bcg.extension, BlockCipherExtension::Shake256);
    }
}
