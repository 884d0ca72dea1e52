//! C3: AuthenticatedStream — a ChaCha-family stream cipher with an
//! integrated, rotating-key MAC, behaving as AEAD with separate
//! `set_associated_data` / `transform` / `tag` steps (§4.3).
//!
//! Lifecycle: `new(authenticator)` → `initialize(encrypt, kc)` →
//! `set_associated_data?` → `transform` → `tag()` / `reset()` / drop.
//! One `transform` call processes one whole message (`input` the full
//! plaintext or ciphertext‖tag, `output` sized accordingly) rather than
//! an arbitrarily-chunked stream — the contract's `transform(in, out,
//! len)` signature takes the complete buffers for one message, and the
//! AEAD ordering in §4.3 ("ciphertext produced; ciphertext → MAC;
//! finalize and append tag") is naturally one-shot per message.

pub mod authenticator;
pub mod chacha;

use crate::cshake::cshake;
use crate::errors::CexError;
use crate::key::{KeyContainer, KeySize, LegalKeySizes};
use crate::parallel::{parallel_for_chunks, ParallelOptions};
pub use authenticator::AuthenticatorChoice;
use authenticator::Authenticator;
use chacha::{ChaChaCipher, CONSTANTS, DEFAULT_ROUNDS};
use subtle::ConstantTimeEq;

const CIPHER_KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 8;
const BLOCK_SIZE: usize = 64;
const CIPHER_STATE_WORDS: usize = 14;

pub struct AuthenticatedStream {
    authenticator_choice: AuthenticatorChoice,
    encrypt: bool,
    root_key: Vec<u8>,
    info: Vec<u8>,
    cipher_key: Vec<u8>,
    nonce: [u8; NONCE_SIZE],
    counter: u64,
    mac_counter: u64,
    authenticator: Option<Authenticator>,
    aad: Vec<u8>,
    tag: Option<Vec<u8>>,
    initialized: bool,
    destroyed: bool,
    parallel: ParallelOptions,
}

impl AuthenticatedStream {
    pub fn new(authenticator: AuthenticatorChoice) -> Self {
        Self {
            authenticator_choice: authenticator,
            encrypt: true,
            root_key: Vec::new(),
            info: Vec::new(),
            cipher_key: Vec::new(),
            nonce: [0u8; NONCE_SIZE],
            counter: 0,
            mac_counter: 0,
            authenticator: None,
            aad: Vec::new(),
            tag: None,
            initialized: false,
            destroyed: false,
            parallel: ParallelOptions::sequential(),
        }
    }

    pub fn with_parallel_options(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn legal_key_sizes() -> LegalKeySizes {
        LegalKeySizes(vec![KeySize::new(CIPHER_KEY_SIZE, Some(NONCE_SIZE), None)])
    }

    pub fn tag_size(&self) -> usize {
        self.authenticator_choice.tag_size()
    }

    /// `cshake(256, "", mac_counter_le64 || class_name || info, root_key, 32 + tag_size)`,
    /// split into the cipher key and a fresh MAC key (§4.3 "Key schedule").
    fn derive_keys(&mut self) -> Result<(), CexError> {
        if !self.authenticator_choice.is_authenticated() {
            if self.root_key.len() != CIPHER_KEY_SIZE {
                return Err(CexError::InvalidKey);
            }
            self.cipher_key = self.root_key.clone();
            self.authenticator = None;
            return Ok(());
        }

        let mut customization = self.mac_counter.to_le_bytes().to_vec();
        customization.extend_from_slice(self.authenticator_choice.class_name());
        customization.extend_from_slice(&self.info);

        let tag_size = self.authenticator_choice.tag_size();
        let okm = cshake(256, b"", &customization, &self.root_key, CIPHER_KEY_SIZE + tag_size);
        let (cipher_key, mac_key) = okm.split_at(CIPHER_KEY_SIZE);

        if self.counter == 0 {
            self.cipher_key = cipher_key.to_vec();
        }
        self.authenticator = Some(Authenticator::new(self.authenticator_choice, mac_key.to_vec()));
        Ok(())
    }

    pub fn initialize(&mut self, encrypt: bool, kc: KeyContainer) -> Result<(), CexError> {
        let sizes = Self::legal_key_sizes();
        let shape = sizes.validate(&kc)?;
        if kc.key.len() != shape.key_size {
            return Err(CexError::InvalidKey);
        }
        let nonce = kc.nonce.as_deref().ok_or(CexError::InvalidNonce)?;
        if nonce.len() != NONCE_SIZE {
            return Err(CexError::InvalidNonce);
        }

        self.encrypt = encrypt;
        self.root_key = kc.key.to_vec();
        self.info = kc.info_slice().to_vec();
        self.nonce.copy_from_slice(nonce);
        self.counter = 0;
        self.mac_counter = 0;
        self.aad.clear();
        self.tag = None;
        self.destroyed = false;

        self.derive_keys()?;
        self.initialized = true;
        Ok(())
    }

    pub fn set_associated_data(&mut self, aad: &[u8]) -> Result<(), CexError> {
        if !self.initialized || self.destroyed {
            return Err(CexError::NotInitialized);
        }
        self.aad = aad.to_vec();
        Ok(())
    }

    fn apply_keystream(&mut self, data: &mut [u8]) {
        let cipher = ChaChaCipher::new(
            self.cipher_key[..].try_into().expect("cipher_key is 32 bytes"),
            &self.nonce,
            DEFAULT_ROUNDS,
        );

        if self.parallel.should_split(data.len()) {
            let degree = self.parallel.max_degree;
            let blocks_per_lane = data.len().div_ceil(BLOCK_SIZE).div_ceil(degree).max(1);
            let chunk_bytes = blocks_per_lane * BLOCK_SIZE;
            let base_counter = self.counter;
            parallel_for_chunks(data, degree, chunk_bytes, |lane, chunk| {
                let lane_counter = base_counter.wrapping_add((lane * blocks_per_lane) as u64);
                cipher.apply_keystream(chunk, lane_counter);
            });
            let total_blocks = data.len().div_ceil(BLOCK_SIZE) as u64;
            self.counter = self.counter.wrapping_add(total_blocks);
        } else {
            self.counter = cipher.apply_keystream(data, self.counter);
        }
    }

    /// Re-squeezes the key schedule with the now-advanced `mac_counter`,
    /// producing a fresh MAC key for the next call while leaving the
    /// cipher key untouched (§4.3: "Rotate MAC key on every `transform`
    /// finalize").
    fn rotate_mac_key(&mut self) -> Result<(), CexError> {
        if self.authenticator_choice.is_authenticated() {
            self.derive_keys()?;
        }
        Ok(())
    }

    /// Encrypts `input` into `output` (`output.len() == input.len() +
    /// tag_size()`, ciphertext followed by the tag) or decrypts
    /// `input` (`ciphertext || tag`) into `output`
    /// (`output.len() == input.len() - tag_size()`), verifying the tag
    /// before any plaintext byte is written.
    pub fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CexError> {
        if !self.initialized || self.destroyed {
            return Err(CexError::NotInitialized);
        }
        let tag_size = self.tag_size();

        if self.encrypt {
            if output.len() != input.len() + tag_size {
                return Err(CexError::InvalidSize);
            }
            let (ct_out, tag_out) = output.split_at_mut(input.len());
            ct_out.copy_from_slice(input);
            self.apply_keystream(ct_out);

            if let Some(mac) = &self.authenticator {
                let tag = mac.compute(&[&self.nonce, &self.aad, ct_out]);
                tag_out.copy_from_slice(&tag[..tag_size]);
            }
            self.mac_counter = self.mac_counter.wrapping_add(ct_out.len() as u64);
            self.rotate_mac_key()?;
            self.tag = Some(tag_out.to_vec());
            Ok(())
        } else {
            if input.len() < tag_size || output.len() != input.len() - tag_size {
                return Err(CexError::InvalidSize);
            }
            let (ciphertext, given_tag) = input.split_at(input.len() - tag_size);

            if let Some(mac) = &self.authenticator {
                let computed = mac.compute(&[&self.nonce, &self.aad, ciphertext]);
                let ok: bool = computed[..tag_size].ct_eq(given_tag).into();
                if !ok {
                    self.destroy();
                    return Err(CexError::AuthenticationFailure);
                }
            }
            self.mac_counter = self.mac_counter.wrapping_add(ciphertext.len() as u64);

            output.copy_from_slice(ciphertext);
            self.apply_keystream(output);
            self.rotate_mac_key()?;
            self.tag = Some(given_tag.to_vec());
            Ok(())
        }
    }

    pub fn tag(&self) -> Option<&[u8]> {
        self.tag.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized && !self.destroyed
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.initialized = false;
    }

    pub fn reset(&mut self) {
        use zeroize::Zeroize;
        self.root_key.zeroize();
        self.cipher_key.zeroize();
        self.authenticator = None;
        self.aad.clear();
        self.tag = None;
        self.counter = 0;
        self.mac_counter = 0;
        self.initialized = false;
        self.destroyed = false;
    }

    /// Flattens the live state into the fixed persisted-state layout
    /// (§6): `cipher_state(14×u32) ‖ len16(custom) ‖ custom ‖
    /// len16(mac_key) ‖ mac_key ‖ len16(mac_tag) ‖ mac_tag ‖ nonce ‖
    /// counter_u64 ‖ is_authenticated ‖ is_encryption ‖
    /// is_initialized`, all integers little-endian. `cipher_state`
    /// is the ChaCha constants/key/block-counter words (the same
    /// layout `ChaChaCipher::block` builds minus the trailing nonce
    /// words, which are carried separately); `counter_u64` here is
    /// `mac_counter`, since the cipher's own block counter is already
    /// embedded in `cipher_state`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();

        for word in CONSTANTS {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for chunk in self.cipher_key.chunks(4) {
            let word = u32::from_le_bytes(chunk.try_into().expect("cipher key is word-aligned"));
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&(self.counter & 0xffff_ffff).to_le_bytes()[..4]);
        out.extend_from_slice(&(self.counter >> 32).to_le_bytes()[..4]);
        debug_assert_eq!(out.len(), CIPHER_STATE_WORDS * 4);

        write_len16_field(&mut out, &self.info);

        let mac_key = self.authenticator.as_ref().map(|a| a.key_bytes()).unwrap_or(&[]);
        write_len16_field(&mut out, mac_key);

        let mac_tag = self.tag.as_deref().unwrap_or(&[]);
        write_len16_field(&mut out, mac_tag);

        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.mac_counter.to_le_bytes());
        out.push(self.authenticator_choice.is_authenticated() as u8);
        out.push(self.encrypt as u8);
        out.push(self.initialized as u8);
        out
    }

    /// Rebuilds an `AuthenticatedStream` from a buffer produced by
    /// [`Self::serialize`]. `root_key` is not recoverable from the
    /// persisted state (only the derived `cipher_key`/`mac_key` are
    /// stored) and must be supplied by the caller, matching the spec's
    /// `AuthStreamState` not carrying `root_key` in its field list.
    pub fn deserialize(authenticator: AuthenticatorChoice, root_key: Vec<u8>, data: &[u8]) -> Result<Self, CexError> {
        let mut cursor = 0usize;
        let take = |cursor: &mut usize, len: usize| -> Result<&[u8], CexError> {
            let end = cursor.checked_add(len).ok_or(CexError::InvalidSize)?;
            let slice = data.get(*cursor..end).ok_or(CexError::InvalidSize)?;
            *cursor = end;
            Ok(slice)
        };

        let cipher_state = take(&mut cursor, CIPHER_STATE_WORDS * 4)?;
        let cipher_key = cipher_state[16..48].to_vec();
        let counter_lo = u32::from_le_bytes(cipher_state[48..52].try_into().expect("4 bytes"));
        let counter_hi = u32::from_le_bytes(cipher_state[52..56].try_into().expect("4 bytes"));
        let counter = (counter_lo as u64) | ((counter_hi as u64) << 32);

        let info = read_len16_field(&mut cursor, data)?;
        let mac_key = read_len16_field(&mut cursor, data)?;
        let mac_tag = read_len16_field(&mut cursor, data)?;

        let nonce_bytes = take(&mut cursor, NONCE_SIZE)?;
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        let mac_counter = u64::from_le_bytes(take(&mut cursor, 8)?.try_into().expect("8 bytes"));
        let is_authenticated = take(&mut cursor, 1)?[0] != 0;
        let is_encryption = take(&mut cursor, 1)?[0] != 0;
        let is_initialized = take(&mut cursor, 1)?[0] != 0;

        if is_authenticated != authenticator.is_authenticated() {
            return Err(CexError::InvalidParam);
        }

        let authenticator_instance = if is_authenticated {
            Some(Authenticator::new(authenticator, mac_key))
        } else {
            None
        };

        Ok(Self {
            authenticator_choice: authenticator,
            encrypt: is_encryption,
            root_key,
            info,
            cipher_key,
            nonce,
            counter,
            mac_counter,
            authenticator: authenticator_instance,
            aad: Vec::new(),
            tag: if mac_tag.is_empty() { None } else { Some(mac_tag) },
            initialized: is_initialized,
            destroyed: false,
            parallel: ParallelOptions::sequential(),
        })
    }
}

fn write_len16_field(out: &mut Vec<u8>, field: &[u8]) {
    out.extend_from_slice(&(field.len() as u16).to_le_bytes());
    out.extend_from_slice(field);
}

fn read_len16_field(cursor: &mut usize, data: &[u8]) -> Result<Vec<u8>, CexError> {
    let len_bytes = data.get(*cursor..*cursor + 2).ok_or(CexError::InvalidSize)?;
    let len = u16::from_le_bytes(len_bytes.try_into().expect("2 bytes")) as usize;
    *cursor += 2;
    let field = data.get(*cursor..*cursor + len).ok_or(CexError::InvalidSize)?;
    *cursor += len;
    Ok(field.to_vec())
}

impl Drop for AuthenticatedStream {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.root_key.zeroize();
        self.cipher_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(authenticator: AuthenticatorChoice, plaintext: &[u8], aad: &[u8]) {
        let key = vec![0x11u8; 32];
        let nonce = vec![0x22u8; 8];
        let info = vec![0x33u8; 16];

        let mut encryptor = AuthenticatedStream::new(authenticator);
        encryptor
            .initialize(true, KeyContainer::new(key.clone()).with_nonce(nonce.clone()).with_info(info.clone()))
            .unwrap();
        encryptor.set_associated_data(aad).unwrap();
        let mut ciphertext = vec![0u8; plaintext.len() + authenticator.tag_size()];
        encryptor.transform(plaintext, &mut ciphertext).unwrap();

        let mut decryptor = AuthenticatedStream::new(authenticator);
        decryptor
            .initialize(false, KeyContainer::new(key).with_nonce(nonce).with_info(info))
            .unwrap();
        decryptor.set_associated_data(aad).unwrap();
        let mut recovered = vec![0u8; plaintext.len()];
        decryptor.transform(&ciphertext, &mut recovered).unwrap();

        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn kmac256_round_trip() {
        roundtrip(AuthenticatorChoice::Kmac256, &[0u8; 1024 * 1024 + 37], b"authenticated-data");
    }

    #[test]
    fn hmac_sha256_round_trip() {
        roundtrip(AuthenticatorChoice::HmacSha256, b"a shorter message", b"aad");
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let key = vec![0x11u8; 32];
        let nonce = vec![0x22u8; 8];
        let info = vec![0x33u8; 16];
        let plaintext = vec![0u8; 1024 * 1024 + 37];
        let aad = b"authenticated-data";

        let mut encryptor = AuthenticatedStream::new(AuthenticatorChoice::Kmac256);
        encryptor
            .initialize(true, KeyContainer::new(key.clone()).with_nonce(nonce.clone()).with_info(info.clone()))
            .unwrap();
        encryptor.set_associated_data(aad).unwrap();
        let mut ciphertext = vec![0u8; plaintext.len() + AuthenticatorChoice::Kmac256.tag_size()];
        encryptor.transform(&plaintext, &mut ciphertext).unwrap();
        assert_eq!(AuthenticatorChoice::Kmac256.tag_size(), 32);

        ciphertext[42] ^= 0x01;

        let mut decryptor = AuthenticatedStream::new(AuthenticatorChoice::Kmac256);
        decryptor
            .initialize(false, KeyContainer::new(key).with_nonce(nonce).with_info(info))
            .unwrap();
        decryptor.set_associated_data(aad).unwrap();
        let mut recovered = vec![0u8; plaintext.len()];
        let result = decryptor.transform(&ciphertext, &mut recovered);
        assert_eq!(result, Err(CexError::AuthenticationFailure));
        assert!(recovered.iter().all(|&b| b == 0));
    }

    #[test]
    fn unauthenticated_variant_has_zero_length_tag() {
        roundtrip(AuthenticatorChoice::None, b"no mac here", b"");
    }

    #[test]
    fn serialize_deserialize_round_trip_continues_the_stream() {
        let key = vec![0x11u8; 32];
        let nonce = vec![0x22u8; 8];
        let info = vec![0x33u8; 16];
        let aad = b"aad";

        let mut encryptor = AuthenticatedStream::new(AuthenticatorChoice::Kmac256);
        encryptor
            .initialize(true, KeyContainer::new(key.clone()).with_nonce(nonce.clone()).with_info(info.clone()))
            .unwrap();
        encryptor.set_associated_data(aad).unwrap();
        let mut ct_first = vec![0u8; 64 + 32];
        encryptor.transform(&[0xabu8; 64], &mut ct_first).unwrap();

        let snapshot = encryptor.serialize();
        let mut restored =
            AuthenticatedStream::deserialize(AuthenticatorChoice::Kmac256, key, &snapshot).unwrap();
        restored.set_associated_data(aad).unwrap();

        let mut ct_second_original = vec![0u8; 64 + 32];
        encryptor.transform(&[0xcdu8; 64], &mut ct_second_original).unwrap();

        let mut ct_second_restored = vec![0u8; 64 + 32];
        restored.transform(&[0xcdu8; 64], &mut ct_second_restored).unwrap();

        assert_eq!(ct_second_original, ct_second_restored);
    }

    #[test]
    fn deserialize_rejects_truncated_buffer() {
        let result = AuthenticatedStream::deserialize(AuthenticatorChoice::Kmac256, vec![0u8; 32], &[0u8; 10]);
        assert!(matches!(result, Err(CexError::InvalidSize)));
    }
}
