//! Block cipher adapter over `aes` + `ctr`, generalizing the
//! `Aes128`/`Aes192`/`Aes256` + `Ctr128BE` dispatch in the teacher's
//! `prf.rs::Prf::next`. BCG drives this with a logical 256-bit counter
//! split across two 128-bit CTR blocks (see `drbg::bcg`), since the
//! underlying `aes` crate's cipher is a standard 128-bit block.

use crate::errors::CexError;
use crate::key::{KeySize, LegalKeySizes};
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes192, Aes256};
use ctr::Ctr128BE;

enum Engine {
    Aes128(Ctr128BE<Aes128>),
    Aes192(Ctr128BE<Aes192>),
    Aes256(Ctr128BE<Aes256>),
}

/// A re-initializable AES-CTR block cipher, keyed with a 16/24/32-byte
/// key and a 16-byte counter block.
pub struct BlockCipherAdapter {
    engine: Option<Engine>,
}

impl BlockCipherAdapter {
    pub const BLOCK_SIZE: usize = 16;

    pub fn new() -> Self {
        Self { engine: None }
    }

    pub fn legal_key_sizes() -> LegalKeySizes {
        LegalKeySizes(vec![
            KeySize::new(16, Some(16), None),
            KeySize::new(24, Some(16), None),
            KeySize::new(32, Some(16), None),
        ])
    }

    pub fn initialize(&mut self, key: &[u8], counter_block: [u8; 16]) -> Result<(), CexError> {
        self.engine = Some(match key.len() {
            16 => Engine::Aes128(Ctr128BE::<Aes128>::new(key.into(), &counter_block.into())),
            24 => Engine::Aes192(Ctr128BE::<Aes192>::new(key.into(), &counter_block.into())),
            32 => Engine::Aes256(Ctr128BE::<Aes256>::new(key.into(), &counter_block.into())),
            _ => return Err(CexError::InvalidKey),
        });
        Ok(())
    }

    /// Encrypts `block.len()` zero bytes in place, producing
    /// `block.len()` bytes of AES-CTR keystream for the current
    /// counter position. The caller (BCG) advances the counter by
    /// re-initializing with the next counter block.
    pub fn encrypt_block(&mut self, block: &mut [u8]) -> Result<(), CexError> {
        let engine = self.engine.as_mut().ok_or(CexError::NotInitialized)?;
        block.fill(0);
        match engine {
            Engine::Aes128(c) => c.apply_keystream(block),
            Engine::Aes192(c) => c.apply_keystream(block),
            Engine::Aes256(c) => c.apply_keystream(block),
        }
        Ok(())
    }
}

impl Default for BlockCipherAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BlockCipherAdapter {
    fn drop(&mut self) {
        self.engine = None;
    }
}
