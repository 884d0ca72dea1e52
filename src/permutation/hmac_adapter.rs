//! HMAC adapter over the `hmac` crate, generalizing the
//! `Hmac::<D>::new_from_slice` pattern the teacher uses throughout
//! `prf.rs` (`bind`, `subkeys`, `indices`, `combine`, `derive_key_nonce`)
//! into the runtime-selected SHA-256/SHA-512 choice HCG needs.

use crate::permutation::hash::HashChoice;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

enum Engine {
    Sha256(Hmac<Sha256>),
    Sha512(Hmac<Sha512>),
}

/// A re-initializable HMAC instance; `finalize` consumes the MAC and
/// requires `reset` (re-`initialize`) before further use, matching the
/// `hmac` crate's own `Mac::finalize` semantics.
pub struct HmacAdapter {
    choice: HashChoice,
    engine: Option<Engine>,
}

impl HmacAdapter {
    pub fn new(choice: HashChoice) -> Self {
        Self {
            choice,
            engine: None,
        }
    }

    pub fn tag_size(&self) -> usize {
        self.choice.digest_size()
    }

    /// HMAC accepts a key of any length (short keys are zero-padded,
    /// long keys are hashed down), so this never fails.
    pub fn initialize(&mut self, key: &[u8]) {
        self.engine = Some(match self.choice {
            HashChoice::Sha256 => {
                Engine::Sha256(Hmac::<Sha256>::new_from_slice(key).expect("hmac accepts any key length"))
            }
            HashChoice::Sha512 => {
                Engine::Sha512(Hmac::<Sha512>::new_from_slice(key).expect("hmac accepts any key length"))
            }
        });
    }

    pub fn update(&mut self, data: &[u8]) {
        match self.engine.as_mut().expect("hmac adapter not initialized") {
            Engine::Sha256(m) => Mac::update(m, data),
            Engine::Sha512(m) => Mac::update(m, data),
        }
    }

    pub fn finalize(&mut self) -> Vec<u8> {
        match self.engine.take().expect("hmac adapter not initialized") {
            Engine::Sha256(m) => m.finalize().into_bytes().to_vec(),
            Engine::Sha512(m) => m.finalize().into_bytes().to_vec(),
        }
    }
}

/// One-shot HMAC, used for HCG's `HMAC_K(...)` steps where keeping a
/// live `Mac` across calls would not simplify anything.
pub fn hmac_once(choice: HashChoice, key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut adapter = HmacAdapter::new(choice);
    adapter.initialize(key);
    adapter.update(data);
    adapter.finalize()
}
