//! The rotating-key MAC layer behind [`super::AuthenticatedStream`]:
//! KMAC256/512 (built on [`crate::cshake::kmac`]) or HMAC-SHA256/512
//! (built on [`crate::permutation::hmac_adapter`]).
//!
//! `Kmac512` is not NIST KMAC512 (no such standard algorithm exists —
//! KMAC's output length is a free parameter of the same cSHAKE256-based
//! construction); it names KMAC256 squeezed to a 64-byte tag, matching
//! the teacher corpus's habit of naming a MAC variant after its tag
//! length rather than inventing a second sponge rate for it.
//!
//! `KMAC1024` from the spec's enumeration is intentionally absent: it
//! would require a non-standard SHAKE1024 sponge rate the `sha3` crate
//! does not expose, and the spec itself flags `SHAKE1024` as
//! experimental and excluded from default paths. See `DESIGN.md`.

use crate::cshake::kmac;
use crate::permutation::hash::HashChoice;
use crate::permutation::hmac_adapter::hmac_once;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthenticatorChoice {
    None,
    Kmac256,
    Kmac512,
    HmacSha256,
    HmacSha512,
}

impl AuthenticatorChoice {
    pub fn tag_size(self) -> usize {
        match self {
            AuthenticatorChoice::None => 0,
            AuthenticatorChoice::Kmac256 | AuthenticatorChoice::HmacSha256 => 32,
            AuthenticatorChoice::Kmac512 | AuthenticatorChoice::HmacSha512 => 64,
        }
    }

    /// Used as the `class_name` half of the key-schedule customization
    /// string (§4.3: "absorb key into a SHAKE with customization
    /// `mac_counter_le64 || class_name`").
    pub fn class_name(self) -> &'static [u8] {
        match self {
            AuthenticatorChoice::None => b"CSX-NONE",
            AuthenticatorChoice::Kmac256 => b"CSX256-KMAC256",
            AuthenticatorChoice::Kmac512 => b"CSX256-KMAC512",
            AuthenticatorChoice::HmacSha256 => b"CSX256-HMAC256",
            AuthenticatorChoice::HmacSha512 => b"CSX256-HMAC512",
        }
    }

    pub fn is_authenticated(self) -> bool {
        !matches!(self, AuthenticatorChoice::None)
    }
}

/// A keyed MAC instance, rebuilt each time `mac_key` rotates.
pub struct Authenticator {
    choice: AuthenticatorChoice,
    mac_key: Vec<u8>,
}

impl Authenticator {
    pub fn new(choice: AuthenticatorChoice, mac_key: Vec<u8>) -> Self {
        Self { choice, mac_key }
    }

    pub fn tag_size(&self) -> usize {
        self.choice.tag_size()
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.mac_key
    }

    /// Computes the tag over the concatenation of `parts`, in order —
    /// `AuthenticatedStream` passes `[nonce, aad, ciphertext]` per the
    /// §4.3 AEAD ordering.
    pub fn compute(&self, parts: &[&[u8]]) -> Vec<u8> {
        let mut data = Vec::new();
        for part in parts {
            data.extend_from_slice(part);
        }
        match self.choice {
            AuthenticatorChoice::None => Vec::new(),
            AuthenticatorChoice::Kmac256 => kmac(256, &self.mac_key, &data, b"CSX", 32),
            AuthenticatorChoice::Kmac512 => kmac(256, &self.mac_key, &data, b"CSX", 64),
            AuthenticatorChoice::HmacSha256 => hmac_once(HashChoice::Sha256, &self.mac_key, &data),
            AuthenticatorChoice::HmacSha512 => hmac_once(HashChoice::Sha512, &self.mac_key, &data),
        }
    }
}

impl Drop for Authenticator {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.mac_key.zeroize();
    }
}
