//! Hash adapter over `sha2`, used by HCG/DCG. Generalizes the
//! `D: Digest` bound the teacher threads through `Drbg<D, T>` into a
//! runtime-selected choice between SHA-256 and SHA-512, since C2's
//! DRBGs are a tagged enum (see `drbg::mod`) rather than a type
//! parameter.

use sha2::{Digest, Sha256, Sha512};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashChoice {
    Sha256,
    Sha512,
}

impl HashChoice {
    pub fn digest_size(self) -> usize {
        match self {
            HashChoice::Sha256 => 32,
            HashChoice::Sha512 => 64,
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            HashChoice::Sha256 => 64,
            HashChoice::Sha512 => 128,
        }
    }
}

/// One-shot hash, used by HCG/DCG's `V := H(Sc || V || K || provider_pad)`
/// step. HCG and DCG never need a hasher that survives across calls —
/// each digest is over a freshly-built `Sc || V || ...` buffer — so
/// there is no stateful `update`/`finalize` adapter here to mirror
/// `HmacAdapter`'s; `sha2::Digest::digest` already is that one-shot call.
pub fn hash_once(choice: HashChoice, data: &[u8]) -> Vec<u8> {
    match choice {
        HashChoice::Sha256 => Sha256::digest(data).to_vec(),
        HashChoice::Sha512 => Sha512::digest(data).to_vec(),
    }
}
