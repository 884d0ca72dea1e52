//! Cryptographic primitives for deterministic random generation,
//! buffered PRNG sampling, and an authenticated stream cipher, built on
//! a small set of pluggable permutations (a block cipher, a hash, an
//! HMAC, and a cSHAKE XOF).
//!
//! # Modules
//! - [`drbg`] — the four deterministic random byte generators (BCG,
//!   CSG, HCG, DCG) behind one [`drbg::Drbg`] enum and [`drbg::DrbgEngine`]
//!   trait.
//! - [`prng`] — buffered, typed-integer samplers wrapping each DRBG
//!   variant ([`prng::Prng`]).
//! - [`authstream`] — an AEAD-shaped authenticated stream cipher
//!   ([`authstream::AuthenticatedStream`]).
//! - [`entropy`] — the [`entropy::EntropyProvider`] contract DRBGs use
//!   for reseeding, plus concrete providers and a FIPS 140-2 continuous
//!   self-test.
//! - [`permutation`] — the underlying block cipher / hash / HMAC / XOF
//!   adapters shared by the generators above.
//!
//! # Example
//! ```
//! use cex_drbg::drbg::{Drbg, DrbgVariant};
//! use cex_drbg::entropy::SystemCsp;
//! use cex_drbg::key::KeyContainer;
//! use cex_drbg::parallel::ParallelOptions;
//!
//! let mut drbg = Drbg::new(
//!     DrbgVariant::Hcg,
//!     Some(Box::new(SystemCsp::new())),
//!     ParallelOptions::sequential(),
//! );
//! let kc = KeyContainer::new(vec![0x5au8; 32]).with_nonce(vec![0xa5u8; 32]);
//! drbg.initialize(kc).expect("HCG accepts a 32-byte key");
//!
//! let mut out = vec![0u8; 64];
//! drbg.generate(&mut out).expect("generator is initialized");
//! ```

pub mod authstream;
pub mod cshake;
pub mod drbg;
pub mod entropy;
pub mod errors;
pub mod key;
pub mod parallel;
pub mod permutation;
pub mod prng;
pub mod secret;
pub mod traits;

pub use authstream::{AuthenticatedStream, AuthenticatorChoice};
pub use drbg::{Drbg, DrbgVariant};
pub use errors::CexError;
pub use key::KeyContainer;
pub use prng::{Prng, PrngVariant};
pub use secret::SecretBytes;
