use core::fmt;

/// Error kinds shared by every generator, buffered PRNG, authenticated
/// stream, and entropy provider in this crate.
///
/// Parameter errors (`InvalidKey`, `InvalidNonce`, `InvalidInfo`,
/// `InvalidSize`, `InvalidParam`) never mutate state: a failed
/// `initialize` leaves the instance exactly as it was before the call.
/// Quota and entropy errors (`MaxRequest`, `MaxOutput`, `MaxReseed`,
/// `EntropyFailure`) are fatal for the instance; the caller must build
/// a new one. `AuthenticationFailure` is fatal only for the current
/// `transform` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CexError {
    /// Key length is not one of the generator's `LegalKeySizes`.
    InvalidKey,
    /// Nonce length is not one of the generator's `LegalKeySizes`.
    InvalidNonce,
    /// Info/customization length is not one of the generator's `LegalKeySizes`.
    InvalidInfo,
    /// A requested size (output length, subset size, range bound) is invalid.
    InvalidSize,
    /// A parameter outside the key container is invalid (e.g. parallel degree).
    InvalidParam,
    /// `generate`/`transform` called before `initialize`, or after `destroyed`.
    NotInitialized,
    /// An operation is not legal in the current lifecycle state.
    IllegalOperation,
    /// A single request exceeded `MAX_REQUEST` for this generator.
    MaxRequest,
    /// Cumulative lifetime output exceeded `MAX_OUTPUT` without a rekey.
    MaxOutput,
    /// `reseed_requests` exceeded `MAX_RESEED`; the instance must be rebuilt.
    MaxReseed,
    /// The entropy provider was exhausted, unavailable, or failed its
    /// continuous self-test.
    EntropyFailure,
    /// AEAD tag verification failed; no plaintext was released.
    AuthenticationFailure,
    /// The requested capability or variant is not supported on this build.
    NotSupported,
}

impl fmt::Display for CexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CexError::InvalidKey => write!(f, "key length is not a legal key size"),
            CexError::InvalidNonce => write!(f, "nonce length is not a legal nonce size"),
            CexError::InvalidInfo => write!(f, "info length is not a legal info size"),
            CexError::InvalidSize => write!(f, "requested size is invalid"),
            CexError::InvalidParam => write!(f, "parameter is invalid"),
            CexError::NotInitialized => write!(f, "generator is not initialized"),
            CexError::IllegalOperation => {
                write!(f, "operation is not legal in the current state")
            }
            CexError::MaxRequest => write!(f, "single request exceeds the maximum request size"),
            CexError::MaxOutput => write!(f, "cumulative output exceeds the maximum output size"),
            CexError::MaxReseed => write!(f, "maximum number of reseed requests exceeded"),
            CexError::EntropyFailure => write!(f, "entropy provider failed or was exhausted"),
            CexError::AuthenticationFailure => write!(f, "authentication tag did not verify"),
            CexError::NotSupported => write!(f, "capability is not supported on this build"),
        }
    }
}

impl std::error::Error for CexError {}
