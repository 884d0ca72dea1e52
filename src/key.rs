use crate::errors::CexError;
use crate::secret::SecretBytes;

/// Secret keying material handed to a generator's `initialize` function.
///
/// `key` is mandatory; `nonce` and `info` are optional depending on the
/// generator. All three fields are secret, random, and zeroized on
/// drop via [`SecretBytes`]. `info` seeds the customization /
/// distribution code used for domain separation.
#[derive(Clone, Default)]
pub struct KeyContainer {
    pub key: SecretBytes,
    pub nonce: Option<SecretBytes>,
    pub info: Option<SecretBytes>,
}

impl KeyContainer {
    pub fn new(key: impl Into<SecretBytes>) -> Self {
        Self {
            key: key.into(),
            nonce: None,
            info: None,
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<SecretBytes>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<SecretBytes>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn nonce_slice(&self) -> &[u8] {
        self.nonce.as_deref().unwrap_or(&[])
    }

    pub fn info_slice(&self) -> &[u8] {
        self.info.as_deref().unwrap_or(&[])
    }
}

/// One supported `(key_size, nonce_size, info_size)` shape.
///
/// A size of `None` means the field is either unused or unconstrained
/// in length for that shape (e.g. HCG accepts info of any length).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeySize {
    pub key_size: usize,
    pub nonce_size: Option<usize>,
    pub info_size: Option<usize>,
}

impl KeySize {
    pub const fn new(key_size: usize, nonce_size: Option<usize>, info_size: Option<usize>) -> Self {
        Self {
            key_size,
            nonce_size,
            info_size,
        }
    }
}

/// Ordered list of supported key/nonce/info shapes for one generator.
///
/// Index 1 (the second entry), when present, is the *recommended*
/// size as described in `examples/original_source/CEX/BCG.h`
/// ("there are three LegalKeySizes, minimum, recommended, and
/// maximum... the middle value is the recommended seed length").
#[derive(Clone, Debug)]
pub struct LegalKeySizes(pub Vec<KeySize>);

impl LegalKeySizes {
    pub fn recommended(&self) -> Option<&KeySize> {
        self.0.get(1).or_else(|| self.0.first())
    }

    pub fn contains_key_len(&self, len: usize) -> bool {
        self.0.iter().any(|k| k.key_size == len)
    }

    pub fn matching(&self, len: usize) -> Option<&KeySize> {
        self.0.iter().find(|k| k.key_size == len)
    }

    pub fn validate(&self, kc: &KeyContainer) -> Result<&KeySize, CexError> {
        let shape = self.matching(kc.key.len()).ok_or(CexError::InvalidKey)?;
        if let Some(expected) = shape.nonce_size {
            let got = kc.nonce.as_ref().map(|n| n.len()).unwrap_or(0);
            if got != 0 && got != expected {
                return Err(CexError::InvalidNonce);
            }
        }
        if let Some(expected) = shape.info_size {
            let got = kc.info.as_ref().map(|n| n.len()).unwrap_or(0);
            if got != 0 && got != expected {
                return Err(CexError::InvalidInfo);
            }
        }
        Ok(shape)
    }
}
