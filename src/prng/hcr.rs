//! HCR: buffered sampler over [`crate::drbg::Hcg`].

use super::{BufferedPrng, DEFAULT_BUFFER_SIZE};
use crate::drbg::DrbgVariant;
use crate::entropy::EntropyProvider;
use crate::parallel::ParallelOptions;

pub struct Hcr {
    pub(crate) inner: BufferedPrng,
}

impl Hcr {
    pub fn new(provider: Option<Box<dyn EntropyProvider>>) -> Self {
        Self {
            inner: BufferedPrng::new(DrbgVariant::Hcg, provider, ParallelOptions::sequential(), DEFAULT_BUFFER_SIZE),
        }
    }

    pub fn with_buffer_size(provider: Option<Box<dyn EntropyProvider>>, buffer_size: usize) -> Self {
        Self {
            inner: BufferedPrng::new(DrbgVariant::Hcg, provider, ParallelOptions::sequential(), buffer_size),
        }
    }
}
