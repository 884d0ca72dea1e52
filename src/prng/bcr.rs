//! BCR: buffered sampler over [`crate::drbg::Bcg`].

use super::{BufferedPrng, DEFAULT_BUFFER_SIZE};
use crate::drbg::DrbgVariant;
use crate::entropy::EntropyProvider;
use crate::parallel::ParallelOptions;

pub struct Bcr {
    pub(crate) inner: BufferedPrng,
}

impl Bcr {
    pub fn new(provider: Option<Box<dyn EntropyProvider>>, parallel: ParallelOptions) -> Self {
        Self {
            inner: BufferedPrng::new(DrbgVariant::Bcg, provider, parallel, DEFAULT_BUFFER_SIZE),
        }
    }

    pub fn with_buffer_size(provider: Option<Box<dyn EntropyProvider>>, parallel: ParallelOptions, buffer_size: usize) -> Self {
        Self {
            inner: BufferedPrng::new(DrbgVariant::Bcg, provider, parallel, buffer_size),
        }
    }
}
