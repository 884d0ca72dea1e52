//! CSR: buffered sampler over [`crate::drbg::Csg`].

use super::{BufferedPrng, DEFAULT_BUFFER_SIZE};
use crate::drbg::DrbgVariant;
use crate::entropy::EntropyProvider;
use crate::parallel::ParallelOptions;

pub struct Csr {
    pub(crate) inner: BufferedPrng,
}

impl Csr {
    pub fn new(provider: Option<Box<dyn EntropyProvider>>, parallel: ParallelOptions) -> Self {
        Self {
            inner: BufferedPrng::new(DrbgVariant::Csg, provider, parallel, DEFAULT_BUFFER_SIZE),
        }
    }

    pub fn with_buffer_size(provider: Option<Box<dyn EntropyProvider>>, parallel: ParallelOptions, buffer_size: usize) -> Self {
        Self {
            inner: BufferedPrng::new(DrbgVariant::Csg, provider, parallel, buffer_size),
        }
    }
}
