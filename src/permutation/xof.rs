//! XOF adapter: cSHAKE128/256, used by CSG directly and by BCG's key
//! schedule. Wraps `crate::cshake`.

use crate::cshake::CShakeSponge;
use digest::XofReader;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum XofStrength {
    Shake128,
    Shake256,
}

impl XofStrength {
    fn bits(self) -> usize {
        match self {
            XofStrength::Shake128 => 128,
            XofStrength::Shake256 => 256,
        }
    }
}

/// An absorb-then-squeeze sponge adapter over cSHAKE. Once squeezing
/// starts (`start_squeeze`), the sponge can be read from repeatedly —
/// absorbing more input requires a fresh `initialize`.
pub struct XofAdapter {
    sponge: Option<CShakeSponge>,
    reader: Option<Box<dyn XofReader>>,
    strength: XofStrength,
}

impl XofAdapter {
    pub fn new(strength: XofStrength) -> Self {
        Self {
            sponge: None,
            reader: None,
            strength,
        }
    }

    pub fn rate(&self) -> usize {
        match self.strength {
            XofStrength::Shake128 => 168,
            XofStrength::Shake256 => 136,
        }
    }

    pub fn initialize(&mut self, function_name: &[u8], customization: &[u8]) {
        self.sponge = Some(CShakeSponge::new(
            self.strength.bits(),
            function_name,
            customization,
        ));
        self.reader = None;
    }

    pub fn absorb(&mut self, data: &[u8]) {
        self.sponge
            .as_mut()
            .expect("xof adapter not initialized")
            .absorb(data);
    }

    /// Reads the next `out.len()` bytes of the keystream, starting the
    /// squeeze phase on first call and continuing it on subsequent
    /// calls, so a sequence of reads is one continuous stream.
    pub fn squeeze(&mut self, out: &mut [u8]) {
        if self.reader.is_none() {
            let sponge = self.sponge.take().expect("xof adapter not initialized");
            self.reader = Some(sponge.finalize_xof());
        }
        self.reader
            .as_mut()
            .expect("squeeze reader is present after initialization")
            .read(out);
    }
}
