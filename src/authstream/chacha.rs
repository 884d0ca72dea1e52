//! The ChaCha permutation and block-keystream generator, grounded on
//! the quarter-round structure in
//! `examples/other_examples/...xchacha20poly1305-chacha20.rs.rs`, but
//! using the original (non-IETF) layout the spec calls for: a 64-bit
//! little-endian counter in words 12-13 and a 64-bit nonce in words
//! 14-15, rather than RFC 8439's 32-bit counter + 96-bit nonce.

pub(crate) const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Default ChaCha20/CSX256 round count (10 double-rounds = 20 rounds).
pub const DEFAULT_ROUNDS: usize = 10;

/// A keyed ChaCha permutation, producing 64-byte keystream blocks
/// indexed by a 64-bit counter. `rounds` counts double-rounds (one
/// column pass + one diagonal pass), so `DEFAULT_ROUNDS = 10` gives the
/// standard 20-round ChaCha20.
pub struct ChaChaCipher {
    key: [u32; 8],
    nonce: [u32; 2],
    rounds: usize,
}

impl ChaChaCipher {
    pub fn new(key: &[u8; 32], nonce: &[u8; 8], rounds: usize) -> Self {
        let mut k = [0u32; 8];
        for i in 0..8 {
            k[i] = u32::from_le_bytes(key[i * 4..i * 4 + 4].try_into().expect("4-byte slice"));
        }
        let n0 = u32::from_le_bytes(nonce[0..4].try_into().expect("4-byte slice"));
        let n1 = u32::from_le_bytes(nonce[4..8].try_into().expect("4-byte slice"));
        Self {
            key: k,
            nonce: [n0, n1],
            rounds,
        }
    }

    #[inline(always)]
    fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
        state[a] = state[a].wrapping_add(state[b]);
        state[d] ^= state[a];
        state[d] = state[d].rotate_left(16);

        state[c] = state[c].wrapping_add(state[d]);
        state[b] ^= state[c];
        state[b] = state[b].rotate_left(12);

        state[a] = state[a].wrapping_add(state[b]);
        state[d] ^= state[a];
        state[d] = state[d].rotate_left(8);

        state[c] = state[c].wrapping_add(state[d]);
        state[b] ^= state[c];
        state[b] = state[b].rotate_left(7);
    }

    /// Produces one 64-byte keystream block for `counter`.
    pub fn block(&self, counter: u64) -> [u8; 64] {
        let mut state = [0u32; 16];
        state[0..4].copy_from_slice(&CONSTANTS);
        state[4..12].copy_from_slice(&self.key);
        state[12] = (counter & 0xffff_ffff) as u32;
        state[13] = (counter >> 32) as u32;
        state[14] = self.nonce[0];
        state[15] = self.nonce[1];
        let initial = state;

        for _ in 0..self.rounds {
            Self::quarter_round(&mut state, 0, 4, 8, 12);
            Self::quarter_round(&mut state, 1, 5, 9, 13);
            Self::quarter_round(&mut state, 2, 6, 10, 14);
            Self::quarter_round(&mut state, 3, 7, 11, 15);

            Self::quarter_round(&mut state, 0, 5, 10, 15);
            Self::quarter_round(&mut state, 1, 6, 11, 12);
            Self::quarter_round(&mut state, 2, 7, 8, 13);
            Self::quarter_round(&mut state, 3, 4, 9, 14);
        }

        let mut out = [0u8; 64];
        for i in 0..16 {
            let word = state[i].wrapping_add(initial[i]);
            out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// XORs `data` in place with the keystream starting at
    /// `start_counter`, returning the counter advanced by the number of
    /// 64-byte blocks consumed (the caller's running block index).
    pub fn apply_keystream(&self, data: &mut [u8], start_counter: u64) -> u64 {
        let mut counter = start_counter;
        for chunk in data.chunks_mut(64) {
            let ks = self.block(counter);
            for (byte, k) in chunk.iter_mut().zip(ks.iter()) {
                *byte ^= k;
            }
            counter = counter.wrapping_add(1);
        }
        counter
    }
}

impl Drop for ChaChaCipher {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keystream_is_deterministic_and_nonzero() {
        let key = [0x11u8; 32];
        let nonce = [0x22u8; 8];
        let cipher = ChaChaCipher::new(&key, &nonce, DEFAULT_ROUNDS);
        let a = cipher.block(0);
        let b = cipher.block(0);
        assert_eq!(a, b);
        assert!(a.iter().any(|&b| b != 0));
    }

    #[test]
    fn successive_blocks_differ() {
        let key = [0x11u8; 32];
        let nonce = [0x22u8; 8];
        let cipher = ChaChaCipher::new(&key, &nonce, DEFAULT_ROUNDS);
        assert_ne!(cipher.block(0), cipher.block(1));
    }

    #[test]
    fn apply_keystream_is_involutive() {
        let key = [0x33u8; 32];
        let nonce = [0x44u8; 8];
        let cipher = ChaChaCipher::new(&key, &nonce, DEFAULT_ROUNDS);
        let plaintext = b"the quick brown fox jumps over the lazy dog, twice over".to_vec();
        let mut buf = plaintext.clone();
        cipher.apply_keystream(&mut buf, 0);
        assert_ne!(buf, plaintext);
        cipher.apply_keystream(&mut buf, 0);
        assert_eq!(buf, plaintext);
    }
}
