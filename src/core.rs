use crate::error::{Error, Result};
use crate::{DEFAULT_WARMUP, IV_BITS, IV_BYTES, IvBits, KEY_BITS, KEY_BYTES, KeyBits, backends, bits};
use cipher::{
    BlockSizeUser, Iv, IvSizeUser, Key, KeyIvInit, KeySizeUser, StreamCipherCore, StreamClosure,
    consts::{U1, U10},
};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Register lengths in bits.
pub(crate) const A_LEN: usize = 93;
pub(crate) const B_LEN: usize = 84;
pub(crate) const C_LEN: usize = 111;

/// Tap positions (1-based, inside one register) for one feedback value.
///
/// `out` feeds both the keystream bit and the feedback, `and` is the
/// quadratic term from the same register, `next` the linear term from the
/// following register.
pub(crate) struct Taps {
    pub(crate) out: [usize; 2],
    pub(crate) and: [usize; 2],
    pub(crate) next: usize,
}

/// `t1`: register A, inserted into B.
pub(crate) const T1: Taps = Taps { out: [66, 93], and: [91, 92], next: 78 };
/// `t2`: register B, inserted into C.
pub(crate) const T2: Taps = Taps { out: [69, 84], and: [82, 83], next: 87 };
/// `t3`: register C, inserted into A.
pub(crate) const T3: Taps = Taps { out: [66, 111], and: [109, 110], next: 69 };

/// Positions of register C forced to one at load time.
pub(crate) const C_ONES: [usize; 3] = [109, 110, 111];

/// The Trivium state: registers A, B and C as 93, 84 and 111 bit words.
///
/// Bit `p - 1` of a word is register position `p`. Every update shifts
/// towards the high end and inserts the feedback bit at position 1.
#[derive(Clone)]
pub struct TriviumCore {
    /// Registers A, B, C
    pub(crate) state: [u128; 3],
    /// Keystream bytes produced through the block interface
    pub(crate) counter: u64,
}

impl TriviumCore {
    /// Loads `key` and `iv` and runs `warmup` update steps.
    ///
    /// Key bit `i` goes to position `i + 1` of register A, IV bit `i` to
    /// position `i + 1` of register B, and the three last positions of C
    /// are set to one.
    pub fn with_warmup(key: &KeyBits, iv: &IvBits, warmup: usize) -> Self {
        let pack = |word: &[bool; 80]| {
            word.iter()
                .enumerate()
                .fold(0u128, |acc, (i, &bit)| acc | ((bit as u128) << i))
        };
        let c = C_ONES.iter().fold(0u128, |acc, &p| acc | (1u128 << (p - 1)));

        let mut core = Self {
            state: [pack(key), pack(iv), c],
            counter: 0,
        };
        core.warm_up(warmup);
        core
    }

    /// Builds a core from bit slices, checking that both are 80 bits long.
    ///
    /// # Errors
    /// [`Error::InvalidKeyLength`] or [`Error::InvalidIvLength`] on any
    /// other length.
    pub fn from_bits(key: &[bool], iv: &[bool], warmup: usize) -> Result<Self> {
        let key: KeyBits = bits::to_array(key).ok_or(Error::InvalidKeyLength(key.len()))?;
        let iv: IvBits = bits::to_array(iv).ok_or(Error::InvalidIvLength(iv.len()))?;
        Ok(Self::with_warmup(&key, &iv, warmup))
    }

    /// Builds a core from 10-byte key and IV buffers.
    ///
    /// # Errors
    /// Length errors report the number of bits supplied.
    pub fn from_bytes(key: &[u8], iv: &[u8], warmup: usize) -> Result<Self> {
        if key.len() != KEY_BYTES {
            return Err(Error::InvalidKeyLength(key.len() * 8));
        }
        if iv.len() != IV_BYTES {
            return Err(Error::InvalidIvLength(iv.len() * 8));
        }
        Self::from_bits(&bits::unpack_msb_first(key), &bits::unpack_msb_first(iv), warmup)
    }

    /// Runs `steps` updates, discarding the output.
    pub fn warm_up(&mut self, steps: usize) {
        for _ in 0..steps {
            backends::soft::clock(&mut self.state);
        }
    }

    /// Advances the state by one update and returns the output bit.
    #[inline]
    pub fn step(&mut self) -> bool {
        backends::soft::clock(&mut self.state)
    }

    /// Returns the next `n` keystream bits. Advances the state by `n` steps.
    pub fn keystream_bits(&mut self, n: usize) -> Vec<bool> {
        (0..n).map(|_| self.step()).collect()
    }

    /// Returns the next 8 keystream bits packed LSB-first.
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        (0..8).fold(0u8, |acc, j| acc | ((self.step() as u8) << j))
    }

    /// Number of keystream bytes produced through the `cipher` traits.
    pub fn block_pos(&self) -> u64 {
        self.counter
    }
}

impl fmt::Debug for TriviumCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriviumCore")
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

impl Drop for TriviumCore {
    fn drop(&mut self) {
        self.state.zeroize();
        self.counter.zeroize();
    }
}

impl ZeroizeOnDrop for TriviumCore {}

impl KeySizeUser for TriviumCore {
    type KeySize = U10;
}

impl IvSizeUser for TriviumCore {
    type IvSize = U10;
}

impl BlockSizeUser for TriviumCore {
    type BlockSize = U1; // one keystream byte per block
}

impl KeyIvInit for TriviumCore {
    fn new(key: &Key<Self>, iv: &Iv<Self>) -> Self {
        let mut key_bits = [false; KEY_BITS];
        let mut iv_bits = [false; IV_BITS];
        for (dst, src) in key_bits.iter_mut().zip(bits::unpack_msb_first(key)) {
            *dst = src;
        }
        for (dst, src) in iv_bits.iter_mut().zip(bits::unpack_msb_first(iv)) {
            *dst = src;
        }
        Self::with_warmup(&key_bits, &iv_bits, DEFAULT_WARMUP)
    }
}

impl StreamCipherCore for TriviumCore {
    fn remaining_blocks(&self) -> Option<usize> {
        None
    }

    fn process_with_backend(&mut self, f: impl StreamClosure<BlockSize = Self::BlockSize>) {
        f.call(&mut backends::soft::Backend(self));
    }
}
