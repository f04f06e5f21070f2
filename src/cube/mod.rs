//! Cube attack on reduced-round Trivium.
//!
//! A cube is a small set of IV positions. Summing the first keystream bit
//! over every assignment of those positions yields the *superpoly*, a
//! polynomial in the key. When that polynomial is a single key bit the cube
//! gives one linear equation on the key.
//!
//! The attack runs in two phases:
//!
//! ```text
//! offline  find_linear_cubes   random cubes -> try_identify_linearity -> LinearRelation
//! online   recover_key         LinearRelation x oracle -> observed bits -> gf2 -> KeyRecovery
//! ```

use crate::core::TriviumCore;
use crate::error::{CubeError, Error, Result};
use crate::{IV_BITS, IvBits, KEY_BITS, KeyBits, backends};
use rand::Rng;
use std::fmt;
use zeroize::Zeroize;

pub mod attack;
pub mod superpoly;

/// Largest supported cube; `2^6` assignments fill one bit-sliced batch.
pub const MAX_CUBE_SIZE: usize = 6;

/// An ordered, duplicate-free set of IV positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cube(Vec<usize>);

impl Cube {
    /// Builds a cube from IV positions in any order.
    ///
    /// # Errors
    /// Empty or oversized sets, positions outside `0..80`, and repeated
    /// positions are rejected.
    pub fn new(indices: impl IntoIterator<Item = usize>) -> std::result::Result<Self, CubeError> {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        if indices.is_empty() {
            return Err(CubeError::Empty);
        }
        if indices.len() > MAX_CUBE_SIZE {
            return Err(CubeError::TooLarge(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= IV_BITS) {
            return Err(CubeError::IndexOutOfRange(index));
        }
        indices.sort_unstable();
        if let Some(pair) = indices.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(CubeError::Duplicate(pair[0]));
        }
        Ok(Self(indices))
    }

    /// Draws `size` distinct IV positions uniformly at random.
    pub(crate) fn sample<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Self {
        debug_assert!((1..=MAX_CUBE_SIZE).contains(&size));
        let mut indices = rand::seq::index::sample(rng, IV_BITS, size).into_vec();
        indices.sort_unstable();
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed cube; pairs with [`Cube::len`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every IV obtained from `base` by assigning the cube positions, in
    /// counting order (bit `j` of the counter drives `indices()[j]`).
    pub fn assignments(&self, base: &IvBits) -> Vec<IvBits> {
        (0..1usize << self.len())
            .map(|mask| {
                let mut iv = *base;
                for (j, &pos) in self.0.iter().enumerate() {
                    iv[pos] = (mask >> j) & 1 == 1;
                }
                iv
            })
            .collect()
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "}}")
    }
}

/// A cube whose superpoly is believed to equal one key bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinearRelation {
    cube: Cube,
    key_index: usize,
}

impl LinearRelation {
    /// # Errors
    /// [`Error::KeyIndexOutOfRange`] if `key_index >= 80`.
    pub fn new(cube: Cube, key_index: usize) -> Result<Self> {
        if key_index >= KEY_BITS {
            return Err(Error::KeyIndexOutOfRange(key_index));
        }
        Ok(Self { cube, key_index })
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn key_index(&self) -> usize {
        self.key_index
    }
}

/// Anything that yields keystream bits one step at a time.
pub trait KeystreamGenerator {
    fn step(&mut self) -> bool;
}

impl KeystreamGenerator for TriviumCore {
    #[inline]
    fn step(&mut self) -> bool {
        TriviumCore::step(self)
    }
}

/// A cipher under a key the caller cannot see.
///
/// Only fresh instances for chosen IVs are available. Implementations must
/// be shareable across threads, since the online phase evaluates relations
/// in parallel.
pub trait CipherOracle: Sync {
    type Instance: KeystreamGenerator;

    /// A fresh instance for `iv`, after `warmup` update steps.
    fn initialize(&self, iv: &IvBits, warmup: usize) -> Self::Instance;

    /// XOR of the first output bit over fresh instances for every IV.
    ///
    /// The default runs one instance at a time; implementations may batch.
    fn xor_first_bits(&self, ivs: &[IvBits], warmup: usize) -> bool {
        ivs.iter()
            .fold(false, |acc, iv| acc ^ self.initialize(iv, warmup).step())
    }
}

/// Trivium under a hidden key.
#[derive(Clone)]
pub struct TriviumOracle {
    key: KeyBits,
}

impl TriviumOracle {
    pub fn new(key: KeyBits) -> Self {
        Self { key }
    }
}

impl fmt::Debug for TriviumOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriviumOracle").finish_non_exhaustive()
    }
}

impl Drop for TriviumOracle {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl CipherOracle for TriviumOracle {
    type Instance = TriviumCore;

    fn initialize(&self, iv: &IvBits, warmup: usize) -> TriviumCore {
        TriviumCore::with_warmup(&self.key, iv, warmup)
    }

    fn xor_first_bits(&self, ivs: &[IvBits], warmup: usize) -> bool {
        backends::xor_first_bits(&self.key, ivs, warmup)
    }
}

/// A uniformly random 80-bit key.
pub fn random_key<R: Rng + ?Sized>(rng: &mut R) -> KeyBits {
    std::array::from_fn(|_| rng.gen_bool(0.5))
}
