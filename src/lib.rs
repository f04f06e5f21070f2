//! Trivium stream cipher and a cube-attack engine for reduced-round variants.
//!
//! The cipher core is compatible with the `cipher` crate traits, with the
//! core logic kept apart from the trait implementations. On top of it sit a
//! byte-level facade ([`Trivium`]), the offline/online cube attack
//! ([`cube`]), a GF(2) linear solver ([`gf2`]) and simple keystream
//! statistics ([`stats`]).
//!
//! The number of warm-up steps is a parameter everywhere. Full Trivium uses
//! [`DEFAULT_WARMUP`]; the attack targets far smaller values.

pub use cipher; // Re-export cipher crate for downstream users

// --- Core Cipher Logic ---

pub(crate) mod core;

// --- Backends ---
pub(crate) mod backends;

pub mod bits;
pub mod cube;
pub mod error;
pub mod gf2;
pub mod stats;
pub mod stream;

// --- Constants ---
pub const KEY_BITS: usize = 80;
pub const IV_BITS: usize = 80;
pub const KEY_BYTES: usize = KEY_BITS / 8;
pub const IV_BYTES: usize = IV_BITS / 8;
/// Warm-up steps of the full cipher (4 * 288).
pub const DEFAULT_WARMUP: usize = 1152;

// --- Convenience Type Aliases for Users ---
pub type KeyBits = [bool; KEY_BITS];
pub type IvBits = [bool; IV_BITS];
pub type TriviumCipher = cipher::StreamCipherCoreWrapper<TriviumCore>;

pub use crate::core::TriviumCore;
pub use crate::cube::attack::{CubeAttack, CubeAttackConfig, CubeSearch, KeyRecovery};
pub use crate::cube::{CipherOracle, Cube, KeystreamGenerator, LinearRelation, TriviumOracle};
pub use crate::error::{CubeError, Error, Result};
pub use crate::gf2::LinearSystem;
pub use crate::stream::Trivium;
