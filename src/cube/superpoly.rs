//! Superpoly evaluation and the offline linearity test.

use super::{CipherOracle, Cube, TriviumOracle, random_key};
use crate::{IvBits, KEY_BITS, KeyBits};
use log::trace;
use rand::Rng;

/// XOR of the first output bit over every assignment of `cube`, each from a
/// fresh oracle instance warmed up for `rounds` steps. IV positions outside
/// the cube come from `fixed_iv`.
pub fn evaluate_superpoly<O: CipherOracle + ?Sized>(
    oracle: &O,
    cube: &Cube,
    fixed_iv: &IvBits,
    rounds: usize,
) -> bool {
    oracle.xor_first_bits(&cube.assignments(fixed_iv), rounds)
}

/// [`evaluate_superpoly`] under a key the caller chooses.
pub fn evaluate_superpoly_with_key(
    cube: &Cube,
    key: &KeyBits,
    fixed_iv: &IvBits,
    rounds: usize,
) -> bool {
    evaluate_superpoly(&TriviumOracle::new(*key), cube, fixed_iv, rounds)
}

/// Probes whether the superpoly of `cube` equals a single key bit.
///
/// Starts with all 80 key indices as candidates. Each trial draws a random
/// key, evaluates the superpoly and keeps only the indices whose key bit
/// equals the observed value. Returns the index if exactly one candidate
/// survives all `trials`; an empty candidate set rejects the cube at once.
///
/// The test is probabilistic. A wrong index survives a trial with
/// probability 1/2, so for `t` trials:
///
/// - a constant or key-independent superpoly is accepted with probability
///   about `80 * 2^-t * (1 - 2^-t)^79` (~0.2 at `t = 5`, ~0.001 at `t = 16`);
/// - a true single-bit superpoly is accepted with probability
///   `(1 - 2^-t)^79` (~0.08 at `t = 5`, ~0.999 at `t = 16`).
pub fn try_identify_linearity<R: Rng + ?Sized>(
    cube: &Cube,
    rounds: usize,
    trials: usize,
    fixed_iv: &IvBits,
    rng: &mut R,
) -> Option<usize> {
    let mut candidates = [true; KEY_BITS];
    let mut remaining = KEY_BITS;

    for trial in 0..trials {
        let key = random_key(rng);
        let value = evaluate_superpoly_with_key(cube, &key, fixed_iv, rounds);
        for (alive, &bit) in candidates.iter_mut().zip(key.iter()) {
            if *alive && bit != value {
                *alive = false;
                remaining -= 1;
            }
        }
        if remaining == 0 {
            trace!("cube {cube} rejected after trial {}: no candidate left", trial + 1);
            return None;
        }
    }

    if remaining == 1 {
        candidates.iter().position(|&alive| alive)
    } else {
        trace!("cube {cube} rejected: {remaining} candidates left");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    const ZERO_IV: IvBits = [false; 80];

    #[test]
    fn test_known_superpolys_at_149_rounds() {
        // The first output bit after 149 steps contains the product
        // (k64 ^ v76)(k65 ^ v77), zero-based, and no other term in v76 or v77.
        let mut rng = StdRng::seed_from_u64(1);
        let high = Cube::new([77]).unwrap();
        let low = Cube::new([76]).unwrap();
        for _ in 0..20 {
            let key = random_key(&mut rng);
            assert_eq!(evaluate_superpoly_with_key(&high, &key, &ZERO_IV, 149), key[64]);
            assert_eq!(evaluate_superpoly_with_key(&low, &key, &ZERO_IV, 149), key[65]);
        }
    }

    #[test]
    fn test_identifies_known_linear_cube() {
        let mut rng = StdRng::seed_from_u64(2);
        let cube = Cube::new([77]).unwrap();
        assert_eq!(try_identify_linearity(&cube, 149, 24, &ZERO_IV, &mut rng), Some(64));
    }

    #[test]
    fn test_rejects_constant_superpoly() {
        // Without warm-up the first output bit is k65 ^ v68 ^ 1, so cube
        // {68} sums to the constant 1 and no key index can explain it once
        // enough trials have run.
        let mut rng = StdRng::seed_from_u64(4);
        let cube = Cube::new([68]).unwrap();
        for _ in 0..10 {
            let key = random_key(&mut rng);
            assert!(evaluate_superpoly_with_key(&cube, &key, &ZERO_IV, 0));
        }
        assert_eq!(try_identify_linearity(&cube, 0, 24, &ZERO_IV, &mut rng), None);
    }

    #[test]
    fn test_zero_trials_leave_every_candidate() {
        let mut rng = StdRng::seed_from_u64(6);
        let cube = Cube::new([77]).unwrap();
        assert_eq!(try_identify_linearity(&cube, 149, 0, &ZERO_IV, &mut rng), None);
    }

    #[test]
    fn test_fixed_iv_shifts_superpoly() {
        // With v76 fixed to one the superpoly of {77} becomes k64 ^ 1.
        let mut rng = StdRng::seed_from_u64(8);
        let mut fixed = ZERO_IV;
        fixed[76] = true;
        let cube = Cube::new([77]).unwrap();
        for _ in 0..10 {
            let key = random_key(&mut rng);
            assert_eq!(evaluate_superpoly_with_key(&cube, &key, &fixed, 149), !key[64]);
        }
    }
}
