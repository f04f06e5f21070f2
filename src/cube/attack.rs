//! The two-phase cube attack driver.

use super::superpoly::{evaluate_superpoly, try_identify_linearity};
use super::{CipherOracle, Cube, LinearRelation, MAX_CUBE_SIZE};
use crate::error::{Error, Result};
use crate::gf2::{LinearSystem, Solution};
use crate::{IV_BITS, IvBits, KEY_BITS, KeyBits};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Tuning knobs for the cube search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeAttackConfig {
    /// Random-key probes per candidate cube.
    pub trials: usize,
    /// Random cubes drawn for each size.
    pub cubes_per_size: usize,
    pub min_cube_size: usize,
    pub max_cube_size: usize,
    /// IV bits outside the cube.
    pub fixed_iv: IvBits,
}

impl Default for CubeAttackConfig {
    fn default() -> Self {
        Self {
            trials: 5,
            cubes_per_size: 20,
            min_cube_size: 1,
            max_cube_size: MAX_CUBE_SIZE,
            fixed_iv: [false; IV_BITS],
        }
    }
}

impl CubeAttackConfig {
    fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::InvalidConfig("trials must be at least 1"));
        }
        if self.min_cube_size == 0 || self.min_cube_size > self.max_cube_size {
            return Err(Error::InvalidConfig(
                "cube sizes must satisfy 1 <= min_cube_size <= max_cube_size",
            ));
        }
        if self.max_cube_size > MAX_CUBE_SIZE {
            return Err(Error::InvalidConfig("max_cube_size exceeds the supported maximum"));
        }
        Ok(())
    }
}

/// Counters and timing for one cube search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMetrics {
    pub rounds: usize,
    pub cubes_tested: usize,
    pub accepted: usize,
    pub elapsed: Duration,
}

/// Outcome of the offline phase.
#[derive(Debug, Clone)]
pub struct CubeSearch {
    pub relations: Vec<LinearRelation>,
    pub metrics: SearchMetrics,
}

/// Counters and timing for one key recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryMetrics {
    pub rounds: usize,
    pub relations: usize,
    pub equations_used: usize,
    pub elapsed: Duration,
}

/// The attack's estimate of the key.
///
/// Indices without a contributing equation are unrecovered: [`bit`]
/// returns `None` for them even though [`key_guess`] holds `false` there.
///
/// [`bit`]: KeyRecovery::bit
/// [`key_guess`]: KeyRecovery::key_guess
#[derive(Debug, Clone)]
pub struct KeyRecovery {
    key: KeyBits,
    recovered: [bool; KEY_BITS],
    conflicts: Vec<usize>,
    metrics: RecoveryMetrics,
}

impl KeyRecovery {
    /// The recovered value of key bit `index`, if any.
    pub fn bit(&self, index: usize) -> Option<bool> {
        (index < KEY_BITS && self.recovered[index]).then(|| self.key[index])
    }

    /// The full solver output, unrecovered positions defaulted to `false`.
    pub fn key_guess(&self) -> &KeyBits {
        &self.key
    }

    pub fn recovered_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..KEY_BITS).filter(|&i| self.recovered[i])
    }

    pub fn recovered_count(&self) -> usize {
        self.recovered.iter().filter(|&&r| r).count()
    }

    /// Key indices dropped because relations disagreed on their value.
    pub fn conflicts(&self) -> &[usize] {
        &self.conflicts
    }

    pub fn metrics(&self) -> &RecoveryMetrics {
        &self.metrics
    }

    /// Fraction of recovered bits that match `key`, `None` if nothing was
    /// recovered.
    pub fn accuracy_against(&self, key: &KeyBits) -> Option<f64> {
        let recovered = self.recovered_count();
        if recovered == 0 {
            return None;
        }
        let correct = self
            .recovered_indices()
            .filter(|&i| self.key[i] == key[i])
            .count();
        Some(correct as f64 / recovered as f64)
    }
}

/// Cube attack engine.
#[derive(Debug, Clone, Default)]
pub struct CubeAttack {
    config: CubeAttackConfig,
}

impl CubeAttack {
    /// # Errors
    /// [`Error::InvalidConfig`] for zero trials or cube sizes outside
    /// `1..=6`.
    pub fn new(config: CubeAttackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CubeAttackConfig {
        &self.config
    }

    /// Offline phase: samples random cubes of every configured size and
    /// keeps those that pass [`try_identify_linearity`] at `rounds`.
    ///
    /// Cubes and per-cube seeds are drawn from `rng` up front, then tested
    /// in parallel, each with its own generator. The result depends only on
    /// the state of `rng`, not on scheduling.
    pub fn find_linear_cubes<R: Rng + ?Sized>(&self, rounds: usize, rng: &mut R) -> CubeSearch {
        let start = Instant::now();
        let config = &self.config;

        let mut jobs: Vec<(Cube, u64)> = Vec::new();
        for size in config.min_cube_size..=config.max_cube_size {
            for _ in 0..config.cubes_per_size {
                let cube = Cube::sample(rng, size);
                jobs.push((cube, rng.next_u64()));
            }
        }
        let cubes_tested = jobs.len();

        let relations: Vec<LinearRelation> = jobs
            .into_par_iter()
            .filter_map(|(cube, seed)| {
                let mut rng = StdRng::seed_from_u64(seed);
                try_identify_linearity(&cube, rounds, config.trials, &config.fixed_iv, &mut rng)
                    .map(|key_index| LinearRelation { cube, key_index })
            })
            .collect();

        for relation in &relations {
            debug!(
                "linear cube {} -> key bit {} at {rounds} rounds",
                relation.cube, relation.key_index
            );
        }

        let metrics = SearchMetrics {
            rounds,
            cubes_tested,
            accepted: relations.len(),
            elapsed: start.elapsed(),
        };
        info!(
            "cube search at {rounds} rounds: {}/{} cubes accepted in {:?}",
            metrics.accepted, metrics.cubes_tested, metrics.elapsed
        );

        CubeSearch { relations, metrics }
    }

    /// Online phase: evaluates each relation's cube against `oracle`, turns
    /// each observation into `key[index] = value` and solves.
    ///
    /// When relations disagree on a key bit the full system is
    /// inconsistent; every disagreeing index is then dropped and left
    /// unrecovered, and the rest is solved.
    pub fn recover_key<O: CipherOracle + ?Sized>(
        &self,
        relations: &[LinearRelation],
        oracle: &O,
        rounds: usize,
    ) -> KeyRecovery {
        let start = Instant::now();
        let fixed_iv = &self.config.fixed_iv;

        let observed: Vec<bool> = relations
            .par_iter()
            .map(|relation| evaluate_superpoly(oracle, &relation.cube, fixed_iv, rounds))
            .collect();

        let mut equations: Vec<(usize, bool)> = relations
            .iter()
            .map(LinearRelation::key_index)
            .zip(observed)
            .collect();

        let mut conflicts = Vec::new();
        let solution = solve_units(&equations).or_else(|| {
            conflicts = conflicting_indices(&equations);
            for index in &conflicts {
                warn!("relations disagree on key bit {index}; leaving it unrecovered");
            }
            equations.retain(|(index, _)| !conflicts.contains(index));
            solve_units(&equations)
        });

        let mut key = [false; KEY_BITS];
        let mut recovered = [false; KEY_BITS];
        if let Some(solution) = solution {
            for &(index, _) in &equations {
                key[index] = solution.values()[index];
                recovered[index] = solution.is_determined(index);
            }
        }

        let metrics = RecoveryMetrics {
            rounds,
            relations: relations.len(),
            equations_used: equations.len(),
            elapsed: start.elapsed(),
        };
        let result = KeyRecovery {
            key,
            recovered,
            conflicts,
            metrics,
        };
        info!(
            "recovered {} key bits from {} relations in {:?}",
            result.recovered_count(),
            result.metrics.relations,
            result.metrics.elapsed
        );
        result
    }
}

/// One unit row per equation; `None` if the rows contradict each other.
fn solve_units(equations: &[(usize, bool)]) -> Option<Solution> {
    let mut system = LinearSystem::new(KEY_BITS);
    for &(index, value) in equations {
        system.push_unit(index, value).ok()?;
    }
    system.solve()
}

/// Key indices that appear with both values.
fn conflicting_indices(equations: &[(usize, bool)]) -> Vec<usize> {
    let mut seen: BTreeMap<usize, [bool; 2]> = BTreeMap::new();
    for &(index, value) in equations {
        seen.entry(index).or_default()[value as usize] = true;
    }
    seen.into_iter()
        .filter(|(_, [zero, one])| *zero && *one)
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{TriviumOracle, random_key};

    fn relation(cube: &[usize], key_index: usize) -> LinearRelation {
        LinearRelation::new(Cube::new(cube.iter().copied()).unwrap(), key_index).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(CubeAttack::new(CubeAttackConfig::default()).is_ok());
        let bad = [
            CubeAttackConfig { trials: 0, ..Default::default() },
            CubeAttackConfig { min_cube_size: 0, ..Default::default() },
            CubeAttackConfig { min_cube_size: 4, max_cube_size: 3, ..Default::default() },
            CubeAttackConfig { max_cube_size: 7, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(CubeAttack::new(config), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_recovers_bits_from_known_relations() {
        let mut rng = StdRng::seed_from_u64(21);
        let key = random_key(&mut rng);
        let oracle = TriviumOracle::new(key);
        let relations = [relation(&[77], 64), relation(&[76], 65)];

        let result = CubeAttack::default().recover_key(&relations, &oracle, 149);
        assert_eq!(result.bit(64), Some(key[64]));
        assert_eq!(result.bit(65), Some(key[65]));
        assert_eq!(result.recovered_count(), 2);
        assert_eq!(result.bit(0), None);
        assert_eq!(result.accuracy_against(&key), Some(1.0));
        assert!(result.conflicts().is_empty());
    }

    #[test]
    fn test_redundant_relations_at_288_rounds() {
        // {7} and {52} both isolate key bit 9 at 288 rounds.
        let mut rng = StdRng::seed_from_u64(22);
        let key = random_key(&mut rng);
        let oracle = TriviumOracle::new(key);
        let relations = [
            relation(&[6], 10),
            relation(&[37], 24),
            relation(&[69], 58),
            relation(&[7], 9),
            relation(&[52], 9),
            relation(&[70], 57),
        ];

        let result = CubeAttack::default().recover_key(&relations, &oracle, 288);
        assert_eq!(result.recovered_indices().collect::<Vec<_>>(), vec![9, 10, 24, 57, 58]);
        assert_eq!(result.accuracy_against(&key), Some(1.0));
        assert_eq!(result.metrics().equations_used, 6);
    }

    #[test]
    fn test_conflicting_relations_leave_bit_unrecovered() {
        // {76} really isolates bit 65; claiming it for 64 conflicts with
        // {77} whenever the two key bits differ.
        let mut key = [false; KEY_BITS];
        key[64] = true;
        let oracle = TriviumOracle::new(key);
        let relations = [relation(&[77], 64), relation(&[76], 64), relation(&[6], 10)];

        let result = CubeAttack::default().recover_key(&relations, &oracle, 149);
        assert_eq!(result.conflicts(), &[64]);
        assert_eq!(result.bit(64), None);
        assert_eq!(result.metrics().equations_used, 1);
    }

    #[test]
    fn test_empty_relations_recover_nothing() {
        let oracle = TriviumOracle::new([true; KEY_BITS]);
        let result = CubeAttack::default().recover_key(&[], &oracle, 288);
        assert_eq!(result.recovered_count(), 0);
        assert_eq!(result.accuracy_against(&[true; KEY_BITS]), None);
    }

    #[test]
    fn test_search_is_deterministic_for_a_seed() {
        let attack = CubeAttack::new(CubeAttackConfig {
            cubes_per_size: 4,
            max_cube_size: 3,
            ..Default::default()
        })
        .unwrap();
        let first = attack.find_linear_cubes(200, &mut StdRng::seed_from_u64(99));
        let second = attack.find_linear_cubes(200, &mut StdRng::seed_from_u64(99));
        assert_eq!(first.relations, second.relations);
        assert_eq!(first.metrics.cubes_tested, 12);
        assert_eq!(first.metrics.accepted, first.relations.len());
    }

    #[test]
    fn test_conflicting_indices() {
        let equations = [(3, true), (5, false), (3, false), (5, false), (1, true)];
        assert_eq!(conflicting_indices(&equations), vec![3]);
    }
}
