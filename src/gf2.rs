//! Linear systems over GF(2).
//!
//! Rows are packed into `u64` words so that a row operation is a word-wise
//! XOR. Systems here are small (at most 80 unknowns for key recovery), so
//! elimination is plain and single-threaded.

use crate::error::{Error, Result};

const WORD: usize = u64::BITS as usize;

/// A packed row of coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    words: Vec<u64>,
    rhs: bool,
}

impl Row {
    fn zero(variables: usize, rhs: bool) -> Self {
        Self {
            words: vec![0; variables.div_ceil(WORD)],
            rhs,
        }
    }

    #[inline]
    fn get(&self, col: usize) -> bool {
        (self.words[col / WORD] >> (col % WORD)) & 1 == 1
    }

    #[inline]
    fn set(&mut self, col: usize) {
        self.words[col / WORD] |= 1 << (col % WORD);
    }

    fn xor_assign(&mut self, other: &Row) {
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w ^= o;
        }
        self.rhs ^= other.rhs;
    }

    fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }
}

/// A system of linear equations over GF(2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearSystem {
    variables: usize,
    rows: Vec<Row>,
}

/// A solution vector together with what elimination learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    values: Vec<bool>,
    determined: Vec<bool>,
    rank: usize,
}

impl Solution {
    /// Value of every variable; free variables are `false`.
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    pub fn into_values(self) -> Vec<bool> {
        self.values
    }

    /// Rank of the coefficient matrix.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// `true` when the system pins `var` to a single value.
    ///
    /// A pivot variable is determined unless its row still references a
    /// free variable after back-substitution.
    pub fn is_determined(&self, var: usize) -> bool {
        self.determined.get(var).copied().unwrap_or(false)
    }

    /// `true` when every variable is determined.
    pub fn is_unique(&self) -> bool {
        self.rank == self.values.len()
    }
}

impl LinearSystem {
    /// An empty system in `variables` unknowns.
    pub fn new(variables: usize) -> Self {
        Self {
            variables,
            rows: Vec::new(),
        }
    }

    /// Builds a system from a dense `m x v` matrix and an `m`-vector.
    ///
    /// # Errors
    /// [`Error::DimensionMismatch`] if the rows are ragged or `rhs` has the
    /// wrong length.
    pub fn from_dense(matrix: &[Vec<bool>], rhs: &[bool]) -> Result<Self> {
        if matrix.len() != rhs.len() {
            return Err(Error::DimensionMismatch {
                expected: matrix.len(),
                got: rhs.len(),
            });
        }
        let variables = matrix.first().map_or(0, Vec::len);
        let mut system = Self::new(variables);
        for (row, &value) in matrix.iter().zip(rhs) {
            system.push_equation(row, value)?;
        }
        Ok(system)
    }

    pub fn variables(&self) -> usize {
        self.variables
    }

    pub fn equations(&self) -> usize {
        self.rows.len()
    }

    /// Appends `sum(coeffs[i] * x_i) = rhs`.
    ///
    /// # Errors
    /// [`Error::DimensionMismatch`] if `coeffs` does not have one entry per
    /// variable.
    pub fn push_equation(&mut self, coeffs: &[bool], rhs: bool) -> Result<()> {
        if coeffs.len() != self.variables {
            return Err(Error::DimensionMismatch {
                expected: self.variables,
                got: coeffs.len(),
            });
        }
        let mut row = Row::zero(self.variables, rhs);
        for (col, _) in coeffs.iter().enumerate().filter(|(_, c)| **c) {
            row.set(col);
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends `x_var = rhs`.
    ///
    /// # Errors
    /// [`Error::DimensionMismatch`] if `var` is not a variable of the system.
    pub fn push_unit(&mut self, var: usize, rhs: bool) -> Result<()> {
        if var >= self.variables {
            return Err(Error::DimensionMismatch {
                expected: self.variables,
                got: var + 1,
            });
        }
        let mut row = Row::zero(self.variables, rhs);
        row.set(var);
        self.rows.push(row);
        Ok(())
    }

    /// Solves the system by Gaussian elimination and back-substitution.
    ///
    /// Returns `None` when elimination leaves a row `0 = 1`. An
    /// under-determined system still yields a vector, with free variables
    /// set to `false`; check [`Solution::is_determined`] before trusting a
    /// value.
    pub fn solve(&self) -> Option<Solution> {
        let mut rows = self.rows.clone();
        let mut pivots: Vec<usize> = Vec::new();

        // Forward elimination: the first row at or below the current rank
        // with a one in the column becomes the pivot.
        for col in 0..self.variables {
            let rank = pivots.len();
            let Some(found) = (rank..rows.len()).find(|&r| rows[r].get(col)) else {
                continue;
            };
            rows.swap(rank, found);
            let (upper, lower) = rows.split_at_mut(rank + 1);
            let pivot = &upper[rank];
            for row in lower.iter_mut().filter(|row| row.get(col)) {
                row.xor_assign(pivot);
            }
            pivots.push(col);
        }

        let rank = pivots.len();
        if rows[rank..].iter().any(|row| row.is_zero() && row.rhs) {
            return None;
        }

        // Back-substitution, last pivot first.
        let mut values = vec![false; self.variables];
        let mut determined = vec![false; self.variables];
        for (r, &col) in pivots.iter().enumerate().rev() {
            let row = &rows[r];
            let mut value = row.rhs;
            let mut depends_on_free = false;
            for other in col + 1..self.variables {
                if row.get(other) {
                    value ^= values[other];
                    depends_on_free |= !determined[other];
                }
            }
            values[col] = value;
            determined[col] = !depends_on_free;
        }

        Some(Solution {
            values,
            determined,
            rank,
        })
    }
}

/// Solves `matrix * x = rhs` over GF(2).
///
/// # Errors
/// [`Error::DimensionMismatch`] on malformed input. An inconsistent system
/// is `Ok(None)`.
pub fn solve(matrix: &[Vec<bool>], rhs: &[bool]) -> Result<Option<Vec<bool>>> {
    Ok(LinearSystem::from_dense(matrix, rhs)?
        .solve()
        .map(Solution::into_values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

    #[test]
    fn test_unit_rows_return_rhs_for_every_size() {
        let mut rng = StdRng::seed_from_u64(5);
        for k in 1..=80 {
            let mut indices: Vec<usize> = (0..80).collect();
            indices.shuffle(&mut rng);
            let chosen = &indices[..k];
            let rhs: Vec<bool> = (0..k).map(|_| rng.gen_bool(0.5)).collect();

            let mut system = LinearSystem::new(80);
            for (&var, &value) in chosen.iter().zip(&rhs) {
                system.push_unit(var, value).unwrap();
            }
            let solution = system.solve().expect("unit rows are consistent");
            assert_eq!(solution.rank(), k);
            for (&var, &value) in chosen.iter().zip(&rhs) {
                assert_eq!(solution.values()[var], value);
                assert!(solution.is_determined(var));
            }
            assert_eq!(solution.is_unique(), k == 80);
        }
    }

    #[test]
    fn test_dense_system() {
        // x0 ^ x1 = 1, x1 ^ x2 = 0, x0 ^ x1 ^ x2 = 0
        let matrix = vec![
            vec![true, true, false],
            vec![false, true, true],
            vec![true, true, true],
        ];
        let x = solve(&matrix, &[true, false, false]).unwrap().unwrap();
        assert_eq!(x, vec![false, true, true]);
    }

    #[test]
    fn test_inconsistent_system() {
        let mut system = LinearSystem::new(4);
        system.push_unit(2, true).unwrap();
        system.push_unit(2, false).unwrap();
        assert!(system.solve().is_none());
    }

    #[test]
    fn test_redundant_rows_are_consistent() {
        let mut system = LinearSystem::new(4);
        system.push_unit(1, true).unwrap();
        system.push_unit(1, true).unwrap();
        system.push_equation(&[true, true, false, false], false).unwrap();
        let solution = system.solve().unwrap();
        assert_eq!(solution.values(), &[true, true, false, false]);
        assert_eq!(solution.rank(), 2);
        assert!(solution.is_determined(0));
        assert!(!solution.is_determined(3));
    }

    #[test]
    fn test_free_variable_defaults_to_false() {
        // x0 ^ x1 = 1 leaves x1 free: x1 = 0, x0 = 1, neither determined.
        let mut system = LinearSystem::new(2);
        system.push_equation(&[true, true], true).unwrap();
        let solution = system.solve().unwrap();
        assert_eq!(solution.values(), &[true, false]);
        assert!(!solution.is_determined(0));
        assert!(!solution.is_determined(1));
    }

    #[test]
    fn test_wide_rows_cross_word_boundary() {
        let mut system = LinearSystem::new(130);
        let mut coeffs = vec![false; 130];
        coeffs[3] = true;
        coeffs[127] = true;
        system.push_equation(&coeffs, true).unwrap();
        system.push_unit(127, true).unwrap();
        let solution = system.solve().unwrap();
        assert!(!solution.values()[3]);
        assert!(solution.values()[127]);
        assert!(solution.is_determined(3));
    }

    #[test]
    fn test_dimension_errors() {
        let mut system = LinearSystem::new(3);
        assert_eq!(
            system.push_equation(&[true; 4], false).unwrap_err(),
            Error::DimensionMismatch { expected: 3, got: 4 }
        );
        assert!(system.push_unit(3, true).is_err());
        assert!(solve(&[vec![true]], &[]).is_err());
        assert!(solve(&[vec![true], vec![true, false]], &[true, true]).is_err());
    }
}
