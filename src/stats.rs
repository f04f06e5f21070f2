//! Basic randomness diagnostics for keystream samples.
//!
//! These checks are coarse sanity tests for comparing warm-up lengths, not
//! a statistical test suite.

use crate::bits;
use crate::error::Result;
use crate::stream::Trivium;

/// Monobit chi-square bound for one degree of freedom at p = 0.001.
const MONOBIT_CHI_SQUARE_LIMIT: f64 = 10.83;
/// Byte-frequency chi-square bound for 255 degrees of freedom at p = 0.001.
const BYTE_CHI_SQUARE_LIMIT: f64 = 330.52;
const BALANCE_TOLERANCE: f64 = 0.02;
const AUTOCORRELATION_LIMIT: f64 = 0.05;

/// Summary statistics of a bit sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct KeystreamStats {
    pub bits: usize,
    pub ones: usize,
    /// Fraction of ones.
    pub balance: f64,
    /// Number of maximal runs of equal bits.
    pub runs: usize,
    /// Lag-1 autocorrelation in `[-1, 1]`: (agreements - disagreements) / pairs.
    pub autocorrelation: f64,
    pub monobit_chi_square: f64,
    /// Chi-square of the byte histogram (bits packed LSB-first), 0 when the
    /// sample is shorter than one byte.
    pub byte_chi_square: f64,
}

impl KeystreamStats {
    pub fn from_bits(bits: &[bool]) -> Self {
        let n = bits.len();
        let ones = bits.iter().filter(|&&b| b).count();
        let agreements = bits.windows(2).filter(|w| w[0] == w[1]).count();
        let pairs = n.saturating_sub(1);

        let runs = if n == 0 { 0 } else { 1 + (pairs - agreements) };
        let autocorrelation = if pairs == 0 {
            0.0
        } else {
            (agreements as f64 - (pairs - agreements) as f64) / pairs as f64
        };
        let monobit_chi_square = if n == 0 {
            0.0
        } else {
            let diff = ones as f64 - (n - ones) as f64;
            diff * diff / n as f64
        };

        Self {
            bits: n,
            ones,
            balance: if n == 0 { 0.0 } else { ones as f64 / n as f64 },
            runs,
            autocorrelation,
            monobit_chi_square,
            byte_chi_square: byte_chi_square(&bits[..n - n % 8]),
        }
    }

    /// Every statistic within loose bounds expected of random bits.
    pub fn looks_random(&self) -> bool {
        self.bits > 0
            && (self.balance - 0.5).abs() < BALANCE_TOLERANCE
            && self.autocorrelation.abs() < AUTOCORRELATION_LIMIT
            && self.monobit_chi_square < MONOBIT_CHI_SQUARE_LIMIT
            && self.byte_chi_square < BYTE_CHI_SQUARE_LIMIT
    }
}

fn byte_chi_square(bits: &[bool]) -> f64 {
    let bytes = bits::pack_lsb_first(bits);
    if bytes.is_empty() {
        return 0.0;
    }
    let mut counts = [0usize; 256];
    for &byte in &bytes {
        counts[byte as usize] += 1;
    }
    let expected = bytes.len() as f64 / 256.0;
    counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum()
}

/// Statistics of the first `len` keystream bytes for `key`/`iv` after
/// `warmup` steps.
///
/// # Errors
/// Invalid key or IV length.
pub fn sample(key: &[u8], iv: &[u8], warmup: usize, len: usize) -> Result<KeystreamStats> {
    let keystream = Trivium::with_warmup(key, iv, warmup)?.keystream(len);
    Ok(KeystreamStats::from_bits(&bits::unpack_lsb_first(&keystream)))
}

/// [`sample`] for each warm-up length in `warmups`.
///
/// # Errors
/// Invalid key or IV length.
pub fn warmup_profile(
    key: &[u8],
    iv: &[u8],
    warmups: &[usize],
    len: usize,
) -> Result<Vec<(usize, KeystreamStats)>> {
    warmups
        .iter()
        .map(|&warmup| Ok((warmup, sample(key, iv, warmup, len)?)))
        .collect()
}
