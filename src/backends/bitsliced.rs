use crate::core::{A_LEN, B_LEN, C_LEN, C_ONES, T1, T2, T3};
use crate::{IvBits, KeyBits};
use zeroize::Zeroize;

/// Number of cipher instances evaluated side by side.
pub(crate) const LANES: usize = 64;

/// A register of `N` positions, one `u64` per position, one lane per bit.
///
/// Stored as a ring so that a shift is a head move plus one write.
struct Register<const N: usize> {
    bits: [u64; N],
    head: usize,
}

impl<const N: usize> Register<N> {
    fn zeroed() -> Self {
        Self { bits: [0; N], head: 0 }
    }

    /// Lanes of register position `pos` (1-based).
    #[inline(always)]
    fn at(&self, pos: usize) -> u64 {
        let i = self.head + pos - 1;
        self.bits[if i >= N { i - N } else { i }]
    }

    /// Shifts every position up by one and writes `value` at position 1.
    #[inline(always)]
    fn push(&mut self, value: u64) {
        self.head = if self.head == 0 { N - 1 } else { self.head - 1 };
        self.bits[self.head] = value;
    }
}

impl<const N: usize> Drop for Register<N> {
    fn drop(&mut self) {
        self.bits.zeroize();
    }
}

/// Up to 64 Trivium instances sharing one key, each with its own IV.
pub(crate) struct Batch {
    a: Register<A_LEN>,
    b: Register<B_LEN>,
    c: Register<C_LEN>,
}

impl Batch {
    /// Loads `key` into every lane and `ivs[l]` into lane `l`.
    ///
    /// Lanes past `ivs.len()` run with an all-zero IV and must be masked
    /// out by the caller.
    pub(crate) fn new(key: &KeyBits, ivs: &[IvBits]) -> Self {
        debug_assert!(ivs.len() <= LANES);
        let mut a = Register::<A_LEN>::zeroed();
        let mut b = Register::<B_LEN>::zeroed();
        let mut c = Register::<C_LEN>::zeroed();

        for (word, &bit) in a.bits.iter_mut().zip(key.iter()) {
            *word = if bit { !0 } else { 0 };
        }
        for (lane, iv) in ivs.iter().enumerate() {
            for (word, &bit) in b.bits.iter_mut().zip(iv.iter()) {
                *word |= (bit as u64) << lane;
            }
        }
        for &pos in &C_ONES {
            c.bits[pos - 1] = !0;
        }

        Self { a, b, c }
    }

    /// One update on all lanes; lane `l` of the result is instance `l`'s
    /// output bit.
    #[inline]
    pub(crate) fn step(&mut self) -> u64 {
        let (a, b, c) = (&self.a, &self.b, &self.c);

        let t1 = a.at(T1.out[0]) ^ a.at(T1.out[1]);
        let t2 = b.at(T2.out[0]) ^ b.at(T2.out[1]);
        let t3 = c.at(T3.out[0]) ^ c.at(T3.out[1]);
        let z = t1 ^ t2 ^ t3;

        let t1 = t1 ^ (a.at(T1.and[0]) & a.at(T1.and[1])) ^ b.at(T1.next);
        let t2 = t2 ^ (b.at(T2.and[0]) & b.at(T2.and[1])) ^ c.at(T2.next);
        let t3 = t3 ^ (c.at(T3.and[0]) & c.at(T3.and[1])) ^ a.at(T3.next);

        self.a.push(t3);
        self.b.push(t1);
        self.c.push(t2);
        z
    }

    pub(crate) fn warm_up(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }
}

/// XOR of the first output bit of every instance `(key, ivs[i])` after
/// `warmup` steps, 64 instances per pass.
pub(crate) fn xor_first_bits(key: &KeyBits, ivs: &[IvBits], warmup: usize) -> bool {
    ivs.chunks(LANES).fold(false, |acc, chunk| {
        let mut batch = Batch::new(key, chunk);
        batch.warm_up(warmup);
        let mask = if chunk.len() == LANES {
            !0
        } else {
            (1u64 << chunk.len()) - 1
        };
        acc ^ ((batch.step() & mask).count_ones() & 1 == 1)
    })
}
