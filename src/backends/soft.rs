use crate::core::{A_LEN, B_LEN, C_LEN, T1, T2, T3, TriviumCore};
use crate::{IvBits, KeyBits};
use cipher::{
    Block, BlockSizeUser, ParBlocksSizeUser, StreamBackend,
    consts::U1,
};

const MASK_A: u128 = (1 << A_LEN) - 1;
const MASK_B: u128 = (1 << B_LEN) - 1;
const MASK_C: u128 = (1 << C_LEN) - 1;

/// The scalar byte-at-a-time backend.
pub struct Backend<'a>(pub(crate) &'a mut TriviumCore);

impl BlockSizeUser for Backend<'_> {
    type BlockSize = U1;
}

impl ParBlocksSizeUser for Backend<'_> {
    type ParBlocksSize = U1;
}

impl StreamBackend for Backend<'_> {
    #[inline]
    fn gen_ks_block(&mut self, block: &mut Block<Self>) {
        self.0.counter = self.0.counter.wrapping_add(1);
        block[0] = self.0.next_byte();
    }
}

#[inline(always)]
fn tap(reg: u128, pos: usize) -> u128 {
    (reg >> (pos - 1)) & 1
}

/// One Trivium update on registers `[A, B, C]`, returning the output bit.
///
/// This is the reference recurrence; the bit-sliced backend must agree
/// with it lane by lane.
#[inline(always)]
pub(crate) fn clock(state: &mut [u128; 3]) -> bool {
    let [a, b, c] = *state;

    let t1 = tap(a, T1.out[0]) ^ tap(a, T1.out[1]);
    let t2 = tap(b, T2.out[0]) ^ tap(b, T2.out[1]);
    let t3 = tap(c, T3.out[0]) ^ tap(c, T3.out[1]);
    let z = t1 ^ t2 ^ t3;

    let t1 = t1 ^ (tap(a, T1.and[0]) & tap(a, T1.and[1])) ^ tap(b, T1.next);
    let t2 = t2 ^ (tap(b, T2.and[0]) & tap(b, T2.and[1])) ^ tap(c, T2.next);
    let t3 = t3 ^ (tap(c, T3.and[0]) & tap(c, T3.and[1])) ^ tap(a, T3.next);

    *state = [
        ((a << 1) | t3) & MASK_A,
        ((b << 1) | t1) & MASK_B,
        ((c << 1) | t2) & MASK_C,
    ];
    z == 1
}

/// XOR of the first output bit of every instance `(key, ivs[i])` after
/// `warmup` steps, one scalar instance at a time.
#[cfg_attr(not(feature = "force-soft"), allow(dead_code))]
pub(crate) fn xor_first_bits(key: &KeyBits, ivs: &[IvBits], warmup: usize) -> bool {
    ivs.iter().fold(false, |acc, iv| {
        acc ^ TriviumCore::with_warmup(key, iv, warmup).step()
    })
}
