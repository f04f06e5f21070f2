//! Conversions between byte buffers and bit vectors.
//!
//! Keys and IVs are unpacked MSB-first inside each byte, byte 0 first.
//! Keystream bits are packed LSB-first: the first output bit lands in bit 0
//! of the first byte, which is the layout of the published test vectors.

/// Unpacks `bytes` into bits, most significant bit of each byte first.
pub fn unpack_msb_first(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |j| (byte >> j) & 1 == 1))
        .collect()
}

/// Packs bits into bytes, first bit into the least significant position.
///
/// A trailing partial byte is zero-padded in its high bits.
pub fn pack_lsb_first(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (j, &bit)| acc | ((bit as u8) << j))
        })
        .collect()
}

/// Unpacks keystream bytes back into bits, least significant bit first.
pub fn unpack_lsb_first(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).map(move |j| (byte >> j) & 1 == 1))
        .collect()
}

/// Converts a bit slice of known length into a fixed array.
pub(crate) fn to_array<const N: usize>(bits: &[bool]) -> Option<[bool; N]> {
    bits.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_msb_first() {
        let bits = unpack_msb_first(&[0x80, 0x01]);
        assert_eq!(bits.len(), 16);
        assert!(bits[0]);
        assert!(bits[1..15].iter().all(|&b| !b));
        assert!(bits[15]);
    }

    #[test]
    fn test_pack_lsb_first() {
        let mut bits = [false; 12];
        bits[0] = true;
        bits[7] = true;
        bits[9] = true;
        assert_eq!(pack_lsb_first(&bits), vec![0x81, 0x02]);
    }

    #[test]
    fn test_lsb_round_trip() {
        let bytes = [0x00, 0xA5, 0xFF, 0x3C];
        assert_eq!(pack_lsb_first(&unpack_lsb_first(&bytes)), bytes);
    }

    #[test]
    fn test_to_array_rejects_wrong_length() {
        assert!(to_array::<4>(&[true; 3]).is_none());
        assert_eq!(to_array::<2>(&[true, false]), Some([true, false]));
    }
}
