//! Difficulty target comparison.

use shared_types::Hash;

/// Unsigned big-endian value of the first `width` bytes of `hash`.
///
/// `width` is clamped to 1..=8.
pub fn leading_value(hash: &Hash, width: usize) -> u64 {
    let width = width.clamp(1, 8);
    hash[..width]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Strict comparison: a hash whose leading value equals the target fails.
pub fn meets_target(hash: &Hash, target: u64, width: usize) -> bool {
    leading_value(hash, width) < target
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hash_with_prefix(prefix: &[u8]) -> Hash {
        let mut hash = [0xffu8; 32];
        hash[..prefix.len()].copy_from_slice(prefix);
        hash
    }

    #[test]
    fn test_leading_value_is_big_endian() {
        let hash = hash_with_prefix(&[0x00, 0x00, 0x0f, 0xfe]);
        assert_eq!(leading_value(&hash, 4), 0x0000_0ffe);
    }

    #[test]
    fn test_equal_to_target_is_rejected() {
        let hash = hash_with_prefix(&[0x00, 0x00, 0x0f, 0xff]);
        assert!(!meets_target(&hash, 0x0000_0fff, 4));
    }

    #[test]
    fn test_one_below_target_passes() {
        let hash = hash_with_prefix(&[0x00, 0x00, 0x0f, 0xfe]);
        assert!(meets_target(&hash, 0x0000_0fff, 4));
    }

    #[test]
    fn test_width_eight() {
        let hash = hash_with_prefix(&[0, 0, 0, 0, 0, 0, 0x01, 0x00]);
        assert_eq!(leading_value(&hash, 8), 0x100);
        assert!(!meets_target(&hash, 0x100, 8));
        assert!(meets_target(&hash, 0x101, 8));
    }

    proptest! {
        #[test]
        fn prop_value_equal_target_never_passes(hash in any::<[u8; 32]>(), width in 4usize..=8) {
            let value = leading_value(&hash, width);
            prop_assert!(!meets_target(&hash, value, width));
            if value < u64::MAX {
                prop_assert!(meets_target(&hash, value + 1, width));
            }
        }
    }
}
