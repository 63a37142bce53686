//! Bit arithmetic: critical-bit masks, branch directions and key divergence.

use super::key::{ByteKey, END_OF_KEY};

/// Width of a byte code: one sentinel bit plus eight bits of payload.
const CODE_BITS: u32 = 9;

/// All nine code bits set.
const CODE_SPACE: u16 = (1 << CODE_BITS) - 1;

// =============================================================================
// Direction
// =============================================================================

/// The side of an internal node a key belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Direction {
    Left,
    Right,
}

/// Decides the branch for `code` at a node discriminating on `mask`.
///
/// `mask` has every bit set except the critical one, so `mask | code` is
/// `CODE_SPACE` exactly when `code` carries the critical bit, and adding one
/// carries into bit 9.
#[inline]
pub(crate) const fn direction(mask: u16, code: u16) -> Direction {
    if (1 + (mask | code)) >> CODE_BITS == 0 {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// Builds the mask isolating the most significant set bit of `difference`.
///
/// The highest bit is smeared downwards, the smear is reduced back to its top
/// bit, and the result is complemented within the code space. A zero
/// difference yields `CODE_SPACE`, a mask that discriminates nothing.
#[inline]
pub(crate) const fn critical_mask(difference: u16) -> u16 {
    let mut smeared = difference;
    smeared |= smeared >> 1;
    smeared |= smeared >> 2;
    smeared |= smeared >> 4;
    smeared |= smeared >> 8;
    let highest = smeared & !(smeared >> 1);
    highest ^ CODE_SPACE
}

// =============================================================================
// Critical Bit
// =============================================================================

/// The byte offset and mask discriminating the two subtrees of a node.
///
/// The derived ordering is the refinement order of the trie: a later offset is
/// greater, and at the same offset a less significant critical bit has a
/// larger mask. Along every root-to-leaf path critical bits strictly increase.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) struct CriticalBit {
    offset: usize,
    mask: u16,
}

impl CriticalBit {
    /// The critical bit between two differing codes found at `offset`.
    #[inline]
    pub(crate) const fn between(offset: usize, code_a: u16, code_b: u16) -> Self {
        Self {
            offset,
            mask: critical_mask(code_a ^ code_b),
        }
    }

    #[inline]
    pub(crate) const fn offset(self) -> usize {
        self.offset
    }

    #[inline]
    pub(crate) const fn mask(self) -> u16 {
        self.mask
    }

    /// Direction of a code read at [`offset`](Self::offset).
    #[inline]
    pub(crate) const fn direction(self, code: u16) -> Direction {
        direction(self.mask, code)
    }

    /// Direction of `key` at this critical bit.
    #[inline]
    pub(crate) fn direction_of<Q: ByteKey + ?Sized>(self, key: &Q) -> Direction {
        self.direction(key.byte_code(self.offset))
    }

    /// Returns `true` if the mask leaves exactly one code bit clear.
    pub(crate) const fn is_well_formed(self) -> bool {
        self.mask <= CODE_SPACE && (!self.mask & CODE_SPACE).count_ones() == 1
    }
}

// =============================================================================
// Divergence
// =============================================================================

/// Where two keys first differ, plus the second key's code at that offset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Divergence {
    pub(crate) critical: CriticalBit,
    pub(crate) code: u16,
}

/// Scans both keys from `start` for the first position whose codes differ or
/// where either key ends.
///
/// Offset and mask do not depend on argument order; the returned code is
/// always `key_b`'s. Identical keys stop at their common end with a mask that
/// carries no critical bit.
pub(crate) fn divergence<A, B>(start: usize, key_a: &A, key_b: &B) -> Divergence
where
    A: ByteKey + ?Sized,
    B: ByteKey + ?Sized,
{
    let mut offset = start;
    loop {
        let code_a = key_a.byte_code(offset);
        let code_b = key_b.byte_code(offset);
        if code_a != code_b || code_a == END_OF_KEY {
            return Divergence {
                critical: CriticalBit::between(offset, code_a, code_b),
                code: code_b,
            };
        }
        offset += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::critbit::key::byte_code_at;
    use rstest::rstest;

    #[rstest]
    #[case(0b1_0000_0000, 0b0_1111_1111)]
    #[case(0b0_1000_0000, 0b1_0111_1111)]
    #[case(0b0_0000_0001, 0b1_1111_1110)]
    #[case(0b0_0110_0101, 0b1_1011_1111)]
    #[case(0, CODE_SPACE)]
    fn test_critical_mask(#[case] difference: u16, #[case] expected: u16) {
        assert_eq!(critical_mask(difference), expected);
    }

    #[rstest]
    fn test_direction_follows_critical_bit() {
        let critical = CriticalBit::between(0, byte_code_at(b"a", 0), byte_code_at(b"b", 0));
        // 'a' = 0x61, 'b' = 0x62: the critical bit is bit 1
        assert_eq!(critical.direction(byte_code_at(b"a", 0)), Direction::Left);
        assert_eq!(critical.direction(byte_code_at(b"b", 0)), Direction::Right);
        assert_eq!(critical.direction(byte_code_at(b"c", 0)), Direction::Right);
        assert_eq!(critical.direction(byte_code_at(b"`", 0)), Direction::Left);
    }

    #[rstest]
    fn test_end_of_key_goes_left() {
        let found = divergence(0, "ab", "a");
        assert_eq!(found.critical.offset(), 1);
        assert_eq!(found.code, END_OF_KEY);
        assert_eq!(found.critical.direction(END_OF_KEY), Direction::Left);
        assert_eq!(found.critical.direction_of("ab"), Direction::Right);
    }

    #[rstest]
    #[case("abc", "abd", 2)]
    #[case("abc", "abc\0", 3)]
    #[case("", "x", 0)]
    #[case("hello", "help", 3)]
    fn test_divergence_offset(#[case] left: &str, #[case] right: &str, #[case] offset: usize) {
        assert_eq!(divergence(0, left, right).critical.offset(), offset);
    }

    #[rstest]
    fn test_divergence_is_symmetric() {
        let forward = divergence(0, "apple", "apricot");
        let backward = divergence(0, "apricot", "apple");
        assert_eq!(forward.critical, backward.critical);
        assert_eq!(forward.code, byte_code_at(b"apricot", 2));
        assert_eq!(backward.code, byte_code_at(b"apple", 2));
    }

    #[rstest]
    fn test_divergence_respects_start() {
        // Differences before `start` are not looked at
        let found = divergence(2, "xxcd", "yyce");
        assert_eq!(found.critical.offset(), 3);
    }

    #[rstest]
    fn test_identical_keys_yield_no_critical_bit() {
        let found = divergence(0, "same", "same");
        assert_eq!(found.critical.offset(), 4);
        assert_eq!(found.critical.mask(), CODE_SPACE);
        assert!(!found.critical.is_well_formed());
    }

    #[rstest]
    fn test_refinement_order() {
        let early = CriticalBit::between(0, 0b1_0000_0000, 0b1_1000_0000);
        let same_byte_lower_bit = CriticalBit::between(0, 0b1_0000_0000, 0b1_0000_0001);
        let later_byte = CriticalBit::between(1, 0b1_0000_0000, 0b1_1000_0000);
        assert!(early < same_byte_lower_bit);
        assert!(same_byte_lower_bit < later_byte);
        assert!(early.is_well_formed());
        assert!(later_byte.is_well_formed());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_divergence_symmetric(
                first in prop::collection::vec(0u8..4, 0..8),
                second in prop::collection::vec(0u8..4, 0..8),
                start in 0usize..4
            ) {
                let forward = divergence(start, first.as_slice(), second.as_slice());
                let backward = divergence(start, second.as_slice(), first.as_slice());
                prop_assert_eq!(forward.critical, backward.critical);
                prop_assert_eq!(forward.code, second.byte_code(forward.critical.offset()));
                prop_assert_eq!(backward.code, first.byte_code(backward.critical.offset()));
            }

            #[test]
            fn prop_divergence_separates_distinct_keys(
                first in prop::collection::vec(any::<u8>(), 0..8),
                second in prop::collection::vec(any::<u8>(), 0..8)
            ) {
                prop_assume!(first != second);
                let found = divergence(0, first.as_slice(), second.as_slice());
                prop_assert!(found.critical.is_well_formed());
                let first_side = found.critical.direction_of(first.as_slice());
                let second_side = found.critical.direction_of(second.as_slice());
                prop_assert_ne!(first_side, second_side);
                // The smaller key always goes left
                let smaller_side = if first < second { first_side } else { second_side };
                prop_assert_eq!(smaller_side, Direction::Left);
            }
        }
    }
}
