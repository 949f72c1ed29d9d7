//! The range check every type carries.

use serde::Serialize;

/// `slot`, `start` and `range` of a type: a value of type `X` is assignable to
/// this type iff `X.slots[slot] - start`, as an unsigned 16-bit value, is
/// below `range`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RangeCheck {
    pub slot: u16,
    pub start: u16,
    pub range: u16,
}

impl RangeCheck {
    /// Whether `id` (the checked type's entry in `self.slot`) passes.
    pub fn matches(self, id: u16) -> bool {
        id.wrapping_sub(self.start) < self.range
    }

    /// Largest id inside the range.
    pub fn end(self) -> u32 {
        u32::from(self.start) + u32::from(self.range) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_unsigned() {
        let check = RangeCheck {
            slot: 0,
            start: 5,
            range: 3,
        };
        assert!(!check.matches(4));
        assert!(check.matches(5));
        assert!(check.matches(7));
        assert!(!check.matches(8));
        // Below `start` wraps to a large value.
        assert!(!check.matches(0));
        assert_eq!(check.end(), 7);
    }
}
