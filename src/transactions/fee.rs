//! Signed fee accounting used during group analysis and redistribution.

use std::ops::Add;

/// The difference between what a transaction pays and what its execution
/// requires. A deficit means the transaction needs more fee than it carries,
/// a surplus means it carries more than it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeDelta {
    Deficit(u64),
    Surplus(u64),
}

impl FeeDelta {
    /// A positive value is a deficit, a negative value a surplus, zero is no
    /// delta at all.
    pub fn from_i64(value: i64) -> Option<FeeDelta> {
        match value {
            v if v > 0 => Some(FeeDelta::Deficit(v as u64)),
            v if v < 0 => Some(FeeDelta::Surplus(v.unsigned_abs())),
            _ => None,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            FeeDelta::Deficit(amount) => amount as i64,
            FeeDelta::Surplus(amount) => -(amount as i64),
        }
    }

    pub fn amount(self) -> u64 {
        match self {
            FeeDelta::Deficit(amount) | FeeDelta::Surplus(amount) => amount,
        }
    }
}

impl Add for FeeDelta {
    type Output = Option<FeeDelta>;

    fn add(self, other: FeeDelta) -> Option<FeeDelta> {
        FeeDelta::from_i64(self.to_i64() + other.to_i64())
    }
}

/// How urgently a transaction's deficit must be funded from the group's
/// surplus pool. Ordering is by urgency: deficits on transactions whose fee
/// cannot be raised must be funded first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeePriority {
    /// No deficit, nothing to fund.
    Covered,
    /// A deficit on a transaction whose own fee can still be raised.
    ModifiableDeficit(u64),
    /// A deficit that can only be funded by the rest of the group.
    ImmutableDeficit(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fee_delta_from_i64() {
        assert_eq!(FeeDelta::from_i64(500), Some(FeeDelta::Deficit(500)));
        assert_eq!(FeeDelta::from_i64(-300), Some(FeeDelta::Surplus(300)));
        assert_eq!(FeeDelta::from_i64(0), None);
    }

    #[test]
    fn test_fee_delta_addition() {
        assert_eq!(
            FeeDelta::Deficit(500) + FeeDelta::Surplus(200),
            Some(FeeDelta::Deficit(300))
        );
        assert_eq!(
            FeeDelta::Surplus(500) + FeeDelta::Deficit(200),
            Some(FeeDelta::Surplus(300))
        );
        // Exact cancellation leaves no delta
        assert_eq!(FeeDelta::Deficit(400) + FeeDelta::Surplus(400), None);
        assert_eq!(
            FeeDelta::Deficit(100) + FeeDelta::Deficit(150),
            Some(FeeDelta::Deficit(250))
        );
    }

    #[test]
    fn test_fee_delta_amount_is_magnitude() {
        assert_eq!(FeeDelta::Deficit(700).amount(), 700);
        assert_eq!(FeeDelta::Surplus(700).amount(), 700);
    }

    #[test]
    fn test_fee_priority_ordering() {
        assert!(FeePriority::ImmutableDeficit(1) > FeePriority::ModifiableDeficit(u64::MAX));
        assert!(FeePriority::ModifiableDeficit(1) > FeePriority::Covered);
        assert!(FeePriority::ImmutableDeficit(200) > FeePriority::ImmutableDeficit(100));
        assert!(FeePriority::ModifiableDeficit(200) > FeePriority::ModifiableDeficit(100));
        assert_eq!(FeePriority::Covered, FeePriority::Covered);
    }
}
