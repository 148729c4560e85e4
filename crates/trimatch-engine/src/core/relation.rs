use std::fmt;

use serde::{Deserialize, Serialize};

/// The arithmetic rule that three selected values must satisfy.
///
/// Operand order follows selection order: the first selected tile is the
/// first operand, so `Subtraction` and `Division` are order-sensitive.
///
/// | Relation       | Satisfied when    |
/// |----------------|-------------------|
/// | Addition       | `a + b == c`      |
/// | Subtraction    | `a - b == c`      |
/// | Multiplication | `a × b == c`      |
/// | Division       | `a ÷ b == c`      |
/// | TargetSum      | `a + b + c == t`  |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Relation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    TargetSum { target: u32 },
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Addition => f.write_str("addition"),
            Relation::Subtraction => f.write_str("subtraction"),
            Relation::Multiplication => f.write_str("multiplication"),
            Relation::Division => f.write_str("division"),
            Relation::TargetSum { target } => write!(f, "target sum {target}"),
        }
    }
}

impl Relation {
    /// Smallest target a target-sum relation can be generated for, with
    /// every operand at least 1.
    pub const MIN_TARGET_SUM: u32 = 3;

    /// Raises a target-sum target below [`Self::MIN_TARGET_SUM`] to it.
    /// Other relations are returned as is.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Relation::TargetSum { target } => Relation::TargetSum {
                target: target.max(Self::MIN_TARGET_SUM),
            },
            relation => relation,
        }
    }

    /// Evaluates the relation on three values in selection order.
    ///
    /// Evaluation is exact integer arithmetic. Overflow and division by
    /// zero are treated as a non-match.
    #[must_use]
    pub fn is_satisfied(self, a: u32, b: u32, c: u32) -> bool {
        match self {
            Relation::Addition => a.checked_add(b) == Some(c),
            Relation::Subtraction => a.checked_sub(b) == Some(c),
            Relation::Multiplication => a.checked_mul(b) == Some(c),
            Relation::Division => b != 0 && a % b == 0 && a / b == c,
            Relation::TargetSum { target } => {
                u64::from(a) + u64::from(b) + u64::from(c) == u64::from(target)
            }
        }
    }

    /// Short operator text used when describing a triple, e.g. `3 + 4 = 7`.
    #[must_use]
    pub fn describe(self, triple: Triple) -> String {
        let [a, b, c] = triple.values();
        match self {
            Relation::Addition => format!("{a} + {b} = {c}"),
            Relation::Subtraction => format!("{a} - {b} = {c}"),
            Relation::Multiplication => format!("{a} × {b} = {c}"),
            Relation::Division => format!("{a} ÷ {b} = {c}"),
            Relation::TargetSum { target } => format!("{a} + {b} + {c} = {target}"),
        }
    }
}

/// Three values evaluated jointly against a [`Relation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triple([u32; 3]);

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "({a}, {b}, {c})")
    }
}

impl From<[u32; 3]> for Triple {
    fn from(values: [u32; 3]) -> Self {
        Self(values)
    }
}

impl Triple {
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self([a, b, c])
    }

    #[must_use]
    pub const fn values(self) -> [u32; 3] {
        self.0
    }

    #[must_use]
    pub fn satisfies(self, relation: Relation) -> bool {
        let [a, b, c] = self.0;
        relation.is_satisfied(a, b, c)
    }

    #[must_use]
    pub fn max(self) -> u32 {
        self.0.into_iter().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_raises_small_targets() {
        for target in 0..=2 {
            assert_eq!(
                Relation::TargetSum { target }.normalized(),
                Relation::TargetSum { target: 3 }
            );
        }
        assert_eq!(
            Relation::TargetSum { target: 24 }.normalized(),
            Relation::TargetSum { target: 24 }
        );
        assert_eq!(Relation::Division.normalized(), Relation::Division);
    }

    #[test]
    fn test_addition() {
        assert!(Relation::Addition.is_satisfied(3, 4, 7));
        assert!(Relation::Addition.is_satisfied(4, 3, 7));
        assert!(!Relation::Addition.is_satisfied(3, 7, 4));
    }

    #[test]
    fn test_subtraction_is_order_sensitive() {
        assert!(Relation::Subtraction.is_satisfied(9, 4, 5));
        assert!(!Relation::Subtraction.is_satisfied(4, 9, 5));
        // Negative differences never match.
        assert!(!Relation::Subtraction.is_satisfied(4, 9, 0));
    }

    #[test]
    fn test_multiplication() {
        assert!(Relation::Multiplication.is_satisfied(3, 4, 12));
        assert!(!Relation::Multiplication.is_satisfied(3, 4, 7));
        assert!(!Relation::Multiplication.is_satisfied(u32::MAX, 2, 0));
    }

    #[test]
    fn test_division_guards_zero() {
        assert!(Relation::Division.is_satisfied(12, 4, 3));
        assert!(!Relation::Division.is_satisfied(12, 0, 0));
        assert!(!Relation::Division.is_satisfied(0, 0, 0));
        // Inexact division is not a match.
        assert!(!Relation::Division.is_satisfied(13, 4, 3));
    }

    #[test]
    fn test_target_sum() {
        let relation = Relation::TargetSum { target: 12 };
        assert!(relation.is_satisfied(2, 4, 6));
        assert!(relation.is_satisfied(6, 2, 4));
        assert!(!relation.is_satisfied(2, 4, 5));
        assert!(!relation.is_satisfied(u32::MAX, u32::MAX, 14));
    }

    #[test]
    fn test_describe() {
        let triple = Triple::new(9, 4, 5);
        assert_eq!(Relation::Subtraction.describe(triple), "9 - 4 = 5");
        assert_eq!(
            Relation::TargetSum { target: 18 }.describe(triple),
            "9 + 4 + 5 = 18"
        );
    }

    #[test]
    fn test_relation_serialization() {
        let relation = Relation::TargetSum { target: 24 };
        let serialized = serde_json::to_string(&relation).unwrap();
        assert_eq!(serialized, r#"{"mode":"target_sum","target":24}"#);
        let deserialized: Relation = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, relation);

        let serialized = serde_json::to_string(&Relation::Addition).unwrap();
        assert_eq!(serialized, r#"{"mode":"addition"}"#);
    }
}
