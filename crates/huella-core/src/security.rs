//! Vendor match security levels.

use serde::{Deserialize, Serialize};

/// Match strictness for template comparison.
///
/// The vendor SDK exposes nine ordinal security levels controlling the
/// trade-off between false acceptance and false rejection. Callers address
/// them by ordinal (1-9); [`SecurityLevel::Normal`] (5) is the default used
/// when a comparison request does not specify one.
///
/// # Examples
///
/// ```
/// use huella_core::SecurityLevel;
///
/// let level = SecurityLevel::from_ordinal(5).unwrap();
/// assert_eq!(level, SecurityLevel::Normal);
/// assert_eq!(level.ordinal(), 5);
///
/// assert!(SecurityLevel::from_ordinal(0).is_none());
/// assert!(SecurityLevel::from_ordinal(10).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// Most permissive matching (ordinal 1).
    Lowest,
    /// Ordinal 2.
    Lower,
    /// Ordinal 3.
    Low,
    /// Ordinal 4.
    BelowNormal,
    /// Vendor default strictness (ordinal 5).
    Normal,
    /// Ordinal 6.
    AboveNormal,
    /// Ordinal 7.
    High,
    /// Ordinal 8.
    Higher,
    /// Strictest matching (ordinal 9).
    Highest,
}

impl SecurityLevel {
    /// Map a caller-supplied ordinal (1-9) to a security level.
    ///
    /// Returns `None` for ordinals outside the vendor range.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Self::Lowest),
            2 => Some(Self::Lower),
            3 => Some(Self::Low),
            4 => Some(Self::BelowNormal),
            5 => Some(Self::Normal),
            6 => Some(Self::AboveNormal),
            7 => Some(Self::High),
            8 => Some(Self::Higher),
            9 => Some(Self::Highest),
            _ => None,
        }
    }

    /// The ordinal passed to the vendor match routine.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Lowest => 1,
            Self::Lower => 2,
            Self::Low => 3,
            Self::BelowNormal => 4,
            Self::Normal => 5,
            Self::AboveNormal => 6,
            Self::High => 7,
            Self::Higher => 8,
            Self::Highest => 9,
        }
    }
}

impl Default for SecurityLevel {
    fn default() -> Self {
        Self::Normal
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SL{}", self.ordinal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, SecurityLevel::Lowest)]
    #[case(5, SecurityLevel::Normal)]
    #[case(9, SecurityLevel::Highest)]
    fn test_ordinal_round_trip(#[case] ordinal: u8, #[case] expected: SecurityLevel) {
        let level = SecurityLevel::from_ordinal(ordinal).unwrap();
        assert_eq!(level, expected);
        assert_eq!(level.ordinal(), ordinal);
    }

    #[rstest]
    #[case(0)]
    #[case(10)]
    #[case(255)]
    fn test_invalid_ordinals(#[case] ordinal: u8) {
        assert!(SecurityLevel::from_ordinal(ordinal).is_none());
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(SecurityLevel::default(), SecurityLevel::Normal);
    }

    #[test]
    fn test_ordering_follows_strictness() {
        assert!(SecurityLevel::Lowest < SecurityLevel::Normal);
        assert!(SecurityLevel::Normal < SecurityLevel::Highest);
    }

    #[test]
    fn test_display() {
        assert_eq!(SecurityLevel::Normal.to_string(), "SL5");
        assert_eq!(SecurityLevel::Highest.to_string(), "SL9");
    }
}
