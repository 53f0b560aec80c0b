/// A cheaply obtained element count.
///
/// `Unknown` means the count cannot be had without a full traversal.
/// Combinators derive their hint from their inputs' hints arithmetically and
/// never traverse to compute one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LenHint {
    Known(usize),
    #[default]
    Unknown,
}

impl LenHint {
    /// Returns the count if known.
    pub fn known(self) -> Option<usize> {
        match self {
            LenHint::Known(n) => Some(n),
            LenHint::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, LenHint::Known(_))
    }

    /// Applies `f` to the count, keeping `Unknown` as is.
    pub fn map(self, f: impl FnOnce(usize) -> usize) -> LenHint {
        match self {
            LenHint::Known(n) => LenHint::Known(f(n)),
            LenHint::Unknown => LenHint::Unknown,
        }
    }

    /// Combines two hints; `Unknown` if either is unknown.
    pub fn zip_with(self, other: LenHint, f: impl FnOnce(usize, usize) -> usize) -> LenHint {
        match (self, other) {
            (LenHint::Known(a), LenHint::Known(b)) => LenHint::Known(f(a, b)),
            _ => LenHint::Unknown,
        }
    }

    pub fn min(self, other: LenHint) -> LenHint {
        self.zip_with(other, usize::min)
    }

    pub fn max(self, other: LenHint) -> LenHint {
        self.zip_with(other, usize::max)
    }

    pub fn add(self, other: LenHint) -> LenHint {
        self.zip_with(other, usize::saturating_add)
    }

    /// Builds a hint from an iterator's `size_hint`, known only when exact.
    pub fn from_size_hint((lower, upper): (usize, Option<usize>)) -> LenHint {
        match upper {
            Some(upper) if upper == lower => LenHint::Known(lower),
            _ => LenHint::Unknown,
        }
    }
}

impl From<usize> for LenHint {
    fn from(n: usize) -> Self {
        LenHint::Known(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algebra_with_known() {
        let a = LenHint::Known(3);
        let b = LenHint::Known(5);
        assert_eq!(a.min(b), LenHint::Known(3));
        assert_eq!(a.max(b), LenHint::Known(5));
        assert_eq!(a.add(b), LenHint::Known(8));
        assert_eq!(a.map(|n| n * 2), LenHint::Known(6));
    }

    #[test]
    fn test_unknown_is_absorbing() {
        let a = LenHint::Known(3);
        assert_eq!(a.min(LenHint::Unknown), LenHint::Unknown);
        assert_eq!(LenHint::Unknown.max(a), LenHint::Unknown);
        assert_eq!(LenHint::Unknown.map(|n| n + 1), LenHint::Unknown);
    }

    #[test]
    fn test_from_size_hint() {
        assert_eq!(LenHint::from_size_hint((4, Some(4))), LenHint::Known(4));
        assert_eq!(LenHint::from_size_hint((0, Some(4))), LenHint::Unknown);
        assert_eq!(LenHint::from_size_hint((0, None)), LenHint::Unknown);
    }
}
