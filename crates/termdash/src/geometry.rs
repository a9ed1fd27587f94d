//! Size policies and alignment.
//!
//! A [`SizePolicy`] tells a [`BoxLayout`](crate::layout::BoxLayout) how a
//! widget reacts when the space available differs from its natural size.
//! Policies combine [`SizePolicyFlags`] with a resize factor that weighs the
//! widget against its siblings when surplus or deficit space is shared out.

use std::ops::{BitOr, BitOrAssign};

/// Flags describing how a widget may be resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizePolicyFlags(u8);

impl SizePolicyFlags {
    /// The widget always gets its natural size.
    pub const FIXED: Self = Self(0);
    /// The widget may take surplus space left after expanding widgets.
    pub const GROW: Self = Self(1);
    /// The widget may give up space down to its minimum size.
    pub const SHRINK: Self = Self(2);
    /// The widget takes surplus space before growing widgets do.
    pub const EXPAND: Self = Self(4);

    /// Returns `true` if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for SizePolicyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SizePolicyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Resize behavior of a layout participant.
///
/// # Example
///
/// ```
/// use termdash::{SizePolicy, SizePolicyFlags};
///
/// let policy = SizePolicy::new(SizePolicyFlags::GROW | SizePolicyFlags::SHRINK)
///     .with_resize_factor(2.0);
/// assert!(policy.can_grow());
/// assert!(policy.can_shrink());
/// assert!(!policy.is_expanding());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePolicy {
    flags: SizePolicyFlags,
    resize_factor: f64,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self::fixed()
    }
}

impl SizePolicy {
    /// A policy with the given flags and a resize factor of `1.0`.
    pub const fn new(flags: SizePolicyFlags) -> Self {
        Self {
            flags,
            resize_factor: 1.0,
        }
    }

    /// A policy that never resizes.
    pub const fn fixed() -> Self {
        Self::new(SizePolicyFlags::FIXED)
    }

    /// Set the weight used when sharing space with siblings. Negative and
    /// non-finite values count as zero.
    pub fn with_resize_factor(mut self, factor: f64) -> Self {
        self.resize_factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        self
    }

    /// The policy flags.
    pub const fn flags(self) -> SizePolicyFlags {
        self.flags
    }

    /// The weight used when sharing space with siblings.
    pub const fn resize_factor(self) -> f64 {
        self.resize_factor
    }

    /// Returns `true` if no flag is set.
    pub const fn is_fixed(self) -> bool {
        self.flags.0 == 0
    }

    /// Returns `true` if the widget may end up larger than its natural size.
    pub const fn can_grow(self) -> bool {
        self.flags.contains(SizePolicyFlags::GROW) || self.flags.contains(SizePolicyFlags::EXPAND)
    }

    /// Returns `true` if the widget may end up smaller than its natural size.
    pub const fn can_shrink(self) -> bool {
        self.flags.contains(SizePolicyFlags::SHRINK)
    }

    /// Returns `true` if the widget has first claim on surplus space.
    pub const fn is_expanding(self) -> bool {
        self.flags.contains(SizePolicyFlags::EXPAND)
    }

    /// Returns `true` if the widget takes surplus left after expanding widgets.
    pub const fn is_growing(self) -> bool {
        self.flags.contains(SizePolicyFlags::GROW)
    }
}

impl From<SizePolicyFlags> for SizePolicy {
    fn from(flags: SizePolicyFlags) -> Self {
        Self::new(flags)
    }
}

/// Horizontal placement of content within its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    /// Flush with the left edge.
    #[default]
    Left,
    /// Centered, extra column on the right.
    Center,
    /// Flush with the right edge.
    Right,
}

impl Alignment {
    /// Split `slack` columns into left and right padding.
    pub fn split(self, slack: usize) -> (usize, usize) {
        match self {
            Self::Left => (0, slack),
            Self::Center => (slack / 2, slack - slack / 2),
            Self::Right => (slack, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let flags = SizePolicyFlags::GROW | SizePolicyFlags::EXPAND;
        assert!(flags.contains(SizePolicyFlags::GROW));
        assert!(!flags.contains(SizePolicyFlags::SHRINK));
        assert!(flags.contains(SizePolicyFlags::FIXED));
        assert_eq!(flags.bits(), 5);
    }

    #[test]
    fn test_policy_queries() {
        let fixed = SizePolicy::fixed();
        assert!(fixed.is_fixed());
        assert!(!fixed.can_grow());
        assert!(!fixed.can_shrink());

        let expanding = SizePolicy::from(SizePolicyFlags::EXPAND);
        assert!(expanding.can_grow());
        assert!(expanding.is_expanding());
        assert!(!expanding.is_growing());
    }

    #[test]
    fn test_resize_factor_sanitized() {
        let policy = SizePolicy::new(SizePolicyFlags::GROW);
        assert_eq!(policy.resize_factor(), 1.0);
        assert_eq!(policy.with_resize_factor(-3.0).resize_factor(), 0.0);
        assert_eq!(policy.with_resize_factor(f64::NAN).resize_factor(), 0.0);
        assert_eq!(policy.with_resize_factor(2.5).resize_factor(), 2.5);
    }

    #[test]
    fn test_alignment_split() {
        assert_eq!(Alignment::Left.split(5), (0, 5));
        assert_eq!(Alignment::Center.split(5), (2, 3));
        assert_eq!(Alignment::Right.split(5), (5, 0));
    }
}
