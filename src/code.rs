//! Location codes: octant paths packed into a single integer.

use std::fmt;

use nalgebra::Vector3;

use crate::{Octant, Real};

/// Packed `(depth, path)` identifier of an octant.
///
/// The root is `1`; each level appends one [Octant] as three low bits, so a code at depth
/// `d` has its highest set bit at position `3d`. `0` is [`OctantCode::NONE`], which names no
/// node at all and must not be navigated from.
///
/// ```
/// # use octpath::{Octant, OctantCode};
/// let c = OctantCode::ROOT.child(Octant(5)).child(Octant(2));
/// assert_eq!(c.depth(), 2);
/// assert_eq!(c.parent().parent(), OctantCode::ROOT);
/// ```
#[repr(transparent)]
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OctantCode(u32);

impl OctantCode {
    /// The sentinel "no node" code.
    pub const NONE: Self = Self(0);
    /// The code of the root octant, representing the whole region.
    pub const ROOT: Self = Self(1);
    /// The deepest level representable in 32 bits (1 marker bit + 3 bits per level).
    pub const MAX_DEPTH: u8 = 10;

    /// Wrap a raw code without validation.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Wrap a raw code, returning `None` unless it is a well-formed, non-sentinel code.
    pub fn new(raw: u32) -> Option<Self> {
        let code = Self(raw);
        code.is_valid().then_some(code)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_root(self) -> bool {
        self.0 == 1
    }

    /// Whether `self` is a non-sentinel code whose marker bit sits on a level boundary.
    pub fn is_valid(self) -> bool {
        self.0 != 0 && (31 - self.0.leading_zeros()) % 3 == 0
    }

    /// Number of ancestors of this code; `0` for the root.
    #[inline]
    pub fn depth(self) -> u8 {
        debug_assert!(!self.is_none(), "depth of the NONE code");
        ((31 - self.0.leading_zeros()) / 3) as u8
    }

    /// Code of the parent octant. The parent of the root is [`OctantCode::NONE`].
    #[inline]
    pub fn parent(self) -> Self {
        debug_assert!(!self.is_none(), "parent of the NONE code");
        Self(self.0 >> 3)
    }

    /// Code of the `oct`th child of `self`.
    #[inline]
    pub fn child(self, oct: Octant) -> Self {
        debug_assert!(!self.is_none(), "child of the NONE code");
        debug_assert!(self.depth() < Self::MAX_DEPTH, "child below MAX_DEPTH");
        Self((self.0 << 3) | (oct.0 & 0b111) as u32)
    }

    /// Code of the first (`-x-y-z`) child of `self`.
    #[inline]
    pub fn first_child(self) -> Self {
        self.child(Octant(0))
    }

    /// Which child of its parent `self` is. Meaningless for the root.
    #[inline]
    pub fn octant(self) -> Octant {
        Octant((self.0 & 0b111) as u8)
    }

    /// The octants leading from the root to `self`, shallowest first.
    pub fn path(self) -> impl Iterator<Item = Octant> {
        let depth = self.depth();
        (0..depth)
            .rev()
            .map(move |level| Octant(((self.0 >> (3 * level as u32)) & 0b111) as u8))
    }

    /// Whether `self` is a (non-strict) ancestor of `other`.
    pub fn contains(self, other: Self) -> bool {
        let (d, od) = (self.depth(), other.depth());
        od >= d && (other.0 >> (3 * (od - d) as u32)) == self.0
    }

    /// Integer coordinates of `self` within the `2ᵈ`-sized grid of its own depth.
    pub fn lattice(self) -> Vector3<u32> {
        self.path()
            .fold(Vector3::zeros(), |acc, oct| acc * 2 + oct.vector())
    }
}

/// Edge length of an octant at `depth`, given the root edge length.
#[inline]
pub fn size_at_depth(root_size: Real, depth: u8) -> Real {
    root_size * (0.5 as Real).powi(depth as i32)
}

impl fmt::Debug for OctantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:o}", self.0)
    }
}

impl fmt::Display for OctantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<OctantCode> for u32 {
    fn from(code: OctantCode) -> Self {
        code.0
    }
}
