use nalgebra::Vector3;

use crate::{Octant, OctantCode, Real, WorldPoint};

use super::Aabb;

#[derive(Debug, thiserror::Error)]
pub enum AabcError {
    #[error("volume {0:?} does not contain point {1:?}")]
    PointOutOfBounds(Aabc, WorldPoint),
}

/// Axis-Aligned Bounding Cube
///
/// Stored as a center and half edge length, because octant centers are what the tree
/// records and what every child computation starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabc {
    pub center: WorldPoint,
    pub half: Real,
}

impl Aabc {
    #[inline]
    pub fn new(center: WorldPoint, half: Real) -> Self {
        Self { center, half }
    }

    /// Construct a cube from its center and full edge length.
    #[inline]
    pub fn with_size(center: WorldPoint, size: Real) -> Self {
        Self::new(center, size / 2.0)
    }

    #[inline]
    pub fn size(&self) -> Real {
        self.half * 2.0
    }

    #[inline]
    pub fn mins(&self) -> WorldPoint {
        self.center - Vector3::repeat(self.half)
    }

    #[inline]
    pub fn maxs(&self) -> WorldPoint {
        self.center + Vector3::repeat(self.half)
    }

    /// Determine whether a point `p` lies within `self` (boundary included).
    pub fn contains(&self, p: &WorldPoint) -> bool {
        let (n, x) = (self.mins(), self.maxs());
        (p.x >= n.x && p.x <= x.x) && (p.y >= n.y && p.y <= x.y) && (p.z >= n.z && p.z <= x.z)
    }

    /// Determine the [Octant] of `p`.
    ///
    /// This still works even if `p` ∉ `self`: the result is given as if taking the octant of `p`
    /// within an infinitely-large bounding cube sharing a center with `self`.
    #[inline]
    pub fn octant_of(&self, p: &WorldPoint) -> Octant {
        Octant::of(&self.center, p)
    }

    /// Given an [Octant] `oct`, construct an [Aabc] `n` such that `n` is the `oct`th octant of
    /// `self`.
    #[inline]
    pub fn child(&self, oct: Octant) -> Self {
        let q = self.half / 2.0;
        Self {
            center: self.center + oct.sign() * q,
            half: q,
        }
    }

    /// Given a [point](WorldPoint) `p`, construct the octant of `self` containing `p`.
    ///
    /// * [`PointOutOfBounds`](AabcError::PointOutOfBounds) if `p` ∉ `self`.
    pub fn child_containing(&self, p: &WorldPoint) -> Result<(Octant, Self), AabcError> {
        if !self.contains(p) {
            return Err(AabcError::PointOutOfBounds(*self, *p));
        }
        let oct = self.octant_of(p);
        Ok((oct, self.child(oct)))
    }

    /// The cube of the octant named by `code`, treating `self` as the root.
    ///
    /// This is the only way octant centers are derived, so centers computed at bake time and
    /// after loading a persisted tree are bit-identical.
    pub fn descend(&self, code: OctantCode) -> Self {
        code.path().fold(*self, |cube, oct| cube.child(oct))
    }
}

impl From<Aabc> for Aabb {
    fn from(cube: Aabc) -> Self {
        Self {
            mins: cube.mins(),
            maxs: cube.maxs(),
        }
    }
}
