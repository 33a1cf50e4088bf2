use nalgebra::Vector3;

use crate::{Real, WorldPoint};

/// Axis-Aligned Bounding Box
///
/// Similar to [`parry3d::bounding_volume::Aabb`], without requiring the `spatial` feature.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub mins: WorldPoint,
    pub maxs: WorldPoint,
}

impl Aabb {
    #[inline]
    pub fn new(mins: WorldPoint, maxs: WorldPoint) -> Self {
        Self { mins, maxs }
    }

    #[inline]
    pub fn from_half_extents(center: WorldPoint, half: Vector3<Real>) -> Self {
        Self {
            mins: center - half,
            maxs: center + half,
        }
    }

    /// Whether the interiors of `self` and `other` overlap.
    ///
    /// Boxes that only share a face, edge or corner do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|a| self.mins[a] < other.maxs[a] && other.mins[a] < self.maxs[a])
    }

    /// Squared distance from `p` to the nearest point of `self`; zero inside.
    pub fn distance_squared(&self, p: &WorldPoint) -> Real {
        (0..3)
            .map(|a| {
                let d = (self.mins[a] - p[a]).max(0.0).max(p[a] - self.maxs[a]);
                d * d
            })
            .sum()
    }

    /// Whether the interior of a sphere overlaps the interior of `self`.
    #[inline]
    pub fn intersects_sphere(&self, center: &WorldPoint, radius: Real) -> bool {
        self.distance_squared(center) < radius * radius
    }

    /// Whether the segment `a → b` passes through the interior of `self`.
    ///
    /// Slab test; a segment that only grazes a face does not count as a hit.
    pub fn intersects_segment(&self, a: &WorldPoint, b: &WorldPoint) -> bool {
        let d = b - a;
        let mut enter: Real = 0.0;
        let mut exit: Real = 1.0;
        for axis in 0..3 {
            let (lo, hi) = (self.mins[axis], self.maxs[axis]);
            if d[axis].abs() <= Real::EPSILON {
                if a[axis] <= lo || a[axis] >= hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d[axis];
            let (mut t0, mut t1) = ((lo - a[axis]) * inv, (hi - a[axis]) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            enter = enter.max(t0);
            exit = exit.min(t1);
            if enter >= exit {
                return false;
            }
        }
        true
    }
}

#[cfg(feature = "spatial")]
impl From<parry3d::bounding_volume::Aabb> for Aabb {
    fn from(p: parry3d::bounding_volume::Aabb) -> Self {
        Self {
            mins: p.mins,
            maxs: p.maxs,
        }
    }
}

#[cfg(feature = "spatial")]
impl From<Aabb> for parry3d::bounding_volume::Aabb {
    fn from(e: Aabb) -> Self {
        Self {
            mins: e.mins,
            maxs: e.maxs,
        }
    }
}
