use nalgebra::Vector3;

use crate::{Real, WorldPoint};

/// A way to refer to octants in a 3D volume.
///
/// # Diagram
/// `IJK>A`, where `IJK` are the octant coords (`I` = x, `J` = y, `K` = z), and `A` is the
/// corresponding child index.
/// <pre>
/// Lower           Upper
/// -------------   -------------     2 - 6     J
/// |000>0|100>4|   |010>2|110>6|   3 - 7 |     |
/// |-----|-----|   |-----|-----|   |   | 4     ___ I
/// |001>1|101>5|   |011>3|111>7|   1 - 5      /
/// -------------   -------------             K
/// </pre>
///
/// So `-x-y-z` is child `0` and `+x+y+z` is child `7`. Every subsystem that generates,
/// stores or reads children (building, connecting, locating, persisting) goes through this
/// type, so they all agree on what a child index means spatially.
#[repr(transparent)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Octant(pub u8);

impl Octant {
    /// Iterator through all possible octants, in child order.
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..8).map(Self)
    }

    /// Construct an Octant from coordinates; `true` selects the positive half of an axis.
    #[inline]
    pub fn new(i: bool, j: bool, k: bool) -> Self {
        Self((i as u8 * 0b100) | (j as u8 * 0b010) | (k as u8))
    }

    /// Find the Octant of a point `p` relative to a center `c`.
    ///
    /// Points lying exactly on a dividing plane belong to the positive half.
    #[inline]
    pub fn of(c: &WorldPoint, p: &WorldPoint) -> Self {
        Self::new(p.x >= c.x, p.y >= c.y, p.z >= c.z)
    }

    /// Whether `self` lies on the positive side of the x axis.
    #[inline]
    pub fn i(self) -> bool {
        self.0 & 0b100 != 0
    }
    /// Whether `self` lies on the positive side of the y axis.
    #[inline]
    pub fn j(self) -> bool {
        self.0 & 0b010 != 0
    }
    /// Whether `self` lies on the positive side of the z axis.
    #[inline]
    pub fn k(self) -> bool {
        self.0 & 0b001 != 0
    }

    /// Offset of this child within its parent's `2×2×2` block of children.
    #[inline]
    pub fn vector(self) -> Vector3<u32> {
        Vector3::new(self.i() as u32, self.j() as u32, self.k() as u32)
    }

    /// Unit direction from a parent's center towards this child's center.
    pub fn sign(self) -> Vector3<Real> {
        let s = |b: bool| if b { 1.0 } else { -1.0 };
        Vector3::new(s(self.i()), s(self.j()), s(self.k()))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;

    #[test]
    fn ordering_matches_axes() {
        assert_eq!(Octant::new(false, false, false), Octant(0));
        assert_eq!(Octant::new(false, false, true), Octant(1));
        assert_eq!(Octant::new(false, true, false), Octant(2));
        assert_eq!(Octant::new(true, false, false), Octant(4));
        assert_eq!(Octant::new(true, true, true), Octant(7));
        for oct in Octant::all() {
            assert_eq!(Octant::new(oct.i(), oct.j(), oct.k()), oct);
        }
        assert_eq!(Octant(0).vector(), Vector3::new(0, 0, 0));
        assert_eq!(Octant(5).vector(), Vector3::new(1, 0, 1));
        assert_eq!(Octant(6).vector(), Vector3::new(1, 1, 0));
    }

    #[test]
    fn of_point() {
        let c = point![0.0, 0.0, 0.0];
        assert_eq!(Octant::of(&c, &point![-1.0, -1.0, -1.0]), Octant(0));
        assert_eq!(Octant::of(&c, &point![1.0, -1.0, 1.0]), Octant(5));
        // ties go positive
        assert_eq!(Octant::of(&c, &c), Octant(7));
    }
}
