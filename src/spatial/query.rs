use nalgebra::Vector3;

use crate::{Real, WorldPoint};

use super::{Aabb, Aabc};

/// Bitmask of obstacle layers; an obstacle is considered when its layers overlap the mask.
pub type LayerMask = u32;

/// How an obstacle query interprets the region it is handed.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum QueryMode {
    /// Test the whole cube.
    #[default]
    Cube = 0,
    /// Test the sphere inscribed in the cube.
    Sphere = 1,
}

impl TryFrom<i32> for QueryMode {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Cube),
            1 => Ok(Self::Sphere),
            other => Err(other),
        }
    }
}

/// A cubical region of space handed to an [ObstacleQuery].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRegion {
    pub center: WorldPoint,
    pub half_extent: Real,
    pub layers: LayerMask,
    pub mode: QueryMode,
}

impl QueryRegion {
    pub fn new(cube: &Aabc, layers: LayerMask, mode: QueryMode) -> Self {
        Self {
            center: cube.center,
            half_extent: cube.half,
            layers,
            mode,
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_half_extents(self.center, Vector3::repeat(self.half_extent))
    }
}

/// A failed obstacle query.
///
/// Queries are expected to be infallible in practice; when one does fail, whatever was
/// being built from it is abandoned rather than committed half-finished.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("obstacle query failed: {0}")]
pub struct QueryError(pub String);

impl QueryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Capability: report whether any obstacle lies within a region.
///
/// Implementations must be synchronous and free of side effects; the same region must
/// always produce the same answer while a bake is running.
pub trait ObstacleQuery {
    fn any_obstacle(&self, region: &QueryRegion) -> Result<bool, QueryError>;
}

impl<F> ObstacleQuery for F
where
    F: Fn(&QueryRegion) -> Result<bool, QueryError>,
{
    #[inline]
    fn any_obstacle(&self, region: &QueryRegion) -> Result<bool, QueryError> {
        self(region)
    }
}

/// Capability: report whether the straight segment between two points is unobstructed.
pub trait LineOfSight {
    fn line_of_sight(&self, from: &WorldPoint, to: &WorldPoint) -> bool;
}

impl<F> LineOfSight for F
where
    F: Fn(&WorldPoint, &WorldPoint) -> bool,
{
    #[inline]
    fn line_of_sight(&self, from: &WorldPoint, to: &WorldPoint) -> bool {
        self(from, to)
    }
}

/// Placeholder [LineOfSight] for navigators that have no sight capability attached.
///
/// Navigators holding this type report that they do not support line of sight, so it is
/// never actually consulted.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoSight;

impl LineOfSight for NoSight {
    fn line_of_sight(&self, _: &WorldPoint, _: &WorldPoint) -> bool {
        false
    }
}
