//! Octree spatial partitioning plus any-angle pathfinding over the resulting cell graph.
//!
//! A region of space is subdivided into transitable and intransitable [octants](OctantData)
//! by an [Octree], whose leaves are then linked into a neighbor graph. Any structure
//! implementing [Graph] (the octree through [OctreeNavigator], or the voxel-column
//! [ColumnGrid]) can be searched with a resumable [Search] session.
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

pub mod code;
pub mod column;
pub mod error;
pub mod graph;
mod octant;
pub mod search;
pub mod spatial;
pub mod tree;

pub use code::OctantCode;
pub use column::{ColumnGrid, ColumnNavigator, ColumnNode, ColumnSettings};
pub use error::Error;
pub use graph::{Cost, Graph};
pub use octant::*;
pub use search::{
    find_path, CancelToken, Deadline, Goal, Matching, Path, PathResult, Reach, Search,
    SearchError, SearchMode, SearchPool, SearchState, Status, StepBudget, Target, Unbounded,
    Watchdog,
};
pub use spatial::{Aabb, Aabc, LineOfSight, ObstacleQuery, QueryMode, QueryRegion};
pub use tree::{
    BakeStats, ConnectionType, OctantData, OctantFlags, Octree, OctreeNavigator, OctreeSettings,
    SharedOctree,
};

use nalgebra::{Point3, Vector3};

/// Scalar type used for all world-space math.
///
/// Matches `parry3d::math::Real` so shapes can be queried without conversion.
pub type Real = f32;

/// A point within a navigable volume
pub type WorldPoint = Point3<Real>;

/// A vector within a navigable volume
pub type WorldVector = Vector3<Real>;
