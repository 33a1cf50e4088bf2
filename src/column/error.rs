use nalgebra::Vector3;

use crate::{spatial::QueryError, Real};

/// Errors related to configuring and baking [ColumnGrids](crate::ColumnGrid).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Voxel size must be positive and finite, got {0}")]
    InvalidCellSize(Real),
    #[error("Grid origin must be finite")]
    InvalidOrigin,
    #[error("Grid dimensions must all be nonzero, got {0:?}")]
    EmptyGrid(Vector3<u32>),
    #[error("Grid of {0} voxels is too large to sample")]
    TooLarge(u64),
    #[error("Clearance must be at least one voxel")]
    ZeroClearance,
    #[error("Obstacle query failed while sampling voxel {voxel:?}")]
    QueryFailed {
        voxel: Vector3<u32>,
        #[source]
        source: QueryError,
    },
}
