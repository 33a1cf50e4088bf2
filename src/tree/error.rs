use crate::{spatial::QueryError, OctantCode, Real};

/// Errors related to building and configuring [Octrees](crate::Octree).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Subdivision depth {0} exceeds the maximum of {max}", max = OctantCode::MAX_DEPTH)]
    DepthTooLarge(u8),
    #[error("Octree size must be positive and finite, got {0}")]
    InvalidSize(Real),
    #[error("Octree center must be finite")]
    InvalidCenter,
    #[error("Attempted to use an invalid octant code: {0:?}")]
    InvalidCode(OctantCode),
    #[error("Octant {code:?} lies below the configured depth of {max_depth}")]
    TooDeep { code: OctantCode, max_depth: u8 },
    #[error("Obstacle query failed while baking octant {code:?}")]
    QueryFailed {
        code: OctantCode,
        #[source]
        source: QueryError,
    },
}

/// Errors from reading or writing persisted [Octrees](crate::Octree).
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Not an octree file (bad magic {0:?})")]
    BadMagic([u8; 4]),
    #[error("Unsupported octree file version {0}")]
    UnsupportedVersion(u16),
    #[error("Invalid {field} in octree header: {value}")]
    BadHeader { field: &'static str, value: i64 },
    #[error("Octree file stores octant {0:?} more than once")]
    DuplicateOctant(OctantCode),
    #[error("Octree file links {owner:?} to {neighbor:?}, which is not a matching neighbor")]
    BadLink {
        owner: OctantCode,
        neighbor: OctantCode,
    },
    #[error("Octree file lists {listed} connections but stores {stored}")]
    ConnectionCount { listed: usize, stored: usize },
    #[error(transparent)]
    Config(#[from] Error),
}
