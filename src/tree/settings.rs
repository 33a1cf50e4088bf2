use nalgebra::point;

use crate::{
    spatial::{Aabc, LayerMask, QueryMode},
    OctantCode, Real, WorldPoint,
};

use super::{Error, OctantFlags};

bitflags::bitflags! {
    /// Which kinds of leaves the connectivity graph links together.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ConnectionType: u8 {
        const TRANSITABLE = 0b01;
        const INTRANSITABLE = 0b10;
        const BOTH = Self::TRANSITABLE.bits() | Self::INTRANSITABLE.bits();
    }
}

impl Default for ConnectionType {
    fn default() -> Self {
        Self::TRANSITABLE
    }
}

impl ConnectionType {
    /// Whether a leaf with `flags` takes part in connectivity under `self`.
    #[inline]
    pub fn admits(self, flags: OctantFlags) -> bool {
        if flags.contains(OctantFlags::INTRANSITABLE) {
            self.contains(Self::INTRANSITABLE)
        } else {
            self.contains(Self::TRANSITABLE)
        }
    }
}

/// Configuration of an [Octree](crate::Octree).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OctreeSettings {
    /// Center of the root cube.
    pub center: WorldPoint,
    /// Edge length of the root cube.
    pub size: Real,
    /// Deepest level subdivision may reach; at most [`OctantCode::MAX_DEPTH`].
    pub max_depth: u8,
    /// Obstacle layers that make space intransitable.
    pub include_layers: LayerMask,
    /// Obstacle layers that count as ground underneath transitable leaves; `0` disables
    /// ground classification.
    pub ground_layers: LayerMask,
    pub query_mode: QueryMode,
    pub connection: ConnectionType,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            center: point![0.0, 0.0, 0.0],
            size: 64.0,
            max_depth: 5,
            include_layers: LayerMask::MAX,
            ground_layers: 0,
            query_mode: QueryMode::Cube,
            connection: ConnectionType::TRANSITABLE,
        }
    }
}

impl OctreeSettings {
    pub fn new(center: WorldPoint, size: Real, max_depth: u8) -> Self {
        Self {
            center,
            size,
            max_depth,
            ..Default::default()
        }
    }

    pub fn with_layers(mut self, include: LayerMask, ground: LayerMask) -> Self {
        self.include_layers = include;
        self.ground_layers = ground;
        self
    }

    pub fn with_query_mode(mut self, mode: QueryMode) -> Self {
        self.query_mode = mode;
        self
    }

    pub fn with_connection(mut self, connection: ConnectionType) -> Self {
        self.connection = connection;
        self
    }

    /// Reject configurations that cannot be baked.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_depth > OctantCode::MAX_DEPTH {
            return Err(Error::DepthTooLarge(self.max_depth));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(Error::InvalidSize(self.size));
        }
        if !self.center.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidCenter);
        }
        Ok(())
    }

    /// The cube covered by the root octant.
    #[inline]
    pub fn root_cube(&self) -> Aabc {
        Aabc::with_size(self.center, self.size)
    }

    /// Edge length of the smallest octant this configuration can produce.
    #[inline]
    pub fn min_octant_size(&self) -> Real {
        crate::code::size_at_depth(self.size, self.max_depth)
    }
}
