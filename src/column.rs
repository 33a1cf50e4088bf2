//! Walkable surfaces of a voxelized volume, as a graph of floor spans over a 2D grid.
//!
//! The volume is cut into `dimensions.x × dimensions.y × dimensions.z` voxels. Each `(x, z)`
//! column records the voxels an agent can stand in; standing voxels of neighboring columns
//! are linked when the step between them is small enough to climb.

mod bake;
mod error;
mod navigator;

pub use error::*;
pub use navigator::*;

use nalgebra::{distance_squared, vector, Vector3};

use crate::{
    spatial::{LayerMask, ObstacleQuery},
    Real, WorldPoint,
};

use bake::Solidity;

/// Configuration of a [ColumnGrid].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSettings {
    /// Minimum corner of the voxelized volume.
    pub origin: WorldPoint,
    /// Edge length of one voxel.
    pub cell_size: Real,
    /// Voxel counts along each axis; `y` is up.
    pub dimensions: Vector3<u32>,
    /// Largest floor height difference, in voxels, that can be stepped across.
    pub climb: u32,
    /// Empty voxels needed above a floor, counting the standing voxel itself.
    pub clearance: u32,
    /// Whether the bottom of the volume counts as solid ground.
    pub floor_is_solid: bool,
    pub include_layers: LayerMask,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            origin: WorldPoint::origin(),
            cell_size: 1.0,
            dimensions: vector![16, 16, 16],
            climb: 1,
            clearance: 2,
            floor_is_solid: true,
            include_layers: LayerMask::MAX,
        }
    }
}

impl ColumnSettings {
    pub fn new(origin: WorldPoint, cell_size: Real) -> Self {
        Self {
            origin,
            cell_size,
            ..Default::default()
        }
    }

    pub fn with_dimensions(mut self, x: u32, y: u32, z: u32) -> Self {
        self.dimensions = vector![x, y, z];
        self
    }

    pub fn with_agent(mut self, climb: u32, clearance: u32) -> Self {
        self.climb = climb;
        self.clearance = clearance;
        self
    }

    /// Reject configurations that cannot be baked.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(Error::InvalidCellSize(self.cell_size));
        }
        if !self.origin.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidOrigin);
        }
        if self.dimensions.iter().any(|d| *d == 0) {
            return Err(Error::EmptyGrid(self.dimensions));
        }
        if self.clearance == 0 {
            return Err(Error::ZeroClearance);
        }
        let count = self.voxel_count();
        if count > u32::MAX as u64 {
            return Err(Error::TooLarge(count));
        }
        Ok(())
    }

    #[inline]
    pub fn voxel_count(&self) -> u64 {
        self.dimensions.iter().map(|d| *d as u64).product()
    }

    /// World-space center of the voxel at grid coordinates `voxel`.
    #[inline]
    pub fn voxel_center(&self, voxel: Vector3<u32>) -> WorldPoint {
        self.origin + voxel.map(|c| (c as Real + 0.5) * self.cell_size)
    }
}

/// A walkable voxel within a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Height index of the voxel an agent stands in.
    pub floor: u32,
    /// Number of empty voxels from `floor` upward.
    pub height: u32,
}

/// One standing place: the `span`th span of column `(x, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnNode {
    pub x: u32,
    pub z: u32,
    pub span: u32,
}

impl ColumnNode {
    pub const fn new(x: u32, z: u32, span: u32) -> Self {
        Self { x, z, span }
    }
}

/// Neighbor offsets in `(x, z)`: the four sides first, then the diagonals.
const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Walkable spans of a voxelized volume.
#[derive(Debug, Clone)]
pub struct ColumnGrid {
    settings: ColumnSettings,
    /// Indexed by `x + z * dimensions.x`.
    columns: Vec<Vec<Span>>,
    generation: u64,
}

impl ColumnGrid {
    /// Construct an unbaked grid, with no walkable spans at all.
    pub fn new(settings: ColumnSettings) -> Result<Self, Error> {
        settings.validate()?;
        let count = settings.dimensions.x as usize * settings.dimensions.z as usize;
        Ok(Self {
            settings,
            columns: vec![Vec::new(); count],
            generation: 0,
        })
    }

    #[inline]
    pub fn settings(&self) -> &ColumnSettings {
        &self.settings
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total number of spans.
    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    /// Spans of column `(x, z)`, lowest first; empty outside the grid.
    pub fn spans(&self, x: u32, z: u32) -> &[Span] {
        self.index(x, z)
            .map(|i| self.columns[i].as_slice())
            .unwrap_or_default()
    }

    pub fn span(&self, node: ColumnNode) -> Option<&Span> {
        self.spans(node.x, node.z).get(node.span as usize)
    }

    /// Every node of the grid, column by column.
    pub fn nodes(&self) -> impl Iterator<Item = ColumnNode> + '_ {
        let dx = self.settings.dimensions.x as usize;
        self.columns.iter().enumerate().flat_map(move |(i, spans)| {
            let (x, z) = ((i % dx) as u32, (i / dx) as u32);
            (0..spans.len() as u32).map(move |s| ColumnNode::new(x, z, s))
        })
    }

    /// Center of the voxel `node` stands in.
    ///
    /// Nodes that do not exist sit on the bottom layer of their column.
    pub fn position(&self, node: ColumnNode) -> WorldPoint {
        let floor = self.span(node).map_or(0, |s| s.floor);
        self.settings.voxel_center(vector![node.x, floor, node.z])
    }

    /// Resample every voxel against `query` and rebuild the spans.
    ///
    /// The grid is only replaced once every voxel was sampled; if a query fails, it is left
    /// as it was. Returns the number of spans found.
    #[tracing::instrument(skip_all, fields(dimensions = ?self.settings.dimensions))]
    pub fn bake<Q: ObstacleQuery + ?Sized>(&mut self, query: &Q) -> Result<usize, Error> {
        let solidity = match Solidity::sample(&self.settings, query) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "bake aborted; previous grid kept");
                return Err(e);
            }
        };
        let dims = self.settings.dimensions;
        let mut columns = Vec::with_capacity(self.columns.len());
        for z in 0..dims.z {
            for x in 0..dims.x {
                columns.push(solidity.spans(x, z, &self.settings));
            }
        }
        self.columns = columns;
        self.generation = self.generation.wrapping_add(1);
        let spans = self.len();
        tracing::debug!(spans, "baked column grid");
        Ok(spans)
    }

    /// Nodes one step away from `node`.
    ///
    /// Spans in the eight surrounding columns are reachable when their floor is within
    /// `climb` of this one. Diagonal steps also need both columns beside the step to be
    /// reachable, so paths never cut around corners.
    pub fn neighbors(&self, node: ColumnNode) -> impl Iterator<Item = ColumnNode> + '_ {
        let floor = self.span(node).map(|s| s.floor);
        floor.into_iter().flat_map(move |floor| {
            DIRECTIONS
                .iter()
                .filter_map(move |&(dx, dz)| {
                    let (x, z) = self.offset(node.x, node.z, dx, dz)?;
                    if dx != 0 && dz != 0 {
                        let (ax, az) = self.offset(node.x, node.z, dx, 0)?;
                        let (bx, bz) = self.offset(node.x, node.z, 0, dz)?;
                        if self.steps(ax, az, floor).next().is_none()
                            || self.steps(bx, bz, floor).next().is_none()
                        {
                            return None;
                        }
                    }
                    Some(self.steps(x, z, floor))
                })
                .flatten()
        })
    }

    /// The node closest to `p`.
    ///
    /// Columns are searched in growing square rings around the one below `p` (clamped into
    /// the grid); the closest span of the first ring holding any span wins, the first one
    /// found on ties.
    pub fn closest_node(&self, p: &WorldPoint) -> Option<ColumnNode> {
        if !p.iter().all(|c| c.is_finite()) {
            return None;
        }
        let dims = self.settings.dimensions;
        let cell = |axis: usize, dim: u32| -> i64 {
            let c = ((p[axis] - self.settings.origin[axis]) / self.settings.cell_size).floor();
            (c as i64).clamp(0, dim as i64 - 1)
        };
        let (cx, cz) = (cell(0, dims.x), cell(2, dims.z));
        let max_ring = dims.x.max(dims.z) as i64;
        for ring in 0..=max_ring {
            let mut best: Option<(Real, ColumnNode)> = None;
            for z in cz - ring..=cz + ring {
                for x in cx - ring..=cx + ring {
                    if (x - cx).abs().max((z - cz).abs()) != ring {
                        continue;
                    }
                    let (Ok(x), Ok(z)) = (u32::try_from(x), u32::try_from(z)) else {
                        continue;
                    };
                    for s in 0..self.spans(x, z).len() as u32 {
                        let node = ColumnNode::new(x, z, s);
                        let d = distance_squared(p, &self.position(node));
                        if best.map_or(true, |(b, _)| d < b) {
                            best = Some((d, node));
                        }
                    }
                }
            }
            if let Some((_, node)) = best {
                return Some(node);
            }
        }
        None
    }

    #[inline]
    fn index(&self, x: u32, z: u32) -> Option<usize> {
        let dims = self.settings.dimensions;
        (x < dims.x && z < dims.z).then(|| x as usize + z as usize * dims.x as usize)
    }

    fn offset(&self, x: u32, z: u32, dx: i32, dz: i32) -> Option<(u32, u32)> {
        let x = x.checked_add_signed(dx)?;
        let z = z.checked_add_signed(dz)?;
        self.index(x, z).map(|_| (x, z))
    }

    /// Spans of column `(x, z)` reachable from a floor at height `floor`.
    fn steps(&self, x: u32, z: u32, floor: u32) -> impl Iterator<Item = ColumnNode> + '_ {
        let climb = self.settings.climb;
        self.spans(x, z)
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.floor.abs_diff(floor) <= climb)
            .map(move |(i, _)| ColumnNode::new(x, z, i as u32))
    }
}
