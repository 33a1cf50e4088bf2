use nalgebra::{vector, Vector3};

use crate::spatial::{Aabc, ObstacleQuery, QueryMode, QueryRegion};

use super::{ColumnSettings, Error, Span};

/// Solid/empty samples of every voxel, stored column by column.
pub(super) struct Solidity {
    dims: Vector3<u32>,
    solid: Vec<bool>,
}

impl Solidity {
    /// Sample every voxel of the grid described by `settings` against `query`.
    pub fn sample<Q: ObstacleQuery + ?Sized>(
        settings: &ColumnSettings,
        query: &Q,
    ) -> Result<Self, Error> {
        let dims = settings.dimensions;
        let mut solid = Vec::with_capacity(settings.voxel_count() as usize);
        for z in 0..dims.z {
            for x in 0..dims.x {
                for y in 0..dims.y {
                    let voxel = vector![x, y, z];
                    let cube = Aabc::with_size(settings.voxel_center(voxel), settings.cell_size);
                    let region = QueryRegion::new(&cube, settings.include_layers, QueryMode::Cube);
                    let hit = query
                        .any_obstacle(&region)
                        .map_err(|source| Error::QueryFailed { voxel, source })?;
                    solid.push(hit);
                }
            }
        }
        Ok(Self { dims, solid })
    }

    #[inline]
    fn column(&self, x: u32, z: u32) -> &[bool] {
        let h = self.dims.y as usize;
        let start = (z as usize * self.dims.x as usize + x as usize) * h;
        &self.solid[start..start + h]
    }

    /// The walkable spans of column `(x, z)`, lowest first.
    ///
    /// A voxel is walkable if it is empty, stands on a solid voxel (or on the floor of the
    /// grid, when that counts as solid), and has `clearance` empty voxels starting at itself.
    /// Empty space above the top of the grid counts as clear.
    pub fn spans(&self, x: u32, z: u32, settings: &ColumnSettings) -> Vec<Span> {
        let column = self.column(x, z);
        let mut res = Vec::new();
        for (y, &filled) in column.iter().enumerate() {
            if filled {
                continue;
            }
            let supported = match y {
                0 => settings.floor_is_solid,
                _ => column[y - 1],
            };
            if !supported {
                continue;
            }
            let height = column[y..].iter().take_while(|s| !**s).count() as u32;
            let open_top = y as u32 + height == self.dims.y;
            if height >= settings.clearance || open_top {
                res.push(Span {
                    floor: y as u32,
                    height,
                });
            }
        }
        res
    }
}
