use nalgebra::vector;

use crate::{
    spatial::{Aabc, ObstacleQuery, QueryRegion},
    Octant, OctantCode,
};

use super::{Error, OctantData, OctantFlags, OctantStore, OctreeSettings};

/// Counters describing the outcome of an [Octree::bake](crate::Octree::bake).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BakeStats {
    /// Obstacle queries issued, ground queries included.
    pub queries: usize,
    pub branches: usize,
    pub transitable: usize,
    pub intransitable: usize,
    /// Transitable leaves with ground directly below them.
    pub grounded: usize,
    /// Branches collapsed into a single intransitable leaf.
    pub collapsed: usize,
    /// Undirected neighbor links in the connectivity graph.
    pub connections: usize,
}

impl BakeStats {
    #[inline]
    pub fn leaves(&self) -> usize {
        self.transitable + self.intransitable
    }
}

/// Recursive subdivision of a store against an obstacle query.
pub(super) struct Builder<'q, Q: ?Sized> {
    settings: &'q OctreeSettings,
    query: &'q Q,
    stats: BakeStats,
}

impl<'q, Q: ObstacleQuery + ?Sized> Builder<'q, Q> {
    pub fn new(settings: &'q OctreeSettings, query: &'q Q) -> Self {
        Self {
            settings,
            query,
            stats: BakeStats::default(),
        }
    }

    /// Subdivide `store` from the root, reusing whatever structure it already holds.
    pub fn run(mut self, store: &mut OctantStore) -> Result<BakeStats, Error> {
        self.subdivide(store, OctantCode::ROOT, self.settings.root_cube())?;
        Ok(self.stats)
    }

    fn ask(&mut self, code: OctantCode, region: QueryRegion) -> Result<bool, Error> {
        self.stats.queries += 1;
        self.query
            .any_obstacle(&region)
            .map_err(|source| Error::QueryFailed { code, source })
    }

    /// Whether the slab of the same size directly below `cube` holds ground.
    fn grounded(&mut self, code: OctantCode, cube: &Aabc) -> Result<bool, Error> {
        let below = Aabc::new(cube.center - vector![0.0, cube.size(), 0.0], cube.half);
        let region = QueryRegion::new(&below, self.settings.ground_layers, self.settings.query_mode);
        self.ask(code, region)
    }

    fn prune(store: &mut OctantStore, code: OctantCode) -> Result<(), Error> {
        if store.has_children(code) {
            store.remove_block_of_eight(code.first_child())?;
        }
        Ok(())
    }

    /// Returns whether the octant at `code` ended up an intransitable leaf.
    fn subdivide(
        &mut self,
        store: &mut OctantStore,
        code: OctantCode,
        cube: Aabc,
    ) -> Result<bool, Error> {
        let region = QueryRegion::new(&cube, self.settings.include_layers, self.settings.query_mode);
        let blocked = self.ask(code, region)?;

        if !blocked {
            Self::prune(store, code)?;
            let mut flags = OctantFlags::LEAF;
            if self.settings.ground_layers != 0 && self.grounded(code, &cube)? {
                flags |= OctantFlags::HAS_GROUND;
                self.stats.grounded += 1;
            }
            store.set(OctantData::new(code, cube.center, flags))?;
            self.stats.transitable += 1;
            return Ok(false);
        }

        if code.depth() >= self.settings.max_depth {
            Self::prune(store, code)?;
            store.set(OctantData::new(
                code,
                cube.center,
                OctantFlags::LEAF | OctantFlags::INTRANSITABLE,
            ))?;
            self.stats.intransitable += 1;
            return Ok(true);
        }

        store.set(OctantData::new(code, cube.center, OctantFlags::empty()))?;
        store.allocate_block(code)?;
        let mut all_blocked = true;
        for oct in Octant::all() {
            all_blocked &= self.subdivide(store, code.child(oct), cube.child(oct))?;
        }

        if all_blocked {
            tracing::trace!(?code, "collapsing fully blocked branch");
            store.remove_block_of_eight(code.first_child())?;
            store.set(OctantData::new(
                code,
                cube.center,
                OctantFlags::LEAF | OctantFlags::INTRANSITABLE,
            ))?;
            self.stats.intransitable -= 7;
            self.stats.collapsed += 1;
        } else {
            self.stats.branches += 1;
        }
        Ok(all_blocked)
    }
}
