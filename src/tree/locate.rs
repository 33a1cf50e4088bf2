use std::sync::Arc;

use nalgebra::distance_squared;

use crate::{OctantCode, Real, WorldPoint};

use super::{OctantData, Octree};

/// Leaf centers sorted along x, for nearest-neighbor fallbacks.
#[derive(Debug, Default)]
pub(super) struct NearestIndex {
    points: Vec<(WorldPoint, OctantCode)>,
}

impl NearestIndex {
    pub fn new(points: impl IntoIterator<Item = (WorldPoint, OctantCode)>) -> Self {
        let mut points: Vec<_> = points.into_iter().collect();
        points.sort_by(|(a, ac), (b, bc)| a.x.total_cmp(&b.x).then(ac.cmp(bc)));
        Self { points }
    }

    /// The closest indexed code to `p`; equally distant codes resolve to the smaller one.
    pub fn nearest(&self, p: &WorldPoint) -> Option<OctantCode> {
        let split = self.points.partition_point(|(q, _)| q.x < p.x);
        let mut best: Option<(Real, OctantCode)> = None;
        let mut consider = |q: &WorldPoint, code: OctantCode| {
            let dx = q.x - p.x;
            if best.is_some_and(|(d, _)| dx * dx > d) {
                return false;
            }
            let d = distance_squared(p, q);
            if best.map_or(true, |(bd, bc)| d < bd || (d == bd && code < bc)) {
                best = Some((d, code));
            }
            true
        };
        for (q, code) in &self.points[split..] {
            if !consider(q, *code) {
                break;
            }
        }
        for (q, code) in self.points[..split].iter().rev() {
            if !consider(q, *code) {
                break;
            }
        }
        best.map(|(_, code)| code)
    }
}

impl Octree {
    /// The deepest stored octant containing `p`, or `None` if `p` lies outside the root.
    pub fn locate(&self, p: &WorldPoint) -> Option<OctantCode> {
        let mut cube = self.settings.root_cube();
        if !cube.contains(p) {
            return None;
        }
        let mut code = OctantCode::ROOT;
        while self.store.has_children(code) {
            let Ok((oct, inner)) = cube.child_containing(p) else {
                break;
            };
            let child = code.child(oct);
            if !self.store.contains(child) {
                break;
            }
            code = child;
            cube = inner;
        }
        Some(code)
    }

    /// Whether `octant` can serve as a graph node.
    fn admissible(&self, octant: &OctantData, require_ground: bool) -> bool {
        octant.is_leaf()
            && self.settings.connection.admits(octant.flags)
            && (!require_ground || octant.has_ground())
    }

    /// The graph node that best represents `p`.
    ///
    /// This is the leaf containing `p` when that leaf is a usable node; otherwise the usable
    /// leaf whose center is nearest to `p`. With `require_ground`, only leaves with ground
    /// below them are usable.
    pub fn closest_node(&self, p: &WorldPoint, require_ground: bool) -> Option<OctantCode> {
        let containing = self
            .locate(p)
            .filter(|&code| self.store.get(code).is_some_and(|o| self.admissible(o, require_ground)));
        if containing.is_some() {
            return containing;
        }
        self.nearest_index(require_ground).nearest(p)
    }

    fn nearest_index(&self, require_ground: bool) -> Arc<NearestIndex> {
        let slot = require_ground as usize;
        let cached = self.nearest_cache.read()[slot].clone();
        if let Some(index) = cached {
            return index;
        }
        let index = Arc::new(NearestIndex::new(
            self.store
                .iter()
                .filter(|o| self.admissible(o, require_ground))
                .map(|o| (o.center, o.code)),
        ));
        tracing::trace!(points = index.points.len(), require_ground, "built nearest-leaf index");
        self.nearest_cache.write()[slot] = Some(index.clone());
        index
    }
}
