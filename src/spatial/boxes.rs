use crate::WorldPoint;

use super::{Aabb, LayerMask, LineOfSight, ObstacleQuery, QueryError, QueryMode, QueryRegion};

/// A set of axis-aligned blocking boxes.
///
/// The simplest world an octree can be baked against; also answers line-of-sight queries
/// against the same boxes.
#[derive(Debug, Clone, Default)]
pub struct BoxField {
    boxes: Vec<(Aabb, LayerMask)>,
}

impl BoxField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a box on every layer.
    pub fn with(mut self, aabb: Aabb) -> Self {
        self.push(aabb, LayerMask::MAX);
        self
    }

    pub fn push(&mut self, aabb: Aabb, layers: LayerMask) {
        self.boxes.push((aabb, layers));
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aabb> {
        self.boxes.iter().map(|(b, _)| b)
    }
}

impl FromIterator<Aabb> for BoxField {
    fn from_iter<I: IntoIterator<Item = Aabb>>(iter: I) -> Self {
        Self {
            boxes: iter.into_iter().map(|b| (b, LayerMask::MAX)).collect(),
        }
    }
}

impl ObstacleQuery for BoxField {
    fn any_obstacle(&self, region: &QueryRegion) -> Result<bool, QueryError> {
        let mut candidates = self
            .boxes
            .iter()
            .filter(|(_, layers)| layers & region.layers != 0);
        Ok(match region.mode {
            QueryMode::Cube => {
                let bb = region.aabb();
                candidates.any(|(b, _)| b.intersects(&bb))
            }
            QueryMode::Sphere => {
                candidates.any(|(b, _)| b.intersects_sphere(&region.center, region.half_extent))
            }
        })
    }
}

impl LineOfSight for BoxField {
    fn line_of_sight(&self, from: &WorldPoint, to: &WorldPoint) -> bool {
        !self.boxes.iter().any(|(b, _)| b.intersects_segment(from, to))
    }
}
