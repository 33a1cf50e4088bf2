//! Obstacle worlds made of arbitrary [parry3d] shapes.

use parry3d::{
    math::{Isometry, Vector},
    query::{self, Ray, RayCast},
    shape::{Ball, Cuboid, Shape, SharedShape},
};

use crate::{Real, WorldPoint};

use super::{LayerMask, LineOfSight, ObstacleQuery, QueryError, QueryMode, QueryRegion};

/// A placed shape within a [ShapeField].
#[derive(Clone)]
pub struct Placed {
    pub pose: Isometry<Real>,
    pub shape: SharedShape,
    pub layers: LayerMask,
}

impl std::fmt::Debug for Placed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Placed")
            .field("pose", &self.pose)
            .field("shape", &self.shape.shape_type())
            .field("layers", &self.layers)
            .finish()
    }
}

/// A set of posed parry shapes answering obstacle and line-of-sight queries.
#[derive(Debug, Clone, Default)]
pub struct ShapeField {
    shapes: Vec<Placed>,
}

impl ShapeField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pose: Isometry<Real>, shape: SharedShape, layers: LayerMask) {
        self.shapes.push(Placed {
            pose,
            shape,
            layers,
        });
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl ObstacleQuery for ShapeField {
    fn any_obstacle(&self, region: &QueryRegion) -> Result<bool, QueryError> {
        let pose = Isometry::translation(region.center.x, region.center.y, region.center.z);
        let cuboid;
        let ball;
        let probe: &dyn Shape = match region.mode {
            QueryMode::Cube => {
                cuboid = Cuboid::new(Vector::repeat(region.half_extent));
                &cuboid
            }
            QueryMode::Sphere => {
                ball = Ball::new(region.half_extent);
                &ball
            }
        };
        for placed in self.shapes.iter().filter(|p| p.layers & region.layers != 0) {
            let hit = query::intersection_test(&pose, probe, &placed.pose, &*placed.shape)
                .map_err(|e| QueryError::new(format!("{e:?} ({:?})", placed.shape.shape_type())))?;
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl LineOfSight for ShapeField {
    fn line_of_sight(&self, from: &WorldPoint, to: &WorldPoint) -> bool {
        let ray = Ray::new(*from, to - from);
        !self
            .shapes
            .iter()
            .any(|p| p.shape.cast_ray(&p.pose, &ray, 1.0, true).is_some())
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::point;

    use super::*;
    use crate::Aabc;

    #[test]
    fn ball_blocks_region_and_sight() {
        let mut field = ShapeField::new();
        field.push(Isometry::identity(), SharedShape::ball(1.0), LayerMask::MAX);

        let near = Aabc::new(point![0.0, 0.0, 0.0], 0.5);
        let far = Aabc::new(point![5.0, 0.0, 0.0], 0.5);
        let q = |c: &Aabc| QueryRegion::new(c, LayerMask::MAX, QueryMode::Cube);
        assert!(field.any_obstacle(&q(&near)).unwrap());
        assert!(!field.any_obstacle(&q(&far)).unwrap());

        assert!(!field.line_of_sight(&point![-3.0, 0.0, 0.0], &point![3.0, 0.0, 0.0]));
        assert!(field.line_of_sight(&point![-3.0, 2.0, 0.0], &point![3.0, 2.0, 0.0]));
    }
}
