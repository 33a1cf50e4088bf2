//! Geometry of octree volumes and the capabilities a host world provides to query them.

mod bounding_box;
pub use bounding_box::*;
mod bounding_cube;
pub use bounding_cube::*;
mod boxes;
pub use boxes::*;
mod query;
pub use query::*;
#[cfg(feature = "spatial")]
mod shapes;
#[cfg(feature = "spatial")]
pub use shapes::*;
