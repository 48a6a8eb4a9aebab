//! Spatial reference systems and coordinate transformations.

mod srs;
mod transform;

pub use srs::SpatialRef;
pub use transform::CoordTransform;
