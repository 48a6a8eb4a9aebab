//! Geometry wrappers and the operations defined on them.

mod envelope;
mod field;
mod from_geo;
mod geometry;
pub(crate) mod kind;
mod ops;
mod to_geo;

pub use envelope::Envelope;
pub use field::{FieldType, FieldValue};
pub use from_geo::ToGeometry;
pub use geometry::Geometry;
pub use kind::GeometryKind;
pub use ops::DEFAULT_BUFFER_QUAD_SEGS;
