mod conversions;
mod predicates;
mod set;
mod transformations;

pub use transformations::DEFAULT_BUFFER_QUAD_SEGS;
