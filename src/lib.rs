//! A planar geometry engine with an OGR-flavored wrapper API.
//!
//! Geometries are built, parsed, combined, and serialized through the
//! [`vector::Geometry`] wrapper; all coordinate state lives behind the
//! [`engine::Engine`] seam, and spatial reference systems and coordinate
//! transforms live in [`spatial_ref`].
//!
//! ## Use
//!
//! ```
//! use terrane::vector::Geometry;
//!
//! let cell = Geometry::from_wkt("POLYGON ((0 0,0 10,10 10,10 0,0 0))").unwrap();
//! let probe = Geometry::from_wkt("POLYGON ((5 5,5 15,15 15,15 5,5 5))").unwrap();
//! assert!(cell.intersects(&probe).unwrap());
//!
//! let shared = cell.intersection(&probe).unwrap();
//! assert_eq!(shared.name(), "Polygon");
//! assert_eq!(shared.area(), 25.0);
//! ```

pub mod engine;
pub mod errors;
pub mod spatial_ref;
pub mod vector;

pub use errors::TerraneError;
