//! The geometry engine boundary.
//!
//! All geometry state lives behind an [`Engine`]; the wrapper types in
//! [`crate::vector`] hold opaque handles and forward every operation across
//! this trait. The crate ships one implementation, [`PlanarEngine`], and the
//! trait seam exists so tests can interpose instrumented engines.

mod gml;
mod json;
mod ops;
mod planar;
pub(crate) mod repr;
mod wkb;
mod wkt;

use std::sync::{Arc, OnceLock};

use crate::errors::Result;
use crate::spatial_ref::CoordTransform;
use crate::vector::{Envelope, GeometryKind};

pub use planar::PlanarEngine;

/// An opaque reference to a geometry owned by an engine.
///
/// Handles are plain values: comparing two handles for equality asks whether
/// they name the same engine-side geometry, which is how derived-geometry
/// results are checked against their inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeomHandle(pub(crate) u64);

/// Byte order of a well-known-binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WkbByteOrder {
    /// Big endian.
    Xdr,
    /// Little endian.
    Ndr,
}

/// GeoJSON export options.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonOptions {
    /// Round coordinates to this many decimal places on export.
    pub coordinate_precision: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GmlVersion {
    /// `gml:coordinates` markup.
    #[default]
    Gml2,
    /// `gml:pos`/`gml:posList` markup with `srsDimension`.
    Gml3,
}

/// GML export options.
#[derive(Debug, Clone, Default)]
pub struct GmlOptions {
    pub version: GmlVersion,
    /// `gml:id` attribute on the root element (GML 3 only).
    pub gml_id: Option<String>,
}

/// The capability surface a geometry engine provides.
///
/// Derived-geometry methods return `Ok(None)` when the engine cannot produce
/// a result for the operand kinds; `Err` is reserved for failures worth
/// reporting verbatim. Binary operations on unregistered handles also yield
/// `Ok(None)`, so a destroyed operand degrades rather than aborts.
pub trait Engine: Send + Sync + std::fmt::Debug {
    // Construction and destruction.
    fn create(&self, kind: GeometryKind) -> Result<Option<GeomHandle>>;
    fn clone_geom(&self, handle: GeomHandle) -> Result<GeomHandle>;
    fn destroy(&self, handle: GeomHandle) -> Result<()>;

    // Structure building.
    fn add_point(&self, handle: GeomHandle, x: f64, y: f64, z: Option<f64>) -> Result<()>;
    fn set_point(
        &self,
        handle: GeomHandle,
        index: usize,
        x: f64,
        y: f64,
        z: Option<f64>,
    ) -> Result<()>;
    fn get_point(&self, handle: GeomHandle, index: usize) -> Result<Option<(f64, f64, f64)>>;
    /// Adds a copy of `child` as a member of `handle`.
    fn add_geometry(&self, handle: GeomHandle, child: GeomHandle) -> Result<()>;
    /// A non-owning view of the `index`-th member. The returned handle lives
    /// until its parent is destroyed and must not be destroyed directly.
    fn get_geometry(&self, handle: GeomHandle, index: usize) -> Result<Option<GeomHandle>>;
    fn clear(&self, handle: GeomHandle) -> Result<()>;
    fn set_coordinate_dimension(&self, handle: GeomHandle, dim3: bool) -> Result<()>;

    // Introspection.
    fn kind(&self, handle: GeomHandle) -> Result<GeometryKind>;
    fn dimension(&self, handle: GeomHandle) -> Result<i32>;
    fn coordinate_dimension(&self, handle: GeomHandle) -> Result<i32>;
    fn envelope(&self, handle: GeomHandle) -> Result<Option<Envelope>>;
    fn is_empty(&self, handle: GeomHandle) -> Result<bool>;
    fn point_count(&self, handle: GeomHandle) -> Result<usize>;
    fn geometry_count(&self, handle: GeomHandle) -> Result<usize>;
    fn area(&self, handle: GeomHandle) -> Result<f64>;

    // Binary predicates.
    fn intersects(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;
    fn disjoint(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;
    fn touches(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;
    fn crosses(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;
    fn within(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;
    fn contains(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;
    fn overlaps(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;
    /// Structural equality: same kind tag, same coordinates.
    fn equals(&self, a: GeomHandle, b: GeomHandle) -> Result<bool>;

    // Unary predicates.
    fn is_valid(&self, handle: GeomHandle) -> Result<bool>;
    fn is_simple(&self, handle: GeomHandle) -> Result<bool>;
    fn is_ring(&self, handle: GeomHandle) -> Result<bool>;

    // Derived geometries.
    fn intersection(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>>;
    fn union(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>>;
    fn union_cascaded(&self, handle: GeomHandle) -> Result<Option<GeomHandle>>;
    fn difference(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>>;
    fn sym_difference(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>>;
    fn boundary(&self, handle: GeomHandle) -> Result<Option<GeomHandle>>;
    fn convex_hull(&self, handle: GeomHandle) -> Result<Option<GeomHandle>>;
    fn point_on_surface(&self, handle: GeomHandle) -> Result<Option<GeomHandle>>;
    fn centroid(&self, handle: GeomHandle) -> Result<Option<GeomHandle>>;
    fn polygonize(&self, handle: GeomHandle) -> Result<Option<GeomHandle>>;
    fn buffer(
        &self,
        handle: GeomHandle,
        distance: f64,
        quad_segs: u32,
    ) -> Result<Option<GeomHandle>>;
    fn simplify(&self, handle: GeomHandle, tolerance: f64) -> Result<Option<GeomHandle>>;
    fn simplify_preserve_topology(
        &self,
        handle: GeomHandle,
        tolerance: f64,
    ) -> Result<Option<GeomHandle>>;

    // Transformation.
    fn transform(&self, handle: GeomHandle, ct: &CoordTransform) -> Result<()>;

    // Import into fresh handles.
    fn from_wkt(&self, wkt: &str) -> Result<GeomHandle>;
    fn from_wkb(&self, bytes: &[u8]) -> Result<GeomHandle>;
    fn from_geojson(&self, json: &str) -> Result<GeomHandle>;
    fn from_gml(&self, gml: &str) -> Result<GeomHandle>;

    // Import into an existing handle, replacing its contents.
    fn import_wkt(&self, handle: GeomHandle, wkt: &str) -> Result<()>;
    fn import_wkb(&self, handle: GeomHandle, bytes: &[u8]) -> Result<()>;

    // Export.
    fn to_wkt(&self, handle: GeomHandle) -> Result<String>;
    fn to_iso_wkt(&self, handle: GeomHandle) -> Result<String>;
    /// Exact byte length [`Engine::to_wkb`] will produce for this handle.
    fn wkb_size(&self, handle: GeomHandle) -> Result<usize>;
    fn to_wkb(&self, handle: GeomHandle, order: WkbByteOrder) -> Result<Vec<u8>>;
    fn to_geojson(&self, handle: GeomHandle, options: &GeoJsonOptions) -> Result<String>;
    fn to_gml(&self, handle: GeomHandle, options: &GmlOptions) -> Result<String>;
    fn to_kml(&self, handle: GeomHandle, altitude_mode: Option<&str>) -> Result<String>;
}

/// The process-wide default engine, shared by all wrappers constructed
/// without an explicit engine.
pub fn default_engine() -> Arc<PlanarEngine> {
    static ENGINE: OnceLock<Arc<PlanarEngine>> = OnceLock::new();
    ENGINE.get_or_init(|| Arc::new(PlanarEngine::new())).clone()
}
