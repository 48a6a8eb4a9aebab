//! The in-process planar geometry engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::engine::repr::GeomRepr;
use crate::engine::{gml, json, ops, wkb, wkt};
use crate::engine::{Engine, GeoJsonOptions, GeomHandle, GmlOptions, WkbByteOrder};
use crate::errors::{Result, TerraneError};
use crate::spatial_ref::CoordTransform;
use crate::vector::{Envelope, GeometryKind};

#[derive(Debug)]
struct Entry {
    repr: GeomRepr,
    /// Child-view handles destroyed together with this one.
    dependents: Vec<u64>,
}

/// The default [`Engine`]: geometries live in a table behind a mutex, and
/// handles are table keys. Algorithms run on the 2D plane via the `geo`
/// crate; serialization codecs are local to the engine.
#[derive(Debug)]
pub struct PlanarEngine {
    geoms: Mutex<HashMap<u64, Entry>>,
    next_id: AtomicU64,
}

impl Default for PlanarEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanarEngine {
    pub fn new() -> PlanarEngine {
        PlanarEngine {
            geoms: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of live handles, child views included. Exposed for leak
    /// assertions in tests.
    pub fn live_handles(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Entry>> {
        self.geoms.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, repr: GeomRepr) -> GeomHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(
            id,
            Entry {
                repr,
                dependents: Vec::new(),
            },
        );
        GeomHandle(id)
    }

    fn missing(method: &'static str, handle: GeomHandle) -> TerraneError {
        TerraneError::InvalidHandle {
            msg: format!("handle {} is not registered ({method})", handle.0),
        }
    }

    fn read<R>(
        &self,
        method: &'static str,
        handle: GeomHandle,
        f: impl FnOnce(&GeomRepr) -> R,
    ) -> Result<R> {
        let geoms = self.lock();
        let entry = geoms
            .get(&handle.0)
            .ok_or_else(|| Self::missing(method, handle))?;
        Ok(f(&entry.repr))
    }

    fn modify<R>(
        &self,
        method: &'static str,
        handle: GeomHandle,
        f: impl FnOnce(&mut GeomRepr) -> R,
    ) -> Result<R> {
        let mut geoms = self.lock();
        let entry = geoms
            .get_mut(&handle.0)
            .ok_or_else(|| Self::missing(method, handle))?;
        Ok(f(&mut entry.repr))
    }

    fn predicate(
        &self,
        method: &'static str,
        a: GeomHandle,
        b: GeomHandle,
        f: impl FnOnce(&GeomRepr, &GeomRepr) -> std::result::Result<bool, String>,
    ) -> Result<bool> {
        let geoms = self.lock();
        let ea = geoms.get(&a.0).ok_or_else(|| Self::missing(method, a))?;
        let eb = geoms.get(&b.0).ok_or_else(|| Self::missing(method, b))?;
        f(&ea.repr, &eb.repr).map_err(|msg| TerraneError::engine(method, msg))
    }

    /// Binary derived geometry. A dropped operand handle degrades to a null
    /// result instead of an error.
    fn binary_derived(
        &self,
        method: &'static str,
        a: GeomHandle,
        b: GeomHandle,
        f: impl FnOnce(&GeomRepr, &GeomRepr) -> Option<GeomRepr>,
    ) -> Result<Option<GeomHandle>> {
        let derived = {
            let geoms = self.lock();
            let (Some(ea), Some(eb)) = (geoms.get(&a.0), geoms.get(&b.0)) else {
                log::debug!("{method}: operand handle no longer registered, null result");
                return Ok(None);
            };
            f(&ea.repr, &eb.repr)
        };
        Ok(derived.map(|repr| self.insert(repr)))
    }

    fn unary_derived(
        &self,
        method: &'static str,
        handle: GeomHandle,
        f: impl FnOnce(&GeomRepr) -> Option<GeomRepr>,
    ) -> Result<Option<GeomHandle>> {
        let derived = self.read(method, handle, f)?;
        Ok(derived.map(|repr| self.insert(repr)))
    }

    fn parse_new(
        &self,
        format: &'static str,
        parsed: std::result::Result<GeomRepr, String>,
    ) -> Result<GeomHandle> {
        let repr = parsed.map_err(|msg| TerraneError::ParseError { format, msg })?;
        Ok(self.insert(repr))
    }
}

impl Engine for PlanarEngine {
    fn create(&self, kind: GeometryKind) -> Result<Option<GeomHandle>> {
        Ok(GeomRepr::create(kind).map(|repr| self.insert(repr)))
    }

    fn clone_geom(&self, handle: GeomHandle) -> Result<GeomHandle> {
        let repr = self.read("clone_geom", handle, |r| r.clone())?;
        Ok(self.insert(repr))
    }

    fn destroy(&self, handle: GeomHandle) -> Result<()> {
        // Idempotent: destroying an unregistered handle is a no-op.
        let mut geoms = self.lock();
        let mut pending = vec![handle.0];
        while let Some(id) = pending.pop() {
            if let Some(entry) = geoms.remove(&id) {
                pending.extend(entry.dependents);
            }
        }
        Ok(())
    }

    fn add_point(&self, handle: GeomHandle, x: f64, y: f64, z: Option<f64>) -> Result<()> {
        self.modify("add_point", handle, |r| r.add_point(x, y, z))?
            .map_err(|msg| TerraneError::engine("add_point", msg))
    }

    fn set_point(
        &self,
        handle: GeomHandle,
        index: usize,
        x: f64,
        y: f64,
        z: Option<f64>,
    ) -> Result<()> {
        self.modify("set_point", handle, |r| r.set_point(index, x, y, z))?
            .map_err(|msg| TerraneError::engine("set_point", msg))
    }

    fn get_point(&self, handle: GeomHandle, index: usize) -> Result<Option<(f64, f64, f64)>> {
        self.read("get_point", handle, |r| r.get_point(index))
    }

    fn add_geometry(&self, handle: GeomHandle, child: GeomHandle) -> Result<()> {
        let mut geoms = self.lock();
        let child_repr = geoms
            .get(&child.0)
            .ok_or_else(|| Self::missing("add_geometry", child))?
            .repr
            .clone();
        let entry = geoms
            .get_mut(&handle.0)
            .ok_or_else(|| Self::missing("add_geometry", handle))?;
        entry
            .repr
            .add_child(&child_repr)
            .map_err(|msg| TerraneError::engine("add_geometry", msg))
    }

    fn get_geometry(&self, handle: GeomHandle, index: usize) -> Result<Option<GeomHandle>> {
        let mut geoms = self.lock();
        let entry = geoms
            .get(&handle.0)
            .ok_or_else(|| Self::missing("get_geometry", handle))?;
        let Some(child) = entry.repr.child(index) else {
            return Ok(None);
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        geoms.insert(
            id,
            Entry {
                repr: child,
                dependents: Vec::new(),
            },
        );
        if let Some(parent) = geoms.get_mut(&handle.0) {
            parent.dependents.push(id);
        }
        Ok(Some(GeomHandle(id)))
    }

    fn clear(&self, handle: GeomHandle) -> Result<()> {
        self.modify("clear", handle, |r| r.clear())
    }

    fn set_coordinate_dimension(&self, handle: GeomHandle, dim3: bool) -> Result<()> {
        self.modify("set_coordinate_dimension", handle, |r| r.set_dim3(dim3))
    }

    fn kind(&self, handle: GeomHandle) -> Result<GeometryKind> {
        self.read("kind", handle, |r| r.kind())
    }

    fn dimension(&self, handle: GeomHandle) -> Result<i32> {
        self.read("dimension", handle, |r| r.dimension())
    }

    fn coordinate_dimension(&self, handle: GeomHandle) -> Result<i32> {
        self.read("coordinate_dimension", handle, |r| r.coordinate_dimension())
    }

    fn envelope(&self, handle: GeomHandle) -> Result<Option<Envelope>> {
        self.read("envelope", handle, |r| r.envelope())
    }

    fn is_empty(&self, handle: GeomHandle) -> Result<bool> {
        self.read("is_empty", handle, |r| r.is_empty())
    }

    fn point_count(&self, handle: GeomHandle) -> Result<usize> {
        self.read("point_count", handle, |r| r.point_count())
    }

    fn geometry_count(&self, handle: GeomHandle) -> Result<usize> {
        self.read("geometry_count", handle, |r| r.child_count())
    }

    fn area(&self, handle: GeomHandle) -> Result<f64> {
        self.read("area", handle, ops::area)
    }

    fn intersects(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("intersects", a, b, ops::intersects)
    }

    fn disjoint(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("disjoint", a, b, ops::disjoint)
    }

    fn touches(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("touches", a, b, ops::touches)
    }

    fn crosses(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("crosses", a, b, ops::crosses)
    }

    fn within(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("within", a, b, ops::within)
    }

    fn contains(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("contains", a, b, ops::contains)
    }

    fn overlaps(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("overlaps", a, b, ops::overlaps)
    }

    fn equals(&self, a: GeomHandle, b: GeomHandle) -> Result<bool> {
        self.predicate("equals", a, b, |x, y| Ok(x.same_structure(y)))
    }

    fn is_valid(&self, handle: GeomHandle) -> Result<bool> {
        self.read("is_valid", handle, ops::is_valid)?
            .map_err(|msg| TerraneError::engine("is_valid", msg))
    }

    fn is_simple(&self, handle: GeomHandle) -> Result<bool> {
        self.read("is_simple", handle, ops::is_simple)?
            .map_err(|msg| TerraneError::engine("is_simple", msg))
    }

    fn is_ring(&self, handle: GeomHandle) -> Result<bool> {
        self.read("is_ring", handle, ops::is_ring)?
            .map_err(|msg| TerraneError::engine("is_ring", msg))
    }

    fn intersection(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>> {
        self.binary_derived("intersection", a, b, ops::intersection)
    }

    fn union(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>> {
        self.binary_derived("union", a, b, ops::union)
    }

    fn union_cascaded(&self, handle: GeomHandle) -> Result<Option<GeomHandle>> {
        let derived = self
            .read("union_cascaded", handle, ops::union_cascaded)?
            .map_err(|msg| TerraneError::engine("union_cascaded", msg))?;
        Ok(derived.map(|repr| self.insert(repr)))
    }

    fn difference(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>> {
        self.binary_derived("difference", a, b, ops::difference)
    }

    fn sym_difference(&self, a: GeomHandle, b: GeomHandle) -> Result<Option<GeomHandle>> {
        self.binary_derived("sym_difference", a, b, ops::sym_difference)
    }

    fn boundary(&self, handle: GeomHandle) -> Result<Option<GeomHandle>> {
        self.unary_derived("boundary", handle, ops::boundary)
    }

    fn convex_hull(&self, handle: GeomHandle) -> Result<Option<GeomHandle>> {
        self.unary_derived("convex_hull", handle, ops::convex_hull)
    }

    fn point_on_surface(&self, handle: GeomHandle) -> Result<Option<GeomHandle>> {
        self.unary_derived("point_on_surface", handle, ops::point_on_surface)
    }

    fn centroid(&self, handle: GeomHandle) -> Result<Option<GeomHandle>> {
        self.unary_derived("centroid", handle, ops::centroid)
    }

    fn polygonize(&self, handle: GeomHandle) -> Result<Option<GeomHandle>> {
        self.unary_derived("polygonize", handle, ops::polygonize)
    }

    fn buffer(
        &self,
        handle: GeomHandle,
        distance: f64,
        quad_segs: u32,
    ) -> Result<Option<GeomHandle>> {
        self.unary_derived("buffer", handle, |r| ops::buffer(r, distance, quad_segs))
    }

    fn simplify(&self, handle: GeomHandle, tolerance: f64) -> Result<Option<GeomHandle>> {
        self.unary_derived("simplify", handle, |r| ops::simplify(r, tolerance))
    }

    fn simplify_preserve_topology(
        &self,
        handle: GeomHandle,
        tolerance: f64,
    ) -> Result<Option<GeomHandle>> {
        self.unary_derived("simplify_preserve_topology", handle, |r| {
            ops::simplify_preserve_topology(r, tolerance)
        })
    }

    fn transform(&self, handle: GeomHandle, ct: &CoordTransform) -> Result<()> {
        if ct.is_null() {
            return Ok(());
        }
        let mut geoms = self.lock();
        let entry = geoms
            .get_mut(&handle.0)
            .ok_or_else(|| Self::missing("transform", handle))?;

        let coords = entry.repr.coords();
        let mut xs: Vec<f64> = coords.iter().map(|c| c.x).collect();
        let mut ys: Vec<f64> = coords.iter().map(|c| c.y).collect();
        let mut zs: Vec<f64> = coords.iter().map(|c| c.z).collect();
        ct.transform_coords(&mut xs, &mut ys, &mut zs)?;

        let mut i = 0;
        entry.repr.for_each_coord_mut(&mut |c| {
            c.x = xs[i];
            c.y = ys[i];
            c.z = zs[i];
            i += 1;
        });
        Ok(())
    }

    fn from_wkt(&self, input: &str) -> Result<GeomHandle> {
        self.parse_new("WKT", wkt::parse(input))
    }

    fn from_wkb(&self, bytes: &[u8]) -> Result<GeomHandle> {
        self.parse_new("WKB", wkb::parse(bytes))
    }

    fn from_geojson(&self, input: &str) -> Result<GeomHandle> {
        self.parse_new("GeoJSON", json::parse(input))
    }

    fn from_gml(&self, input: &str) -> Result<GeomHandle> {
        self.parse_new("GML", gml::parse(input))
    }

    fn import_wkt(&self, handle: GeomHandle, input: &str) -> Result<()> {
        let repr = wkt::parse(input).map_err(|msg| TerraneError::ParseError {
            format: "WKT",
            msg,
        })?;
        self.modify("import_wkt", handle, |r| *r = repr)
    }

    fn import_wkb(&self, handle: GeomHandle, bytes: &[u8]) -> Result<()> {
        let repr = wkb::parse(bytes).map_err(|msg| TerraneError::ParseError {
            format: "WKB",
            msg,
        })?;
        self.modify("import_wkb", handle, |r| *r = repr)
    }

    fn to_wkt(&self, handle: GeomHandle) -> Result<String> {
        self.read("to_wkt", handle, |r| wkt::write(r, false))
    }

    fn to_iso_wkt(&self, handle: GeomHandle) -> Result<String> {
        self.read("to_iso_wkt", handle, |r| wkt::write(r, true))
    }

    fn wkb_size(&self, handle: GeomHandle) -> Result<usize> {
        self.read("wkb_size", handle, wkb::size)
    }

    fn to_wkb(&self, handle: GeomHandle, order: WkbByteOrder) -> Result<Vec<u8>> {
        self.read("to_wkb", handle, |r| wkb::write(r, order))
    }

    fn to_geojson(&self, handle: GeomHandle, options: &GeoJsonOptions) -> Result<String> {
        self.read("to_geojson", handle, |r| json::write(r, options))?
            .map_err(|msg| TerraneError::engine("to_geojson", msg))
    }

    fn to_gml(&self, handle: GeomHandle, options: &GmlOptions) -> Result<String> {
        self.read("to_gml", handle, |r| gml::write_gml(r, options))?
            .map_err(|msg| TerraneError::engine("to_gml", msg))
    }

    fn to_kml(&self, handle: GeomHandle, altitude_mode: Option<&str>) -> Result<String> {
        self.read("to_kml", handle, |r| gml::write_kml(r, altitude_mode))?
            .map_err(|msg| TerraneError::engine("to_kml", msg))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    fn engine() -> PlanarEngine {
        PlanarEngine::new()
    }

    #[test]
    fn test_create_and_destroy() {
        let e = engine();
        let h = e.create(GeometryKind::Point).unwrap().unwrap();
        assert_eq!(e.kind(h).unwrap(), GeometryKind::Point);
        assert_eq!(e.live_handles(), 1);
        e.destroy(h).unwrap();
        assert_eq!(e.live_handles(), 0);
        assert!(e.kind(h).is_err());
        // Idempotent.
        e.destroy(h).unwrap();
    }

    #[test]
    fn test_create_unknown_refused() {
        let e = engine();
        assert!(e.create(GeometryKind::Unknown).unwrap().is_none());
    }

    #[test]
    fn test_child_views_die_with_parent() {
        let e = engine();
        let poly = e
            .from_wkt("POLYGON ((0 0,0 1,1 1,0 0))")
            .unwrap();
        let ring = e.get_geometry(poly, 0).unwrap().unwrap();
        assert_eq!(e.kind(ring).unwrap(), GeometryKind::LineString);
        assert_eq!(e.point_count(ring).unwrap(), 4);
        assert_eq!(e.live_handles(), 2);

        e.destroy(poly).unwrap();
        assert_eq!(e.live_handles(), 0);
        assert!(e.kind(ring).is_err());
    }

    #[test]
    fn test_derived_results_are_new_handles() {
        let e = engine();
        let a = e.from_wkt("POLYGON ((0 0,0 2,2 2,2 0,0 0))").unwrap();
        let b = e.from_wkt("POLYGON ((1 0,1 2,3 2,3 0,1 0))").unwrap();
        let u = e.union(a, b).unwrap().unwrap();
        assert_ne!(u, a);
        assert_ne!(u, b);
        assert_eq!(e.kind(u).unwrap(), GeometryKind::Polygon);
    }

    #[test]
    fn test_binary_derived_degrades_on_dropped_handle() {
        let e = engine();
        let a = e.from_wkt("POLYGON ((0 0,0 2,2 2,2 0,0 0))").unwrap();
        let b = e.from_wkt("POLYGON ((1 0,1 2,3 2,3 0,1 0))").unwrap();
        e.destroy(b).unwrap();
        assert!(e.union(a, b).unwrap().is_none());
        // Predicates stay strict.
        assert!(e.intersects(a, b).is_err());
    }

    #[test]
    fn test_equals_is_structural() {
        let e = engine();
        let a = e.from_wkt("LINESTRING (0 0,1 1)").unwrap();
        let b = e.from_wkt("LINESTRING (0 0,1 1)").unwrap();
        let c = e.from_wkt("LINEARRING (0 0,0 1,1 1,0 0)").unwrap();
        let d = e.from_wkt("LINESTRING (0 0,0 1,1 1,0 0)").unwrap();
        assert!(e.equals(a, b).unwrap());
        // The ring marker has no wire tag and does not split equality.
        assert!(e.equals(c, d).unwrap());
        assert!(!e.equals(a, d).unwrap());
    }

    #[test]
    fn test_transform_in_place() {
        use crate::spatial_ref::SpatialRef;
        let e = engine();
        let h = e.from_wkt("POINT (0 0)").unwrap();
        let ct = CoordTransform::new(
            &SpatialRef::from_epsg(4326).unwrap(),
            &SpatialRef::from_epsg(3857).unwrap(),
        )
        .unwrap();
        e.transform(h, &ct).unwrap();
        let (x, y, z) = e.get_point(h, 0).unwrap().unwrap();
        assert!(approx_eq!(f64, x, 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, y, 0.0, epsilon = 1e-9));
        assert_eq!(z, 0.0);

        let projected = e.get_point(h, 0).unwrap();
        let null = CoordTransform::null();
        e.transform(h, &null).unwrap();
        assert_eq!(e.get_point(h, 0).unwrap(), projected);
    }

    #[test]
    fn test_wkb_size_matches_export() {
        let e = engine();
        let h = e
            .from_wkt("POLYGON ((0 0,0 1,1 1,0 0),(0.1 0.1,0.1 0.2,0.2 0.2,0.1 0.1))")
            .unwrap();
        let size = e.wkb_size(h).unwrap();
        let bytes = e.to_wkb(h, WkbByteOrder::Ndr).unwrap();
        assert_eq!(bytes.len(), size);
    }

    #[test]
    fn test_import_replaces_contents() {
        let e = engine();
        let h = e.from_wkt("POINT (1 2)").unwrap();
        e.import_wkt(h, "LINESTRING (0 0,1 1)").unwrap();
        assert_eq!(e.kind(h).unwrap(), GeometryKind::LineString);
        assert!(e.import_wkt(h, "POIN (1 2)").is_err());
        // A failed import leaves the previous contents in place.
        assert_eq!(e.kind(h).unwrap(), GeometryKind::LineString);
    }
}
