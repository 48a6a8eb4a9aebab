//! The geometry wrapper.
//!
//! A [`Geometry`] is a kind-tagged wrapper around an engine handle. The
//! variant is fixed when the wrapper is built; the engine stays the source
//! of truth for everything else. Wrappers own their handle unless they were
//! produced as child views, and owned handles are destroyed on drop.

use std::fmt;
use std::sync::Arc;

use crate::engine::{default_engine, Engine, GeomHandle};
use crate::errors::{Result, TerraneError};
use crate::spatial_ref::SpatialRef;
use crate::vector::{Envelope, GeometryKind};

/// Shared state of every variant: the engine, the handle (cleared on
/// destroy), ownership, and the optional spatial reference association.
#[derive(Debug)]
pub(crate) struct GeomCore {
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) handle: Option<GeomHandle>,
    pub(crate) owned: bool,
    pub(crate) spatial_ref: Option<SpatialRef>,
}

impl Drop for GeomCore {
    fn drop(&mut self) {
        if self.owned {
            if let Some(handle) = self.handle.take() {
                // Destruction is idempotent engine-side; a failure here has
                // no caller to report to.
                let _ = self.engine.destroy(handle);
            }
        }
    }
}

/// A geometry of a specific kind.
///
/// The variant set mirrors the external kind-tag space. Unrecognized tags
/// are carried as [`Geometry::Unknown`] without loss: the handle stays
/// usable for everything the engine supports on it.
#[derive(Debug)]
pub enum Geometry {
    Point(GeomCore),
    Point25D(GeomCore),
    LineString(GeomCore),
    LineString25D(GeomCore),
    LinearRing(GeomCore),
    Polygon(GeomCore),
    Polygon25D(GeomCore),
    MultiPoint(GeomCore),
    MultiPoint25D(GeomCore),
    MultiLineString(GeomCore),
    MultiLineString25D(GeomCore),
    MultiPolygon(GeomCore),
    MultiPolygon25D(GeomCore),
    GeometryCollection(GeomCore),
    GeometryCollection25D(GeomCore),
    NoneGeometry(GeomCore),
    Unknown(GeomCore),
}

impl Geometry {
    pub(crate) fn core(&self) -> &GeomCore {
        match self {
            Geometry::Point(c)
            | Geometry::Point25D(c)
            | Geometry::LineString(c)
            | Geometry::LineString25D(c)
            | Geometry::LinearRing(c)
            | Geometry::Polygon(c)
            | Geometry::Polygon25D(c)
            | Geometry::MultiPoint(c)
            | Geometry::MultiPoint25D(c)
            | Geometry::MultiLineString(c)
            | Geometry::MultiLineString25D(c)
            | Geometry::MultiPolygon(c)
            | Geometry::MultiPolygon25D(c)
            | Geometry::GeometryCollection(c)
            | Geometry::GeometryCollection25D(c)
            | Geometry::NoneGeometry(c)
            | Geometry::Unknown(c) => c,
        }
    }

    pub(crate) fn core_mut(&mut self) -> &mut GeomCore {
        match self {
            Geometry::Point(c)
            | Geometry::Point25D(c)
            | Geometry::LineString(c)
            | Geometry::LineString25D(c)
            | Geometry::LinearRing(c)
            | Geometry::Polygon(c)
            | Geometry::Polygon25D(c)
            | Geometry::MultiPoint(c)
            | Geometry::MultiPoint25D(c)
            | Geometry::MultiLineString(c)
            | Geometry::MultiLineString25D(c)
            | Geometry::MultiPolygon(c)
            | Geometry::MultiPolygon25D(c)
            | Geometry::GeometryCollection(c)
            | Geometry::GeometryCollection25D(c)
            | Geometry::NoneGeometry(c)
            | Geometry::Unknown(c) => c,
        }
    }

    /// Same variant, different core. Used by `Clone` when the source handle
    /// is already gone.
    fn rewrap(&self, core: GeomCore) -> Geometry {
        match self {
            Geometry::Point(_) => Geometry::Point(core),
            Geometry::Point25D(_) => Geometry::Point25D(core),
            Geometry::LineString(_) => Geometry::LineString(core),
            Geometry::LineString25D(_) => Geometry::LineString25D(core),
            Geometry::LinearRing(_) => Geometry::LinearRing(core),
            Geometry::Polygon(_) => Geometry::Polygon(core),
            Geometry::Polygon25D(_) => Geometry::Polygon25D(core),
            Geometry::MultiPoint(_) => Geometry::MultiPoint(core),
            Geometry::MultiPoint25D(_) => Geometry::MultiPoint25D(core),
            Geometry::MultiLineString(_) => Geometry::MultiLineString(core),
            Geometry::MultiLineString25D(_) => Geometry::MultiLineString25D(core),
            Geometry::MultiPolygon(_) => Geometry::MultiPolygon(core),
            Geometry::MultiPolygon25D(_) => Geometry::MultiPolygon25D(core),
            Geometry::GeometryCollection(_) => Geometry::GeometryCollection(core),
            Geometry::GeometryCollection25D(_) => Geometry::GeometryCollection25D(core),
            Geometry::NoneGeometry(_) => Geometry::NoneGeometry(core),
            Geometry::Unknown(_) => Geometry::Unknown(core),
        }
    }

    /// Allocates an empty geometry of `kind` on the default engine.
    pub fn create(kind: GeometryKind) -> Result<Geometry> {
        Geometry::create_on(default_engine(), kind)
    }

    /// Allocates an empty geometry of `kind` on `engine`.
    pub fn create_on(engine: Arc<dyn Engine>, kind: GeometryKind) -> Result<Geometry> {
        let handle = engine
            .create(kind)?
            .ok_or(TerraneError::AllocationError { kind })?;
        Geometry::factory(engine, Some(handle), true)
            .ok_or(TerraneError::AllocationError { kind })
    }

    /// Wraps an engine handle in the variant matching its kind tag.
    ///
    /// Returns `None` for a null handle or one the engine no longer knows.
    /// A `LineString` tag whose classic WKT leads with `LINEARRING` is
    /// redirected to the ring variant: the wire tag space cannot distinguish
    /// the two, but the text form can.
    pub fn factory(
        engine: Arc<dyn Engine>,
        handle: Option<GeomHandle>,
        owned: bool,
    ) -> Option<Geometry> {
        let handle = handle?;
        let kind = match engine.kind(handle) {
            Ok(kind) => kind,
            Err(err) => {
                log::debug!("factory: engine rejected handle: {err}");
                return None;
            }
        };
        let core = GeomCore {
            engine,
            handle: Some(handle),
            owned,
            spatial_ref: None,
        };
        Some(match kind {
            GeometryKind::Point => Geometry::Point(core),
            GeometryKind::Point25D => Geometry::Point25D(core),
            GeometryKind::LineString => {
                let is_ring = core
                    .engine
                    .to_wkt(handle)
                    .map(|wkt| wkt.starts_with("LINEARRING"))
                    .unwrap_or(false);
                if is_ring {
                    Geometry::LinearRing(core)
                } else {
                    Geometry::LineString(core)
                }
            }
            GeometryKind::LineString25D => Geometry::LineString25D(core),
            GeometryKind::LinearRing => Geometry::LinearRing(core),
            GeometryKind::Polygon => Geometry::Polygon(core),
            GeometryKind::Polygon25D => Geometry::Polygon25D(core),
            GeometryKind::MultiPoint => Geometry::MultiPoint(core),
            GeometryKind::MultiPoint25D => Geometry::MultiPoint25D(core),
            GeometryKind::MultiLineString => Geometry::MultiLineString(core),
            GeometryKind::MultiLineString25D => Geometry::MultiLineString25D(core),
            GeometryKind::MultiPolygon => Geometry::MultiPolygon(core),
            GeometryKind::MultiPolygon25D => Geometry::MultiPolygon25D(core),
            GeometryKind::GeometryCollection => Geometry::GeometryCollection(core),
            GeometryKind::GeometryCollection25D => Geometry::GeometryCollection25D(core),
            GeometryKind::None => Geometry::NoneGeometry(core),
            GeometryKind::Unknown => Geometry::Unknown(core),
        })
    }

    /// The engine handle, or `InvalidHandle` after [`Geometry::destroy`].
    pub(crate) fn handle(&self) -> Result<GeomHandle> {
        self.core().handle.ok_or_else(|| TerraneError::InvalidHandle {
            msg: "geometry was destroyed".to_string(),
        })
    }

    pub(crate) fn engine(&self) -> &Arc<dyn Engine> {
        &self.core().engine
    }

    /// Wraps a derived-operation result. A null result, a result echoing the
    /// input handle (when `suppress_same` is set), or an unusable handle all
    /// collapse to `None`. The spatial reference association carries over.
    pub(crate) fn wrap_derived(
        &self,
        result: Option<GeomHandle>,
        suppress_same: bool,
    ) -> Option<Geometry> {
        let out = result?;
        if suppress_same && Some(out) == self.core().handle {
            return None;
        }
        let mut derived = Geometry::factory(self.core().engine.clone(), Some(out), true)?;
        derived.core_mut().spatial_ref = self.core().spatial_ref.clone();
        Some(derived)
    }

    // -----------------------------------------------------------------------
    // Introspection

    /// The kind tag currently reported by the engine.
    ///
    /// Usually this matches the variant, but not always: an empty 2.5D
    /// collection reports the 2D tag until a 3D member is added.
    pub fn kind(&self) -> GeometryKind {
        match self.core().handle {
            Some(handle) => self
                .core()
                .engine
                .kind(handle)
                .unwrap_or(GeometryKind::Unknown),
            None => GeometryKind::Unknown,
        }
    }

    /// Human-readable name of the reported kind.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Topological dimension: 0, 1, or 2.
    pub fn dimension(&self) -> Result<i32> {
        self.core().engine.dimension(self.handle()?)
    }

    /// Coordinate dimension: 2 or 3 (0 for an empty point).
    pub fn coordinate_dimension(&self) -> Result<i32> {
        self.core().engine.coordinate_dimension(self.handle()?)
    }

    /// Forces the coordinate dimension to 2 or 3. Flattening zeroes all Z
    /// values.
    pub fn set_coordinate_dimension(&mut self, dimension: i32) -> Result<()> {
        let dim3 = match dimension {
            2 => false,
            3 => true,
            other => {
                return Err(TerraneError::BadArgument(format!(
                    "coordinate dimension must be 2 or 3, got {other}"
                )))
            }
        };
        self.core().engine.set_coordinate_dimension(self.handle()?, dim3)
    }

    pub fn is_2d(&self) -> bool {
        self.coordinate_dimension().map(|d| d == 2).unwrap_or(false)
    }

    pub fn is_3d(&self) -> bool {
        self.coordinate_dimension().map(|d| d == 3).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        match self.core().handle {
            Some(handle) => self.core().engine.is_empty(handle).unwrap_or(true),
            None => true,
        }
    }

    /// Bounding envelope, or `None` for an empty geometry.
    pub fn envelope(&self) -> Result<Option<Envelope>> {
        self.core().engine.envelope(self.handle()?)
    }

    /// Number of points in a point or curve geometry; 0 for containers.
    pub fn point_count(&self) -> usize {
        match self.core().handle {
            Some(handle) => self.core().engine.point_count(handle).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of directly contained geometries (rings for polygons).
    pub fn geometry_count(&self) -> usize {
        match self.core().handle {
            Some(handle) => self.core().engine.geometry_count(handle).unwrap_or(0),
            None => 0,
        }
    }

    /// Area of a surface geometry; 0 for points and curves.
    pub fn area(&self) -> f64 {
        match self.core().handle {
            Some(handle) => self.core().engine.area(handle).unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn get_point(&self, index: usize) -> Result<Option<(f64, f64, f64)>> {
        self.core().engine.get_point(self.handle()?, index)
    }

    pub fn add_point(&mut self, point: (f64, f64, f64)) -> Result<()> {
        self.core()
            .engine
            .add_point(self.handle()?, point.0, point.1, Some(point.2))
    }

    pub fn add_point_2d(&mut self, point: (f64, f64)) -> Result<()> {
        self.core()
            .engine
            .add_point(self.handle()?, point.0, point.1, None)
    }

    pub fn set_point(&mut self, index: usize, point: (f64, f64, f64)) -> Result<()> {
        self.core()
            .engine
            .set_point(self.handle()?, index, point.0, point.1, Some(point.2))
    }

    pub fn set_point_2d(&mut self, index: usize, point: (f64, f64)) -> Result<()> {
        self.core()
            .engine
            .set_point(self.handle()?, index, point.0, point.1, None)
    }

    /// A non-owning view of the `index`-th contained geometry. The view's
    /// handle lives until this geometry is destroyed; the view reflects the
    /// member at the time of the call.
    pub fn get_geometry(&self, index: usize) -> Result<Option<Geometry>> {
        let child = self.core().engine.get_geometry(self.handle()?, index)?;
        let Some(child) = child else {
            return Ok(None);
        };
        let mut view = Geometry::factory(self.core().engine.clone(), Some(child), false)
            .ok_or_else(|| TerraneError::engine("get_geometry", "child view is unusable"))?;
        view.core_mut().spatial_ref = self.core().spatial_ref.clone();
        Ok(Some(view))
    }

    /// Adds a copy of `child` as a member.
    pub fn add_geometry(&mut self, child: &Geometry) -> Result<()> {
        self.core()
            .engine
            .add_geometry(self.handle()?, child.handle()?)
    }

    /// Removes all points and members, keeping the kind.
    pub fn clear(&mut self) -> Result<()> {
        self.core().engine.clear(self.handle()?)
    }

    /// Drops all Z values and reports the 2D kind afterwards.
    pub fn flatten_to_2d(&mut self) -> Result<()> {
        self.set_coordinate_dimension(2)
    }

    // -----------------------------------------------------------------------
    // Spatial reference association

    /// The associated spatial reference, retained (never copied).
    pub fn spatial_ref(&self) -> Option<SpatialRef> {
        self.core().spatial_ref.clone()
    }

    /// Replaces the association without reprojecting any coordinates.
    pub fn set_spatial_ref(&mut self, spatial_ref: SpatialRef) {
        self.core_mut().spatial_ref = Some(spatial_ref);
    }

    pub fn clear_spatial_ref(&mut self) {
        self.core_mut().spatial_ref = None;
    }

    // -----------------------------------------------------------------------
    // Lifecycle

    /// Releases the engine-side geometry now. Further operations on this
    /// wrapper report `InvalidHandle`. Dropping an owned wrapper does the
    /// same implicitly.
    pub fn destroy(&mut self) -> Result<()> {
        let core = self.core_mut();
        if let Some(handle) = core.handle.take() {
            if core.owned {
                core.engine.destroy(handle)?;
            }
        }
        Ok(())
    }
}

impl Clone for Geometry {
    /// Deep copy through the engine. The spatial reference is retained, not
    /// copied. Cloning a destroyed wrapper yields another destroyed wrapper.
    fn clone(&self) -> Geometry {
        let core = self.core();
        let copied = core
            .handle
            .and_then(|handle| core.engine.clone_geom(handle).ok())
            .and_then(|handle| Geometry::factory(core.engine.clone(), Some(handle), true));
        match copied {
            Some(mut cloned) => {
                cloned.core_mut().spatial_ref = core.spatial_ref.clone();
                cloned
            }
            None => self.rewrap(GeomCore {
                engine: core.engine.clone(),
                handle: None,
                owned: false,
                spatial_ref: core.spatial_ref.clone(),
            }),
        }
    }
}

impl PartialEq for Geometry {
    /// Structural equality via the engine: same kind tag, same coordinates.
    /// Destroyed wrappers compare unequal to everything.
    fn eq(&self, other: &Geometry) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wkt() {
            Ok(wkt) => f.write_str(&wkt),
            Err(_) => f.write_str("<destroyed geometry>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_each_kind() {
        for kind in [
            GeometryKind::Point,
            GeometryKind::LineString,
            GeometryKind::LinearRing,
            GeometryKind::Polygon,
            GeometryKind::MultiPoint,
            GeometryKind::MultiLineString,
            GeometryKind::MultiPolygon,
            GeometryKind::GeometryCollection,
            GeometryKind::Point25D,
        ] {
            let geom = Geometry::create(kind).unwrap();
            assert!(geom.is_empty(), "fresh {kind:?} should be empty");
        }
        assert!(matches!(
            Geometry::create(GeometryKind::Unknown),
            Err(TerraneError::AllocationError { .. })
        ));
    }

    #[test]
    fn test_factory_redirects_rings() {
        let ring = Geometry::from_wkt("LINEARRING (0 0,0 1,1 1,0 0)").unwrap();
        assert!(matches!(ring, Geometry::LinearRing(_)));
        let line = Geometry::from_wkt("LINESTRING (0 0,1 1)").unwrap();
        assert!(matches!(line, Geometry::LineString(_)));
    }

    #[test]
    fn test_point_building() {
        let mut point = Geometry::create(GeometryKind::Point).unwrap();
        assert_eq!(point.coordinate_dimension().unwrap(), 0);
        point.add_point_2d((1.0, 2.0)).unwrap();
        assert_eq!(point.get_point(0).unwrap(), Some((1.0, 2.0, 0.0)));
        assert!(point.is_2d());

        point.set_point(0, (1.0, 2.0, 3.0)).unwrap();
        assert!(point.is_3d());
        point.flatten_to_2d().unwrap();
        assert_eq!(point.get_point(0).unwrap(), Some((1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_collection_kind_quirk() {
        let mut gc = Geometry::create(GeometryKind::GeometryCollection25D).unwrap();
        // Empty 2.5D collections report the 2D tag.
        assert_eq!(gc.kind(), GeometryKind::GeometryCollection);

        let point = Geometry::from_wkt("POINT (1 2 3)").unwrap();
        gc.add_geometry(&point).unwrap();
        assert_eq!(gc.kind(), GeometryKind::GeometryCollection25D);
    }

    #[test]
    fn test_child_views_are_not_owned() {
        let poly = Geometry::from_wkt("POLYGON ((0 0,0 1,1 1,0 0))").unwrap();
        assert_eq!(poly.geometry_count(), 1);
        {
            let ring = poly.get_geometry(0).unwrap().unwrap();
            assert!(matches!(ring, Geometry::LinearRing(_)));
            assert_eq!(ring.point_count(), 4);
            // Dropping the view must not tear down anything.
        }
        assert_eq!(poly.geometry_count(), 1);
        assert!(poly.get_geometry(5).unwrap().is_none());
    }

    #[test]
    fn test_destroy_invalidates() {
        let mut geom = Geometry::from_wkt("POINT (1 2)").unwrap();
        geom.destroy().unwrap();
        assert!(matches!(
            geom.get_point(0),
            Err(TerraneError::InvalidHandle { .. })
        ));
        assert!(geom.is_empty());
        assert_eq!(geom.area(), 0.0);
        // destroy is idempotent on the wrapper too.
        geom.destroy().unwrap();
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Geometry::from_wkt("LINESTRING (0 0,1 1)").unwrap();
        let mut copy = original.clone();
        assert_eq!(original, copy);
        copy.add_point_2d((2.0, 2.0)).unwrap();
        assert_ne!(original, copy);
        assert_eq!(original.point_count(), 2);
    }

    #[test]
    fn test_clear_keeps_kind() {
        let mut line = Geometry::from_wkt("LINESTRING (0 0,1 1)").unwrap();
        line.clear().unwrap();
        assert!(line.is_empty());
        assert_eq!(line.kind(), GeometryKind::LineString);
    }

    #[test]
    fn test_spatial_ref_is_retained() {
        let srs = SpatialRef::from_epsg(4326).unwrap();
        let mut geom = Geometry::from_wkt("POINT (1 2)").unwrap();
        assert!(geom.spatial_ref().is_none());
        geom.set_spatial_ref(srs.clone());
        // Held by the local, the geometry, and the accessor's clone.
        assert_eq!(geom.spatial_ref().unwrap().retain_count(), 3);
        assert!(geom.spatial_ref().unwrap().is_same(&srs));
    }

    #[test]
    fn test_display_is_wkt() {
        let geom = Geometry::from_wkt("POINT (1 2)").unwrap();
        assert_eq!(format!("{geom}"), "POINT (1 2)");
    }
}
