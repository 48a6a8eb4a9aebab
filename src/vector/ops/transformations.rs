use crate::errors::Result;
use crate::spatial_ref::{CoordTransform, SpatialRef};
use crate::vector::Geometry;

/// Segments per quarter circle when approximating curved offsets in
/// [`Geometry::buffer`].
pub const DEFAULT_BUFFER_QUAD_SEGS: u32 = 30;

/// # Transformations
///
/// Coordinate transforms and derived geometries computed from a single
/// operand. The derived-geometry methods return `Ok(None)` when the engine
/// cannot produce a result for the operand kind.
impl Geometry {
    /// Applies `ct` to a copy of the geometry and returns the copy.
    pub fn transform(&self, ct: &CoordTransform) -> Result<Geometry> {
        let mut new = self.clone();
        new.transform_inplace(ct)?;
        Ok(new)
    }

    /// Applies `ct` to the geometry's coordinates in place. A null transform
    /// leaves the geometry untouched.
    pub fn transform_inplace(&mut self, ct: &CoordTransform) -> Result<()> {
        if ct.is_null() {
            return Ok(());
        }
        self.engine().transform(self.handle()?, ct)
    }

    /// Reprojects a copy of the geometry into `spatial_ref` and returns the
    /// copy.
    pub fn transform_to(&self, spatial_ref: &SpatialRef) -> Result<Geometry> {
        let mut new = self.clone();
        new.transform_to_inplace(spatial_ref)?;
        Ok(new)
    }

    /// Reprojects the geometry into `spatial_ref` in place and records the
    /// new association. Without a source spatial reference the coordinates
    /// are assumed to already be in the target system and only the
    /// association changes.
    pub fn transform_to_inplace(&mut self, spatial_ref: &SpatialRef) -> Result<()> {
        if let Some(source) = self.spatial_ref() {
            let ct = CoordTransform::new(&source, spatial_ref)?;
            self.engine().transform(self.handle()?, &ct)?;
        }
        self.set_spatial_ref(spatial_ref.clone());
        Ok(())
    }

    /// Computes the boundary of the geometry: endpoints of curves, rings of
    /// surfaces, nothing for points.
    pub fn boundary(&self) -> Result<Option<Geometry>> {
        let result = self.engine().boundary(self.handle()?)?;
        Ok(self.wrap_derived(result, true))
    }

    /// Computes the convex hull of all points of the geometry.
    pub fn convex_hull(&self) -> Result<Option<Geometry>> {
        let result = self.engine().convex_hull(self.handle()?)?;
        Ok(self.wrap_derived(result, true))
    }

    /// Computes a point guaranteed to lie on the surface.
    pub fn point_on_surface(&self) -> Result<Option<Geometry>> {
        let result = self.engine().point_on_surface(self.handle()?)?;
        Ok(self.wrap_derived(result, true))
    }

    /// Computes the centroid. For surfaces this is the center of mass, which
    /// need not lie on the geometry itself.
    pub fn centroid(&self) -> Result<Option<Geometry>> {
        let result = self.engine().centroid(self.handle()?)?;
        Ok(self.wrap_derived(result, true))
    }

    /// Assembles polygons from a collection of fully-noded linework.
    /// `Ok(None)` when the linework does not close into rings.
    pub fn polygonize(&self) -> Result<Option<Geometry>> {
        let result = self.engine().polygonize(self.handle()?)?;
        Ok(self.wrap_derived(result, true))
    }

    /// Computes the region within `distance` of the geometry, using
    /// [`DEFAULT_BUFFER_QUAD_SEGS`] segments per quarter circle. A negative
    /// distance shrinks a surface instead.
    pub fn buffer(&self, distance: f64) -> Result<Option<Geometry>> {
        self.buffer_ex(distance, DEFAULT_BUFFER_QUAD_SEGS)
    }

    /// [`Geometry::buffer`] with an explicit curve approximation.
    pub fn buffer_ex(&self, distance: f64, quad_segs: u32) -> Result<Option<Geometry>> {
        let result = self.engine().buffer(self.handle()?, distance, quad_segs)?;
        Ok(self.wrap_derived(result, true))
    }

    /// Removes vertices that deviate less than `tolerance`, without any
    /// topology guarantee. The result may be invalid or collapse entirely.
    pub fn simplify(&self, tolerance: f64) -> Result<Option<Geometry>> {
        let result = self.engine().simplify(self.handle()?, tolerance)?;
        Ok(self.wrap_derived(result, true))
    }

    /// Like [`Geometry::simplify`], but rings stay rings and components are
    /// never merged or dropped.
    pub fn simplify_preserve_topology(&self, tolerance: f64) -> Result<Option<Geometry>> {
        let result = self
            .engine()
            .simplify_preserve_topology(self.handle()?, tolerance)?;
        Ok(self.wrap_derived(result, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::GeometryKind;
    use float_cmp::approx_eq;

    fn wkt(input: &str) -> Geometry {
        Geometry::from_wkt(input).unwrap()
    }

    #[test]
    fn test_transform_copies() {
        let wgs84 = SpatialRef::from_epsg(4326).unwrap();
        let mercator = SpatialRef::from_epsg(3857).unwrap();
        let ct = CoordTransform::new(&wgs84, &mercator).unwrap();

        let geom = wkt("POINT (-122.0 47.0)");
        let projected = geom.transform(&ct).unwrap();

        // The source is untouched.
        assert_eq!(geom.get_point(0).unwrap(), Some((-122.0, 47.0, 0.0)));
        let (x, y, _) = projected.get_point(0).unwrap().unwrap();
        assert!(approx_eq!(f64, x, -13_580_977.88, epsilon = 1.0));
        assert!(approx_eq!(f64, y, 5_942_074.07, epsilon = 1.0));
    }

    #[test]
    fn test_null_transform_is_a_no_op() {
        let mut geom = wkt("POINT (-122.0 47.0)");
        geom.transform_inplace(&CoordTransform::null()).unwrap();
        assert_eq!(geom.get_point(0).unwrap(), Some((-122.0, 47.0, 0.0)));
    }

    #[test]
    fn test_transform_to() {
        let mut geom = wkt("POINT (-122.0 47.0)");
        geom.set_spatial_ref(SpatialRef::from_epsg(4326).unwrap());

        let mercator = SpatialRef::from_epsg(3857).unwrap();
        let projected = geom.transform_to(&mercator).unwrap();
        assert!(projected.spatial_ref().unwrap().is_same(&mercator));
        let (x, _, _) = projected.get_point(0).unwrap().unwrap();
        assert!(approx_eq!(f64, x, -13_580_977.88, epsilon = 1.0));
    }

    #[test]
    fn test_transform_to_without_source_only_assigns() {
        let mut geom = wkt("POINT (-122.0 47.0)");
        assert!(geom.spatial_ref().is_none());

        let mercator = SpatialRef::from_epsg(3857).unwrap();
        geom.transform_to_inplace(&mercator).unwrap();
        // Coordinates are taken at face value.
        assert_eq!(geom.get_point(0).unwrap(), Some((-122.0, 47.0, 0.0)));
        assert!(geom.spatial_ref().unwrap().is_same(&mercator));
    }

    #[test]
    fn test_boundary() {
        let line = wkt("LINESTRING (0 0,1 1,2 2)");
        let boundary = line.boundary().unwrap().unwrap();
        assert_eq!(boundary.kind(), GeometryKind::MultiPoint);
        assert_eq!(boundary.geometry_count(), 2);

        let poly = wkt("POLYGON ((0 0,0 1,1 1,0 0))");
        let boundary = poly.boundary().unwrap().unwrap();
        assert_eq!(boundary.kind(), GeometryKind::LineString);
    }

    #[test]
    fn test_convex_hull() {
        let star = wkt(
            "MULTIPOINT (0 0,0 2,1 3,2 2,2 0,1 0.5,1.1 1.0,0.9 1.4,1 1)",
        );
        let hull = star.convex_hull().unwrap().unwrap();
        assert_eq!(hull.kind(), GeometryKind::Polygon);
        assert!(approx_eq!(f64, hull.area(), 5.0, epsilon = 1e-9));
    }

    #[test]
    fn test_centroid_and_point_on_surface() {
        let poly = wkt("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        let centroid = poly.centroid().unwrap().unwrap();
        assert_eq!(centroid.get_point(0).unwrap(), Some((1.0, 1.0, 0.0)));

        let pos = poly.point_on_surface().unwrap().unwrap();
        assert!(poly.contains(&pos).unwrap());
    }

    #[test]
    fn test_buffer_grows_a_point() {
        let point = wkt("POINT (0 0)");
        let buffered = point.buffer(1.0).unwrap().unwrap();
        assert_eq!(buffered.kind(), GeometryKind::Polygon);
        // The inscribed polygon approaches pi from below.
        assert!(buffered.area() > 3.0);
        assert!(buffered.area() < std::f64::consts::PI);
    }

    #[test]
    fn test_negative_buffer_shrinks() {
        let poly = wkt("POLYGON ((0 0,0 10,10 10,10 0,0 0))");
        let shrunk = poly.buffer_ex(-1.0, 8).unwrap().unwrap();
        assert!(shrunk.area() < 100.0);
        assert!(shrunk.area() > 0.0);
    }

    #[test]
    fn test_simplify_variants() {
        let line = wkt("LINESTRING (0 0,0.05 1,0 2,1 2,2 2)");
        let simplified = line.simplify(0.1).unwrap().unwrap();
        assert!(simplified.point_count() < 5);

        let preserved = line.simplify_preserve_topology(0.1).unwrap().unwrap();
        assert!(preserved.point_count() <= 5);

        // Points pass through either path unchanged.
        let point = wkt("POINT (1 2)");
        assert_eq!(point.simplify(0.5).unwrap().unwrap(), point);
    }

    #[test]
    fn test_polygonize() {
        let linework = wkt(
            "GEOMETRYCOLLECTION (LINESTRING (0 0,0 1),LINESTRING (0 1,1 1),\
             LINESTRING (1 1,0 0))",
        );
        let polygons = linework.polygonize().unwrap().unwrap();
        assert_eq!(polygons.kind(), GeometryKind::GeometryCollection);
        assert_eq!(polygons.geometry_count(), 1);

        let dangling = wkt("GEOMETRYCOLLECTION (LINESTRING (0 0,0 1))");
        assert!(dangling.polygonize().unwrap().is_none());
    }
}
