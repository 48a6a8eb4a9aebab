use crate::errors::Result;
use crate::vector::Geometry;

/// # Geometric Predicates
///
/// Common [spatial relations](https://en.wikipedia.org/wiki/DE-9IM#Spatial_predicates)
/// between two geometries, plus the unary validity and simplicity tests.
///
/// The binary predicates are non-mutating; engine failures propagate.
/// [`Geometry::is_valid`] and [`Geometry::is_ring`] are the exception: they
/// never raise, and degrade to `false` instead.
impl Geometry {
    /// Tests if two geometries _intersect_; `self` and `other` have at least
    /// one point in common.
    pub fn intersects(&self, other: &Self) -> Result<bool> {
        self.engine().intersects(self.handle()?, other.handle()?)
    }

    /// Tests if this geometry and the other geometry are _disjoint_;
    /// they share no point at all.
    pub fn disjoint(&self, other: &Self) -> Result<bool> {
        self.engine().disjoint(self.handle()?, other.handle()?)
    }

    /// Tests if this geometry and the other geometry are _touching_;
    /// they share boundary points but no interior points.
    pub fn touches(&self, other: &Self) -> Result<bool> {
        self.engine().touches(self.handle()?, other.handle()?)
    }

    /// Tests if this geometry and the other geometry are _crossing_;
    /// they share some but not all interior points, and the intersection has
    /// a lower dimension than at least one operand.
    pub fn crosses(&self, other: &Self) -> Result<bool> {
        self.engine().crosses(self.handle()?, other.handle()?)
    }

    /// Tests if this geometry is _within_ the other; `self` lies fully in
    /// the interior of `other`.
    pub fn within(&self, other: &Self) -> Result<bool> {
        self.engine().within(self.handle()?, other.handle()?)
    }

    /// Tests if this geometry _contains_ the other geometry;
    /// `other` lies in `self`, and the interiors intersect.
    pub fn contains(&self, other: &Self) -> Result<bool> {
        self.engine().contains(self.handle()?, other.handle()?)
    }

    /// Tests if this geometry and the other geometry _overlap_;
    /// they share space, are of the same dimension, and neither contains the
    /// other.
    pub fn overlaps(&self, other: &Self) -> Result<bool> {
        self.engine().overlaps(self.handle()?, other.handle()?)
    }

    /// Structural equality: the same kind tag and the same coordinates, in
    /// order. The linear-ring marker does not participate, as the tag space
    /// has no wire-level code for it. Also available as `==`, which answers
    /// `false` instead of failing.
    pub fn equals(&self, other: &Self) -> Result<bool> {
        self.engine().equals(self.handle()?, other.handle()?)
    }

    /// Tests the geometry for validity under the OGC simple-features rules.
    /// Never raises: engine failures degrade to `false`.
    pub fn is_valid(&self) -> bool {
        self.lenient_unary_predicate("is_valid", |e, h| e.is_valid(h))
    }

    /// Tests the geometry for simplicity (no anomalous self-intersection).
    ///
    /// Unlike [`Geometry::is_valid`], engine errors propagate.
    pub fn is_simple(&self) -> Result<bool> {
        self.engine().is_simple(self.handle()?)
    }

    /// Tests whether this geometry is a closed, simple curve. `false` for
    /// anything that is not a curve; never raises.
    pub fn is_ring(&self) -> bool {
        self.lenient_unary_predicate("is_ring", |e, h| e.is_ring(h))
    }

    fn lenient_unary_predicate(
        &self,
        method: &'static str,
        f: impl FnOnce(&dyn crate::engine::Engine, crate::engine::GeomHandle) -> Result<bool>,
    ) -> bool {
        let Some(handle) = self.core().handle else {
            return false;
        };
        match f(self.engine().as_ref(), handle) {
            Ok(answer) => answer,
            Err(err) => {
                log::debug!("{method}: engine reported '{err}', answering false");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::vector::Geometry;

    fn wkt(input: &str) -> Geometry {
        Geometry::from_wkt(input).unwrap()
    }

    #[test]
    fn test_intersects() {
        let a = wkt("POLYGON ((0 0,0 10,10 10,10 0,0 0))");
        let b = wkt("POLYGON ((5 5,5 15,15 15,15 5,5 5))");
        let c = wkt("POLYGON ((20 20,20 30,30 30,30 20,20 20))");
        assert!(a.intersects(&b).unwrap());
        assert!(!a.intersects(&c).unwrap());
        assert!(a.disjoint(&c).unwrap());
    }

    #[test]
    fn test_contains_and_within() {
        let outer = wkt("POLYGON ((0 0,0 10,10 10,10 0,0 0))");
        let point = wkt("POINT (5 5)");
        assert!(outer.contains(&point).unwrap());
        assert!(point.within(&outer).unwrap());
        assert!(!point.contains(&outer).unwrap());
    }

    #[test]
    fn test_touches_crosses_overlaps() {
        let a = wkt("POLYGON ((0 0,0 1,1 1,1 0,0 0))");
        let neighbor = wkt("POLYGON ((1 0,1 1,2 1,2 0,1 0))");
        assert!(a.touches(&neighbor).unwrap());

        let line = wkt("LINESTRING (-1 0.5,2 0.5)");
        assert!(line.crosses(&a).unwrap());

        let shifted = wkt("POLYGON ((0.5 0.5,0.5 1.5,1.5 1.5,1.5 0.5,0.5 0.5))");
        assert!(a.overlaps(&shifted).unwrap());
    }

    #[test]
    fn test_equals_ignores_ring_marker() {
        let ring = wkt("LINEARRING (0 0,0 1,1 1,0 0)");
        let line = wkt("LINESTRING (0 0,0 1,1 1,0 0)");
        assert!(ring.equals(&line).unwrap());
        assert_eq!(ring, line);
        assert_ne!(ring, wkt("LINESTRING (0 0,1 1)"));
    }

    #[test]
    fn test_validity() {
        assert!(wkt("POLYGON ((0 0,0 1,1 1,1 0,0 0))").is_valid());
        assert!(!wkt("POLYGON ((0 0,2 2,2 0,0 2,0 0))").is_valid());
    }

    #[test]
    fn test_validity_never_raises() {
        let mut geom = wkt("POINT (1 2)");
        geom.destroy().unwrap();
        assert!(!geom.is_valid());
        assert!(!geom.is_ring());
    }

    #[test]
    fn test_is_simple_propagates_errors() {
        let line = wkt("LINESTRING (0 0,1 1,2 0)");
        assert!(line.is_simple().unwrap());
        assert!(!wkt("LINESTRING (0 0,2 2,0 2,2 0)").is_simple().unwrap());

        let gc = wkt("GEOMETRYCOLLECTION (POINT (0 0))");
        assert!(gc.is_simple().is_err());
    }

    #[test]
    fn test_is_ring_degrades_on_non_curves() {
        assert!(wkt("LINESTRING (0 0,0 1,1 1,0 0)").is_ring());
        assert!(!wkt("LINESTRING (0 0,1 1)").is_ring());
        // Engine-side this raises; the wrapper answers false.
        assert!(!wkt("POINT (0 0)").is_ring());
    }

    #[test]
    fn test_predicates_on_destroyed_operand() {
        let a = wkt("POINT (0 0)");
        let mut b = wkt("POINT (0 0)");
        assert!(a.intersects(&b).unwrap());
        b.destroy().unwrap();
        assert!(a.intersects(&b).is_err());
        // `==` degrades instead of failing.
        assert!(a != b);
    }
}
