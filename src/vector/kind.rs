//! Geometry kind tags.
//!
//! The tag space mirrors the well-known-binary type codes: the low byte
//! carries the base kind and the high bit marks the 2.5D ("with Z") variant.

/// The kind tag reported by the engine for a geometry handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Unknown,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    None,
    LinearRing,
    Point25D,
    LineString25D,
    Polygon25D,
    MultiPoint25D,
    MultiLineString25D,
    MultiPolygon25D,
    GeometryCollection25D,
}

/// WKB flag bit marking a 2.5D type code.
pub const WKB_25D_BIT: u32 = 0x8000_0000;

impl GeometryKind {
    /// Maps an external type code onto the closed kind set. Unrecognized
    /// codes collapse to [`GeometryKind::Unknown`]; the raw code is kept by
    /// the caller when loss matters (see `Geometry::factory`).
    pub fn from_code(code: u32) -> GeometryKind {
        let z = code & WKB_25D_BIT != 0;
        match (code & !WKB_25D_BIT, z) {
            (0, _) => GeometryKind::Unknown,
            (1, false) => GeometryKind::Point,
            (1, true) => GeometryKind::Point25D,
            (2, false) => GeometryKind::LineString,
            (2, true) => GeometryKind::LineString25D,
            (3, false) => GeometryKind::Polygon,
            (3, true) => GeometryKind::Polygon25D,
            (4, false) => GeometryKind::MultiPoint,
            (4, true) => GeometryKind::MultiPoint25D,
            (5, false) => GeometryKind::MultiLineString,
            (5, true) => GeometryKind::MultiLineString25D,
            (6, false) => GeometryKind::MultiPolygon,
            (6, true) => GeometryKind::MultiPolygon25D,
            (7, false) => GeometryKind::GeometryCollection,
            (7, true) => GeometryKind::GeometryCollection25D,
            (100, _) => GeometryKind::None,
            (101, _) => GeometryKind::LinearRing,
            _ => GeometryKind::Unknown,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            GeometryKind::Unknown => 0,
            GeometryKind::Point => 1,
            GeometryKind::LineString => 2,
            GeometryKind::Polygon => 3,
            GeometryKind::MultiPoint => 4,
            GeometryKind::MultiLineString => 5,
            GeometryKind::MultiPolygon => 6,
            GeometryKind::GeometryCollection => 7,
            GeometryKind::None => 100,
            GeometryKind::LinearRing => 101,
            GeometryKind::Point25D => 1 | WKB_25D_BIT,
            GeometryKind::LineString25D => 2 | WKB_25D_BIT,
            GeometryKind::Polygon25D => 3 | WKB_25D_BIT,
            GeometryKind::MultiPoint25D => 4 | WKB_25D_BIT,
            GeometryKind::MultiLineString25D => 5 | WKB_25D_BIT,
            GeometryKind::MultiPolygon25D => 6 | WKB_25D_BIT,
            GeometryKind::GeometryCollection25D => 7 | WKB_25D_BIT,
        }
    }

    /// Human-readable name of the kind tag.
    pub fn name(&self) -> &'static str {
        match self.flattened() {
            GeometryKind::Unknown => "Unknown (any)",
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "Line String",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "Multi Point",
            GeometryKind::MultiLineString => "Multi Line String",
            GeometryKind::MultiPolygon => "Multi Polygon",
            GeometryKind::GeometryCollection => "Geometry Collection",
            GeometryKind::None => "None",
            GeometryKind::LinearRing => "Linear Ring",
            _ => unreachable!("flattened() returns base kinds only"),
        }
    }

    pub fn is_3d(&self) -> bool {
        self.code() & WKB_25D_BIT != 0
    }

    /// The 2D base kind with any Z flag stripped.
    pub fn flattened(&self) -> GeometryKind {
        GeometryKind::from_code(self.code() & !WKB_25D_BIT)
    }

    /// The 2.5D counterpart of the kind, where one exists.
    pub fn with_z(&self) -> GeometryKind {
        match self.flattened() {
            GeometryKind::Unknown | GeometryKind::None | GeometryKind::LinearRing => *self,
            base => GeometryKind::from_code(base.code() | WKB_25D_BIT),
        }
    }

    /// Finds the most specific kind common to `main` and `extra`. Useful for
    /// reporting a single type over a heterogeneous collection of members.
    /// Returns [`GeometryKind::Unknown`] when the kinds share no common
    /// ancestor.
    pub fn merge(main: GeometryKind, extra: GeometryKind) -> GeometryKind {
        if main == extra {
            return main;
        }
        if main == GeometryKind::None {
            return extra;
        }
        if extra == GeometryKind::None {
            return main;
        }

        let z = main.is_3d() || extra.is_3d();
        let promote = |kind: GeometryKind| if z { kind.with_z() } else { kind };

        let a = main.flattened();
        let b = extra.flattened();
        if a == b {
            return promote(a);
        }

        use GeometryKind::*;
        let merged = match (a, b) {
            (Point, MultiPoint) | (MultiPoint, Point) => MultiPoint,
            (LineString, MultiLineString) | (MultiLineString, LineString) => MultiLineString,
            (LineString, LinearRing) | (LinearRing, LineString) => LineString,
            (Polygon, MultiPolygon) | (MultiPolygon, Polygon) => MultiPolygon,
            _ => return Unknown,
        };
        promote(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for kind in [
            GeometryKind::Point,
            GeometryKind::LineString25D,
            GeometryKind::MultiPolygon,
            GeometryKind::GeometryCollection25D,
            GeometryKind::None,
            GeometryKind::LinearRing,
        ] {
            assert_eq!(GeometryKind::from_code(kind.code()), kind);
        }
    }

    #[test]
    fn test_unrecognized_code_is_unknown() {
        assert_eq!(GeometryKind::from_code(17), GeometryKind::Unknown);
        assert_eq!(GeometryKind::from_code(3001), GeometryKind::Unknown);
    }

    #[test]
    fn test_merge() {
        use GeometryKind::*;
        assert_eq!(GeometryKind::merge(Point, Point), Point);
        assert_eq!(GeometryKind::merge(Point, MultiPoint), MultiPoint);
        assert_eq!(GeometryKind::merge(Polygon, MultiPolygon25D), MultiPolygon25D);
        assert_eq!(GeometryKind::merge(Point, Polygon), Unknown);
        assert_eq!(GeometryKind::merge(None, LineString), LineString);
        assert_eq!(GeometryKind::merge(Polygon25D, Polygon), Polygon25D);
    }

    #[test]
    fn test_names() {
        assert_eq!(GeometryKind::Point25D.name(), "Point");
        assert_eq!(GeometryKind::MultiLineString.name(), "Multi Line String");
    }
}
