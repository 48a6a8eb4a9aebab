//! Conversion from [`geo_types`] values into [`Geometry`].

use crate::errors::Result;
use crate::vector::{Geometry, GeometryKind};

/// Builds an engine-backed [`Geometry`] from a [`geo_types`] value.
pub trait ToGeometry {
    fn to_geometry(&self) -> Result<Geometry>;
}

impl ToGeometry for geo_types::Point<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        let mut geom = Geometry::create(GeometryKind::Point)?;
        geom.add_point_2d((self.x(), self.y()))?;
        Ok(geom)
    }
}

impl ToGeometry for geo_types::MultiPoint<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        collect(GeometryKind::MultiPoint, self.0.iter())
    }
}

fn curve_of(
    kind: GeometryKind,
    line_string: &geo_types::LineString<f64>,
) -> Result<Geometry> {
    let mut geom = Geometry::create(kind)?;
    for coord in &line_string.0 {
        geom.add_point_2d((coord.x, coord.y))?;
    }
    Ok(geom)
}

impl ToGeometry for geo_types::LineString<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        curve_of(GeometryKind::LineString, self)
    }
}

impl ToGeometry for geo_types::Line<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        geo_types::LineString(vec![self.start, self.end]).to_geometry()
    }
}

impl ToGeometry for geo_types::MultiLineString<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        collect(GeometryKind::MultiLineString, self.0.iter())
    }
}

impl ToGeometry for geo_types::Polygon<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        let mut geom = Geometry::create(GeometryKind::Polygon)?;
        geom.add_geometry(&curve_of(GeometryKind::LinearRing, self.exterior())?)?;
        for ring in self.interiors() {
            geom.add_geometry(&curve_of(GeometryKind::LinearRing, ring)?)?;
        }
        Ok(geom)
    }
}

impl ToGeometry for geo_types::Rect<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        self.to_polygon().to_geometry()
    }
}

impl ToGeometry for geo_types::Triangle<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        self.to_polygon().to_geometry()
    }
}

impl ToGeometry for geo_types::MultiPolygon<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        collect(GeometryKind::MultiPolygon, self.0.iter())
    }
}

impl ToGeometry for geo_types::GeometryCollection<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        collect(GeometryKind::GeometryCollection, self.0.iter())
    }
}

impl ToGeometry for geo_types::Geometry<f64> {
    fn to_geometry(&self) -> Result<Geometry> {
        match self {
            geo_types::Geometry::Point(c) => c.to_geometry(),
            geo_types::Geometry::MultiPoint(c) => c.to_geometry(),
            geo_types::Geometry::Line(c) => c.to_geometry(),
            geo_types::Geometry::LineString(c) => c.to_geometry(),
            geo_types::Geometry::MultiLineString(c) => c.to_geometry(),
            geo_types::Geometry::Polygon(c) => c.to_geometry(),
            geo_types::Geometry::Rect(c) => c.to_geometry(),
            geo_types::Geometry::Triangle(c) => c.to_geometry(),
            geo_types::Geometry::MultiPolygon(c) => c.to_geometry(),
            geo_types::Geometry::GeometryCollection(c) => c.to_geometry(),
        }
    }
}

fn collect<'a, T: ToGeometry + 'a>(
    kind: GeometryKind,
    members: impl Iterator<Item = &'a T>,
) -> Result<Geometry> {
    let mut geom = Geometry::create(kind)?;
    for member in members {
        geom.add_geometry(&member.to_geometry()?)?;
    }
    Ok(geom)
}
