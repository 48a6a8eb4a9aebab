//! Conversion from [`Geometry`] into [`geo_types`] values.

use std::convert::TryFrom;

use crate::errors::{Result, TerraneError};
use crate::vector::{Geometry, GeometryKind};

impl TryFrom<&Geometry> for geo_types::Geometry<f64> {
    type Error = TerraneError;

    fn try_from(geom: &Geometry) -> Result<geo_types::Geometry<f64>> {
        match geom.kind().flattened() {
            GeometryKind::Point => Ok(geo_types::Geometry::Point(point_of(geom, 0)?)),
            GeometryKind::MultiPoint => {
                let points = members(geom, |inner| match inner {
                    geo_types::Geometry::Point(p) => Ok(p),
                    _ => Err(member_mismatch("Point")),
                })?;
                Ok(geo_types::Geometry::MultiPoint(geo_types::MultiPoint(
                    points,
                )))
            }
            GeometryKind::LineString | GeometryKind::LinearRing => Ok(
                geo_types::Geometry::LineString(line_string_of(geom)?),
            ),
            GeometryKind::MultiLineString => {
                let strings = members(geom, |inner| match inner {
                    geo_types::Geometry::LineString(s) => Ok(s),
                    _ => Err(member_mismatch("LineString")),
                })?;
                Ok(geo_types::Geometry::MultiLineString(
                    geo_types::MultiLineString(strings),
                ))
            }
            GeometryKind::Polygon => Ok(geo_types::Geometry::Polygon(polygon_of(geom)?)),
            GeometryKind::MultiPolygon => {
                let polygons = members(geom, |inner| match inner {
                    geo_types::Geometry::Polygon(p) => Ok(p),
                    _ => Err(member_mismatch("Polygon")),
                })?;
                Ok(geo_types::Geometry::MultiPolygon(geo_types::MultiPolygon(
                    polygons,
                )))
            }
            GeometryKind::GeometryCollection => {
                let list = members(geom, Ok)?;
                Ok(geo_types::Geometry::GeometryCollection(
                    geo_types::GeometryCollection(list),
                ))
            }
            other => Err(TerraneError::BadArgument(format!(
                "no geo-types representation for {other:?}"
            ))),
        }
    }
}

impl TryFrom<Geometry> for geo_types::Geometry<f64> {
    type Error = TerraneError;

    fn try_from(geom: Geometry) -> Result<geo_types::Geometry<f64>> {
        Self::try_from(&geom)
    }
}

fn point_of(geom: &Geometry, index: usize) -> Result<geo_types::Point<f64>> {
    let (x, y, _) = geom
        .get_point(index)?
        .ok_or_else(|| TerraneError::BadArgument("empty point has no coordinates".to_string()))?;
    Ok(geo_types::Point(geo_types::Coord { x, y }))
}

fn line_string_of(geom: &Geometry) -> Result<geo_types::LineString<f64>> {
    let mut coords = Vec::with_capacity(geom.point_count());
    for i in 0..geom.point_count() {
        let point = point_of(geom, i)?;
        coords.push(point.0);
    }
    Ok(geo_types::LineString(coords))
}

fn polygon_of(geom: &Geometry) -> Result<geo_types::Polygon<f64>> {
    let ring = |n: usize| -> Result<geo_types::LineString<f64>> {
        let ring = geom
            .get_geometry(n)?
            .ok_or_else(|| member_mismatch("LinearRing"))?;
        line_string_of(&ring)
    };
    if geom.geometry_count() == 0 {
        return Ok(geo_types::Polygon::new(
            geo_types::LineString(Vec::new()),
            Vec::new(),
        ));
    }
    let outer = ring(0)?;
    let holes = (1..geom.geometry_count()).map(ring).collect::<Result<_>>()?;
    Ok(geo_types::Polygon::new(outer, holes))
}

fn members<T>(
    geom: &Geometry,
    pick: impl Fn(geo_types::Geometry<f64>) -> Result<T>,
) -> Result<Vec<T>> {
    (0..geom.geometry_count())
        .map(|n| {
            let member = geom
                .get_geometry(n)?
                .ok_or_else(|| member_mismatch("geometry"))?;
            pick(geo_types::Geometry::try_from(&member)?)
        })
        .collect()
}

fn member_mismatch(expected: &str) -> TerraneError {
    TerraneError::BadArgument(format!("expected a {expected} member"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_geo(wkt: &str) -> geo_types::Geometry<f64> {
        let geom = Geometry::from_wkt(wkt).unwrap();
        geo_types::Geometry::try_from(&geom).unwrap()
    }

    #[test]
    fn test_point() {
        assert_eq!(
            to_geo("POINT (1 2)"),
            geo_types::Geometry::Point(geo_types::Point::new(1.0, 2.0))
        );
    }

    #[test]
    fn test_polygon_with_hole() {
        let geo = to_geo("POLYGON ((0 0,0 10,10 10,10 0,0 0),(2 2,2 4,4 4,4 2,2 2))");
        let geo_types::Geometry::Polygon(polygon) = geo else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_eq!(polygon.interiors().len(), 1);
    }

    #[test]
    fn test_collection_recurses() {
        let geo = to_geo("GEOMETRYCOLLECTION (POINT (1 2),LINESTRING (0 0,1 1))");
        let geo_types::Geometry::GeometryCollection(gc) = geo else {
            panic!("expected a collection");
        };
        assert_eq!(gc.0.len(), 2);
        assert!(matches!(gc.0[0], geo_types::Geometry::Point(_)));
        assert!(matches!(gc.0[1], geo_types::Geometry::LineString(_)));
    }

    #[test]
    fn test_z_is_dropped() {
        assert_eq!(
            to_geo("POINT (1 2 3)"),
            geo_types::Geometry::Point(geo_types::Point::new(1.0, 2.0))
        );
    }

    #[test]
    fn test_empty_point_fails() {
        let geom = Geometry::from_wkt("POINT EMPTY").unwrap();
        assert!(geo_types::Geometry::try_from(&geom).is_err());
    }
}
