//! GeoJSON codec for the planar engine, built on the `geojson` crate.
//!
//! Input may be a bare geometry object or a feature; features contribute
//! their geometry member. Positions with a third element parse as 2.5D.

use geojson::{GeoJson, Value};

use crate::engine::repr::{Coord3, GeomData, GeomRepr};
use crate::engine::GeoJsonOptions;

pub fn parse(input: &str) -> Result<GeomRepr, String> {
    let parsed: GeoJson = input.parse().map_err(|e| format!("{e}"))?;
    let geometry = match parsed {
        GeoJson::Geometry(g) => g,
        GeoJson::Feature(f) => f
            .geometry
            .ok_or_else(|| "feature has a null geometry member".to_string())?,
        GeoJson::FeatureCollection(_) => {
            return Err("expected a geometry, found a feature collection".to_string())
        }
    };
    value_to_repr(&geometry.value)
}

pub fn write(repr: &GeomRepr, options: &GeoJsonOptions) -> Result<String, String> {
    let value = repr_to_value(repr, options)?;
    Ok(geojson::Geometry::new(value).to_string())
}

fn value_to_repr(value: &Value) -> Result<GeomRepr, String> {
    let mut dim3 = false;
    let mut coord = |pos: &[f64]| -> Result<Coord3, String> {
        match pos {
            [x, y] => Ok(Coord3::new(*x, *y, 0.0)),
            [x, y, z, ..] => {
                dim3 = true;
                Ok(Coord3::new(*x, *y, *z))
            }
            _ => Err(format!("position has {} ordinates", pos.len())),
        }
    };

    let data = match value {
        Value::Point(pos) if pos.is_empty() => GeomData::Point(None),
        Value::Point(pos) => GeomData::Point(Some(coord(pos)?)),
        Value::LineString(line) => GeomData::Line {
            coords: line.iter().map(|p| coord(p)).collect::<Result<_, _>>()?,
            ring: false,
        },
        Value::Polygon(rings) => GeomData::Polygon(
            rings
                .iter()
                .map(|r| r.iter().map(|p| coord(p)).collect::<Result<_, _>>())
                .collect::<Result<_, _>>()?,
        ),
        Value::MultiPoint(points) => {
            GeomData::MultiPoint(points.iter().map(|p| coord(p)).collect::<Result<_, _>>()?)
        }
        Value::MultiLineString(lines) => GeomData::MultiLine(
            lines
                .iter()
                .map(|l| l.iter().map(|p| coord(p)).collect::<Result<_, _>>())
                .collect::<Result<_, _>>()?,
        ),
        Value::MultiPolygon(polys) => GeomData::MultiPolygon(
            polys
                .iter()
                .map(|rings| {
                    rings
                        .iter()
                        .map(|r| r.iter().map(|p| coord(p)).collect::<Result<_, _>>())
                        .collect::<Result<_, _>>()
                })
                .collect::<Result<_, _>>()?,
        ),
        Value::GeometryCollection(members) => {
            let members = members
                .iter()
                .map(|g| value_to_repr(&g.value))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(GeomRepr::new(GeomData::Collection(members), false));
        }
    };
    Ok(GeomRepr::new(data, dim3))
}

fn repr_to_value(repr: &GeomRepr, options: &GeoJsonOptions) -> Result<Value, String> {
    let dim3 = repr.dim3;
    let round = |v: f64| match options.coordinate_precision {
        Some(p) => {
            let scale = 10f64.powi(p as i32);
            (v * scale).round() / scale
        }
        None => v,
    };
    let pos = |c: &Coord3| -> Vec<f64> {
        if dim3 {
            vec![round(c.x), round(c.y), round(c.z)]
        } else {
            vec![round(c.x), round(c.y)]
        }
    };
    let line = |coords: &[Coord3]| coords.iter().map(pos).collect::<Vec<_>>();
    let rings = |rs: &[Vec<Coord3>]| rs.iter().map(|r| line(r)).collect::<Vec<_>>();

    Ok(match &repr.data {
        GeomData::Point(None) => Value::Point(Vec::new()),
        GeomData::Point(Some(c)) => Value::Point(pos(c)),
        GeomData::Line { coords, .. } => Value::LineString(line(coords)),
        GeomData::Polygon(rs) => Value::Polygon(rings(rs)),
        GeomData::MultiPoint(ps) => Value::MultiPoint(line(ps)),
        GeomData::MultiLine(ls) => Value::MultiLineString(rings(ls)),
        GeomData::MultiPolygon(ps) => {
            Value::MultiPolygon(ps.iter().map(|p| rings(p)).collect())
        }
        GeomData::Collection(ms) => Value::GeometryCollection(
            ms.iter()
                .map(|m| repr_to_value(m, options).map(geojson::Geometry::new))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        GeomData::None => return Err("the none kind has no GeoJSON representation".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::wkt;

    #[test]
    fn test_point_round_trip() {
        let repr = parse(r#"{"type":"Point","coordinates":[1.0,2.0]}"#).unwrap();
        assert!(repr.same_structure(&wkt::parse("POINT (1 2)").unwrap()));
        let out = write(&repr, &GeoJsonOptions::default()).unwrap();
        assert!(parse(&out).unwrap().same_structure(&repr));
    }

    #[test]
    fn test_25d_positions() {
        let repr = parse(r#"{"type":"LineString","coordinates":[[0,0,1],[1,1,2]]}"#).unwrap();
        assert_eq!(repr.coordinate_dimension(), 3);
        assert_eq!(repr.get_point(1), Some((1.0, 1.0, 2.0)));
    }

    #[test]
    fn test_feature_geometry_member() {
        let input = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {"type":"Point","coordinates":[4.0,5.0]}
        }"#;
        let repr = parse(input).unwrap();
        assert!(repr.same_structure(&wkt::parse("POINT (4 5)").unwrap()));
    }

    #[test]
    fn test_coordinate_precision() {
        let repr = wkt::parse("POINT (1.23456789 2.98765432)").unwrap();
        let opts = GeoJsonOptions {
            coordinate_precision: Some(3),
        };
        let out = write(&repr, &opts).unwrap();
        let back = parse(&out).unwrap();
        assert_eq!(back.get_point(0), Some((1.235, 2.988, 0.0)));
    }

    #[test]
    fn test_collection_round_trip() {
        let repr = wkt::parse("GEOMETRYCOLLECTION (POINT (1 2),LINESTRING (0 0,1 1))").unwrap();
        let out = write(&repr, &GeoJsonOptions::default()).unwrap();
        assert!(parse(&out).unwrap().same_structure(&repr));
    }

    #[test]
    fn test_rejects_feature_collection_and_garbage() {
        assert!(parse(r#"{"type":"FeatureCollection","features":[]}"#).is_err());
        assert!(parse("not json").is_err());
    }
}
