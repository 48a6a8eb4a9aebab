//! Coordinate transformations between spatial reference systems.

use crate::errors::{Result, TerraneError};
use crate::spatial_ref::srs::{EPSG_WEB_MERCATOR, EPSG_WGS84};
use crate::spatial_ref::SpatialRef;

const EARTH_RADIUS: f64 = 6_378_137.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Path {
    /// The null transformation handle. Applying it is a no-op.
    Null,
    Identity,
    Wgs84ToWebMercator,
    WebMercatorToWgs84,
}

/// A reusable operator mapping coordinates from a source system to a target
/// system. Building one is the expensive step; applying it is cheap, so a
/// transform should be built once and reused across geometries.
#[derive(Debug, Clone)]
pub struct CoordTransform {
    path: Path,
    description: String,
}

impl CoordTransform {
    pub fn new(source: &SpatialRef, target: &SpatialRef) -> Result<CoordTransform> {
        let path = if source.is_same(target) {
            Path::Identity
        } else {
            match (source.auth_code(), target.auth_code()) {
                (Some(EPSG_WGS84), Some(EPSG_WEB_MERCATOR)) => Path::Wgs84ToWebMercator,
                (Some(EPSG_WEB_MERCATOR), Some(EPSG_WGS84)) => Path::WebMercatorToWgs84,
                _ => {
                    return Err(TerraneError::TransformError {
                        msg: format!("no transformation path from '{source}' to '{target}'"),
                    })
                }
            }
        };
        Ok(CoordTransform {
            path,
            description: format!("{source} -> {target}"),
        })
    }

    /// The null transformation. Geometry-level application treats it as a
    /// no-op rather than an error.
    pub fn null() -> CoordTransform {
        CoordTransform {
            path: Path::Null,
            description: "null".to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.path == Path::Null
    }

    /// Transforms coordinate triples in place. The three slices must have
    /// equal lengths.
    pub fn transform_coords(
        &self,
        x: &mut [f64],
        y: &mut [f64],
        z: &mut [f64],
    ) -> Result<()> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(TerraneError::BadArgument(format!(
                "coordinate slices differ in length: {}/{}/{}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        match self.path {
            Path::Null | Path::Identity => Ok(()),
            Path::Wgs84ToWebMercator => {
                for (lon, lat) in x.iter_mut().zip(y.iter_mut()) {
                    if !(*lat > -90.0 && *lat < 90.0) || !lon.is_finite() {
                        return Err(TerraneError::TransformError {
                            msg: format!(
                                "({lon}, {lat}) is outside the WGS 84 domain ({})",
                                self.description
                            ),
                        });
                    }
                    let merc_x = EARTH_RADIUS * lon.to_radians();
                    let merc_y = EARTH_RADIUS
                        * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                    if !merc_y.is_finite() {
                        return Err(TerraneError::TransformError {
                            msg: format!("latitude {lat} has no Mercator image"),
                        });
                    }
                    *lon = merc_x;
                    *lat = merc_y;
                }
                Ok(())
            }
            Path::WebMercatorToWgs84 => {
                for (mx, my) in x.iter_mut().zip(y.iter_mut()) {
                    let lon = (*mx / EARTH_RADIUS).to_degrees();
                    let lat = (2.0 * (*my / EARTH_RADIUS).exp().atan()
                        - std::f64::consts::FRAC_PI_2)
                        .to_degrees();
                    *mx = lon;
                    *my = lat;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn wgs84() -> SpatialRef {
        SpatialRef::from_epsg(4326).unwrap()
    }

    fn mercator() -> SpatialRef {
        SpatialRef::from_epsg(3857).unwrap()
    }

    #[test]
    fn test_forward_and_inverse() {
        let forward = CoordTransform::new(&wgs84(), &mercator()).unwrap();
        let mut x = [-122.0, 0.0];
        let mut y = [47.0, 0.0];
        let mut z = [0.0, 0.0];
        forward.transform_coords(&mut x, &mut y, &mut z).unwrap();
        assert!(approx_eq!(f64, x[0], -13_580_977.88, epsilon = 1.0));
        assert!(approx_eq!(f64, y[0], 5_942_074.07, epsilon = 1.0));
        assert!(approx_eq!(f64, x[1], 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, y[1], 0.0, epsilon = 1e-9));

        let inverse = CoordTransform::new(&mercator(), &wgs84()).unwrap();
        inverse.transform_coords(&mut x, &mut y, &mut z).unwrap();
        assert!(approx_eq!(f64, x[0], -122.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, y[0], 47.0, epsilon = 1e-9));
    }

    #[test]
    fn test_identity() {
        let ct = CoordTransform::new(&wgs84(), &wgs84()).unwrap();
        let mut x = [10.0];
        let mut y = [20.0];
        let mut z = [30.0];
        ct.transform_coords(&mut x, &mut y, &mut z).unwrap();
        assert_eq!((x[0], y[0], z[0]), (10.0, 20.0, 30.0));
    }

    #[test]
    fn test_null_is_noop() {
        let ct = CoordTransform::null();
        assert!(ct.is_null());
        let mut x = [1.0];
        let mut y = [2.0];
        let mut z = [3.0];
        ct.transform_coords(&mut x, &mut y, &mut z).unwrap();
        assert_eq!((x[0], y[0]), (1.0, 2.0));
    }

    #[test]
    fn test_no_path() {
        let unknown = SpatialRef::from_epsg(27700).unwrap();
        let err = CoordTransform::new(&wgs84(), &unknown).unwrap_err();
        assert!(matches!(err, TerraneError::TransformError { .. }));
    }

    #[test]
    fn test_out_of_domain() {
        let ct = CoordTransform::new(&wgs84(), &mercator()).unwrap();
        let mut x = [0.0];
        let mut y = [90.0];
        let mut z = [0.0];
        assert!(ct.transform_coords(&mut x, &mut y, &mut z).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let ct = CoordTransform::null();
        let mut x = [0.0, 1.0];
        let mut y = [0.0];
        let mut z = [0.0];
        assert!(ct.transform_coords(&mut x, &mut y, &mut z).is_err());
    }
}
