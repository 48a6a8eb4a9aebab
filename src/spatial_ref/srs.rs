//! Spatial reference systems.
//!
//! The default build knows the two systems the transformation layer can
//! convert between, WGS 84 and spherical Web Mercator, and carries any other
//! definition opaquely: it can be attached to geometries, compared, and
//! exported, but not transformed.

use std::fmt;
use std::sync::Arc;

use crate::errors::{Result, TerraneError};

pub(crate) const EPSG_WGS84: u32 = 4326;
pub(crate) const EPSG_WEB_MERCATOR: u32 = 3857;

const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;
const WEB_MERCATOR_WKT: &str = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Mercator_1SP"],UNIT["metre",1],AUTHORITY["EPSG","3857"]]"#;

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";
const WEB_MERCATOR_PROJ4: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wgs84=0,0,0,0,0,0,0 +no_defs";

#[derive(Debug, PartialEq)]
struct SrsInner {
    authority: Option<(String, u32)>,
    wkt: Option<String>,
    proj4: Option<String>,
    geographic: bool,
}

/// A shared, immutable spatial reference system.
///
/// Cloning retains the same underlying definition; the retain count is
/// observable through [`SpatialRef::retain_count`]. Two references compare
/// equal when they describe the same system, not when they share storage.
#[derive(Debug, Clone)]
pub struct SpatialRef(Arc<SrsInner>);

impl SpatialRef {
    pub fn from_epsg(code: u32) -> Result<SpatialRef> {
        let inner = match code {
            EPSG_WGS84 => SrsInner {
                authority: Some(("EPSG".to_string(), code)),
                wkt: Some(WGS84_WKT.to_string()),
                proj4: Some(WGS84_PROJ4.to_string()),
                geographic: true,
            },
            EPSG_WEB_MERCATOR => SrsInner {
                authority: Some(("EPSG".to_string(), code)),
                wkt: Some(WEB_MERCATOR_WKT.to_string()),
                proj4: Some(WEB_MERCATOR_PROJ4.to_string()),
                geographic: false,
            },
            0 => {
                return Err(TerraneError::ParseError {
                    format: "EPSG code",
                    msg: "0 is not a valid EPSG code".to_string(),
                })
            }
            other => SrsInner {
                authority: Some(("EPSG".to_string(), other)),
                wkt: None,
                proj4: None,
                geographic: false,
            },
        };
        Ok(SpatialRef(Arc::new(inner)))
    }

    pub fn from_proj4(definition: &str) -> Result<SpatialRef> {
        let trimmed = definition.trim();
        if trimmed.is_empty() || !trimmed.starts_with('+') {
            return Err(TerraneError::ParseError {
                format: "PROJ.4 definition",
                msg: format!("'{definition}' is not a PROJ.4 string"),
            });
        }
        if let Some(code) = proj4_epsg(trimmed) {
            return SpatialRef::from_epsg(code);
        }
        let geographic = trimmed.contains("+proj=longlat") || trimmed.contains("+proj=latlong");
        Ok(SpatialRef(Arc::new(SrsInner {
            authority: None,
            wkt: None,
            proj4: Some(trimmed.to_string()),
            geographic,
        })))
    }

    pub fn from_wkt(wkt: &str) -> Result<SpatialRef> {
        let trimmed = wkt.trim();
        let geographic = trimmed.starts_with("GEOGCS") || trimmed.starts_with("GEOGCRS");
        if !geographic && !trimmed.starts_with("PROJCS") && !trimmed.starts_with("PROJCRS") {
            return Err(TerraneError::ParseError {
                format: "WKT SRS definition",
                msg: "expected a GEOGCS or PROJCS node".to_string(),
            });
        }
        if let Some(code) = wkt_epsg(trimmed) {
            return SpatialRef::from_epsg(code);
        }
        Ok(SpatialRef(Arc::new(SrsInner {
            authority: None,
            wkt: Some(trimmed.to_string()),
            proj4: None,
            geographic,
        })))
    }

    /// Dispatches on the definition syntax: `EPSG:n`, a PROJ.4 string, or a
    /// WKT SRS node.
    pub fn from_definition(definition: &str) -> Result<SpatialRef> {
        let trimmed = definition.trim();
        if let Some(code) = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
        {
            let code = code.trim().parse::<u32>().map_err(|e| TerraneError::ParseError {
                format: "EPSG code",
                msg: format!("'{code}': {e}"),
            })?;
            return SpatialRef::from_epsg(code);
        }
        if trimmed.starts_with('+') {
            return SpatialRef::from_proj4(trimmed);
        }
        SpatialRef::from_wkt(trimmed)
    }

    pub fn to_wkt(&self) -> Result<String> {
        if let Some(wkt) = &self.0.wkt {
            return Ok(wkt.clone());
        }
        if let Some((name, code)) = &self.0.authority {
            let node = if self.0.geographic { "GEOGCS" } else { "PROJCS" };
            return Ok(format!(
                r#"{node}["{name}:{code}",AUTHORITY["{name}","{code}"]]"#
            ));
        }
        Err(TerraneError::engine(
            "to_wkt",
            "spatial reference has no WKT form",
        ))
    }

    pub fn to_proj4(&self) -> Result<String> {
        self.0.proj4.clone().ok_or_else(|| {
            TerraneError::engine("to_proj4", "spatial reference has no PROJ.4 form")
        })
    }

    pub fn auth_name(&self) -> Option<&str> {
        self.0.authority.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn auth_code(&self) -> Option<u32> {
        self.0.authority.as_ref().map(|(_, code)| *code)
    }

    /// `"EPSG:4326"`-style authority string, when an authority is known.
    pub fn authority(&self) -> Option<String> {
        self.0
            .authority
            .as_ref()
            .map(|(name, code)| format!("{name}:{code}"))
    }

    pub fn is_geographic(&self) -> bool {
        self.0.geographic
    }

    /// Whether two references describe the same system. Authorities compare
    /// by identity; authority-less definitions compare textually.
    pub fn is_same(&self, other: &SpatialRef) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&self.0.authority, &other.0.authority) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.0 == other.0,
            _ => false,
        }
    }

    /// Number of live retains of this definition, including this one.
    pub fn retain_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl PartialEq for SpatialRef {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.0.authority, &self.0.proj4, &self.0.wkt) {
            (Some((name, code)), _, _) => write!(f, "{name}:{code}"),
            (None, Some(proj4), _) => write!(f, "{proj4}"),
            (None, None, Some(wkt)) => write!(f, "{wkt}"),
            (None, None, None) => write!(f, "<unspecified SRS>"),
        }
    }
}

fn proj4_epsg(definition: &str) -> Option<u32> {
    if let Some(rest) = definition.split("+init=epsg:").nth(1) {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        return digits.parse().ok();
    }
    if definition.contains("+proj=longlat") && definition.contains("+datum=WGS84") {
        return Some(EPSG_WGS84);
    }
    if definition.contains("+proj=merc")
        && definition.contains("+a=6378137")
        && definition.contains("+b=6378137")
    {
        return Some(EPSG_WEB_MERCATOR);
    }
    None
}

fn wkt_epsg(wkt: &str) -> Option<u32> {
    // Only the outermost authority node identifies the full CRS; nested ones
    // name datums and units. Take the last AUTHORITY in the text, which for
    // well-formed single-line WKT is the outer node's.
    let idx = wkt.rfind("AUTHORITY[\"EPSG\",\"")?;
    let rest = &wkt[idx + "AUTHORITY[\"EPSG\",\"".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_round_trip() {
        let srs = SpatialRef::from_epsg(4326).unwrap();
        assert_eq!(srs.auth_name(), Some("EPSG"));
        assert_eq!(srs.auth_code(), Some(4326));
        assert_eq!(srs.authority().as_deref(), Some("EPSG:4326"));
        assert!(srs.is_geographic());
        assert!(srs.to_wkt().unwrap().starts_with("GEOGCS"));
    }

    #[test]
    fn test_equivalent_definitions_compare_same() {
        let by_code = SpatialRef::from_epsg(4326).unwrap();
        let by_wkt = SpatialRef::from_wkt(&by_code.to_wkt().unwrap()).unwrap();
        let by_proj4 = SpatialRef::from_proj4("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        let by_def = SpatialRef::from_definition("EPSG:4326").unwrap();
        assert!(by_code.is_same(&by_wkt));
        assert!(by_code.is_same(&by_proj4));
        assert_eq!(by_code, by_def);

        let mercator = SpatialRef::from_epsg(3857).unwrap();
        assert!(!mercator.is_same(&by_code));
        assert!(!mercator.is_geographic());
    }

    #[test]
    fn test_retain_count() {
        let srs = SpatialRef::from_epsg(4326).unwrap();
        assert_eq!(srs.retain_count(), 1);
        let retained = srs.clone();
        assert_eq!(srs.retain_count(), 2);
        drop(retained);
        assert_eq!(srs.retain_count(), 1);
    }

    #[test]
    fn test_unknown_code_is_opaque() {
        let srs = SpatialRef::from_epsg(27700).unwrap();
        assert_eq!(srs.authority().as_deref(), Some("EPSG:27700"));
        assert!(srs.to_proj4().is_err());
    }

    #[test]
    fn test_bad_definitions() {
        assert!(SpatialRef::from_epsg(0).is_err());
        assert!(SpatialRef::from_proj4("not a projection").is_err());
        assert!(SpatialRef::from_wkt("BANANA[]").is_err());
        assert!(SpatialRef::from_definition("EPSG:abc").is_err());
    }
}
