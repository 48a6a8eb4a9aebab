use std::sync::Arc;

use crate::engine::{default_engine, Engine, GeoJsonOptions, GmlOptions, WkbByteOrder};
use crate::errors::{Result, TerraneError};
use crate::spatial_ref::SpatialRef;
use crate::vector::Geometry;

/// # Conversions
///
/// Imports from and exports to the interchange formats: WKT (classic and
/// ISO), WKB, GeoJSON, GML, and KML.
impl Geometry {
    /// Parses a geometry from well-known text on the default engine.
    pub fn from_wkt(wkt: &str) -> Result<Geometry> {
        Geometry::from_wkt_on(default_engine(), wkt)
    }

    /// Parses a geometry from well-known text on `engine`.
    pub fn from_wkt_on(engine: Arc<dyn Engine>, wkt: &str) -> Result<Geometry> {
        let handle = engine.from_wkt(wkt)?;
        Geometry::factory(engine, Some(handle), true)
            .ok_or_else(|| TerraneError::engine("from_wkt", "parsed handle is unusable"))
    }

    /// Parses well-known text and associates `spatial_ref` with the result.
    pub fn from_wkt_with_ref(wkt: &str, spatial_ref: Option<SpatialRef>) -> Result<Geometry> {
        let mut geom = Geometry::from_wkt(wkt)?;
        if let Some(spatial_ref) = spatial_ref {
            geom.set_spatial_ref(spatial_ref);
        }
        Ok(geom)
    }

    /// Parses a geometry from well-known binary on the default engine.
    pub fn from_wkb(bytes: &[u8]) -> Result<Geometry> {
        Geometry::from_wkb_on(default_engine(), bytes)
    }

    /// Parses a geometry from well-known binary on `engine`.
    pub fn from_wkb_on(engine: Arc<dyn Engine>, bytes: &[u8]) -> Result<Geometry> {
        let handle = engine.from_wkb(bytes)?;
        Geometry::factory(engine, Some(handle), true)
            .ok_or_else(|| TerraneError::engine("from_wkb", "parsed handle is unusable"))
    }

    /// Parses well-known binary and associates `spatial_ref` with the result.
    pub fn from_wkb_with_ref(bytes: &[u8], spatial_ref: Option<SpatialRef>) -> Result<Geometry> {
        let mut geom = Geometry::from_wkb(bytes)?;
        if let Some(spatial_ref) = spatial_ref {
            geom.set_spatial_ref(spatial_ref);
        }
        Ok(geom)
    }

    /// Parses a geometry from a GeoJSON `Geometry` or `Feature` document on
    /// the default engine.
    pub fn from_geojson(json: &str) -> Result<Geometry> {
        Geometry::from_geojson_on(default_engine(), json)
    }

    /// Parses a geometry from GeoJSON on `engine`.
    pub fn from_geojson_on(engine: Arc<dyn Engine>, json: &str) -> Result<Geometry> {
        let handle = engine.from_geojson(json)?;
        Geometry::factory(engine, Some(handle), true)
            .ok_or_else(|| TerraneError::engine("from_geojson", "parsed handle is unusable"))
    }

    /// Parses a geometry from a GML fragment on the default engine.
    pub fn from_gml(gml: &str) -> Result<Geometry> {
        Geometry::from_gml_on(default_engine(), gml)
    }

    /// Parses a geometry from a GML fragment on `engine`.
    pub fn from_gml_on(engine: Arc<dyn Engine>, gml: &str) -> Result<Geometry> {
        let handle = engine.from_gml(gml)?;
        Geometry::factory(engine, Some(handle), true)
            .ok_or_else(|| TerraneError::engine("from_gml", "parsed handle is unusable"))
    }

    /// Replaces this geometry's contents with the result of parsing `wkt`.
    /// The kind may change; on a parse failure the contents are preserved.
    pub fn import_from_wkt(&mut self, wkt: &str) -> Result<()> {
        self.engine().import_wkt(self.handle()?, wkt)
    }

    /// Replaces this geometry's contents with the result of parsing `bytes`.
    /// The kind may change; on a parse failure the contents are preserved.
    pub fn import_from_wkb(&mut self, bytes: &[u8]) -> Result<()> {
        self.engine().import_wkb(self.handle()?, bytes)
    }

    /// Serializes the geometry to classic well-known text. 2.5D geometries
    /// carry a third coordinate but no `Z` marker, and rings are tagged
    /// `LINEARRING`.
    pub fn wkt(&self) -> Result<String> {
        self.engine().to_wkt(self.handle()?)
    }

    /// Serializes the geometry to ISO well-known text, with a `Z` marker on
    /// 2.5D geometries. Rings are still tagged `LINEARRING`.
    pub fn iso_wkt(&self) -> Result<String> {
        self.engine().to_iso_wkt(self.handle()?)
    }

    /// Serializes the geometry to little-endian well-known binary.
    pub fn wkb(&self) -> Result<Vec<u8>> {
        // LSB throughout, as most platforms read it natively.
        self.wkb_with_byte_order(WkbByteOrder::Ndr)
    }

    /// Serializes the geometry to well-known binary in the given byte order.
    pub fn wkb_with_byte_order(&self, order: WkbByteOrder) -> Result<Vec<u8>> {
        self.engine().to_wkb(self.handle()?, order)
    }

    /// The exact byte length [`Geometry::wkb`] will produce.
    pub fn wkb_size(&self) -> Result<usize> {
        self.engine().wkb_size(self.handle()?)
    }

    /// Serializes the geometry to a GeoJSON `Geometry` document.
    pub fn json(&self) -> Result<String> {
        self.json_ex(&GeoJsonOptions::default())
    }

    /// [`Geometry::json`] with export options.
    pub fn json_ex(&self, options: &GeoJsonOptions) -> Result<String> {
        self.engine().to_geojson(self.handle()?, options)
    }

    /// Serializes the geometry to a GML 2 fragment.
    pub fn gml(&self) -> Result<String> {
        self.gml_ex(&GmlOptions::default())
    }

    /// [`Geometry::gml`] with export options.
    pub fn gml_ex(&self, options: &GmlOptions) -> Result<String> {
        self.engine().to_gml(self.handle()?, options)
    }

    /// Serializes the geometry to a KML fragment, optionally tagging every
    /// coordinate block with an `<altitudeMode>`.
    pub fn kml(&self, altitude_mode: Option<&str>) -> Result<String> {
        self.engine().to_kml(self.handle()?, altitude_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::GeometryKind;

    #[test]
    fn test_wkt_round_trip() {
        let input = "POLYGON ((0 0,0 10,10 10,10 0,0 0),(2 2,2 4,4 4,4 2,2 2))";
        let geom = Geometry::from_wkt(input).unwrap();
        assert_eq!(geom.wkt().unwrap(), input);
    }

    #[test]
    fn test_wkt_25d_markers() {
        let geom = Geometry::from_wkt("POINT Z (1 2 3)").unwrap();
        assert_eq!(geom.kind(), GeometryKind::Point25D);
        assert_eq!(geom.wkt().unwrap(), "POINT (1 2 3)");
        assert_eq!(geom.iso_wkt().unwrap(), "POINT Z (1 2 3)");
    }

    #[test]
    fn test_wkt_ring_tag() {
        let ring = Geometry::from_wkt("LINEARRING (0 0,0 1,1 1,0 0)").unwrap();
        assert!(matches!(ring, Geometry::LinearRing(_)));
        assert_eq!(ring.wkt().unwrap(), "LINEARRING (0 0,0 1,1 1,0 0)");
    }

    #[test]
    fn test_wkb_round_trip() {
        let geom = Geometry::from_wkt("LINESTRING (0 0,1 1)").unwrap();
        let bytes = geom.wkb().unwrap();
        assert_eq!(bytes.len(), geom.wkb_size().unwrap());
        assert_eq!(bytes[0], 1); // NDR marker

        let back = Geometry::from_wkb(&bytes).unwrap();
        assert_eq!(back, geom);

        let big = geom.wkb_with_byte_order(WkbByteOrder::Xdr).unwrap();
        assert_eq!(big[0], 0);
        assert_eq!(big.len(), bytes.len());
        assert_eq!(Geometry::from_wkb(&big).unwrap(), geom);
    }

    #[test]
    fn test_wkb_rejects_truncation() {
        let bytes = Geometry::from_wkt("POINT (1 2)").unwrap().wkb().unwrap();
        assert!(Geometry::from_wkb(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_geojson_round_trip() {
        let geom = Geometry::from_wkt("POINT (1.25 2.5)").unwrap();
        let json = geom.json().unwrap();
        assert!(json.contains("\"Point\""));
        assert_eq!(Geometry::from_geojson(&json).unwrap(), geom);
    }

    #[test]
    fn test_geojson_precision() {
        let geom = Geometry::from_wkt("POINT (1.23456789 2.0)").unwrap();
        let options = GeoJsonOptions {
            coordinate_precision: Some(3),
        };
        let json = geom.json_ex(&options).unwrap();
        assert!(json.contains("1.235"));
        assert!(!json.contains("1.23456789"));
    }

    #[test]
    fn test_geojson_accepts_features() {
        let doc = r#"{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1.0,2.0]}}"#;
        let geom = Geometry::from_geojson(doc).unwrap();
        assert_eq!(geom.get_point(0).unwrap(), Some((1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_gml_round_trip() {
        let geom = Geometry::from_wkt("LINESTRING (0 0,1 1,2 0)").unwrap();
        let gml = geom.gml().unwrap();
        assert!(gml.starts_with("<gml:LineString>"));
        assert!(gml.contains("<gml:coordinates>"));
        assert_eq!(Geometry::from_gml(&gml).unwrap(), geom);
    }

    #[test]
    fn test_gml3_export() {
        use crate::engine::{GmlOptions, GmlVersion};
        let geom = Geometry::from_wkt("POINT (1 2 3)").unwrap();
        let gml = geom
            .gml_ex(&GmlOptions {
                version: GmlVersion::Gml3,
                gml_id: Some("pt.0".to_string()),
            })
            .unwrap();
        assert!(gml.contains("gml:id=\"pt.0\""));
        assert!(gml.contains("<gml:pos srsDimension=\"3\">1 2 3</gml:pos>"));
    }

    #[test]
    fn test_kml_export() {
        let geom = Geometry::from_wkt("POINT (1 2)").unwrap();
        let kml = geom.kml(None).unwrap();
        assert_eq!(kml, "<Point><coordinates>1,2</coordinates></Point>");

        let tagged = geom.kml(Some("absolute")).unwrap();
        assert!(tagged.contains("<altitudeMode>absolute</altitudeMode>"));
    }

    #[test]
    fn test_import_replaces_contents() {
        let mut geom = Geometry::from_wkt("POINT (1 2)").unwrap();
        geom.import_from_wkt("LINESTRING (0 0,1 1)").unwrap();
        assert_eq!(geom.kind(), GeometryKind::LineString);
        assert_eq!(geom.point_count(), 2);

        // A failed import leaves the previous contents alone.
        assert!(geom.import_from_wkt("LINESTRING ((").is_err());
        assert_eq!(geom.point_count(), 2);
    }

    #[test]
    fn test_with_ref_constructors() {
        let srs = SpatialRef::from_epsg(4326).unwrap();
        let geom = Geometry::from_wkt_with_ref("POINT (1 2)", Some(srs.clone())).unwrap();
        assert!(geom.spatial_ref().unwrap().is_same(&srs));

        let bytes = geom.wkb().unwrap();
        let geom = Geometry::from_wkb_with_ref(&bytes, None).unwrap();
        assert!(geom.spatial_ref().is_none());
    }
}
