//! Well-known-text codec for the planar engine.
//!
//! The writer follows the classic formatting of the external tag space:
//! a space between the tag and the body (`POLYGON ((0 0,1 1,...))`), commas
//! without spaces between coordinates, and 2.5D coordinates written without a
//! dimension marker unless the ISO form is requested (`POINT Z (1 2 3)`).
//! `LINEARRING` is accepted on input and produced for linear rings on the
//! non-ISO path; the ISO form has no ring tag and falls back to `LINESTRING`.

use crate::engine::repr::{Coord3, GeomData, GeomRepr};

pub fn parse(input: &str) -> Result<GeomRepr, String> {
    let mut p = Parser::new(input);
    let repr = p.geometry()?;
    p.skip_ws();
    if !p.at_end() {
        return Err(format!("trailing input at offset {}", p.pos));
    }
    Ok(repr)
}

pub fn write(repr: &GeomRepr, iso: bool) -> String {
    let mut out = String::new();
    write_geometry(repr, iso, &mut out);
    out
}

fn fmt_f64(v: f64) -> String {
    // Shortest round-trip form; integral values print without a fraction,
    // matching the classic WKT emitters.
    format!("{}", v)
}

fn write_coord(c: &Coord3, dim3: bool, out: &mut String) {
    out.push_str(&fmt_f64(c.x));
    out.push(' ');
    out.push_str(&fmt_f64(c.y));
    if dim3 {
        out.push(' ');
        out.push_str(&fmt_f64(c.z));
    }
}

fn write_seq(coords: &[Coord3], dim3: bool, out: &mut String) {
    out.push('(');
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_coord(c, dim3, out);
    }
    out.push(')');
}

fn write_rings(rings: &[Vec<Coord3>], dim3: bool, out: &mut String) {
    out.push('(');
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_seq(ring, dim3, out);
    }
    out.push(')');
}

fn write_tag(base: &str, dim3: bool, iso: bool, empty: bool, out: &mut String) -> bool {
    out.push_str(base);
    if iso && dim3 {
        out.push_str(" Z");
    }
    if empty {
        out.push_str(" EMPTY");
        return true;
    }
    out.push(' ');
    false
}

fn write_geometry(repr: &GeomRepr, iso: bool, out: &mut String) {
    let dim3 = repr.coordinate_dimension() == 3;
    match &repr.data {
        GeomData::Point(c) => {
            let Some(c) = c else {
                write_tag("POINT", repr.dim3, iso, true, out);
                return;
            };
            write_tag("POINT", repr.dim3, iso, false, out);
            out.push('(');
            write_coord(c, dim3, out);
            out.push(')');
        }
        GeomData::Line { coords, ring } => {
            let tag = if *ring && !iso { "LINEARRING" } else { "LINESTRING" };
            if write_tag(tag, dim3, iso, coords.is_empty(), out) {
                return;
            }
            write_seq(coords, dim3, out);
        }
        GeomData::Polygon(rings) => {
            if write_tag("POLYGON", dim3, iso, rings.is_empty(), out) {
                return;
            }
            write_rings(rings, dim3, out);
        }
        GeomData::MultiPoint(ps) => {
            if write_tag("MULTIPOINT", dim3, iso, ps.is_empty(), out) {
                return;
            }
            write_seq(ps, dim3, out);
        }
        GeomData::MultiLine(ls) => {
            if write_tag("MULTILINESTRING", dim3, iso, ls.is_empty(), out) {
                return;
            }
            write_rings(ls, dim3, out);
        }
        GeomData::MultiPolygon(ps) => {
            if write_tag("MULTIPOLYGON", dim3, iso, ps.is_empty(), out) {
                return;
            }
            out.push('(');
            for (i, rings) in ps.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_rings(rings, dim3, out);
            }
            out.push(')');
        }
        GeomData::Collection(ms) => {
            if write_tag("GEOMETRYCOLLECTION", dim3, iso, ms.is_empty(), out) {
                return;
            }
            out.push('(');
            for (i, m) in ms.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_geometry(m, iso, out);
            }
            out.push(')');
        }
        GeomData::None => out.push_str("GEOMETRYCOLLECTION EMPTY"),
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), String> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            other => Err(format!(
                "expected '{}' at offset {}, found {:?}",
                byte as char,
                self.pos,
                other.map(|b| b as char)
            )),
        }
    }

    fn word(&mut self) -> Option<String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_alphabetic() {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        Some(
            std::str::from_utf8(&self.input[start..self.pos])
                .expect("ascii alphabetic slice")
                .to_ascii_uppercase(),
        )
    }

    fn number(&mut self) -> Result<f64, String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.input.len()
            && matches!(self.input[self.pos], b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(format!("expected a number at offset {}", self.pos));
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .expect("ascii numeric slice")
            .parse::<f64>()
            .map_err(|e| format!("bad number at offset {start}: {e}"))
    }

    /// One coordinate tuple: 2 to 4 numbers depending on the dimension
    /// markers. Measure values are parsed and dropped.
    fn coord(&mut self, has_z: bool, has_m: bool, saw_z: &mut bool) -> Result<Coord3, String> {
        let x = self.number()?;
        let y = self.number()?;
        let mut extra = Vec::new();
        while matches!(self.peek(), Some(b) if matches!(b, b'0'..=b'9' | b'-' | b'+' | b'.')) {
            extra.push(self.number()?);
            if extra.len() == 2 {
                break;
            }
        }
        let z = match (has_z, has_m, extra.len()) {
            (_, _, 0) => None,
            (false, true, 1) => None,     // x y m
            (_, _, 1) => Some(extra[0]),  // x y z
            (_, _, _) => Some(extra[0]),  // x y z m
        };
        if z.is_some() {
            *saw_z = true;
        }
        Ok(Coord3::new(x, y, z.unwrap_or(0.0)))
    }

    fn seq(&mut self, has_z: bool, has_m: bool, saw_z: &mut bool) -> Result<Vec<Coord3>, String> {
        self.expect(b'(')?;
        let mut coords = vec![self.coord(has_z, has_m, saw_z)?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            coords.push(self.coord(has_z, has_m, saw_z)?);
        }
        self.expect(b')')?;
        Ok(coords)
    }

    fn rings(
        &mut self,
        has_z: bool,
        has_m: bool,
        saw_z: &mut bool,
    ) -> Result<Vec<Vec<Coord3>>, String> {
        self.expect(b'(')?;
        let mut rings = vec![self.seq(has_z, has_m, saw_z)?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            rings.push(self.seq(has_z, has_m, saw_z)?);
        }
        self.expect(b')')?;
        Ok(rings)
    }

    fn geometry(&mut self) -> Result<GeomRepr, String> {
        let tag = self
            .word()
            .ok_or_else(|| format!("expected a geometry tag at offset {}", self.pos))?;

        let mut has_z = false;
        let mut has_m = false;
        loop {
            let mark = self.pos;
            match self.word().as_deref() {
                Some("Z") => has_z = true,
                Some("ZM") => {
                    has_z = true;
                    has_m = true;
                }
                Some("M") => has_m = true,
                Some("EMPTY") => return empty_repr(&tag, has_z),
                _ => {
                    self.pos = mark;
                    break;
                }
            }
        }

        let mut saw_z = has_z;
        let saw = &mut saw_z;
        let data = match tag.as_str() {
            "POINT" => {
                self.expect(b'(')?;
                let c = self.coord(has_z, has_m, saw)?;
                self.expect(b')')?;
                GeomData::Point(Some(c))
            }
            "LINESTRING" | "LINEARRING" => GeomData::Line {
                coords: self.seq(has_z, has_m, saw)?,
                ring: tag == "LINEARRING",
            },
            "POLYGON" => GeomData::Polygon(self.rings(has_z, has_m, saw)?),
            "MULTIPOINT" => {
                // Accept both `MULTIPOINT (0 1,2 3)` and `MULTIPOINT ((0 1),(2 3))`.
                self.expect(b'(')?;
                let mut points = vec![self.multipoint_member(has_z, has_m, saw)?];
                while self.peek() == Some(b',') {
                    self.pos += 1;
                    points.push(self.multipoint_member(has_z, has_m, saw)?);
                }
                self.expect(b')')?;
                GeomData::MultiPoint(points)
            }
            "MULTILINESTRING" => GeomData::MultiLine(self.rings(has_z, has_m, saw)?),
            "MULTIPOLYGON" => {
                self.expect(b'(')?;
                let mut polys = vec![self.rings(has_z, has_m, saw)?];
                while self.peek() == Some(b',') {
                    self.pos += 1;
                    polys.push(self.rings(has_z, has_m, saw)?);
                }
                self.expect(b')')?;
                GeomData::MultiPolygon(polys)
            }
            "GEOMETRYCOLLECTION" => {
                self.expect(b'(')?;
                let mut members = vec![self.geometry()?];
                while self.peek() == Some(b',') {
                    self.pos += 1;
                    members.push(self.geometry()?);
                }
                self.expect(b')')?;
                return Ok(GeomRepr::new(GeomData::Collection(members), false));
            }
            other => return Err(format!("unrecognized geometry tag '{other}'")),
        };
        Ok(GeomRepr::new(data, saw_z))
    }

    fn multipoint_member(
        &mut self,
        has_z: bool,
        has_m: bool,
        saw_z: &mut bool,
    ) -> Result<Coord3, String> {
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let c = self.coord(has_z, has_m, saw_z)?;
            self.expect(b')')?;
            Ok(c)
        } else {
            self.coord(has_z, has_m, saw_z)
        }
    }
}

fn empty_repr(tag: &str, has_z: bool) -> Result<GeomRepr, String> {
    let data = match tag {
        "POINT" => GeomData::Point(None),
        "LINESTRING" => GeomData::Line {
            coords: Vec::new(),
            ring: false,
        },
        "LINEARRING" => GeomData::Line {
            coords: Vec::new(),
            ring: true,
        },
        "POLYGON" => GeomData::Polygon(Vec::new()),
        "MULTIPOINT" => GeomData::MultiPoint(Vec::new()),
        "MULTILINESTRING" => GeomData::MultiLine(Vec::new()),
        "MULTIPOLYGON" => GeomData::MultiPolygon(Vec::new()),
        "GEOMETRYCOLLECTION" => GeomData::Collection(Vec::new()),
        other => return Err(format!("unrecognized geometry tag '{other}'")),
    };
    Ok(GeomRepr::new(data, has_z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::GeometryKind;

    #[test]
    fn test_point_round_trip() {
        let repr = parse("POINT (1 2)").unwrap();
        assert_eq!(repr.kind(), GeometryKind::Point);
        assert_eq!(write(&repr, false), "POINT (1 2)");
    }

    #[test]
    fn test_point_25d() {
        let repr = parse("POINT (1 2 3)").unwrap();
        assert_eq!(repr.kind(), GeometryKind::Point25D);
        assert_eq!(write(&repr, false), "POINT (1 2 3)");
        assert_eq!(write(&repr, true), "POINT Z (1 2 3)");

        let iso = parse("POINT Z (1 2 3)").unwrap();
        assert!(repr.same_structure(&iso));
    }

    #[test]
    fn test_polygon_format() {
        let repr = parse("POLYGON((0 0,0 1,1 1,0 0))").unwrap();
        assert_eq!(write(&repr, false), "POLYGON ((0 0,0 1,1 1,0 0))");
    }

    #[test]
    fn test_linearring_tag() {
        let repr = parse("LINEARRING (0 0,0 1,1 1,0 0)").unwrap();
        assert_eq!(repr.kind(), GeometryKind::LineString);
        assert!(write(&repr, false).starts_with("LINEARRING"));
        assert!(write(&repr, true).starts_with("LINESTRING"));
    }

    #[test]
    fn test_multi_geometries() {
        let wkt = "MULTIPOLYGON (((0 0,0 1,1 1,0 0)),((0 0,1 1,1 0,0 0)))";
        let repr = parse(wkt).unwrap();
        assert_eq!(repr.kind(), GeometryKind::MultiPolygon);
        assert_eq!(repr.child_count(), 2);
        assert_eq!(write(&repr, false), wkt);

        let mp = parse("MULTIPOINT ((0 1),(2 3))").unwrap();
        assert_eq!(write(&mp, false), "MULTIPOINT (0 1,2 3)");
    }

    #[test]
    fn test_collection() {
        let wkt = "GEOMETRYCOLLECTION (POINT (1 2),LINESTRING (0 0,1 1))";
        let repr = parse(wkt).unwrap();
        assert_eq!(repr.kind(), GeometryKind::GeometryCollection);
        assert_eq!(write(&repr, false), wkt);
    }

    #[test]
    fn test_empty_forms() {
        for wkt in ["POINT EMPTY", "POLYGON EMPTY", "GEOMETRYCOLLECTION EMPTY"] {
            let repr = parse(wkt).unwrap();
            assert!(repr.is_empty());
            assert_eq!(write(&repr, false), wkt);
        }
    }

    #[test]
    fn test_measure_values_dropped() {
        let repr = parse("POINT M (1 2 5)").unwrap();
        assert_eq!(repr.kind(), GeometryKind::Point);
        assert_eq!(repr.get_point(0), Some((1.0, 2.0, 0.0)));

        let zm = parse("POINT ZM (1 2 3 5)").unwrap();
        assert_eq!(zm.kind(), GeometryKind::Point25D);
        assert_eq!(zm.get_point(0), Some((1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_parse_failures() {
        assert!(parse("POINT (1)").is_err());
        assert!(parse("TRIANGLE (0 0,1 1)").is_err());
        assert!(parse("POINT (1 2) extra").is_err());
        assert!(parse("POLYGON ((0 0,1 1)").is_err());
    }
}
