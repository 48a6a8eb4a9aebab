//! Well-known-binary codec for the planar engine.
//!
//! Both byte orders are produced and consumed. 2.5D geometries carry the
//! high-bit flag on the type code rather than the ISO `1000`-range codes.
//! Linear rings have no wire-level code and are written as line strings.
//! Container members are encoded as complete nested records, each with its
//! own byte-order marker.

use crate::engine::repr::{Coord3, GeomData, GeomRepr};
use crate::engine::WkbByteOrder;
use crate::vector::kind::WKB_25D_BIT;

const HEADER: usize = 1 + 4;
const COORD: usize = 8;

/// The exact number of bytes [`write`] produces for `repr`, computed without
/// encoding. An empty point is written as a NaN coordinate pair.
pub fn size(repr: &GeomRepr) -> usize {
    let dim = if repr.dim3 { 3 } else { 2 };
    let seq = |coords: &[Coord3]| 4 + coords.len() * dim * COORD;
    match &repr.data {
        GeomData::Point(_) | GeomData::None => HEADER + dim * COORD,
        GeomData::Line { coords, .. } => HEADER + seq(coords),
        GeomData::Polygon(rings) => HEADER + 4 + rings.iter().map(|r| seq(r)).sum::<usize>(),
        GeomData::MultiPoint(ps) => HEADER + 4 + ps.len() * (HEADER + dim * COORD),
        GeomData::MultiLine(ls) => {
            HEADER + 4 + ls.iter().map(|l| HEADER + seq(l)).sum::<usize>()
        }
        GeomData::MultiPolygon(ps) => {
            HEADER
                + 4
                + ps.iter()
                    .map(|rings| HEADER + 4 + rings.iter().map(|r| seq(r)).sum::<usize>())
                    .sum::<usize>()
        }
        GeomData::Collection(ms) => HEADER + 4 + ms.iter().map(size).sum::<usize>(),
    }
}

pub fn write(repr: &GeomRepr, order: WkbByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(size(repr));
    encode(repr, order, &mut out);
    out
}

pub fn parse(bytes: &[u8]) -> Result<GeomRepr, String> {
    let mut r = Reader { bytes, pos: 0 };
    let repr = decode(&mut r)?;
    if r.pos != bytes.len() {
        return Err(format!("{} trailing bytes after geometry", bytes.len() - r.pos));
    }
    Ok(repr)
}

struct Writer<'a> {
    order: WkbByteOrder,
    out: &'a mut Vec<u8>,
}

impl Writer<'_> {
    fn u32(&mut self, v: u32) {
        match self.order {
            WkbByteOrder::Xdr => self.out.extend_from_slice(&v.to_be_bytes()),
            WkbByteOrder::Ndr => self.out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    fn f64(&mut self, v: f64) {
        match self.order {
            WkbByteOrder::Xdr => self.out.extend_from_slice(&v.to_be_bytes()),
            WkbByteOrder::Ndr => self.out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    fn header(&mut self, base_code: u32, dim3: bool) {
        self.out.push(match self.order {
            WkbByteOrder::Xdr => 0,
            WkbByteOrder::Ndr => 1,
        });
        let code = if dim3 {
            base_code | WKB_25D_BIT
        } else {
            base_code
        };
        self.u32(code);
    }

    fn coord(&mut self, c: &Coord3, dim3: bool) {
        self.f64(c.x);
        self.f64(c.y);
        if dim3 {
            self.f64(c.z);
        }
    }

    fn seq(&mut self, coords: &[Coord3], dim3: bool) {
        self.u32(coords.len() as u32);
        for c in coords {
            self.coord(c, dim3);
        }
    }
}

fn encode(repr: &GeomRepr, order: WkbByteOrder, out: &mut Vec<u8>) {
    let dim3 = repr.dim3;
    let mut w = Writer { order, out };
    match &repr.data {
        GeomData::Point(None) | GeomData::None => {
            // Empty points are written as NaN coordinates; there is no empty
            // marker in the wire format.
            w.header(1, dim3);
            w.coord(&Coord3::new(f64::NAN, f64::NAN, f64::NAN), dim3);
        }
        GeomData::Point(Some(c)) => {
            w.header(1, dim3);
            w.coord(c, dim3);
        }
        GeomData::Line { coords, .. } => {
            w.header(2, dim3);
            w.seq(coords, dim3);
        }
        GeomData::Polygon(rings) => {
            w.header(3, dim3);
            w.u32(rings.len() as u32);
            for ring in rings {
                w.seq(ring, dim3);
            }
        }
        GeomData::MultiPoint(ps) => {
            w.header(4, dim3);
            w.u32(ps.len() as u32);
            for c in ps {
                w.header(1, dim3);
                w.coord(c, dim3);
            }
        }
        GeomData::MultiLine(ls) => {
            w.header(5, dim3);
            w.u32(ls.len() as u32);
            for l in ls {
                w.header(2, dim3);
                w.seq(l, dim3);
            }
        }
        GeomData::MultiPolygon(ps) => {
            w.header(6, dim3);
            w.u32(ps.len() as u32);
            for rings in ps {
                w.header(3, dim3);
                w.u32(rings.len() as u32);
                for ring in rings {
                    w.seq(ring, dim3);
                }
            }
        }
        GeomData::Collection(ms) => {
            w.header(7, dim3);
            w.u32(ms.len() as u32);
            let out = w.out;
            for m in ms {
                encode(m, order, out);
            }
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8], String> {
        let end = self.pos + n;
        if end > self.bytes.len() {
            return Err(format!(
                "truncated geometry: needed {n} bytes at offset {}",
                self.pos
            ));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn order(&mut self) -> Result<WkbByteOrder, String> {
        match self.take(1)?[0] {
            0 => Ok(WkbByteOrder::Xdr),
            1 => Ok(WkbByteOrder::Ndr),
            other => Err(format!("invalid byte-order marker {other}")),
        }
    }

    fn u32(&mut self, order: WkbByteOrder) -> Result<u32, String> {
        let raw: [u8; 4] = self.take(4)?.try_into().expect("slice of length 4");
        Ok(match order {
            WkbByteOrder::Xdr => u32::from_be_bytes(raw),
            WkbByteOrder::Ndr => u32::from_le_bytes(raw),
        })
    }

    fn f64(&mut self, order: WkbByteOrder) -> Result<f64, String> {
        let raw: [u8; 8] = self.take(8)?.try_into().expect("slice of length 8");
        Ok(match order {
            WkbByteOrder::Xdr => f64::from_be_bytes(raw),
            WkbByteOrder::Ndr => f64::from_le_bytes(raw),
        })
    }

    fn coord(&mut self, order: WkbByteOrder, dim3: bool) -> Result<Coord3, String> {
        let x = self.f64(order)?;
        let y = self.f64(order)?;
        let z = if dim3 { self.f64(order)? } else { 0.0 };
        Ok(Coord3::new(x, y, z))
    }

    fn seq(&mut self, order: WkbByteOrder, dim3: bool) -> Result<Vec<Coord3>, String> {
        let count = self.u32(order)? as usize;
        let mut coords = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            coords.push(self.coord(order, dim3)?);
        }
        Ok(coords)
    }

    fn nested(&mut self, expect_code: u32, dim3: bool) -> Result<(), String> {
        let order = self.order()?;
        let code = self.u32(order)?;
        if code & !WKB_25D_BIT != expect_code || (code & WKB_25D_BIT != 0) != dim3 {
            return Err(format!("unexpected member type code {code:#x}"));
        }
        Ok(())
    }
}

fn decode(r: &mut Reader) -> Result<GeomRepr, String> {
    let order = r.order()?;
    let code = r.u32(order)?;
    let dim3 = code & WKB_25D_BIT != 0;
    let data = match code & !WKB_25D_BIT {
        1 => {
            let c = r.coord(order, dim3)?;
            if c.x.is_nan() && c.y.is_nan() {
                GeomData::Point(None)
            } else {
                GeomData::Point(Some(c))
            }
        }
        2 => GeomData::Line {
            coords: r.seq(order, dim3)?,
            ring: false,
        },
        3 => {
            let rings = r.u32(order)? as usize;
            let mut out = Vec::with_capacity(rings.min(4096));
            for _ in 0..rings {
                out.push(r.seq(order, dim3)?);
            }
            GeomData::Polygon(out)
        }
        4 => {
            let count = r.u32(order)? as usize;
            let mut points = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                r.nested(1, dim3)?;
                points.push(r.coord(order, dim3)?);
            }
            GeomData::MultiPoint(points)
        }
        5 => {
            let count = r.u32(order)? as usize;
            let mut lines = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                r.nested(2, dim3)?;
                lines.push(r.seq(order, dim3)?);
            }
            GeomData::MultiLine(lines)
        }
        6 => {
            let count = r.u32(order)? as usize;
            let mut polys = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                r.nested(3, dim3)?;
                let rings = r.u32(order)? as usize;
                let mut poly = Vec::with_capacity(rings.min(4096));
                for _ in 0..rings {
                    poly.push(r.seq(order, dim3)?);
                }
                polys.push(poly);
            }
            GeomData::MultiPolygon(polys)
        }
        7 => {
            let count = r.u32(order)? as usize;
            let mut members = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                members.push(decode(r)?);
            }
            return Ok(GeomRepr::new(GeomData::Collection(members), false));
        }
        other => return Err(format!("unrecognized geometry type code {other:#x}")),
    };
    Ok(GeomRepr::new(data, dim3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::wkt;

    fn round_trip(wkt_in: &str, order: WkbByteOrder) {
        let repr = wkt::parse(wkt_in).unwrap();
        let bytes = write(&repr, order);
        assert_eq!(bytes.len(), size(&repr), "size contract for {wkt_in}");
        let back = parse(&bytes).unwrap();
        assert!(repr.same_structure(&back), "round trip for {wkt_in}");
    }

    #[test]
    fn test_round_trips_both_orders() {
        for wkt_in in [
            "POINT (10 20)",
            "POINT (10 20 30)",
            "LINESTRING (0 0,0 1,1 1)",
            "POLYGON ((0 0,0 1,1 1,0 0),(0.1 0.1,0.1 0.2,0.2 0.2,0.1 0.1))",
            "MULTIPOINT (0 1,2 3)",
            "MULTILINESTRING ((0 0,1 1),(2 2,3 3))",
            "MULTIPOLYGON (((0 0,0 1,1 1,0 0)))",
            "GEOMETRYCOLLECTION (POINT (1 2),LINESTRING (0 0,1 1))",
        ] {
            round_trip(wkt_in, WkbByteOrder::Ndr);
            round_trip(wkt_in, WkbByteOrder::Xdr);
        }
    }

    #[test]
    fn test_known_point_encoding() {
        let repr = wkt::parse("POINT (1 2)").unwrap();
        let bytes = write(&repr, WkbByteOrder::Ndr);
        assert_eq!(bytes.len(), 21);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &[1, 0, 0, 0]);
        assert_eq!(&bytes[5..13], &1.0_f64.to_le_bytes());
    }

    #[test]
    fn test_25d_flag() {
        let repr = wkt::parse("POINT (1 2 3)").unwrap();
        let bytes = write(&repr, WkbByteOrder::Xdr);
        assert_eq!(bytes.len(), 29);
        assert_eq!(&bytes[1..5], &[0x80, 0, 0, 1]);
    }

    #[test]
    fn test_empty_point_is_nan_pair() {
        let repr = wkt::parse("POINT EMPTY").unwrap();
        let bytes = write(&repr, WkbByteOrder::Ndr);
        assert_eq!(bytes.len(), size(&repr));
        let back = parse(&bytes).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse(&[]).is_err());
        assert!(parse(&[2, 1, 0, 0, 0]).is_err());
        let repr = wkt::parse("LINESTRING (0 0,1 1)").unwrap();
        let mut bytes = write(&repr, WkbByteOrder::Ndr);
        bytes.truncate(bytes.len() - 3);
        assert!(parse(&bytes).is_err());
    }
}
