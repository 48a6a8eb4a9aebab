//! GML reader and GML/KML writers for the planar engine.
//!
//! The reader is deliberately tolerant: it accepts both GML 2 geometry
//! markup (`gml:coordinates`, `outerBoundaryIs`) and the GML 3 forms
//! (`gml:pos`/`gml:posList` with `srsDimension`, `exterior`, `MultiCurve`,
//! `MultiSurface`). The writer produces GML 2 by default and GML 3 on
//! request; KML output always uses the comma-tuple coordinate encoding.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::engine::repr::{Coord3, GeomData, GeomRepr};
use crate::engine::{GmlOptions, GmlVersion};

pub fn parse(input: &str) -> Result<GeomRepr, String> {
    let root = read_tree(input)?;
    node_to_repr(&root)
}

// ---------------------------------------------------------------------------
// Reading

/// A geometry subtree. Namespace prefixes are stripped; only the
/// `srsDimension` attribute is kept, for `posList` chunking.
struct Node {
    name: String,
    srs_dimension: Option<usize>,
    text: String,
    children: Vec<Node>,
}

fn read_tree(input: &str) -> Result<Node, String> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;
    loop {
        match reader.read_event().map_err(|e| format!("{e}"))? {
            Event::Start(start) => {
                let mut node = Node {
                    name: local_name(start.name().as_ref()),
                    srs_dimension: None,
                    text: String::new(),
                    children: Vec::new(),
                };
                for attr in start.attributes().flatten() {
                    if local_name(attr.key.as_ref()) == "srsDimension" {
                        let raw = String::from_utf8_lossy(&attr.value).into_owned();
                        node.srs_dimension = raw.trim().parse().ok();
                    }
                }
                stack.push(node);
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let piece = text.unescape().map_err(|e| format!("{e}"))?;
                    if !top.text.is_empty() {
                        top.text.push(' ');
                    }
                    top.text.push_str(piece.trim());
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| "unbalanced end tag".to_string())?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None if root.is_none() => root = Some(node),
                    None => return Err("multiple root elements".to_string()),
                }
            }
            Event::Empty(_) => {}
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err("unterminated element".to_string());
    }
    root.ok_or_else(|| "no geometry element found".to_string())
}

fn local_name(qname: &[u8]) -> String {
    let name = String::from_utf8_lossy(qname);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn first_of(&self, names: &[&str]) -> Option<&Node> {
        self.children.iter().find(|c| names.contains(&c.name.as_str()))
    }
}

/// One coordinate sequence from a geometry element: `coordinates` tuples,
/// a single `pos`, or a flat `posList` chunked by `srsDimension`.
fn coord_seq(node: &Node) -> Result<(Vec<Coord3>, bool), String> {
    if let Some(coords) = node.child("coordinates") {
        let mut out = Vec::new();
        let mut dim3 = false;
        for tuple in coords.text.split_whitespace() {
            let parts: Vec<&str> = tuple.split(',').collect();
            out.push(parse_tuple(&parts, &mut dim3)?);
        }
        return Ok((out, dim3));
    }
    if let Some(pos) = node.child("pos") {
        let parts: Vec<&str> = pos.text.split_whitespace().collect();
        let mut dim3 = false;
        let c = parse_tuple(&parts, &mut dim3)?;
        return Ok((vec![c], dim3));
    }
    if let Some(list) = node.child("posList") {
        let dim = list.srs_dimension.or(node.srs_dimension).unwrap_or(2);
        if !(2..=3).contains(&dim) {
            return Err(format!("unsupported srsDimension {dim}"));
        }
        let values: Vec<f64> = list
            .text
            .split_whitespace()
            .map(|v| v.parse().map_err(|e| format!("bad ordinate '{v}': {e}")))
            .collect::<Result<_, _>>()?;
        if values.len() % dim != 0 {
            return Err(format!(
                "posList length {} is not a multiple of dimension {dim}",
                values.len()
            ));
        }
        let coords = values
            .chunks(dim)
            .map(|c| Coord3::new(c[0], c[1], if dim == 3 { c[2] } else { 0.0 }))
            .collect();
        return Ok((coords, dim == 3));
    }
    Err(format!("element '{}' has no coordinate content", node.name))
}

fn parse_tuple(parts: &[&str], dim3: &mut bool) -> Result<Coord3, String> {
    let ord = |s: &str| -> Result<f64, String> {
        s.trim()
            .parse()
            .map_err(|e| format!("bad ordinate '{s}': {e}"))
    };
    match parts {
        [x, y] => Ok(Coord3::new(ord(x)?, ord(y)?, 0.0)),
        [x, y, z] => {
            *dim3 = true;
            Ok(Coord3::new(ord(x)?, ord(y)?, ord(z)?))
        }
        _ => Err(format!("coordinate tuple has {} ordinates", parts.len())),
    }
}

fn ring_coords(boundary: &Node) -> Result<(Vec<Coord3>, bool), String> {
    let ring = boundary
        .child("LinearRing")
        .ok_or_else(|| format!("'{}' holds no LinearRing", boundary.name))?;
    coord_seq(ring)
}

fn polygon_rings(node: &Node) -> Result<(Vec<Vec<Coord3>>, bool), String> {
    let mut rings = Vec::new();
    let mut dim3 = false;
    let outer = node
        .first_of(&["outerBoundaryIs", "exterior"])
        .ok_or_else(|| "polygon has no exterior boundary".to_string())?;
    let (coords, z) = ring_coords(outer)?;
    dim3 |= z;
    rings.push(coords);
    for inner in node
        .children
        .iter()
        .filter(|c| c.name == "innerBoundaryIs" || c.name == "interior")
    {
        let (coords, z) = ring_coords(inner)?;
        dim3 |= z;
        rings.push(coords);
    }
    Ok((rings, dim3))
}

/// Unwraps `*Member` elements and collects the member geometries of a
/// multi-geometry container.
fn members(node: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    for child in &node.children {
        if child.name.ends_with("Member") || child.name.ends_with("Members") {
            out.extend(child.children.iter());
        }
    }
    out
}

fn node_to_repr(node: &Node) -> Result<GeomRepr, String> {
    match node.name.as_str() {
        "Point" => {
            let (coords, dim3) = coord_seq(node)?;
            Ok(GeomRepr::new(
                GeomData::Point(coords.first().copied()),
                dim3,
            ))
        }
        "LineString" | "LinearRing" => {
            let (coords, dim3) = coord_seq(node)?;
            Ok(GeomRepr::new(
                GeomData::Line {
                    coords,
                    ring: node.name == "LinearRing",
                },
                dim3,
            ))
        }
        "Polygon" => {
            let (rings, dim3) = polygon_rings(node)?;
            Ok(GeomRepr::new(GeomData::Polygon(rings), dim3))
        }
        "MultiPoint" => {
            let mut points = Vec::new();
            let mut dim3 = false;
            for member in members(node) {
                let (coords, z) = coord_seq(member)?;
                dim3 |= z;
                points.extend(coords);
            }
            Ok(GeomRepr::new(GeomData::MultiPoint(points), dim3))
        }
        "MultiLineString" | "MultiCurve" => {
            let mut lines = Vec::new();
            let mut dim3 = false;
            for member in members(node) {
                let (coords, z) = coord_seq(member)?;
                dim3 |= z;
                lines.push(coords);
            }
            Ok(GeomRepr::new(GeomData::MultiLine(lines), dim3))
        }
        "MultiPolygon" | "MultiSurface" => {
            let mut polys = Vec::new();
            let mut dim3 = false;
            for member in members(node) {
                let (rings, z) = polygon_rings(member)?;
                dim3 |= z;
                polys.push(rings);
            }
            Ok(GeomRepr::new(GeomData::MultiPolygon(polys), dim3))
        }
        "MultiGeometry" => {
            let members = members(node)
                .into_iter()
                .map(node_to_repr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GeomRepr::new(GeomData::Collection(members), false))
        }
        other => Err(format!("unrecognized geometry element '{other}'")),
    }
}

// ---------------------------------------------------------------------------
// Writing

pub fn write_gml(repr: &GeomRepr, options: &GmlOptions) -> Result<String, String> {
    let mut out = String::new();
    let id = options.gml_id.as_deref();
    match options.version {
        GmlVersion::Gml2 => write_gml2(repr, &mut out)?,
        GmlVersion::Gml3 => write_gml3(repr, id, &mut out)?,
    }
    Ok(out)
}

fn fmt_f64(v: f64) -> String {
    format!("{}", v)
}

fn tuple(c: &Coord3, dim3: bool) -> String {
    if dim3 {
        format!("{},{},{}", fmt_f64(c.x), fmt_f64(c.y), fmt_f64(c.z))
    } else {
        format!("{},{}", fmt_f64(c.x), fmt_f64(c.y))
    }
}

fn coordinates_tag(coords: &[Coord3], dim3: bool, out: &mut String) {
    out.push_str("<gml:coordinates>");
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&tuple(c, dim3));
    }
    out.push_str("</gml:coordinates>");
}

fn write_gml2(repr: &GeomRepr, out: &mut String) -> Result<(), String> {
    let dim3 = repr.dim3;
    match &repr.data {
        GeomData::Point(Some(c)) => {
            out.push_str("<gml:Point>");
            coordinates_tag(std::slice::from_ref(c), dim3, out);
            out.push_str("</gml:Point>");
        }
        GeomData::Line { coords, ring } => {
            let tag = if *ring { "LinearRing" } else { "LineString" };
            out.push_str(&format!("<gml:{tag}>"));
            coordinates_tag(coords, dim3, out);
            out.push_str(&format!("</gml:{tag}>"));
        }
        GeomData::Polygon(rings) => {
            out.push_str("<gml:Polygon>");
            for (i, ring) in rings.iter().enumerate() {
                let boundary = if i == 0 {
                    "outerBoundaryIs"
                } else {
                    "innerBoundaryIs"
                };
                out.push_str(&format!("<gml:{boundary}><gml:LinearRing>"));
                coordinates_tag(ring, dim3, out);
                out.push_str(&format!("</gml:LinearRing></gml:{boundary}>"));
            }
            out.push_str("</gml:Polygon>");
        }
        GeomData::MultiPoint(ps) => {
            out.push_str("<gml:MultiPoint>");
            for c in ps {
                out.push_str("<gml:pointMember><gml:Point>");
                coordinates_tag(std::slice::from_ref(c), dim3, out);
                out.push_str("</gml:Point></gml:pointMember>");
            }
            out.push_str("</gml:MultiPoint>");
        }
        GeomData::MultiLine(ls) => {
            out.push_str("<gml:MultiLineString>");
            for l in ls {
                out.push_str("<gml:lineStringMember><gml:LineString>");
                coordinates_tag(l, dim3, out);
                out.push_str("</gml:LineString></gml:lineStringMember>");
            }
            out.push_str("</gml:MultiLineString>");
        }
        GeomData::MultiPolygon(ps) => {
            out.push_str("<gml:MultiPolygon>");
            for rings in ps {
                out.push_str("<gml:polygonMember>");
                write_gml2(&GeomRepr::new(GeomData::Polygon(rings.clone()), dim3), out)?;
                out.push_str("</gml:polygonMember>");
            }
            out.push_str("</gml:MultiPolygon>");
        }
        GeomData::Collection(ms) => {
            out.push_str("<gml:MultiGeometry>");
            for m in ms {
                out.push_str("<gml:geometryMember>");
                write_gml2(m, out)?;
                out.push_str("</gml:geometryMember>");
            }
            out.push_str("</gml:MultiGeometry>");
        }
        GeomData::Point(None) | GeomData::None => {
            return Err("empty geometry has no GML representation".to_string())
        }
    }
    Ok(())
}

fn pos_list(coords: &[Coord3], dim3: bool, tag: &str, out: &mut String) {
    if dim3 {
        out.push_str(&format!("<gml:{tag} srsDimension=\"3\">"));
    } else {
        out.push_str(&format!("<gml:{tag}>"));
    }
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&fmt_f64(c.x));
        out.push(' ');
        out.push_str(&fmt_f64(c.y));
        if dim3 {
            out.push(' ');
            out.push_str(&fmt_f64(c.z));
        }
    }
    out.push_str(&format!("</gml:{tag}>"));
}

fn open_tag(tag: &str, id: Option<&str>, out: &mut String) {
    match id {
        Some(id) => out.push_str(&format!("<gml:{tag} gml:id=\"{id}\">")),
        None => out.push_str(&format!("<gml:{tag}>")),
    }
}

fn write_gml3(repr: &GeomRepr, id: Option<&str>, out: &mut String) -> Result<(), String> {
    let dim3 = repr.dim3;
    match &repr.data {
        GeomData::Point(Some(c)) => {
            open_tag("Point", id, out);
            pos_list(std::slice::from_ref(c), dim3, "pos", out);
            out.push_str("</gml:Point>");
        }
        GeomData::Line { coords, .. } => {
            open_tag("LineString", id, out);
            pos_list(coords, dim3, "posList", out);
            out.push_str("</gml:LineString>");
        }
        GeomData::Polygon(rings) => {
            open_tag("Polygon", id, out);
            for (i, ring) in rings.iter().enumerate() {
                let boundary = if i == 0 { "exterior" } else { "interior" };
                out.push_str(&format!("<gml:{boundary}><gml:LinearRing>"));
                pos_list(ring, dim3, "posList", out);
                out.push_str(&format!("</gml:LinearRing></gml:{boundary}>"));
            }
            out.push_str("</gml:Polygon>");
        }
        GeomData::MultiPoint(ps) => {
            open_tag("MultiPoint", id, out);
            for c in ps {
                out.push_str("<gml:pointMember><gml:Point>");
                pos_list(std::slice::from_ref(c), dim3, "pos", out);
                out.push_str("</gml:Point></gml:pointMember>");
            }
            out.push_str("</gml:MultiPoint>");
        }
        GeomData::MultiLine(ls) => {
            open_tag("MultiCurve", id, out);
            for l in ls {
                out.push_str("<gml:curveMember><gml:LineString>");
                pos_list(l, dim3, "posList", out);
                out.push_str("</gml:LineString></gml:curveMember>");
            }
            out.push_str("</gml:MultiCurve>");
        }
        GeomData::MultiPolygon(ps) => {
            open_tag("MultiSurface", id, out);
            for rings in ps {
                out.push_str("<gml:surfaceMember>");
                write_gml3(&GeomRepr::new(GeomData::Polygon(rings.clone()), dim3), None, out)?;
                out.push_str("</gml:surfaceMember>");
            }
            out.push_str("</gml:MultiSurface>");
        }
        GeomData::Collection(ms) => {
            open_tag("MultiGeometry", id, out);
            for m in ms {
                out.push_str("<gml:geometryMember>");
                write_gml3(m, None, out)?;
                out.push_str("</gml:geometryMember>");
            }
            out.push_str("</gml:MultiGeometry>");
        }
        GeomData::Point(None) | GeomData::None => {
            return Err("empty geometry has no GML representation".to_string())
        }
    }
    Ok(())
}

pub fn write_kml(repr: &GeomRepr, altitude_mode: Option<&str>) -> Result<String, String> {
    let mut out = String::new();
    kml_geometry(repr, altitude_mode, &mut out)?;
    Ok(out)
}

fn kml_coordinates(coords: &[Coord3], dim3: bool, out: &mut String) {
    out.push_str("<coordinates>");
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&tuple(c, dim3));
    }
    out.push_str("</coordinates>");
}

fn kml_altitude(altitude_mode: Option<&str>, out: &mut String) {
    if let Some(mode) = altitude_mode {
        out.push_str(&format!("<altitudeMode>{mode}</altitudeMode>"));
    }
}

fn kml_geometry(
    repr: &GeomRepr,
    altitude_mode: Option<&str>,
    out: &mut String,
) -> Result<(), String> {
    let dim3 = repr.dim3;
    match &repr.data {
        GeomData::Point(Some(c)) => {
            out.push_str("<Point>");
            kml_altitude(altitude_mode, out);
            kml_coordinates(std::slice::from_ref(c), dim3, out);
            out.push_str("</Point>");
        }
        GeomData::Line { coords, .. } => {
            out.push_str("<LineString>");
            kml_altitude(altitude_mode, out);
            kml_coordinates(coords, dim3, out);
            out.push_str("</LineString>");
        }
        GeomData::Polygon(rings) => {
            out.push_str("<Polygon>");
            kml_altitude(altitude_mode, out);
            for (i, ring) in rings.iter().enumerate() {
                let boundary = if i == 0 {
                    "outerBoundaryIs"
                } else {
                    "innerBoundaryIs"
                };
                out.push_str(&format!("<{boundary}><LinearRing>"));
                kml_coordinates(ring, dim3, out);
                out.push_str(&format!("</LinearRing></{boundary}>"));
            }
            out.push_str("</Polygon>");
        }
        GeomData::MultiPoint(_)
        | GeomData::MultiLine(_)
        | GeomData::MultiPolygon(_)
        | GeomData::Collection(_) => {
            out.push_str("<MultiGeometry>");
            for i in 0..repr.child_count() {
                let child = repr.child(i).ok_or_else(|| "missing member".to_string())?;
                kml_geometry(&child, altitude_mode, out)?;
            }
            out.push_str("</MultiGeometry>");
        }
        GeomData::Point(None) | GeomData::None => {
            return Err("empty geometry has no KML representation".to_string())
        }
    }
    Ok(())
}
