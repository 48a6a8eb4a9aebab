//! Geometry algorithms backing [`PlanarEngine`], built on the `geo` crate.
//!
//! Everything here works on the 2D projection of a representation; Z values
//! do not participate in predicates or derived geometries. Operations that
//! cannot produce a result for the given operand kinds return `Ok(None)`
//! rather than failing, matching the null-result convention of the wrapper
//! layer.
//!
//! [`PlanarEngine`]: crate::engine::PlanarEngine

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{
    Area, BooleanOps, Centroid, Contains, ConvexHull, InteriorPoint, Intersects, Relate,
    Simplify, SimplifyVwPreserve, Validation,
};
use geo_types::{Coord, Geometry, Line, LineString, MultiPoint, MultiPolygon, Point, Polygon};

use crate::engine::repr::{Coord3, GeomData, GeomRepr};

// ---------------------------------------------------------------------------
// Predicates

pub fn intersects(a: &GeomRepr, b: &GeomRepr) -> Result<bool, String> {
    if a.is_empty() || b.is_empty() {
        return Ok(false);
    }
    let (ga, gb) = geo_pair(a, b)?;
    Ok(ga.intersects(&gb))
}

pub fn disjoint(a: &GeomRepr, b: &GeomRepr) -> Result<bool, String> {
    if a.is_empty() || b.is_empty() {
        return Ok(true);
    }
    intersects(a, b).map(|v| !v)
}

pub fn contains(a: &GeomRepr, b: &GeomRepr) -> Result<bool, String> {
    if a.is_empty() || b.is_empty() {
        return Ok(false);
    }
    let (ga, gb) = geo_pair(a, b)?;
    Ok(ga.contains(&gb))
}

pub fn within(a: &GeomRepr, b: &GeomRepr) -> Result<bool, String> {
    contains(b, a)
}

pub fn touches(a: &GeomRepr, b: &GeomRepr) -> Result<bool, String> {
    relate_pair(a, b, "touches").map(|m| m.map(|m| m.is_touches()).unwrap_or(false))
}

pub fn crosses(a: &GeomRepr, b: &GeomRepr) -> Result<bool, String> {
    relate_pair(a, b, "crosses").map(|m| m.map(|m| m.is_crosses()).unwrap_or(false))
}

pub fn overlaps(a: &GeomRepr, b: &GeomRepr) -> Result<bool, String> {
    relate_pair(a, b, "overlaps").map(|m| m.map(|m| m.is_overlaps()).unwrap_or(false))
}

fn geo_pair(a: &GeomRepr, b: &GeomRepr) -> Result<(Geometry<f64>, Geometry<f64>), String> {
    match (a.to_geo(), b.to_geo()) {
        (Some(ga), Some(gb)) => Ok((ga, gb)),
        _ => Err("operand has no planar representation".to_string()),
    }
}

/// DE-9IM matrix for non-empty, non-collection operands. Empty operands
/// yield `None`; collections are rejected, as the relate machinery does not
/// model them.
fn relate_pair(
    a: &GeomRepr,
    b: &GeomRepr,
    method: &str,
) -> Result<Option<geo::algorithm::relate::IntersectionMatrix>, String> {
    if a.is_empty() || b.is_empty() {
        return Ok(None);
    }
    if matches!(a.data, GeomData::Collection(_)) || matches!(b.data, GeomData::Collection(_)) {
        return Err(format!(
            "{method} is not supported for GeometryCollection operands"
        ));
    }
    let (ga, gb) = geo_pair(a, b)?;
    Ok(Some(ga.relate(&gb)))
}

pub fn is_valid(repr: &GeomRepr) -> Result<bool, String> {
    if repr.is_empty() {
        return Ok(true);
    }
    match repr.to_geo() {
        Some(g) => Ok(g.is_valid()),
        None => Err("geometry has no planar representation".to_string()),
    }
}

/// Simplicity in the OGC sense: no self-intersection except at boundary
/// points. Collections other than multipoints and multilinestrings are not
/// modeled.
pub fn is_simple(repr: &GeomRepr) -> Result<bool, String> {
    match &repr.data {
        GeomData::Point(_) | GeomData::None => Ok(true),
        GeomData::MultiPoint(ps) => {
            for (i, a) in ps.iter().enumerate() {
                for b in &ps[i + 1..] {
                    if a.x == b.x && a.y == b.y {
                        return Ok(false);
                    }
                }
            }
            Ok(true)
        }
        GeomData::Line { coords, .. } => Ok(line_is_simple(coords)),
        GeomData::MultiLine(ls) => {
            if !ls.iter().all(|l| line_is_simple(l)) {
                return Ok(false);
            }
            for (i, a) in ls.iter().enumerate() {
                for b in &ls[i + 1..] {
                    if !lines_meet_only_at_endpoints(a, b) {
                        return Ok(false);
                    }
                }
            }
            Ok(true)
        }
        GeomData::Polygon(_) | GeomData::MultiPolygon(_) => is_valid(repr),
        GeomData::Collection(_) => {
            Err("is_simple is not supported for GeometryCollection".to_string())
        }
    }
}

/// A ring is a closed, simple curve. Non-curve operands are an error; the
/// wrapper layer degrades that to `false`.
pub fn is_ring(repr: &GeomRepr) -> Result<bool, String> {
    let coords = match &repr.data {
        GeomData::Line { coords, .. } => coords,
        _ => {
            return Err(format!(
                "IllegalArgumentException: is_ring requires a curve, got {:?}",
                repr.kind()
            ))
        }
    };
    if coords.len() < 4 {
        return Ok(false);
    }
    let closed = coords.first().map(|c| (c.x, c.y)) == coords.last().map(|c| (c.x, c.y));
    Ok(closed && line_is_simple(coords))
}

fn segments(coords: &[Coord3]) -> Vec<Line<f64>> {
    coords
        .windows(2)
        .map(|w| {
            Line::new(
                Coord { x: w[0].x, y: w[0].y },
                Coord { x: w[1].x, y: w[1].y },
            )
        })
        .collect()
}

fn line_is_simple(coords: &[Coord3]) -> bool {
    let segs = segments(coords);
    if segs.is_empty() {
        return true;
    }
    let closed = coords.first().map(|c| (c.x, c.y)) == coords.last().map(|c| (c.x, c.y));
    let last = segs.len() - 1;
    for i in 0..segs.len() {
        for j in (i + 1)..segs.len() {
            let Some(hit) = line_intersection(segs[i], segs[j]) else {
                continue;
            };
            match hit {
                LineIntersection::Collinear { .. } => return false,
                LineIntersection::SinglePoint { is_proper: true, .. } => return false,
                LineIntersection::SinglePoint { .. } => {
                    let adjacent = j == i + 1 || (closed && i == 0 && j == last);
                    if !adjacent {
                        return false;
                    }
                }
            }
        }
    }
    true
}

fn lines_meet_only_at_endpoints(a: &[Coord3], b: &[Coord3]) -> bool {
    let ends = |coords: &[Coord3]| {
        let mut v = Vec::new();
        if let Some(c) = coords.first() {
            v.push((c.x, c.y));
        }
        if let Some(c) = coords.last() {
            v.push((c.x, c.y));
        }
        v
    };
    let ea = ends(a);
    let eb = ends(b);
    for sa in segments(a) {
        for sb in segments(b) {
            let Some(hit) = line_intersection(sa, sb) else {
                continue;
            };
            match hit {
                LineIntersection::Collinear { .. } => return false,
                LineIntersection::SinglePoint { intersection, .. } => {
                    let p = (intersection.x, intersection.y);
                    if !(ea.contains(&p) && eb.contains(&p)) {
                        return false;
                    }
                }
            }
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Derived geometries

/// Polygonal view of a representation: polygons, multipolygons, and
/// collections whose members are all polygonal. Everything else yields
/// `None`.
fn as_multi_polygon(repr: &GeomRepr) -> Option<MultiPolygon<f64>> {
    match repr.to_geo()? {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        Geometry::MultiPolygon(mp) => Some(mp),
        Geometry::GeometryCollection(gc) => {
            let mut polys = Vec::new();
            for member in gc.0 {
                match member {
                    Geometry::Polygon(p) => polys.push(p),
                    Geometry::MultiPolygon(mp) => polys.extend(mp.0),
                    _ => return None,
                }
            }
            Some(MultiPolygon(polys))
        }
        _ => None,
    }
}

/// Collapses a boolean-op result back into the narrowest kind: a polygon for
/// a single part, otherwise a multipolygon. An empty result is an empty
/// polygon.
fn multi_to_repr(mut mp: MultiPolygon<f64>) -> GeomRepr {
    match mp.0.len() {
        0 => GeomRepr::new(GeomData::Polygon(Vec::new()), false),
        1 => GeomRepr::from_geo(&Geometry::Polygon(mp.0.remove(0))),
        _ => GeomRepr::from_geo(&Geometry::MultiPolygon(mp)),
    }
}

fn boolean_op(
    a: &GeomRepr,
    b: &GeomRepr,
    method: &str,
    op: impl Fn(&MultiPolygon<f64>, &MultiPolygon<f64>) -> MultiPolygon<f64>,
) -> Option<GeomRepr> {
    let (Some(ma), Some(mb)) = (as_multi_polygon(a), as_multi_polygon(b)) else {
        log::debug!(
            "{method}: non-polygonal operands ({:?}, {:?}), no result",
            a.kind(),
            b.kind()
        );
        return None;
    };
    Some(multi_to_repr(op(&ma, &mb)))
}

pub fn intersection(a: &GeomRepr, b: &GeomRepr) -> Option<GeomRepr> {
    boolean_op(a, b, "intersection", |x, y| x.intersection(y))
}

pub fn union(a: &GeomRepr, b: &GeomRepr) -> Option<GeomRepr> {
    boolean_op(a, b, "union", |x, y| x.union(y))
}

pub fn difference(a: &GeomRepr, b: &GeomRepr) -> Option<GeomRepr> {
    boolean_op(a, b, "difference", |x, y| x.difference(y))
}

pub fn sym_difference(a: &GeomRepr, b: &GeomRepr) -> Option<GeomRepr> {
    boolean_op(a, b, "sym_difference", |x, y| x.xor(y))
}

/// Dissolves the members of a multipolygon into a single surface.
pub fn union_cascaded(repr: &GeomRepr) -> Result<Option<GeomRepr>, String> {
    let GeomData::MultiPolygon(_) = &repr.data else {
        return Err(format!(
            "union_cascaded requires a MultiPolygon, got {:?}",
            repr.kind()
        ));
    };
    let Some(mp) = as_multi_polygon(repr) else {
        return Ok(None);
    };
    let mut parts = mp.0.into_iter();
    let Some(first) = parts.next() else {
        return Ok(Some(multi_to_repr(MultiPolygon(Vec::new()))));
    };
    let mut acc = MultiPolygon(vec![first]);
    for part in parts {
        acc = acc.union(&MultiPolygon(vec![part]));
    }
    Ok(Some(multi_to_repr(acc)))
}

/// Combinatorial boundary: ring curves for surfaces, endpoint points for
/// curves (mod-2 rule), empty for points.
pub fn boundary(repr: &GeomRepr) -> Option<GeomRepr> {
    let data = match &repr.data {
        GeomData::Point(_) | GeomData::MultiPoint(_) | GeomData::None => {
            GeomData::Collection(Vec::new())
        }
        GeomData::Line { coords, .. } => GeomData::MultiPoint(endpoint_boundary(&[coords.clone()])),
        GeomData::MultiLine(ls) => GeomData::MultiPoint(endpoint_boundary(ls)),
        GeomData::Polygon(rings) => match rings.len() {
            0 => GeomData::Line {
                coords: Vec::new(),
                ring: false,
            },
            1 => GeomData::Line {
                coords: rings[0].clone(),
                ring: false,
            },
            _ => GeomData::MultiLine(rings.clone()),
        },
        GeomData::MultiPolygon(ps) => {
            GeomData::MultiLine(ps.iter().flat_map(|rings| rings.iter().cloned()).collect())
        }
        GeomData::Collection(ms) => {
            let members = ms.iter().map(boundary).collect::<Option<Vec<_>>>()?;
            GeomData::Collection(members)
        }
    };
    Some(GeomRepr::new(data, false))
}

/// Points that are an endpoint of an odd number of member curves.
fn endpoint_boundary(lines: &[Vec<Coord3>]) -> Vec<Coord3> {
    let mut counts: Vec<(Coord3, usize)> = Vec::new();
    let mut bump = |c: Coord3| {
        match counts.iter_mut().find(|(p, _)| p.x == c.x && p.y == c.y) {
            Some((_, n)) => *n += 1,
            None => counts.push((c, 1)),
        }
    };
    for line in lines {
        if line.len() < 2 {
            continue;
        }
        if let (Some(first), Some(last)) = (line.first(), line.last()) {
            bump(*first);
            bump(*last);
        }
    }
    counts
        .into_iter()
        .filter(|(_, n)| n % 2 == 1)
        .map(|(c, _)| c)
        .collect()
}

pub fn convex_hull(repr: &GeomRepr) -> Option<GeomRepr> {
    let coords = repr.coords();
    if coords.is_empty() {
        return None;
    }
    let mp = MultiPoint(
        coords
            .iter()
            .map(|c| Point::new(c.x, c.y))
            .collect::<Vec<_>>(),
    );
    Some(GeomRepr::from_geo(&Geometry::Polygon(mp.convex_hull())))
}

pub fn point_on_surface(repr: &GeomRepr) -> Option<GeomRepr> {
    let point = repr.to_geo()?.interior_point()?;
    Some(GeomRepr::from_geo(&Geometry::Point(point)))
}

pub fn centroid(repr: &GeomRepr) -> Option<GeomRepr> {
    let point = repr.to_geo()?.centroid()?;
    Some(GeomRepr::from_geo(&Geometry::Point(point)))
}

pub fn area(repr: &GeomRepr) -> f64 {
    repr.to_geo().map(|g| g.unsigned_area()).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Buffer

/// Positive buffers dilate by unioning the base surface with per-vertex
/// discs and per-segment capsules; negative buffers erode a surface by
/// subtracting the dilation of its boundary. `quad_segs` controls disc
/// fidelity exactly as in the original surface (segments per quadrant).
pub fn buffer(repr: &GeomRepr, distance: f64, quad_segs: u32) -> Option<GeomRepr> {
    if distance == 0.0 {
        return as_multi_polygon(repr)
            .map(multi_to_repr)
            .or_else(|| Some(multi_to_repr(MultiPolygon(Vec::new()))));
    }
    let steps = (quad_segs.max(1) * 4) as usize;
    if distance > 0.0 {
        let mut parts: Vec<Polygon<f64>> = as_multi_polygon(repr).map(|mp| mp.0).unwrap_or_default();
        dilate_into(repr, distance, steps, &mut parts);
        if parts.is_empty() {
            return Some(multi_to_repr(MultiPolygon(Vec::new())));
        }
        return Some(multi_to_repr(union_fold(parts)));
    }

    // Erosion is only meaningful for surfaces.
    let base = as_multi_polygon(repr)?;
    let boundary = boundary(repr)?;
    let mut capsules = Vec::new();
    dilate_into(&boundary, -distance, steps, &mut capsules);
    if capsules.is_empty() {
        return Some(multi_to_repr(base));
    }
    Some(multi_to_repr(base.difference(&union_fold(capsules))))
}

fn union_fold(parts: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut iter = parts.into_iter();
    let Some(first) = iter.next() else {
        return MultiPolygon(Vec::new());
    };
    let mut acc = MultiPolygon(vec![first]);
    for part in iter {
        acc = acc.union(&MultiPolygon(vec![part]));
    }
    acc
}

fn disc(center: (f64, f64), radius: f64, steps: usize) -> Polygon<f64> {
    let mut ring = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let theta = (i as f64) * std::f64::consts::TAU / (steps as f64);
        ring.push(Coord {
            x: center.0 + radius * theta.cos(),
            y: center.1 + radius * theta.sin(),
        });
    }
    Polygon::new(LineString(ring), Vec::new())
}

fn segment_box(a: &Coord3, b: &Coord3, radius: f64) -> Option<Polygon<f64>> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return None;
    }
    let nx = -dy / len * radius;
    let ny = dx / len * radius;
    Some(Polygon::new(
        LineString(vec![
            Coord { x: a.x + nx, y: a.y + ny },
            Coord { x: b.x + nx, y: b.y + ny },
            Coord { x: b.x - nx, y: b.y - ny },
            Coord { x: a.x - nx, y: a.y - ny },
            Coord { x: a.x + nx, y: a.y + ny },
        ]),
        Vec::new(),
    ))
}

fn dilate_into(repr: &GeomRepr, radius: f64, steps: usize, out: &mut Vec<Polygon<f64>>) {
    for c in repr.coords() {
        out.push(disc((c.x, c.y), radius, steps));
    }
    for_each_line(repr, &mut |coords| {
        for pair in coords.windows(2) {
            if let Some(boxed) = segment_box(&pair[0], &pair[1], radius) {
                out.push(boxed);
            }
        }
    });
}

fn for_each_line(repr: &GeomRepr, f: &mut dyn FnMut(&[Coord3])) {
    match &repr.data {
        GeomData::Line { coords, .. } => f(coords),
        GeomData::Polygon(rings) | GeomData::MultiLine(rings) => {
            rings.iter().for_each(|r| f(r))
        }
        GeomData::MultiPolygon(ps) => ps.iter().flatten().for_each(|r| f(r)),
        GeomData::Collection(ms) => ms.iter().for_each(|m| for_each_line(m, f)),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Simplification & polygonization

pub fn simplify(repr: &GeomRepr, tolerance: f64) -> Option<GeomRepr> {
    let simplified = match repr.to_geo()? {
        Geometry::LineString(g) => Geometry::LineString(g.simplify(&tolerance)),
        Geometry::MultiLineString(g) => Geometry::MultiLineString(g.simplify(&tolerance)),
        Geometry::Polygon(g) => Geometry::Polygon(g.simplify(&tolerance)),
        Geometry::MultiPolygon(g) => Geometry::MultiPolygon(g.simplify(&tolerance)),
        other @ (Geometry::Point(_) | Geometry::MultiPoint(_)) => other,
        _ => return None,
    };
    Some(GeomRepr::from_geo(&simplified))
}

pub fn simplify_preserve_topology(repr: &GeomRepr, tolerance: f64) -> Option<GeomRepr> {
    let simplified = match repr.to_geo()? {
        Geometry::LineString(g) => Geometry::LineString(g.simplify_vw_preserve(&tolerance)),
        Geometry::MultiLineString(g) => {
            Geometry::MultiLineString(g.simplify_vw_preserve(&tolerance))
        }
        Geometry::Polygon(g) => Geometry::Polygon(g.simplify_vw_preserve(&tolerance)),
        Geometry::MultiPolygon(g) => Geometry::MultiPolygon(g.simplify_vw_preserve(&tolerance)),
        other @ (Geometry::Point(_) | Geometry::MultiPoint(_)) => other,
        _ => return None,
    };
    Some(GeomRepr::from_geo(&simplified))
}

/// Assembles closed rings from a set of curves by greedy endpoint chaining.
/// Returns a collection of the polygons formed, or `None` when any curve is
/// left over.
pub fn polygonize(repr: &GeomRepr) -> Option<GeomRepr> {
    let mut lines: Vec<Vec<Coord3>> = Vec::new();
    for_each_line(repr, &mut |coords| lines.push(coords.to_vec()));
    lines.retain(|l| l.len() >= 2);

    let mut polygons = Vec::new();
    while let Some(start) = lines.pop() {
        let mut path = start;
        loop {
            let head = *path.first()?;
            let tail = *path.last()?;
            if path.len() >= 4 && head.x == tail.x && head.y == tail.y {
                polygons.push(GeomRepr::new(GeomData::Polygon(vec![path]), false));
                break;
            }
            let next = lines.iter().position(|l| {
                let (f, b) = (l[0], l[l.len() - 1]);
                (f.x == tail.x && f.y == tail.y) || (b.x == tail.x && b.y == tail.y)
            })?;
            let mut link = lines.swap_remove(next);
            if !(link[0].x == tail.x && link[0].y == tail.y) {
                link.reverse();
            }
            path.extend_from_slice(&link[1..]);
        }
    }
    Some(GeomRepr::new(GeomData::Collection(polygons), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::wkt;
    use crate::vector::GeometryKind;
    use float_cmp::approx_eq;

    fn g(input: &str) -> GeomRepr {
        wkt::parse(input).unwrap()
    }

    #[test]
    fn test_intersects_and_disjoint() {
        let a = g("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        let b = g("POLYGON ((1 1,1 3,3 3,3 1,1 1))");
        let c = g("POLYGON ((5 5,5 6,6 6,5 5))");
        assert!(intersects(&a, &b).unwrap());
        assert!(!intersects(&a, &c).unwrap());
        assert!(disjoint(&a, &c).unwrap());
        assert!(!disjoint(&a, &b).unwrap());
    }

    #[test]
    fn test_empty_operands() {
        let a = g("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        let e = g("POINT EMPTY");
        assert!(!intersects(&a, &e).unwrap());
        assert!(disjoint(&a, &e).unwrap());
        assert!(!contains(&a, &e).unwrap());
        assert!(!touches(&a, &e).unwrap());
    }

    #[test]
    fn test_containment() {
        let outer = g("POLYGON ((0 0,0 10,10 10,10 0,0 0))");
        let inner = g("POINT (5 5)");
        assert!(contains(&outer, &inner).unwrap());
        assert!(within(&inner, &outer).unwrap());
        assert!(!contains(&inner, &outer).unwrap());
    }

    #[test]
    fn test_touches_and_crosses() {
        let a = g("POLYGON ((0 0,0 1,1 1,1 0,0 0))");
        let b = g("POLYGON ((1 0,1 1,2 1,2 0,1 0))");
        assert!(touches(&a, &b).unwrap());

        let line = g("LINESTRING (-1 0.5,2 0.5)");
        assert!(crosses(&line, &a).unwrap());
    }

    #[test]
    fn test_overlaps() {
        let a = g("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        let b = g("POLYGON ((1 1,1 3,3 3,3 1,1 1))");
        assert!(overlaps(&a, &b).unwrap());
        assert!(!overlaps(&a, &a).unwrap());
    }

    #[test]
    fn test_relate_rejects_collections() {
        let gc = g("GEOMETRYCOLLECTION (POINT (0 0))");
        let p = g("POINT (0 0)");
        assert!(touches(&gc, &p).is_err());
    }

    #[test]
    fn test_validity() {
        assert!(is_valid(&g("POLYGON ((0 0,0 1,1 1,1 0,0 0))")).unwrap());
        // Bow-tie: self-intersecting shell.
        assert!(!is_valid(&g("POLYGON ((0 0,2 2,2 0,0 2,0 0))")).unwrap());
    }

    #[test]
    fn test_simplicity() {
        assert!(is_simple(&g("LINESTRING (0 0,1 1,2 0)")).unwrap());
        assert!(!is_simple(&g("LINESTRING (0 0,2 2,0 2,2 0)")).unwrap());
        assert!(is_simple(&g("MULTIPOINT (0 0,1 1)")).unwrap());
        assert!(!is_simple(&g("MULTIPOINT (0 0,0 0)")).unwrap());
    }

    #[test]
    fn test_rings() {
        assert!(is_ring(&g("LINESTRING (0 0,0 1,1 1,0 0)")).unwrap());
        assert!(!is_ring(&g("LINESTRING (0 0,0 1,1 1)")).unwrap());
        assert!(is_ring(&g("POINT (0 0)")).is_err());
    }

    #[test]
    fn test_boolean_ops() {
        let a = g("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        let b = g("POLYGON ((1 0,1 2,3 2,3 0,1 0))");
        let inter = intersection(&a, &b).unwrap();
        assert!(approx_eq!(f64, area(&inter), 2.0, epsilon = 1e-9));

        let uni = union(&a, &b).unwrap();
        assert!(approx_eq!(f64, area(&uni), 6.0, epsilon = 1e-9));

        let diff = difference(&a, &b).unwrap();
        assert!(approx_eq!(f64, area(&diff), 2.0, epsilon = 1e-9));

        let sym = sym_difference(&a, &b).unwrap();
        assert!(approx_eq!(f64, area(&sym), 4.0, epsilon = 1e-9));
    }

    #[test]
    fn test_boolean_ops_need_surfaces() {
        let a = g("LINESTRING (0 0,1 1)");
        let b = g("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        assert!(intersection(&a, &b).is_none());
        assert!(union(&a, &b).is_none());
    }

    #[test]
    fn test_union_cascaded() {
        let mp = g("MULTIPOLYGON (((0 0,0 2,2 2,2 0,0 0)),((1 0,1 2,3 2,3 0,1 0)))");
        let dissolved = union_cascaded(&mp).unwrap().unwrap();
        assert_eq!(dissolved.kind(), GeometryKind::Polygon);
        assert!(approx_eq!(f64, area(&dissolved), 6.0, epsilon = 1e-9));
        assert!(union_cascaded(&g("POINT (0 0)")).is_err());
    }

    #[test]
    fn test_boundary() {
        let b = boundary(&g("POLYGON ((0 0,0 1,1 1,0 0))")).unwrap();
        assert_eq!(b.kind(), GeometryKind::LineString);
        assert_eq!(b.point_count(), 4);

        let pts = boundary(&g("LINESTRING (0 0,1 1,2 2)")).unwrap();
        assert_eq!(pts.kind(), GeometryKind::MultiPoint);
        assert_eq!(pts.child_count(), 2);

        // A closed curve has an empty boundary.
        let closed = boundary(&g("LINESTRING (0 0,0 1,1 1,0 0)")).unwrap();
        assert!(closed.is_empty());

        assert!(boundary(&g("POINT (1 1)")).unwrap().is_empty());
    }

    #[test]
    fn test_convex_hull_area() {
        let line = g("LINESTRING (0 0,1 1,1.2 0.5,2 3,3 1,4 4)");
        let hull = convex_hull(&line).unwrap();
        assert_eq!(hull.kind(), GeometryKind::Polygon);
        assert!(approx_eq!(f64, area(&hull), 6.0, epsilon = 1e-9));
    }

    #[test]
    fn test_interior_points() {
        let poly = g("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        let pos = point_on_surface(&poly).unwrap();
        assert!(contains(&poly, &pos).unwrap());
        let c = centroid(&poly).unwrap();
        assert_eq!(c.get_point(0), Some((1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_buffer_point() {
        let buffered = buffer(&g("POINT (0 0)"), 1.0, 30).unwrap();
        assert_eq!(buffered.kind(), GeometryKind::Polygon);
        let a = area(&buffered);
        assert!(a > 3.1 && a < std::f64::consts::PI, "disc area was {a}");
        assert!(contains(&buffered, &g("POINT (0.9 0)")).unwrap());
    }

    #[test]
    fn test_buffer_grows_polygon() {
        let sq = g("POLYGON ((0 0,0 2,2 2,2 0,0 0))");
        let grown = buffer(&sq, 0.5, 8).unwrap();
        assert!(area(&grown) > area(&sq));
        assert!(contains(&grown, &sq).unwrap());
    }

    #[test]
    fn test_negative_buffer_shrinks() {
        let sq = g("POLYGON ((0 0,0 4,4 4,4 0,0 0))");
        let shrunk = buffer(&sq, -1.0, 8).unwrap();
        let a = area(&shrunk);
        assert!(a > 0.0 && a < 16.0, "eroded area was {a}");
        assert!(contains(&sq, &shrunk).unwrap());
    }

    #[test]
    fn test_simplify_variants() {
        let line = g("LINESTRING (0 0,0.2 0.1,0.4 -0.05,1 0,2 2)");
        let rdp = simplify(&line, 0.3).unwrap();
        assert!(rdp.point_count() < line.point_count());

        let vw = simplify_preserve_topology(&line, 0.3).unwrap();
        assert!(vw.point_count() <= line.point_count());
    }

    #[test]
    fn test_polygonize() {
        let lines = g("MULTILINESTRING ((0 0,0 1),(0 1,1 1),(1 1,0 0))");
        let out = polygonize(&lines).unwrap();
        assert_eq!(out.kind(), GeometryKind::GeometryCollection);
        assert_eq!(out.child_count(), 1);
        assert_eq!(out.child(0).unwrap().kind(), GeometryKind::Polygon);
    }

    #[test]
    fn test_polygonize_failure() {
        let lines = g("MULTILINESTRING ((0 0,0 1),(5 5,6 6))");
        assert!(polygonize(&lines).is_none());
    }
}
