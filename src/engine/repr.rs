//! In-memory geometry representation used by [`PlanarEngine`].
//!
//! A representation is a base shape plus a Z flag. Linear rings are stored as
//! line strings with a `ring` marker, matching the external tag space, which
//! has no wire-level code for rings.
//!
//! [`PlanarEngine`]: crate::engine::PlanarEngine

use crate::vector::{Envelope, GeometryKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coord3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Coord3 { x, y, z }
    }
}

#[derive(Debug, Clone)]
pub enum GeomData {
    /// `None` is an empty point.
    Point(Option<Coord3>),
    Line { coords: Vec<Coord3>, ring: bool },
    /// Exterior ring first, then interior rings.
    Polygon(Vec<Vec<Coord3>>),
    MultiPoint(Vec<Coord3>),
    MultiLine(Vec<Vec<Coord3>>),
    MultiPolygon(Vec<Vec<Vec<Coord3>>>),
    Collection(Vec<GeomRepr>),
    None,
}

#[derive(Debug, Clone)]
pub struct GeomRepr {
    pub data: GeomData,
    /// Whether the geometry carries Z values. For collections the effective
    /// dimensionality is derived from the members instead; see [`Self::kind`].
    pub dim3: bool,
}

impl GeomRepr {
    pub fn new(data: GeomData, dim3: bool) -> Self {
        GeomRepr { data, dim3 }
    }

    /// Empty representation for a kind tag, or `None` for tags the engine
    /// cannot allocate (`Unknown`).
    pub fn create(kind: GeometryKind) -> Option<GeomRepr> {
        let dim3 = kind.is_3d();
        let data = match kind.flattened() {
            GeometryKind::Point => GeomData::Point(None),
            GeometryKind::LineString => GeomData::Line {
                coords: Vec::new(),
                ring: false,
            },
            GeometryKind::LinearRing => GeomData::Line {
                coords: Vec::new(),
                ring: true,
            },
            GeometryKind::Polygon => GeomData::Polygon(Vec::new()),
            GeometryKind::MultiPoint => GeomData::MultiPoint(Vec::new()),
            GeometryKind::MultiLineString => GeomData::MultiLine(Vec::new()),
            GeometryKind::MultiPolygon => GeomData::MultiPolygon(Vec::new()),
            // An empty collection reports the 2D tag until a 3D member is
            // added, so the Z flag is dropped on creation.
            GeometryKind::GeometryCollection => {
                return Some(GeomRepr::new(GeomData::Collection(Vec::new()), false))
            }
            GeometryKind::None => GeomData::None,
            GeometryKind::Unknown => return None,
            _ => unreachable!("flattened() returns base kinds only"),
        };
        Some(GeomRepr::new(data, dim3))
    }

    /// The reported kind tag. Collections derive their dimensionality from
    /// their members.
    pub fn kind(&self) -> GeometryKind {
        let base = match &self.data {
            GeomData::Point(_) => GeometryKind::Point,
            GeomData::Line { .. } => GeometryKind::LineString,
            GeomData::Polygon(_) => GeometryKind::Polygon,
            GeomData::MultiPoint(_) => GeometryKind::MultiPoint,
            GeomData::MultiLine(_) => GeometryKind::MultiLineString,
            GeomData::MultiPolygon(_) => GeometryKind::MultiPolygon,
            GeomData::Collection(members) => {
                if members.iter().any(|m| m.kind().is_3d()) {
                    return GeometryKind::GeometryCollection25D;
                }
                return GeometryKind::GeometryCollection;
            }
            GeomData::None => return GeometryKind::None,
        };
        if self.dim3 {
            base.with_z()
        } else {
            base
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.data {
            GeomData::Point(c) => c.is_none(),
            GeomData::Line { coords, .. } => coords.is_empty(),
            GeomData::Polygon(rings) => rings.iter().all(|r| r.is_empty()),
            GeomData::MultiPoint(ps) => ps.is_empty(),
            GeomData::MultiLine(ls) => ls.iter().all(|l| l.is_empty()),
            GeomData::MultiPolygon(ps) => ps.iter().all(|p| p.iter().all(|r| r.is_empty())),
            GeomData::Collection(ms) => ms.iter().all(|m| m.is_empty()),
            GeomData::None => true,
        }
    }

    /// Topological dimension: 0 for points, 1 for curves, 2 for surfaces.
    pub fn dimension(&self) -> i32 {
        match &self.data {
            GeomData::Point(_) | GeomData::MultiPoint(_) => 0,
            GeomData::Line { .. } | GeomData::MultiLine(_) => 1,
            GeomData::Polygon(_) | GeomData::MultiPolygon(_) => 2,
            GeomData::Collection(ms) => ms.iter().map(|m| m.dimension()).max().unwrap_or(0),
            GeomData::None => 0,
        }
    }

    /// 2 or 3; 0 for an empty point.
    pub fn coordinate_dimension(&self) -> i32 {
        match &self.data {
            GeomData::Point(None) => 0,
            GeomData::Collection(_) => {
                if self.kind().is_3d() {
                    3
                } else {
                    2
                }
            }
            _ => {
                if self.dim3 {
                    3
                } else {
                    2
                }
            }
        }
    }

    pub fn set_dim3(&mut self, dim3: bool) {
        self.dim3 = dim3;
        if !dim3 {
            self.for_each_coord_mut(&mut |c| c.z = 0.0);
        }
        if let GeomData::Collection(ms) = &mut self.data {
            for m in ms {
                m.set_dim3(dim3);
            }
        }
    }

    pub fn clear(&mut self) {
        let data = match &self.data {
            GeomData::Point(_) => GeomData::Point(None),
            GeomData::Line { ring, .. } => GeomData::Line {
                coords: Vec::new(),
                ring: *ring,
            },
            GeomData::Polygon(_) => GeomData::Polygon(Vec::new()),
            GeomData::MultiPoint(_) => GeomData::MultiPoint(Vec::new()),
            GeomData::MultiLine(_) => GeomData::MultiLine(Vec::new()),
            GeomData::MultiPolygon(_) => GeomData::MultiPolygon(Vec::new()),
            GeomData::Collection(_) => GeomData::Collection(Vec::new()),
            GeomData::None => GeomData::None,
        };
        self.data = data;
    }

    pub fn point_count(&self) -> usize {
        match &self.data {
            GeomData::Point(c) => usize::from(c.is_some()),
            GeomData::Line { coords, .. } => coords.len(),
            _ => 0,
        }
    }

    pub fn child_count(&self) -> usize {
        match &self.data {
            GeomData::Polygon(rings) => rings.len(),
            GeomData::MultiPoint(ps) => ps.len(),
            GeomData::MultiLine(ls) => ls.len(),
            GeomData::MultiPolygon(ps) => ps.len(),
            GeomData::Collection(ms) => ms.len(),
            _ => 0,
        }
    }

    /// Materializes a member as its own representation. Polygon members are
    /// its rings, surfaced as linear rings.
    pub fn child(&self, index: usize) -> Option<GeomRepr> {
        match &self.data {
            GeomData::Polygon(rings) => rings.get(index).map(|r| {
                GeomRepr::new(
                    GeomData::Line {
                        coords: r.clone(),
                        ring: true,
                    },
                    self.dim3,
                )
            }),
            GeomData::MultiPoint(ps) => ps
                .get(index)
                .map(|c| GeomRepr::new(GeomData::Point(Some(*c)), self.dim3)),
            GeomData::MultiLine(ls) => ls.get(index).map(|l| {
                GeomRepr::new(
                    GeomData::Line {
                        coords: l.clone(),
                        ring: false,
                    },
                    self.dim3,
                )
            }),
            GeomData::MultiPolygon(ps) => ps
                .get(index)
                .map(|p| GeomRepr::new(GeomData::Polygon(p.clone()), self.dim3)),
            GeomData::Collection(ms) => ms.get(index).cloned(),
            _ => None,
        }
    }

    /// Adds a copy of `child` as a member. The accepted member kind depends
    /// on the container kind.
    pub fn add_child(&mut self, child: &GeomRepr) -> Result<(), String> {
        let promote = child.dim3;
        match (&mut self.data, &child.data) {
            (GeomData::Polygon(rings), GeomData::Line { coords, .. }) => {
                rings.push(coords.clone());
            }
            (GeomData::MultiPoint(ps), GeomData::Point(Some(c))) => ps.push(*c),
            (GeomData::MultiLine(ls), GeomData::Line { coords, .. }) => ls.push(coords.clone()),
            (GeomData::MultiPolygon(ps), GeomData::Polygon(rings)) => ps.push(rings.clone()),
            (GeomData::Collection(ms), _) => ms.push(child.clone()),
            (_, _) => {
                return Err(format!(
                    "cannot add {:?} member to {:?} container",
                    child.kind(),
                    self.kind()
                ))
            }
        }
        if promote && !matches!(self.data, GeomData::Collection(_)) {
            self.dim3 = true;
        }
        Ok(())
    }

    pub fn add_point(&mut self, x: f64, y: f64, z: Option<f64>) -> Result<(), String> {
        if z.is_some() {
            self.dim3 = true;
        }
        let c = Coord3::new(x, y, z.unwrap_or(0.0));
        match &mut self.data {
            GeomData::Point(p) => *p = Some(c),
            GeomData::Line { coords, .. } => coords.push(c),
            GeomData::MultiPoint(ps) => ps.push(c),
            _ => return Err("add_point requires a point or curve geometry".to_string()),
        }
        Ok(())
    }

    pub fn set_point(&mut self, index: usize, x: f64, y: f64, z: Option<f64>) -> Result<(), String> {
        if z.is_some() {
            self.dim3 = true;
        }
        let c = Coord3::new(x, y, z.unwrap_or(0.0));
        match &mut self.data {
            GeomData::Point(p) if index == 0 => {
                *p = Some(c);
                Ok(())
            }
            GeomData::Line { coords, .. } if index < coords.len() => {
                coords[index] = c;
                Ok(())
            }
            _ => Err(format!("point index {index} out of range")),
        }
    }

    pub fn get_point(&self, index: usize) -> Option<(f64, f64, f64)> {
        match &self.data {
            GeomData::Point(Some(c)) if index == 0 => Some((c.x, c.y, c.z)),
            GeomData::Line { coords, .. } => coords.get(index).map(|c| (c.x, c.y, c.z)),
            _ => None,
        }
    }

    pub fn for_each_coord_mut(&mut self, f: &mut dyn FnMut(&mut Coord3)) {
        match &mut self.data {
            GeomData::Point(Some(c)) => f(c),
            GeomData::Point(None) | GeomData::None => {}
            GeomData::Line { coords, .. } => coords.iter_mut().for_each(|c| f(c)),
            GeomData::MultiPoint(ps) => ps.iter_mut().for_each(|c| f(c)),
            GeomData::Polygon(rings) | GeomData::MultiLine(rings) => {
                rings.iter_mut().flatten().for_each(|c| f(c))
            }
            GeomData::MultiPolygon(ps) => {
                ps.iter_mut().flatten().flatten().for_each(|c| f(c))
            }
            GeomData::Collection(ms) => ms.iter_mut().for_each(|m| m.for_each_coord_mut(f)),
        }
    }

    pub fn coords(&self) -> Vec<Coord3> {
        let mut out = Vec::new();
        self.collect_coords(&mut out);
        out
    }

    fn collect_coords(&self, out: &mut Vec<Coord3>) {
        match &self.data {
            GeomData::Point(Some(c)) => out.push(*c),
            GeomData::Point(None) | GeomData::None => {}
            GeomData::Line { coords, .. } => out.extend_from_slice(coords),
            GeomData::MultiPoint(ps) => out.extend_from_slice(ps),
            GeomData::Polygon(rings) | GeomData::MultiLine(rings) => {
                rings.iter().for_each(|r| out.extend_from_slice(r))
            }
            GeomData::MultiPolygon(ps) => ps
                .iter()
                .flatten()
                .for_each(|r| out.extend_from_slice(r)),
            GeomData::Collection(ms) => ms.iter().for_each(|m| m.collect_coords(out)),
        }
    }

    /// The bounding envelope, or `None` for empty geometries.
    pub fn envelope(&self) -> Option<Envelope> {
        let coords = self.coords();
        let first = coords.first()?;
        let mut env = if self.coordinate_dimension() == 3 {
            Envelope::new_3d(first.x, first.x, first.y, first.y, first.z, first.z)
        } else {
            Envelope::new(first.x, first.x, first.y, first.y)
        };
        for c in &coords[1..] {
            env.expand_to(c.x, c.y, c.z);
        }
        Some(env)
    }

    /// Structural equality: same reported kind, same coordinates. The ring
    /// marker is ignored, as it has no wire-level tag.
    pub fn same_structure(&self, other: &GeomRepr) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match (&self.data, &other.data) {
            (GeomData::Point(a), GeomData::Point(b)) => a == b,
            (GeomData::Line { coords: a, .. }, GeomData::Line { coords: b, .. }) => a == b,
            (GeomData::Polygon(a), GeomData::Polygon(b)) => a == b,
            (GeomData::MultiPoint(a), GeomData::MultiPoint(b)) => a == b,
            (GeomData::MultiLine(a), GeomData::MultiLine(b)) => a == b,
            (GeomData::MultiPolygon(a), GeomData::MultiPolygon(b)) => a == b,
            (GeomData::Collection(a), GeomData::Collection(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_structure(y))
            }
            (GeomData::None, GeomData::None) => true,
            _ => false,
        }
    }

    /// Conversion to the 2D `geo-types` model used by the algorithm layer.
    /// Z values are dropped; empty points and the none kind have no
    /// counterpart and yield `None`.
    pub fn to_geo(&self) -> Option<geo_types::Geometry<f64>> {
        fn xy(c: &Coord3) -> geo_types::Coord<f64> {
            geo_types::Coord { x: c.x, y: c.y }
        }
        fn line(coords: &[Coord3]) -> geo_types::LineString<f64> {
            geo_types::LineString(coords.iter().map(xy).collect())
        }
        fn polygon(rings: &[Vec<Coord3>]) -> geo_types::Polygon<f64> {
            let exterior = rings
                .first()
                .map(|r| line(r))
                .unwrap_or_else(|| geo_types::LineString(Vec::new()));
            let interiors = rings.iter().skip(1).map(|r| line(r)).collect();
            geo_types::Polygon::new(exterior, interiors)
        }

        let geom = match &self.data {
            GeomData::Point(Some(c)) => geo_types::Geometry::Point(geo_types::Point(xy(c))),
            GeomData::Point(None) | GeomData::None => return None,
            GeomData::Line { coords, .. } => geo_types::Geometry::LineString(line(coords)),
            GeomData::Polygon(rings) => geo_types::Geometry::Polygon(polygon(rings)),
            GeomData::MultiPoint(ps) => geo_types::Geometry::MultiPoint(geo_types::MultiPoint(
                ps.iter().map(|c| geo_types::Point(xy(c))).collect(),
            )),
            GeomData::MultiLine(ls) => geo_types::Geometry::MultiLineString(
                geo_types::MultiLineString(ls.iter().map(|l| line(l)).collect()),
            ),
            GeomData::MultiPolygon(ps) => geo_types::Geometry::MultiPolygon(
                geo_types::MultiPolygon(ps.iter().map(|p| polygon(p)).collect()),
            ),
            GeomData::Collection(ms) => geo_types::Geometry::GeometryCollection(
                geo_types::GeometryCollection(ms.iter().filter_map(|m| m.to_geo()).collect()),
            ),
        };
        Some(geom)
    }

    /// Conversion from the 2D `geo-types` model.
    pub fn from_geo(geom: &geo_types::Geometry<f64>) -> GeomRepr {
        fn coord(c: &geo_types::Coord<f64>) -> Coord3 {
            Coord3::new(c.x, c.y, 0.0)
        }
        fn line(ls: &geo_types::LineString<f64>) -> Vec<Coord3> {
            ls.0.iter().map(coord).collect()
        }
        fn polygon(p: &geo_types::Polygon<f64>) -> Vec<Vec<Coord3>> {
            if p.exterior().0.is_empty() && p.interiors().is_empty() {
                return Vec::new();
            }
            let mut rings = vec![line(p.exterior())];
            rings.extend(p.interiors().iter().map(line));
            rings
        }

        let data = match geom {
            geo_types::Geometry::Point(p) => GeomData::Point(Some(coord(&p.0))),
            geo_types::Geometry::Line(l) => GeomData::Line {
                coords: vec![coord(&l.start), coord(&l.end)],
                ring: false,
            },
            geo_types::Geometry::LineString(ls) => GeomData::Line {
                coords: line(ls),
                ring: false,
            },
            geo_types::Geometry::Polygon(p) => GeomData::Polygon(polygon(p)),
            geo_types::Geometry::MultiPoint(mp) => {
                GeomData::MultiPoint(mp.0.iter().map(|p| coord(&p.0)).collect())
            }
            geo_types::Geometry::MultiLineString(mls) => {
                GeomData::MultiLine(mls.0.iter().map(line).collect())
            }
            geo_types::Geometry::MultiPolygon(mp) => {
                GeomData::MultiPolygon(mp.0.iter().map(polygon).collect())
            }
            geo_types::Geometry::GeometryCollection(gc) => {
                GeomData::Collection(gc.0.iter().map(GeomRepr::from_geo).collect())
            }
            geo_types::Geometry::Rect(r) => {
                return GeomRepr::from_geo(&geo_types::Geometry::Polygon(r.to_polygon()))
            }
            geo_types::Geometry::Triangle(t) => {
                return GeomRepr::from_geo(&geo_types::Geometry::Polygon(t.to_polygon()))
            }
        };
        GeomRepr::new(data, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GeomRepr {
        GeomRepr::new(
            GeomData::Polygon(vec![vec![
                Coord3::new(0.0, 0.0, 0.0),
                Coord3::new(0.0, 1.0, 0.0),
                Coord3::new(1.0, 1.0, 0.0),
                Coord3::new(1.0, 0.0, 0.0),
                Coord3::new(0.0, 0.0, 0.0),
            ]]),
            false,
        )
    }

    #[test]
    fn test_empty_point_coordinate_dimension() {
        let repr = GeomRepr::create(GeometryKind::Point).unwrap();
        assert_eq!(repr.coordinate_dimension(), 0);
        assert!(repr.is_empty());
    }

    #[test]
    fn test_collection_kind_follows_members() {
        let mut gc = GeomRepr::create(GeometryKind::GeometryCollection25D).unwrap();
        assert_eq!(gc.kind(), GeometryKind::GeometryCollection);

        let mut point = GeomRepr::create(GeometryKind::Point25D).unwrap();
        point.add_point(1.0, 2.0, Some(3.0)).unwrap();
        gc.add_child(&point).unwrap();
        assert_eq!(gc.kind(), GeometryKind::GeometryCollection25D);
    }

    #[test]
    fn test_polygon_children_are_rings() {
        let sq = square();
        assert_eq!(sq.child_count(), 1);
        let ring = sq.child(0).unwrap();
        assert!(matches!(ring.data, GeomData::Line { ring: true, .. }));
        assert_eq!(ring.point_count(), 5);
    }

    #[test]
    fn test_envelope() {
        let env = square().envelope().unwrap();
        assert_eq!(env.min_x(), 0.0);
        assert_eq!(env.max_x(), 1.0);
        assert_eq!(env.max_y(), 1.0);
        assert!(env.z_range().is_none());
    }

    #[test]
    fn test_geo_round_trip() {
        let sq = square();
        let geo = sq.to_geo().unwrap();
        let back = GeomRepr::from_geo(&geo);
        assert!(sq.same_structure(&back));
    }
}
