//! Axis-aligned bounding envelopes.

/// An axis-aligned bounding box in two or three dimensions.
///
/// Envelopes are derived on demand from a geometry and never cached; they
/// describe the geometry's extent at the moment of derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    z: Option<(f64, f64)>,
}

impl Envelope {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Envelope {
        Envelope {
            min_x,
            max_x,
            min_y,
            max_y,
            z: None,
        }
    }

    pub fn new_3d(
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
    ) -> Envelope {
        Envelope {
            min_x,
            max_x,
            min_y,
            max_y,
            z: Some((min_z, max_z)),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// `(min_z, max_z)` for 3D envelopes, `None` for 2D ones.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.z
    }

    pub(crate) fn expand_to(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        if let Some((lo, hi)) = self.z {
            self.z = Some((lo.min(z), hi.max(z)));
        }
    }

    /// Grows this envelope to cover `other`. A 2D envelope stays 2D.
    pub fn merge(&mut self, other: &Envelope) {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
        if let (Some((lo, hi)), Some((olo, ohi))) = (self.z, other.z) {
            self.z = Some((lo.min(olo), hi.max(ohi)));
        }
    }

    /// Tests for overlap in the XY plane.
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Tests whether `other` lies entirely inside this envelope in the XY
    /// plane.
    pub fn contains(&self, other: &Envelope) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }
}
