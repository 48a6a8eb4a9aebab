use crate::errors::Result;
use crate::vector::Geometry;

/// # Set Operations
///
/// Set operations over two geometries, producing a new geometry.
///
/// Geometry validity is not checked. In case you are unsure of the validity
/// of the input geometries, call [`Geometry::is_valid`] before, otherwise
/// the result might be wrong.
///
/// All four return `Some(Geometry)` on success and `None` when either
/// wrapper no longer holds a handle, or when the engine produced no result.
/// [`Geometry::intersection`] and [`Geometry::union`] additionally treat an
/// engine result that echoes the input handle as no result;
/// [`Geometry::difference`] and [`Geometry::symmetric_difference`] only
/// check for a null result.
impl Geometry {
    /// Computes the region of intersection of the two geometries.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let (a, b) = (self.core().handle?, other.core().handle?);
        let result = self.log_failure("intersection", self.engine().intersection(a, b))?;
        self.wrap_derived(result, true)
    }

    /// Computes the region covered by either geometry.
    pub fn union(&self, other: &Self) -> Option<Self> {
        let (a, b) = (self.core().handle?, other.core().handle?);
        let result = self.log_failure("union", self.engine().union(a, b))?;
        self.wrap_derived(result, true)
    }

    /// Computes the region of this geometry not covered by `other`.
    pub fn difference(&self, other: &Self) -> Option<Self> {
        let (a, b) = (self.core().handle?, other.core().handle?);
        let result = self.log_failure("difference", self.engine().difference(a, b))?;
        self.wrap_derived(result, false)
    }

    /// Computes the region covered by exactly one of the two geometries.
    pub fn symmetric_difference(&self, other: &Self) -> Option<Self> {
        let (a, b) = (self.core().handle?, other.core().handle?);
        let result = self.log_failure("symmetric_difference", self.engine().sym_difference(a, b))?;
        self.wrap_derived(result, false)
    }

    /// Dissolves the members of a multipolygon into a single surface.
    /// Errors on any other kind.
    pub fn union_cascaded(&self) -> Result<Option<Self>> {
        let result = self.engine().union_cascaded(self.handle()?)?;
        Ok(self.wrap_derived(result, true))
    }

    fn log_failure<T>(&self, method: &'static str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::debug!("{method}: engine reported '{err}', no result");
                None
            }
        }
    }
}
