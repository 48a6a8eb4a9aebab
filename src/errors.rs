//! Error types for the crate.

use crate::vector::GeometryKind;

pub type Result<T, E = TerraneError> = std::result::Result<T, E>;

/// Errors surfaced by the geometry engine and the wrapper layer.
///
/// Engine diagnostics are carried verbatim in the `msg` fields so that a
/// failure deep inside an operation stays debuggable at the call site.
#[derive(Clone, PartialEq, Debug, thiserror::Error)]
pub enum TerraneError {
    /// A wrapper was used after its handle was destroyed, or was constructed
    /// around a null handle.
    #[error("invalid geometry handle: {msg}")]
    InvalidHandle { msg: String },

    /// The engine could not allocate a geometry of the requested kind.
    #[error("engine could not allocate geometry of kind '{kind:?}'")]
    AllocationError { kind: GeometryKind },

    /// A serialized form failed to parse into a geometry.
    #[error("failed to parse {format}: {msg}")]
    ParseError { format: &'static str, msg: String },

    /// A coordinate transformation was missing, incompatible, or rejected.
    #[error("coordinate transformation failed: {msg}")]
    TransformError { msg: String },

    /// An external field-type tag with no mapping on this side of the
    /// boundary.
    #[error("unsupported field type tag: {tag}")]
    UnsupportedFieldType { tag: u32 },

    /// Any other engine-reported failure, named after the entry point that
    /// produced it.
    #[error("engine method '{method_name}' failed: {msg}")]
    Engine {
        method_name: &'static str,
        msg: String,
    },

    #[error("invalid argument: {0}")]
    BadArgument(String),
}

impl TerraneError {
    /// Shorthand used throughout the engine for failures that carry a
    /// diagnostic string.
    pub fn engine(method_name: &'static str, msg: impl Into<String>) -> Self {
        TerraneError::Engine {
            method_name,
            msg: msg.into(),
        }
    }
}
