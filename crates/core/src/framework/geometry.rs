use std::{fmt::Debug, hash::Hash};

/// Marker for types usable as solver-local face identifiers.
///
/// Any small copyable key qualifies; grids typically use `usize` or `u32`.
pub trait FaceIndex: Copy + Eq + Hash + Debug {}

impl<T> FaceIndex for T where T: Copy + Eq + Hash + Debug {}

/// A boundary sub-control-volume face.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFace<F> {
    /// The solver-local face identifier.
    pub index: F,

    /// Face centroid, one coordinate per spatial dimension.
    pub center: Vec<f64>,
}

/// The finite-volume grid geometry of one participant.
pub trait GridGeometry {
    type FaceId: FaceIndex;

    /// Spatial dimension of the grid.
    fn dimension(&self) -> usize;

    /// Number of degrees of freedom of the primary solution.
    fn num_dofs(&self) -> usize;

    /// Iterates all boundary faces.
    ///
    /// The order must be deterministic for a given mesh: interface vertex
    /// indices are assigned in this order.
    fn boundary_faces(&self) -> impl Iterator<Item = BoundaryFace<Self::FaceId>> + '_;
}
