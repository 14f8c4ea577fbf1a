use tandem_core::framework::{BoundaryFace, GridGeometry};

use crate::InterfaceError;

/// Default geometric tolerance in mesh units.
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// The coupling interface of one participant, ready for registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface<F> {
    pub dimension: usize,

    /// Face centres flattened as `[x0, y0, (z0), x1, …]`.
    pub coordinates: Vec<f64>,

    /// Solver-local face IDs, parallel to the coordinate tuples.
    pub face_ids: Vec<F>,
}

impl<F> Interface<F> {
    /// Number of interface vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.face_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.face_ids.is_empty()
    }
}

/// Which extreme of the bounding box an interface lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySide {
    Min,
    Max,
}

/// Selects the boundary faces that belong to the coupling interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceExtractor {
    axis: usize,
    side: BoundarySide,
    tolerance: f64,
}

impl InterfaceExtractor {
    /// Faces whose centre lies on the `side` extreme along `axis`.
    ///
    /// For a 2-D domain with the interface on top this is
    /// `InterfaceExtractor::new(1, BoundarySide::Max)`.
    #[must_use]
    pub fn new(axis: usize, side: BoundarySide) -> Self {
        Self {
            axis,
            side,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    #[must_use]
    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    #[must_use]
    pub fn axis(&self) -> usize {
        self.axis
    }

    #[must_use]
    pub fn side(&self) -> BoundarySide {
        self.side
    }

    /// Collects the interface in the geometry's boundary-face order.
    ///
    /// # Errors
    ///
    /// Returns [`InterfaceError::EmptyInterface`] if no boundary face matches,
    /// or [`InterfaceError::CoordinateLength`] if a face centre does not have
    /// one coordinate per dimension.
    pub fn extract<G: GridGeometry>(
        &self,
        geometry: &G,
    ) -> Result<Interface<G::FaceId>, InterfaceError> {
        let Some(target) = geometry
            .boundary_faces()
            .filter_map(|face| face.center.get(self.axis).copied())
            .reduce(|a, b| match self.side {
                BoundarySide::Min => a.min(b),
                BoundarySide::Max => a.max(b),
            })
        else {
            return Err(InterfaceError::EmptyInterface);
        };

        extract_where(geometry, |center| {
            center
                .get(self.axis)
                .is_some_and(|x| (x - target).abs() <= self.tolerance)
        })
    }
}

/// Collects the boundary faces whose centre satisfies `predicate`.
///
/// # Errors
///
/// Returns [`InterfaceError::EmptyInterface`] if no face matches, or
/// [`InterfaceError::CoordinateLength`] for a malformed face centre.
pub fn extract_where<G, P>(
    geometry: &G,
    predicate: P,
) -> Result<Interface<G::FaceId>, InterfaceError>
where
    G: GridGeometry,
    P: Fn(&[f64]) -> bool,
{
    let dimension = geometry.dimension();
    let mut coordinates = Vec::new();
    let mut face_ids = Vec::new();

    for BoundaryFace { index, center } in geometry.boundary_faces() {
        if center.len() != dimension {
            return Err(InterfaceError::CoordinateLength {
                len: center.len(),
                vertices: 1,
                dimension,
            });
        }
        if predicate(&center) {
            coordinates.extend_from_slice(&center);
            face_ids.push(index);
        }
    }

    if face_ids.is_empty() {
        return Err(InterfaceError::EmptyInterface);
    }

    Ok(Interface {
        dimension,
        coordinates,
        face_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A unit square split into `n × n` cells, boundary faces numbered
    /// bottom, right, top, left.
    struct Square {
        n: usize,
    }

    impl GridGeometry for Square {
        type FaceId = usize;

        fn dimension(&self) -> usize {
            2
        }

        fn num_dofs(&self) -> usize {
            self.n * self.n
        }

        fn boundary_faces(&self) -> impl Iterator<Item = BoundaryFace<usize>> + '_ {
            let h = 1.0 / self.n as f64;
            let mid = move |i: usize| (i as f64 + 0.5) * h;
            let n = self.n;
            (0..4 * n).map(move |k| {
                let i = k % n;
                let center = match k / n {
                    0 => vec![mid(i), 0.0],
                    1 => vec![1.0, mid(i)],
                    2 => vec![mid(i), 1.0],
                    _ => vec![0.0, mid(i)],
                };
                BoundaryFace { index: k, center }
            })
        }
    }

    #[test]
    fn top_side_is_selected_in_boundary_order() {
        let interface = InterfaceExtractor::new(1, BoundarySide::Max)
            .extract(&Square { n: 4 })
            .unwrap();

        assert_eq!(interface.dimension, 2);
        assert_eq!(interface.face_ids, vec![8, 9, 10, 11]);
        assert_eq!(interface.coordinates.len(), 8);
        assert!(interface.coordinates.chunks(2).all(|c| c[1] == 1.0));
    }

    #[test]
    fn extraction_is_deterministic() {
        let square = Square { n: 10 };
        let extractor = InterfaceExtractor::new(0, BoundarySide::Min);
        let first = extractor.extract(&square).unwrap();
        let second = extractor.extract(&square).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn empty_predicate_fails() {
        let err = extract_where(&Square { n: 3 }, |c| c[1] > 2.0).unwrap_err();
        assert_eq!(err, InterfaceError::EmptyInterface);
    }

    #[test]
    fn no_boundary_faces_fails() {
        let err = InterfaceExtractor::new(1, BoundarySide::Max)
            .extract(&Square { n: 0 })
            .unwrap_err();
        assert_eq!(err, InterfaceError::EmptyInterface);
    }
}
