use std::collections::HashMap;

use tandem_core::framework::FaceIndex;

use crate::InterfaceError;

/// Bijection between solver-local face IDs and dense vertex indices.
///
/// The position of a face in the construction sequence becomes its vertex
/// index, so both coupled participants agree on buffer layout as long as the
/// interface is traversed in a deterministic order. The mapping is frozen
/// after construction.
#[derive(Debug, Clone)]
pub struct IndexMapper<F: FaceIndex> {
    locals: Vec<F>,
    indices: HashMap<F, usize>,
}

impl<F: FaceIndex> IndexMapper<F> {
    /// Builds the mapping from faces in vertex-index order.
    ///
    /// # Errors
    ///
    /// Returns [`InterfaceError::DuplicateFace`] if a face appears twice.
    pub fn new(faces: impl IntoIterator<Item = F>) -> Result<Self, InterfaceError> {
        let locals: Vec<F> = faces.into_iter().collect();
        let mut indices = HashMap::with_capacity(locals.len());

        for (index, &face) in locals.iter().enumerate() {
            if indices.insert(face, index).is_some() {
                return Err(InterfaceError::duplicate_face(face));
            }
        }

        Ok(Self { locals, indices })
    }

    /// Returns the vertex index of a face.
    ///
    /// # Errors
    ///
    /// Returns [`InterfaceError::UnknownFace`] if the face is not registered.
    pub fn to_index(&self, face: F) -> Result<usize, InterfaceError> {
        self.indices
            .get(&face)
            .copied()
            .ok_or_else(|| InterfaceError::unknown_face(face))
    }

    /// Returns the face registered at a vertex index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn to_local(&self, index: usize) -> F {
        self.locals[index]
    }

    /// Returns the face registered at a vertex index, if any.
    #[must_use]
    pub fn get_local(&self, index: usize) -> Option<F> {
        self.locals.get(index).copied()
    }

    #[must_use]
    pub fn contains(&self, face: F) -> bool {
        self.indices.contains_key(&face)
    }

    /// Number of registered faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    /// Iterates faces in vertex-index order.
    pub fn faces(&self) -> impl Iterator<Item = F> + '_ {
        self.locals.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_in_both_directions() {
        let faces = [17_usize, 3, 42, 8, 0];
        let mapper = IndexMapper::new(faces).unwrap();

        assert_eq!(mapper.len(), faces.len());
        for face in faces {
            assert_eq!(mapper.to_local(mapper.to_index(face).unwrap()), face);
        }
        for index in 0..mapper.len() {
            assert_eq!(mapper.to_index(mapper.to_local(index)).unwrap(), index);
        }
    }

    #[test]
    fn position_becomes_index() {
        let mapper = IndexMapper::new([30_u32, 10, 20]).unwrap();
        assert_eq!(mapper.to_index(30).unwrap(), 0);
        assert_eq!(mapper.to_index(20).unwrap(), 2);
        assert_eq!(mapper.faces().collect::<Vec<_>>(), vec![30, 10, 20]);
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = IndexMapper::new([1_i64, 2, 1]).unwrap_err();
        assert_eq!(err, InterfaceError::DuplicateFace { face: "1".into() });
    }

    #[test]
    fn unknown_face_fails() {
        let mapper = IndexMapper::new([5_usize, 6]).unwrap();
        assert!(!mapper.contains(7));
        assert_eq!(
            mapper.to_index(7),
            Err(InterfaceError::UnknownFace { face: "7".into() })
        );
        assert_eq!(mapper.get_local(2), None);
    }

    #[test]
    fn empty_mapping_is_allowed() {
        let mapper = IndexMapper::<usize>::new([]).unwrap();
        assert!(mapper.is_empty());
    }
}
