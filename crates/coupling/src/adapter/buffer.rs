use tandem_core::Quantity;

use crate::CouplingError;

/// Densely indexed values of one quantity on the interface vertices.
///
/// Layout follows the index mapper: values for vertex `i` occupy
/// `values[i * components..(i + 1) * components]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceBuffer {
    quantity: Quantity,
    components: usize,
    values: Vec<f64>,
}

impl SurfaceBuffer {
    /// Creates a zero-filled buffer for `vertices` vertices in `dimension`-D.
    #[must_use]
    pub fn new(quantity: Quantity, vertices: usize, dimension: usize) -> Self {
        let components = quantity.components(dimension);
        Self {
            quantity,
            components,
            values: vec![0.0; vertices * components],
        }
    }

    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Values per vertex.
    #[must_use]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.components
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The flat value array exchanged with the substrate.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Values of the vertex at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn get(&self, index: usize) -> &[f64] {
        let start = index * self.components;
        &self.values[start..start + self.components]
    }

    /// Overwrites the values of the vertex at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::ComponentMismatch`] if `values` does not hold
    /// exactly one value per component.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn set(&mut self, index: usize, values: &[f64]) -> Result<(), CouplingError> {
        if values.len() != self.components {
            return Err(CouplingError::ComponentMismatch {
                quantity: self.quantity,
                expected: self.components,
                got: values.len(),
            });
        }
        let start = index * self.components;
        self.values[start..start + self.components].copy_from_slice(values);
        Ok(())
    }
}
