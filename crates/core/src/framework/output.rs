use uom::si::f64::Time;

/// Writes a solution frame for visualization.
pub trait VtkWriter<S> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one frame labelled with `time`.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    fn write(&mut self, time: Time, solution: &S) -> Result<(), Self::Error>;
}
