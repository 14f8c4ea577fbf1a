use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckpointError {
    #[error("no iteration checkpoint has been saved")]
    Empty,
}

/// One snapshot of a participant's primary solution and grid variables.
///
/// Restoring does not consume the snapshot: the substrate may roll back to
/// the same sub-step several times while it iterates. The caller must still
/// rebuild derived state from the restored solution before assembling again.
#[derive(Debug, Clone)]
pub struct CheckpointStore<S, G> {
    snapshot: Option<(S, G)>,
    saves: usize,
    restores: usize,
}

impl<S: Clone, G: Clone> CheckpointStore<S, G> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: None,
            saves: 0,
            restores: 0,
        }
    }

    /// Deep-copies the state, replacing any earlier snapshot.
    pub fn save(&mut self, solution: &S, grid_variables: &G) {
        self.snapshot = Some((solution.clone(), grid_variables.clone()));
        self.saves += 1;
    }

    /// Returns a copy of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Empty`] if nothing was saved.
    pub fn restore(&mut self) -> Result<(S, G), CheckpointError> {
        let snapshot = self.snapshot.clone().ok_or(CheckpointError::Empty)?;
        self.restores += 1;
        Ok(snapshot)
    }

    #[must_use]
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }

    /// Number of snapshots taken.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Number of successful restores.
    #[must_use]
    pub fn restores(&self) -> usize {
        self.restores
    }
}

impl<S: Clone, G: Clone> Default for CheckpointStore<S, G> {
    fn default() -> Self {
        Self::new()
    }
}
