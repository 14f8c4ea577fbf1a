//! Legacy ASCII VTK output of the cell temperature field.
//!
//! Each frame is a `STRUCTURED_POINTS` dataset with the simulated time in a
//! `TIME` field, named `<name>-<index>.vtk` so ParaView groups the frames into
//! a series.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use nalgebra::DVector;
use tandem_core::{as_seconds, framework::VtkWriter};
use thiserror::Error;
use uom::si::f64::Time;

use crate::RectGrid;

#[derive(Debug, Error)]
pub enum VtkError {
    #[error("cannot write VTK frame `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("solution has {got} values, grid has {expected} cells")]
    SizeMismatch { expected: usize, got: usize },
}

/// Writes one legacy VTK file per frame.
#[derive(Debug, Clone)]
pub struct LegacyVtkWriter {
    directory: PathBuf,
    name: String,
    grid: RectGrid,
    frames: Vec<(PathBuf, f64)>,
}

impl LegacyVtkWriter {
    /// Creates the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`VtkError::Io`] if the directory cannot be created.
    pub fn new(
        directory: impl Into<PathBuf>,
        name: impl Into<String>,
        grid: RectGrid,
    ) -> Result<Self, VtkError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| VtkError::Io {
            path: directory.clone(),
            source,
        })?;

        Ok(Self {
            directory,
            name: name.into(),
            grid,
            frames: Vec::new(),
        })
    }

    /// Written frames with their simulated times in seconds.
    #[must_use]
    pub fn frames(&self) -> &[(PathBuf, f64)] {
        &self.frames
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn write_frame(&self, path: &Path, time: f64, solution: &DVector<f64>) -> io::Result<()> {
        let [nx, ny] = self.grid.cells();
        let [x0, y0] = self.grid.lower_left();
        let [dx, dy] = self.grid.spacing();

        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "# vtk DataFile Version 3.0")?;
        writeln!(out, "{} t={time}", self.name)?;
        writeln!(out, "ASCII")?;
        writeln!(out, "DATASET STRUCTURED_POINTS")?;
        writeln!(out, "DIMENSIONS {} {} 1", nx + 1, ny + 1)?;
        writeln!(out, "ORIGIN {x0} {y0} 0")?;
        writeln!(out, "SPACING {dx} {dy} 1")?;
        writeln!(out, "FIELD FieldData 1")?;
        writeln!(out, "TIME 1 1 double")?;
        writeln!(out, "{time}")?;
        writeln!(out, "CELL_DATA {}", solution.len())?;
        writeln!(out, "SCALARS temperature double 1")?;
        writeln!(out, "LOOKUP_TABLE default")?;
        for value in solution.iter() {
            writeln!(out, "{value}")?;
        }
        out.flush()
    }
}

impl VtkWriter<DVector<f64>> for LegacyVtkWriter {
    type Error = VtkError;

    fn write(&mut self, time: Time, solution: &DVector<f64>) -> Result<(), VtkError> {
        let expected = self.grid.num_cells();
        if solution.len() != expected {
            return Err(VtkError::SizeMismatch {
                expected,
                got: solution.len(),
            });
        }

        let time = as_seconds(time);
        let path = self
            .directory
            .join(format!("{}-{:05}.vtk", self.name, self.frames.len()));
        self.write_frame(&path, time, solution)
            .map_err(|source| VtkError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), time, "wrote VTK frame");
        self.frames.push((path, time));
        Ok(())
    }
}
