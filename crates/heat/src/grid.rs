use std::{fmt, ops::Range, str::FromStr};

use serde::Deserialize;
use tandem_core::framework::{BoundaryFace, GridGeometry};
use tandem_coupling::{BoundarySide, InterfaceExtractor};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid needs at least one cell per direction, got {nx} x {ny}")]
    NoCells { nx: usize, ny: usize },

    #[error("upper right corner {upper:?} must lie above and right of {lower:?}")]
    InvalidExtent { lower: [f64; 2], upper: [f64; 2] },

    #[error("unknown boundary side `{0}`, expected Bottom, Right, Top, or Left")]
    UnknownSide(String),
}

/// One side of a rectangular domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Side {
    Bottom,
    Right,
    Top,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Bottom, Side::Right, Side::Top, Side::Left];

    /// Selects this side's faces as the coupling interface.
    #[must_use]
    pub fn extractor(self) -> InterfaceExtractor {
        match self {
            Side::Bottom => InterfaceExtractor::new(1, BoundarySide::Min),
            Side::Right => InterfaceExtractor::new(0, BoundarySide::Max),
            Side::Top => InterfaceExtractor::new(1, BoundarySide::Max),
            Side::Left => InterfaceExtractor::new(0, BoundarySide::Min),
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Bottom => 0,
            Side::Right => 1,
            Side::Top => 2,
            Side::Left => 3,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Side {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::ALL
            .into_iter()
            .find(|side| side.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| GridError::UnknownSide(s.to_string()))
    }
}

/// A boundary face resolved to its side and adjacent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryLocation {
    pub side: Side,
    pub cell: usize,
}

/// A uniform 2-D cell-centred grid on an axis-aligned rectangle.
///
/// Cells are numbered row by row from the lower left, `cell = j * nx + i`.
/// Boundary faces are numbered side by side (bottom, right, top, left), each
/// side in increasing coordinate order.
#[derive(Debug, Clone, PartialEq)]
pub struct RectGrid {
    lower_left: [f64; 2],
    upper_right: [f64; 2],
    cells: [usize; 2],
}

impl RectGrid {
    /// # Errors
    ///
    /// Returns a [`GridError`] for an empty or inverted grid.
    pub fn new(
        lower_left: [f64; 2],
        upper_right: [f64; 2],
        cells: [usize; 2],
    ) -> Result<Self, GridError> {
        let [nx, ny] = cells;
        if nx == 0 || ny == 0 {
            return Err(GridError::NoCells { nx, ny });
        }
        let extent_ok = (0..2).all(|d| {
            lower_left[d].is_finite()
                && upper_right[d].is_finite()
                && upper_right[d] > lower_left[d]
        });
        if !extent_ok {
            return Err(GridError::InvalidExtent {
                lower: lower_left,
                upper: upper_right,
            });
        }

        Ok(Self {
            lower_left,
            upper_right,
            cells,
        })
    }

    #[must_use]
    pub fn lower_left(&self) -> [f64; 2] {
        self.lower_left
    }

    #[must_use]
    pub fn cells(&self) -> [usize; 2] {
        self.cells
    }

    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells[0] * self.cells[1]
    }

    /// Cell widths `[dx, dy]`.
    #[must_use]
    pub fn spacing(&self) -> [f64; 2] {
        [0, 1].map(|d| (self.upper_right[d] - self.lower_left[d]) / self.cells[d] as f64)
    }

    #[must_use]
    pub fn cell_volume(&self) -> f64 {
        let [dx, dy] = self.spacing();
        dx * dy
    }

    #[must_use]
    pub fn cell_index(&self, i: usize, j: usize) -> usize {
        j * self.cells[0] + i
    }

    #[must_use]
    pub fn cell_center(&self, cell: usize) -> [f64; 2] {
        let [dx, dy] = self.spacing();
        let (i, j) = (cell % self.cells[0], cell / self.cells[0]);
        [
            self.lower_left[0] + (i as f64 + 0.5) * dx,
            self.lower_left[1] + (j as f64 + 0.5) * dy,
        ]
    }

    /// Number of faces on `side`.
    #[must_use]
    pub fn faces_on(&self, side: Side) -> usize {
        match side {
            Side::Bottom | Side::Top => self.cells[0],
            Side::Right | Side::Left => self.cells[1],
        }
    }

    #[must_use]
    pub fn num_boundary_faces(&self) -> usize {
        2 * (self.cells[0] + self.cells[1])
    }

    /// Resolves a boundary face ID.
    #[must_use]
    pub fn locate(&self, face: usize) -> Option<BoundaryLocation> {
        let [nx, ny] = self.cells;
        let mut offset = 0;
        for side in Side::ALL {
            let count = self.faces_on(side);
            if face < offset + count {
                let k = face - offset;
                let cell = match side {
                    Side::Bottom => self.cell_index(k, 0),
                    Side::Right => self.cell_index(nx - 1, k),
                    Side::Top => self.cell_index(k, ny - 1),
                    Side::Left => self.cell_index(0, k),
                };
                return Some(BoundaryLocation { side, cell });
            }
            offset += count;
        }
        None
    }

    /// Boundary face IDs on `side`, in increasing coordinate order.
    #[must_use]
    pub fn side_faces(&self, side: Side) -> Range<usize> {
        let start: usize = Side::ALL[..side.index()]
            .iter()
            .map(|s| self.faces_on(*s))
            .sum();
        start..start + self.faces_on(side)
    }

    /// Length of a face on `side`.
    #[must_use]
    pub fn face_area(&self, side: Side) -> f64 {
        let [dx, dy] = self.spacing();
        match side {
            Side::Bottom | Side::Top => dx,
            Side::Right | Side::Left => dy,
        }
    }

    /// Distance from a cell centre to its face on `side`.
    #[must_use]
    pub fn half_width(&self, side: Side) -> f64 {
        let [dx, dy] = self.spacing();
        match side {
            Side::Bottom | Side::Top => 0.5 * dy,
            Side::Right | Side::Left => 0.5 * dx,
        }
    }

    fn face_center(&self, location: BoundaryLocation) -> [f64; 2] {
        let [x, y] = self.cell_center(location.cell);
        match location.side {
            Side::Bottom => [x, self.lower_left[1]],
            Side::Right => [self.upper_right[0], y],
            Side::Top => [x, self.upper_right[1]],
            Side::Left => [self.lower_left[0], y],
        }
    }

    /// Interior neighbours of a cell with the face area and centre distance
    /// to each.
    pub(crate) fn neighbors(&self, cell: usize) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        let [nx, ny] = self.cells;
        let [dx, dy] = self.spacing();
        let (i, j) = (cell % nx, cell / nx);

        [
            (i > 0).then(|| (cell - 1, dy, dx)),
            (i + 1 < nx).then(|| (cell + 1, dy, dx)),
            (j > 0).then(|| (cell - nx, dx, dy)),
            (j + 1 < ny).then(|| (cell + nx, dx, dy)),
        ]
        .into_iter()
        .flatten()
    }
}

impl GridGeometry for RectGrid {
    type FaceId = usize;

    fn dimension(&self) -> usize {
        2
    }

    fn num_dofs(&self) -> usize {
        self.num_cells()
    }

    fn boundary_faces(&self) -> impl Iterator<Item = BoundaryFace<usize>> + '_ {
        (0..self.num_boundary_faces()).filter_map(|index| {
            let location = self.locate(index)?;
            Some(BoundaryFace {
                index,
                center: self.face_center(location).to_vec(),
            })
        })
    }
}
