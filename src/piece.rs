/*!
This module implements the board cell and the piece aggregate deriving its
cells from a pivot and a rotation state.
*/

use crate::{Coord, Shape};

/// A single occupied board position with a display color.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Where the cell sits on the grid. Rows above the visible field are
    /// negative.
    pub position: Coord,
    /// Color string consumed verbatim by a renderer.
    pub color: String,
}

/// A tetromino in play: a pivot, one rotation state, a color, and the four
/// cells derived from them.
///
/// Invariant: `cells()[i].position == pivot + shape[i]` for every `i`. The
/// mutators below re-derive all four cells in one step, so the aggregate is
/// never observable in a half-updated state.
///
/// A piece is a passive geometry holder: it does not validate placements.
/// Legality is the rule set's and the game's concern.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    pivot: Coord,
    shape: Shape,
    color: String,
    cells: [Cell; 4],
}

impl Piece {
    /// Creates a piece and derives its cells from `pivot + shape[i]`.
    pub fn new(pivot: Coord, shape: Shape, color: impl Into<String>) -> Self {
        let color = color.into();
        let cells = Self::project(pivot, &shape).map(|position| Cell {
            position,
            color: color.clone(),
        });
        Self {
            pivot,
            shape,
            color,
            cells,
        }
    }

    /// Computes the absolute coordinates `pivot + shape[i]` without building
    /// a piece.
    pub fn project(pivot: Coord, shape: &Shape) -> [Coord; 4] {
        shape.map(|(dx, dy)| (pivot.0 + dx, pivot.1 + dy))
    }

    /// The reference coordinate the shape offsets are relative to.
    pub const fn pivot(&self) -> Coord {
        self.pivot
    }

    /// The current rotation state.
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// The piece's color string.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Read accessor for the derived cells, in shape order.
    pub const fn cells(&self) -> &[Cell; 4] {
        &self.cells
    }

    /// The absolute coordinates currently covered by the piece.
    pub fn coordinates(&self) -> [Coord; 4] {
        Self::project(self.pivot, &self.shape)
    }

    /// Moves the pivot and re-derives every cell in one step.
    pub fn recenter(&mut self, pivot: Coord) {
        self.pivot = pivot;
        self.refresh();
    }

    /// Replaces the rotation state and re-derives every cell in one step.
    pub fn reshape(&mut self, shape: Shape) {
        self.shape = shape;
        self.refresh();
    }

    /// Recolors the piece and all of its cells in one step.
    pub fn recolor(&mut self, color: impl Into<String>) {
        self.color = color.into();
        self.refresh();
    }

    /// Releases the cells, discarding the aggregate. Used when a piece locks
    /// into the field.
    pub(crate) fn into_cells(self) -> [Cell; 4] {
        self.cells
    }

    fn refresh(&mut self) {
        let coordinates = Self::project(self.pivot, &self.shape);
        let color = self.color.clone();
        for (cell, position) in self.cells.iter_mut().zip(coordinates) {
            cell.position = position;
            cell.color.clone_from(&color);
        }
    }
}
