/*!
This module holds the constant tetromino rotation tables and the random draws
over them.
*/

use rand::Rng;

use crate::{Shape, Tetromino};

/// One tetromino family: four successive 90°-clockwise rotation states,
/// indexed `0..=3` and cyclic (index 4 wraps to 0).
pub type ShapeFamily = [Shape; 4];

// Offsets are relative to the pivot, x to the right, y downward. The O family
// repeats one state four times; it has no visual rotation.
#[rustfmt::skip]
const STANDARD_FAMILIES: [ShapeFamily; 7] = [
    // I
    [
        [(-1,  0), ( 0,  0), ( 1,  0), ( 2,  0)],
        [( 0, -1), ( 0,  0), ( 0,  1), ( 0,  2)],
        [( 1,  0), ( 0,  0), (-1,  0), (-2,  0)],
        [( 0,  1), ( 0,  0), ( 0, -1), ( 0, -2)],
    ],
    // J
    [
        [(-1,  0), ( 0,  0), ( 1,  0), ( 1, -1)],
        [( 0, -1), ( 0,  0), ( 0,  1), ( 1,  1)],
        [( 1,  0), ( 0,  0), (-1,  0), (-1,  1)],
        [( 0,  1), ( 0,  0), ( 0, -1), (-1, -1)],
    ],
    // L
    [
        [(-1,  0), ( 0,  0), ( 1,  0), (-1,  1)],
        [( 0, -1), ( 0,  0), ( 0,  1), (-1, -1)],
        [( 1,  0), ( 0,  0), (-1,  0), ( 1, -1)],
        [( 0,  1), ( 0,  0), ( 0, -1), ( 1,  1)],
    ],
    // O
    [
        [( 0,  0), ( 1,  0), ( 0,  1), ( 1,  1)],
        [( 0,  0), ( 1,  0), ( 0,  1), ( 1,  1)],
        [( 0,  0), ( 1,  0), ( 0,  1), ( 1,  1)],
        [( 0,  0), ( 1,  0), ( 0,  1), ( 1,  1)],
    ],
    // S
    [
        [( 1,  0), ( 0,  0), ( 0,  1), (-1,  1)],
        [( 0,  1), ( 0,  0), (-1,  0), (-1, -1)],
        [(-1,  0), ( 0,  0), ( 0, -1), ( 1, -1)],
        [( 0, -1), ( 0,  0), ( 1,  0), ( 1,  1)],
    ],
    // T
    [
        [(-1,  0), ( 0,  0), ( 1,  0), ( 0,  1)],
        [( 0, -1), ( 0,  0), ( 0,  1), (-1,  0)],
        [( 1,  0), ( 0,  0), (-1,  0), ( 0, -1)],
        [( 0,  1), ( 0,  0), ( 0, -1), ( 1,  0)],
    ],
    // Z
    [
        [( 1,  0), ( 0,  0), ( 0, -1), (-1, -1)],
        [( 0,  1), ( 0,  0), ( 1,  0), ( 1, -1)],
        [(-1,  0), ( 0,  0), ( 0,  1), ( 1,  1)],
        [( 0, -1), ( 0,  0), (-1,  0), (-1,  1)],
    ],
];

/// Lookup handle over the rotation-state tables of all seven tetromino
/// families.
///
/// The standard tables are process-wide constant data; games receive a
/// catalog at construction so a substitute table can be injected for testing.
#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub struct ShapeCatalog {
    families: &'static [ShapeFamily; 7],
}

impl Default for ShapeCatalog {
    fn default() -> Self {
        Self {
            families: &STANDARD_FAMILIES,
        }
    }
}

impl ShapeCatalog {
    /// A catalog backed by a caller-provided table.
    pub const fn from_families(families: &'static [ShapeFamily; 7]) -> Self {
        Self { families }
    }

    /// The four clockwise rotation states of `kind`.
    pub const fn family(&self, kind: Tetromino) -> &'static ShapeFamily {
        &self.families[kind as usize]
    }

    /// The spawn-orientation (index 0) state of `kind`.
    pub const fn initial_shape(&self, kind: Tetromino) -> Shape {
        self.families[kind as usize][0]
    }

    /// Draws a shape uniformly: first over the seven families, then over the
    /// four rotation states of the drawn family.
    pub fn random_shape<R: Rng>(&self, rng: &mut R) -> Shape {
        let family = &self.families[rng.random_range(0..self.families.len())];
        family[rng.random_range(0..family.len())]
    }

    /// Draws a family uniformly and returns its spawn-orientation state.
    pub fn random_initial_shape<R: Rng>(&self, rng: &mut R) -> Shape {
        self.families[rng.random_range(0..self.families.len())][0]
    }

    /// The family state following `shape` in clockwise order, found by
    /// walking the tables.
    ///
    /// Returns `None` for a shape that appears in no family.
    pub fn successor(&self, shape: &Shape) -> Option<Shape> {
        self.families.iter().find_map(|family| {
            family
                .iter()
                .position(|state| state == shape)
                .map(|index| family[(index + 1) % family.len()])
        })
    }
}

/// Maps each offset `(x, y)` to `(-y, x)`: one 90° clockwise turn around the
/// pivot.
///
/// Pure geometric helper; in-play rotation walks the precomputed family
/// tables instead.
pub fn rotated_clockwise(shape: Shape) -> Shape {
    shape.map(|(x, y)| (-y, x))
}

/// Maps each offset `(x, y)` to `(y, -x)`: one 90° counterclockwise turn
/// around the pivot.
pub fn rotated_counterclockwise(shape: Shape) -> Shape {
    shape.map(|(x, y)| (y, -x))
}
