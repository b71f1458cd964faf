//! Picross (nonogram) solving engine.
//!
//! A puzzle is a grid whose rows and columns each carry a specification of
//! contiguous colored run lengths. The engine compiles every line spec into
//! a small finite automaton ([`LineAutomaton`]), tracks which automaton
//! states remain possible per cell as colors are committed
//! ([`LineTracker`]), crosses row and column evidence into per-cell
//! verdicts and forced moves ([`GridTracker`]), and analyses hypothetical
//! assignments for two-step contradictions ([`CorneringSolver`]).
//!
//! Colors are small integers: 0 is blank, anything above is a fill color
//! (1 in the classic two-color game). An unset cell is `None`, distinct
//! from a committed blank `Some(0)`.

mod automaton;
mod generator;
mod solver;
mod spec;
mod tracker;

pub use automaton::LineAutomaton;
pub use generator::{Generator, GeneratorConfig};
pub use solver::{CellReport, CellStatus, CorneringSolver, GridTracker, Implication};
pub use spec::{Block, LineSpec, PuzzleSpec};
pub use tracker::LineTracker;

use serde::{Deserialize, Serialize};

/// Construction-time validation failure. Run-time contradictions are not
/// errors; they surface as [`CellStatus::Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("could not parse {text:?} into a specification block")]
    BadBlock { text: String },

    #[error("specification {spec:?} does not fit (minimum size {min_size} exceeds {size})")]
    DoesNotFit {
        spec: String,
        min_size: usize,
        size: usize,
    },

    #[error("specification {spec:?} too long for a line of {size} cells (no state can occupy cell {cell})")]
    WindowEmpty {
        spec: String,
        cell: usize,
        size: usize,
    },

    #[error("expected `<title?>;<row specs>;<col specs>`, got {text:?}")]
    Malformed { text: String },

    #[error("grid of {height}x{width} cells is not a valid puzzle shape")]
    BadDump { height: usize, width: usize },
}

/// A validated specification plus the grid of committed cell colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    spec: PuzzleSpec,
    grid: Vec<Vec<Option<u8>>>,
}

impl Puzzle {
    /// Wrap a spec with an all-unset grid, validating that every line's
    /// automaton can be built.
    pub fn new(spec: PuzzleSpec) -> Result<Self, SpecError> {
        for line in spec.row_specs().iter().chain(spec.col_specs()) {
            LineAutomaton::build(line)?;
        }
        let grid = vec![vec![None; spec.width()]; spec.height()];
        Ok(Puzzle { spec, grid })
    }

    /// Parse a puzzle spec text and wrap it.
    pub fn from_string(text: &str) -> Result<Self, SpecError> {
        Puzzle::new(PuzzleSpec::parse(text)?)
    }

    pub fn spec(&self) -> &PuzzleSpec {
        &self.spec
    }

    pub fn height(&self) -> usize {
        self.spec.height()
    }

    pub fn width(&self) -> usize {
        self.spec.width()
    }

    pub fn color(&self, i: usize, j: usize) -> Option<u8> {
        self.grid[i][j]
    }

    pub(crate) fn set_color(&mut self, i: usize, j: usize, color: Option<u8>) {
        self.grid[i][j] = color;
    }

    /// Clear every committed color.
    pub(crate) fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(None);
        }
    }

    /// Committed colors of row `i`, left to right.
    pub fn row_colors(&self, i: usize) -> Vec<Option<u8>> {
        self.grid[i].clone()
    }

    /// Committed colors of column `j`, top to bottom.
    pub fn col_colors(&self, j: usize) -> Vec<Option<u8>> {
        self.grid.iter().map(|row| row[j]).collect()
    }

    /// Snapshot the grid as a dump, mapping unset cells to blank.
    pub fn dump(&self) -> GridDump {
        GridDump {
            height: self.height(),
            width: self.width(),
            rows: self
                .grid
                .iter()
                .map(|row| row.iter().map(|c| c.unwrap_or(0)).collect())
                .collect(),
        }
    }
}

/// Plain grid-of-colors interchange format (0 = blank), the JSON shape the
/// companion editor copies to and pastes from the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDump {
    pub height: usize,
    pub width: usize,
    pub rows: Vec<Vec<u8>>,
}

impl GridDump {
    /// Derive the specification of the drawn grid.
    pub fn to_spec(&self, title: Option<String>) -> Result<PuzzleSpec, SpecError> {
        if self.rows.len() != self.height || self.rows.iter().any(|r| r.len() != self.width) {
            return Err(SpecError::BadDump {
                height: self.height,
                width: self.width,
            });
        }
        PuzzleSpec::from_grid(title, &self.rows)
    }
}
