//! Cross-line solving: one tracker per row and per column over a shared
//! cell grid, combined into per-cell verdicts and forced-move solving.

mod cornering;

use crate::automaton::LineAutomaton;
use crate::tracker::LineTracker;
use crate::{Puzzle, SpecError};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::debug;

pub use cornering::{CorneringSolver, Implication};

/// Verdict for one cell, combining row and column evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    /// The cell already carries a committed color.
    Solved,
    /// No color is consistent with both axes. Reachable only by manual
    /// toying; never raised as an error.
    Error,
    /// Both axes rule out blank.
    Black,
    /// Both axes rule out every fill color.
    White,
    /// Still ambiguous.
    Unsolved,
}

impl std::fmt::Display for CellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellStatus::Solved => write!(f, "solved"),
            CellStatus::Error => write!(f, "error"),
            CellStatus::Black => write!(f, "black"),
            CellStatus::White => write!(f, "white"),
            CellStatus::Unsolved => write!(f, "unsolved"),
        }
    }
}

/// Full per-cell report for a front-end: verdict, blended confidence that
/// the cell is filled, and both axes' per-color score vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellReport {
    pub code: CellStatus,
    /// `None` exactly when the cell is in contradiction (both products
    /// zero); check `code` first.
    pub score: Option<f64>,
    pub row_colors: Vec<f64>,
    pub col_colors: Vec<f64>,
}

/// Couples a row tracker and a column tracker per line over one puzzle
/// grid. The sole owner of cell colors: every mutation funnels through
/// [`GridTracker::set_color`].
pub struct GridTracker {
    puzzle: Puzzle,
    color_count: usize,
    row_trackers: Vec<LineTracker>,
    col_trackers: Vec<LineTracker>,
}

impl GridTracker {
    /// Build trackers for every row and column of `puzzle`.
    pub fn new(puzzle: Puzzle) -> Result<Self, SpecError> {
        let color_count = puzzle.spec().color_count();
        let row_trackers = puzzle
            .spec()
            .row_specs()
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let automaton = Rc::new(LineAutomaton::build(spec)?);
                Ok(LineTracker::new(automaton, color_count, &puzzle.row_colors(i)))
            })
            .collect::<Result<Vec<_>, SpecError>>()?;
        let col_trackers = puzzle
            .spec()
            .col_specs()
            .iter()
            .enumerate()
            .map(|(j, spec)| {
                let automaton = Rc::new(LineAutomaton::build(spec)?);
                Ok(LineTracker::new(automaton, color_count, &puzzle.col_colors(j)))
            })
            .collect::<Result<Vec<_>, SpecError>>()?;
        Ok(GridTracker {
            puzzle,
            color_count,
            row_trackers,
            col_trackers,
        })
    }

    /// Parse a puzzle spec text and build its tracker.
    pub fn from_string(text: &str) -> Result<Self, SpecError> {
        GridTracker::new(Puzzle::from_string(text)?)
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn height(&self) -> usize {
        self.puzzle.height()
    }

    pub fn width(&self) -> usize {
        self.puzzle.width()
    }

    /// Commit, clear, or reject a cell color. Committing pushes the color
    /// into both axis trackers; clearing resets both whole lines (the
    /// correctness-safe path, since tracker state never grows back).
    /// Re-coloring a committed cell without clearing it first is rejected:
    /// committed cells change only via reset.
    ///
    /// Returns whether anything changed.
    pub fn set_color(&mut self, i: usize, j: usize, color: Option<u8>) -> bool {
        if color == self.puzzle.color(i, j) {
            return false;
        }
        match color {
            Some(color) => {
                if self.puzzle.color(i, j).is_some() {
                    debug!(i, j, color, "rejected recolor of committed cell");
                    return false;
                }
                self.puzzle.set_color(i, j, Some(color));
                self.row_trackers[i].set_color(j, color);
                self.col_trackers[j].set_color(i, color);
            }
            None => {
                self.puzzle.set_color(i, j, None);
                self.row_trackers[i].reset(&self.puzzle.row_colors(i));
                self.col_trackers[j].reset(&self.puzzle.col_colors(j));
                debug!(i, j, "cleared cell; row and column trackers reset");
            }
        }
        true
    }

    /// Color-wise products of the two axes' possible-state counts.
    fn joint_counts(&self, i: usize, j: usize) -> Vec<u64> {
        let row = self.row_trackers[i].color_counts(j);
        let col = self.col_trackers[j].color_counts(i);
        (0..self.color_count)
            .map(|c| row[c] as u64 * col[c] as u64)
            .collect()
    }

    pub fn status_code(&self, i: usize, j: usize) -> CellStatus {
        if self.puzzle.color(i, j).is_some() {
            return CellStatus::Solved;
        }
        let joint = self.joint_counts(i, j);
        let empty = joint[0];
        let filled: u64 = joint[1..].iter().sum();
        if empty == 0 && filled == 0 {
            CellStatus::Error
        } else if empty == 0 {
            CellStatus::Black
        } else if filled == 0 {
            CellStatus::White
        } else {
            CellStatus::Unsolved
        }
    }

    /// Blended confidence in `[0, 1]` that the cell is filled. `None` when
    /// both products vanish (the `Error` status).
    pub fn score(&self, i: usize, j: usize) -> Option<f64> {
        let row = self.row_trackers[i].color_scores(j);
        let col = self.col_trackers[j].color_scores(i);
        let empty = row[0] * col[0];
        let filled: f64 = (1..self.color_count).map(|c| row[c] * col[c]).sum();
        if filled + empty == 0.0 {
            return None;
        }
        Some((1.0 + (filled - empty) / (filled + empty)) / 2.0)
    }

    pub fn get_status(&self, i: usize, j: usize) -> CellReport {
        CellReport {
            code: self.status_code(i, j),
            score: self.score(i, j),
            row_colors: self.row_trackers[i].color_scores(j),
            col_colors: self.col_trackers[j].color_scores(i),
        }
    }

    /// The single color both axes still admit, if there is exactly one.
    fn forced_color(&self, i: usize, j: usize) -> Option<u8> {
        let joint = self.joint_counts(i, j);
        let mut forced = None;
        for (color, &n) in joint.iter().enumerate() {
            if n > 0 {
                if forced.is_some() {
                    return None;
                }
                forced = Some(color as u8);
            }
        }
        forced
    }

    /// Commit the cell if its verdict is certain. Returns whether it did.
    pub fn try_solve(&mut self, i: usize, j: usize) -> bool {
        if self.puzzle.color(i, j).is_some() {
            return false;
        }
        match self.forced_color(i, j) {
            Some(color) => self.set_color(i, j, Some(color)),
            None => false,
        }
    }

    /// One forced-move sweep over every cell, in row-major order. Exactly
    /// one pass; commits made early in the pass can unlock cells later in
    /// the same pass but the sweep is not repeated. Returns the number of
    /// cells committed.
    pub fn try_solve_all(&mut self) -> usize {
        let mut solved = 0;
        for i in 0..self.height() {
            for j in 0..self.width() {
                if self.try_solve(i, j) {
                    solved += 1;
                }
            }
        }
        debug!(solved, "forced-move sweep finished");
        solved
    }

    /// Repeat sweeps until one commits nothing. Returns the total number of
    /// cells committed.
    pub fn solve_to_fixpoint(&mut self) -> usize {
        let mut total = 0;
        loop {
            let solved = self.try_solve_all();
            if solved == 0 {
                return total;
            }
            total += solved;
        }
    }

    /// Clear every cell and rebuild all trackers from the bare spec.
    pub fn reset_from_spec(&mut self) {
        self.puzzle.clear();
        for (i, tracker) in self.row_trackers.iter_mut().enumerate() {
            tracker.reset(&self.puzzle.row_colors(i));
        }
        for (j, tracker) in self.col_trackers.iter_mut().enumerate() {
            tracker.reset(&self.puzzle.col_colors(j));
        }
        debug!("grid reset from spec");
    }

    pub fn is_complete(&self) -> bool {
        (0..self.height()).all(|i| (0..self.width()).all(|j| self.puzzle.color(i, j).is_some()))
    }

    /// Direct consequences of hypothetically committing `(i, j)` to
    /// `color`: the union of both axes' line-level implications.
    pub fn direct_implications(&self, i: usize, j: usize, color: u8) -> Vec<Implication> {
        let row_colors = self.puzzle.row_colors(i);
        let col_colors = self.puzzle.col_colors(j);
        let mut implied: Vec<Implication> = self.row_trackers[i]
            .direct_implications(&row_colors, j, color)
            .into_iter()
            .map(|(cell, color)| Implication { i, j: cell, color })
            .collect();
        implied.extend(
            self.col_trackers[j]
                .direct_implications(&col_colors, i, color)
                .into_iter()
                .map(|(cell, color)| Implication { i: cell, j, color }),
        );
        implied
    }

    /// Per-candidate-color implication lists for an undetermined cell;
    /// empty for a committed one.
    pub fn assignments_direct_implications(&self, i: usize, j: usize) -> Vec<Vec<Implication>> {
        if self.puzzle.color(i, j).is_some() {
            return Vec::new();
        }
        (0..self.color_count)
            .map(|c| self.direct_implications(i, j, c as u8))
            .collect()
    }

    /// Implication lists for every cell and candidate color.
    pub fn all_direct_implications(&self) -> Vec<Vec<Vec<Vec<Implication>>>> {
        (0..self.height())
            .map(|i| {
                (0..self.width())
                    .map(|j| self.assignments_direct_implications(i, j))
                    .collect()
            })
            .collect()
    }

    /// Snapshot the current hypothesis graph for two-step contradiction
    /// analysis.
    pub fn cornering_solver(&self) -> CorneringSolver {
        CorneringSolver::new(
            self.height(),
            self.width(),
            self.color_count,
            self.all_direct_implications(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RING: &str = "Ring;4,1.1,1.1,4;4,1.1,1.1,4";
    const DIAMOND: &str = ";1,1.1,1.1,1;1,1.1,1.1,1";

    fn statuses(tracker: &GridTracker) -> Vec<CellStatus> {
        (0..tracker.height())
            .flat_map(|i| (0..tracker.width()).map(move |j| (i, j)))
            .map(|(i, j)| tracker.status_code(i, j))
            .collect()
    }

    #[test]
    fn test_ring_solves_to_fixpoint() {
        let mut tracker = GridTracker::from_string(RING).unwrap();
        let solved = tracker.solve_to_fixpoint();
        assert_eq!(solved, 16);
        assert!(tracker.is_complete());
        assert!(statuses(&tracker).iter().all(|&s| s == CellStatus::Solved));
        let expected = [
            [1, 1, 1, 1],
            [1, 0, 0, 1],
            [1, 0, 0, 1],
            [1, 1, 1, 1],
        ];
        for (i, row) in expected.iter().enumerate() {
            for (j, &color) in row.iter().enumerate() {
                assert_eq!(tracker.puzzle().color(i, j), Some(color), "cell ({},{})", i, j);
            }
        }
    }

    #[test]
    fn test_try_solve_all_is_a_single_sweep() {
        let mut tracker = GridTracker::from_string(RING).unwrap();
        // One sweep leaves a cell whose column evidence only lands after the
        // sweep has passed it.
        tracker.try_solve_all();
        assert!(!tracker.is_complete());
        tracker.try_solve_all();
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_underconstrained_puzzle_makes_no_progress_and_no_errors() {
        // Two valid fillings exist, so local certainty never appears.
        let mut tracker = GridTracker::from_string(DIAMOND).unwrap();
        assert_eq!(tracker.solve_to_fixpoint(), 0);
        assert!(statuses(&tracker)
            .iter()
            .all(|&s| s == CellStatus::Unsolved));
    }

    #[test]
    fn test_recolor_of_committed_cell_is_rejected() {
        let mut tracker = GridTracker::from_string(DIAMOND).unwrap();
        assert!(tracker.set_color(0, 0, Some(1)));
        assert!(!tracker.set_color(0, 0, Some(0)));
        assert_eq!(tracker.puzzle().color(0, 0), Some(1));
        assert!(!tracker.set_color(0, 0, Some(1)));
        // Clearing reopens the cell.
        assert!(tracker.set_color(0, 0, None));
        assert!(tracker.set_color(0, 0, Some(0)));
        assert_eq!(tracker.puzzle().color(0, 0), Some(0));
    }

    #[test]
    fn test_clearing_a_cell_restores_tracker_state() {
        let mut tracker = GridTracker::from_string(DIAMOND).unwrap();
        let before = statuses(&tracker);
        tracker.set_color(1, 1, Some(1));
        tracker.set_color(1, 1, None);
        assert_eq!(statuses(&tracker), before);
    }

    #[test]
    fn test_manual_toying_surfaces_error_status() {
        // One row "1" over columns "1" and "": filling the blank column's
        // cell strands the other cell with no consistent color.
        let mut tracker = GridTracker::from_string(";1;1,").unwrap();
        assert!(tracker.set_color(0, 1, Some(1)));
        assert_eq!(tracker.status_code(0, 0), CellStatus::Error);
        assert_eq!(tracker.score(0, 0), None);
        assert_eq!(tracker.get_status(0, 0).score, None);
    }

    #[test]
    fn test_status_codes_combine_both_axes() {
        let tracker = GridTracker::from_string(RING).unwrap();
        // Border cells are forced by their "4" line before anything is
        // committed; the inner cells stay open.
        assert_eq!(tracker.status_code(0, 0), CellStatus::Black);
        assert_eq!(tracker.status_code(0, 2), CellStatus::Black);
        assert_eq!(tracker.status_code(1, 1), CellStatus::Unsolved);
    }

    #[test]
    fn test_score_is_symmetric_for_balanced_evidence() {
        let tracker = GridTracker::from_string(";1,1;1,1").unwrap();
        assert_eq!(tracker.score(0, 0), Some(0.5));
    }

    #[test]
    fn test_reset_from_spec_clears_everything() {
        let mut tracker = GridTracker::from_string(RING).unwrap();
        tracker.solve_to_fixpoint();
        assert!(tracker.is_complete());
        tracker.reset_from_spec();
        assert!(!tracker.is_complete());
        assert_eq!(tracker.status_code(1, 1), CellStatus::Unsolved);
        // Solving again reaches the same fixed point.
        let mut again = GridTracker::from_string(RING).unwrap();
        again.solve_to_fixpoint();
        tracker.solve_to_fixpoint();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(tracker.puzzle().color(i, j), again.puzzle().color(i, j));
            }
        }
    }

    #[test]
    fn test_status_report_serializes_with_lowercase_codes() {
        let tracker = GridTracker::from_string(RING).unwrap();
        let report = tracker.get_status(1, 1);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"code\":\"unsolved\""), "got {}", json);
        let back: CellReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, CellStatus::Unsolved);
    }
}
