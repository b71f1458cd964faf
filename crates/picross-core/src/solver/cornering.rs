//! Two-step implication analysis over (cell, color) hypotheses.
//!
//! Every undetermined cell contributes one hypothesis per candidate color.
//! Each hypothesis carries its direct implications; chasing those one level
//! further gives a depth-2 closure. A hypothesis whose depth-2 set forces
//! the same cell to two colors cannot hold. Deeper chains are deliberately
//! not explored; the analysis stays bounded and reports rather than
//! commits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A cell forced to a color as a consequence of some hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Implication {
    pub i: usize,
    pub j: usize,
    pub color: u8,
}

/// Snapshot of the hypothesis graph for one grid state.
pub struct CorneringSolver {
    width: usize,
    color_count: usize,
    /// Keys of live hypotheses (undetermined cells only), ascending.
    keys: Vec<usize>,
    /// Implication key lists indexed by hypothesis key; `None` for
    /// hypotheses on committed cells.
    implications: Vec<Option<Vec<usize>>>,
}

impl CorneringSolver {
    pub(crate) fn new(
        height: usize,
        width: usize,
        color_count: usize,
        all: Vec<Vec<Vec<Vec<Implication>>>>,
    ) -> Self {
        let mut keys = Vec::new();
        let mut implications = vec![None; height * width * color_count];
        for (i, row) in all.iter().enumerate() {
            for (j, per_color) in row.iter().enumerate() {
                // Committed cells carry no hypothesis lists.
                for (c, implied) in per_color.iter().enumerate() {
                    let key = (i * width + j) * color_count + c;
                    keys.push(key);
                    implications[key] = Some(
                        implied
                            .iter()
                            .map(|imp| (imp.i * width + imp.j) * color_count + imp.color as usize)
                            .collect(),
                    );
                }
            }
        }
        CorneringSolver {
            width,
            color_count,
            keys,
            implications,
        }
    }

    /// Hypotheses under analysis, as `(cell, color)` triples.
    pub fn hypotheses(&self) -> Vec<Implication> {
        self.keys.iter().map(|&k| self.triplet(k)).collect()
    }

    fn pos(&self, key: usize) -> usize {
        key / self.color_count
    }

    fn triplet(&self, key: usize) -> Implication {
        let pos = self.pos(key);
        Implication {
            i: pos / self.width,
            j: pos % self.width,
            color: (key % self.color_count) as u8,
        }
    }

    /// Hypothesis pairs that cannot both hold: for every hypothesis whose
    /// depth-2 implication set pins one cell to two different colors, the
    /// hypothesis is paired with the first colliding implication.
    pub fn two_steps_impossible(&self) -> Vec<(Implication, Implication)> {
        // steps1[k] = {k} ∪ direct implications of k.
        let steps1: Vec<Option<BTreeSet<usize>>> = self
            .implications
            .iter()
            .enumerate()
            .map(|(key, implied)| {
                implied.as_ref().map(|implied| {
                    let mut set: BTreeSet<usize> = implied.iter().copied().collect();
                    set.insert(key);
                    set
                })
            })
            .collect();
        // steps2[k] = union of steps1 over every member of steps1[k].
        let steps2: Vec<Option<BTreeSet<usize>>> = steps1
            .iter()
            .map(|step| {
                step.as_ref().map(|members| {
                    let mut union = BTreeSet::new();
                    for &member in members {
                        if let Some(reached) = &steps1[member] {
                            union.extend(reached.iter().copied());
                        }
                    }
                    union
                })
            })
            .collect();

        let mut conflicts = Vec::new();
        for &key in &self.keys {
            let Some(reached) = &steps2[key] else { continue };
            let reached: Vec<usize> = reached.iter().copied().collect();
            for pair in reached.windows(2) {
                if self.pos(pair[0]) == self.pos(pair[1]) {
                    conflicts.push((self.triplet(key), self.triplet(pair[0])));
                }
            }
        }
        debug!(conflicts = conflicts.len(), "two-step contradiction scan");
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::GridTracker;

    #[test]
    fn test_key_round_trip() {
        let tracker = GridTracker::from_string(";1,1;1,1").unwrap();
        let solver = tracker.cornering_solver();
        for hyp in solver.hypotheses() {
            let key = (hyp.i * solver.width + hyp.j) * solver.color_count + hyp.color as usize;
            assert_eq!(solver.triplet(key), hyp);
        }
    }

    #[test]
    fn test_committed_cells_carry_no_hypotheses() {
        let mut tracker = GridTracker::from_string(";1,1;1,1").unwrap();
        tracker.set_color(0, 0, Some(1));
        let solver = tracker.cornering_solver();
        assert!(solver
            .hypotheses()
            .iter()
            .all(|h| !(h.i == 0 && h.j == 0)));
        // Three open cells, two candidate colors each.
        assert_eq!(solver.hypotheses().len(), 6);
    }

    #[test]
    fn test_consistent_hypotheses_do_not_corner() {
        // Two-solution puzzle: assuming either color anywhere stays
        // consistent two steps out.
        let tracker = GridTracker::from_string(";1,1;1,1").unwrap();
        let conflicts = tracker.cornering_solver().two_steps_impossible();
        assert_eq!(conflicts, vec![]);
    }

    #[test]
    fn test_colliding_chains_are_reported() {
        // Assuming (0,0) filled forces (0,1) blank along the top row, and
        // (1,0) blank down the left column. One step further, the blank at
        // (0,1) forces (1,1) filled through the "2" column, while the blank
        // at (1,0) forces (1,1) blank through the empty middle row. Both
        // chains meet at (1,1) with opposite colors.
        let tracker = GridTracker::from_string(";1,,1;1,2,1").unwrap();
        let conflicts = tracker.cornering_solver().two_steps_impossible();
        let hypothesis = Implication { i: 0, j: 0, color: 1 };
        let colliding: Vec<_> = conflicts
            .iter()
            .filter(|(hyp, _)| *hyp == hypothesis)
            .collect();
        assert!(
            colliding.iter().any(|(_, imp)| imp.i == 1 && imp.j == 1),
            "expected a collision at (1,1), got {:?}",
            conflicts
        );
    }
}
