//! Per-line incremental constraint solver.
//!
//! A `LineTracker` maintains, for every cell of one line, the subset of
//! automaton states not yet ruled out, together with the inverse index
//! (which cells each state remains possible for). Fixing a cell's color
//! removes the disagreeing states and propagates the shrunken eligible
//! sets outward in both directions until nothing more can be removed.
//! Between resets the possible sets only ever shrink.

use crate::automaton::LineAutomaton;
use std::collections::BTreeSet;
use std::rc::Rc;

pub struct LineTracker {
    automaton: Rc<LineAutomaton>,
    color_count: usize,
    /// possible_states[cell] — automaton states still possible at that cell.
    possible_states: Vec<BTreeSet<usize>>,
    /// possible_cells[state] — exact inverse of `possible_states`.
    possible_cells: Vec<BTreeSet<usize>>,
}

impl LineTracker {
    /// Seed a tracker from the automaton's initial windows, then replay the
    /// already-known cell colors.
    pub fn new(automaton: Rc<LineAutomaton>, color_count: usize, colors: &[Option<u8>]) -> Self {
        let size = automaton.size();
        debug_assert_eq!(colors.len(), size);
        let state_count = automaton.state_count();
        let mut tracker = LineTracker {
            automaton,
            color_count,
            possible_states: vec![BTreeSet::new(); size],
            possible_cells: vec![BTreeSet::new(); state_count],
        };
        tracker.reset(colors);
        tracker
    }

    pub fn size(&self) -> usize {
        self.possible_states.len()
    }

    /// Drop everything and rebuild: initial windows first, then `set_color`
    /// for every already-committed cell (which does propagate).
    pub fn reset(&mut self, colors: &[Option<u8>]) {
        for states in &mut self.possible_states {
            states.clear();
        }
        for cells in &mut self.possible_cells {
            cells.clear();
        }
        for cell in 0..self.size() {
            let (first, last) = self.automaton.initial_window(cell);
            for state in first..=last {
                self.add_state(cell, state);
            }
        }
        for (cell, color) in colors.iter().enumerate() {
            if let Some(color) = *color {
                self.set_color(cell, color);
            }
        }
    }

    fn add_state(&mut self, cell: usize, state: usize) {
        self.possible_states[cell].insert(state);
        self.possible_cells[state].insert(cell);
    }

    fn remove_state(&mut self, cell: usize, state: usize) {
        self.possible_states[cell].remove(&state);
        self.possible_cells[state].remove(&cell);
    }

    /// Fix a cell's color: remove every state of a different color, then
    /// propagate the shrunken eligible sets right and left. Idempotent.
    pub fn set_color(&mut self, cell: usize, color: u8) {
        let to_remove: Vec<usize> = self.possible_states[cell]
            .iter()
            .copied()
            .filter(|&s| self.automaton.color(s) != color)
            .collect();
        if to_remove.is_empty() {
            return;
        }
        for state in to_remove {
            self.remove_state(cell, state);
        }
        self.update_next(cell);
        self.update_prev(cell);
    }

    /// States the right neighbor may occupy given this cell's possibilities.
    fn eligible_next(&self, cell: usize) -> BTreeSet<usize> {
        self.possible_states[cell]
            .iter()
            .flat_map(|&s| self.automaton.state(s).following.iter().copied())
            .collect()
    }

    fn eligible_prev(&self, cell: usize) -> BTreeSet<usize> {
        self.possible_states[cell]
            .iter()
            .flat_map(|&s| self.automaton.state(s).preceding.iter().copied())
            .collect()
    }

    /// Cascade rightward while eliminations keep landing.
    fn update_next(&mut self, cell: usize) {
        let mut cell = cell;
        while cell + 1 < self.size() {
            let eligible = self.eligible_next(cell);
            let to_remove: Vec<usize> = self.possible_states[cell + 1]
                .iter()
                .copied()
                .filter(|s| !eligible.contains(s))
                .collect();
            if to_remove.is_empty() {
                return;
            }
            for state in to_remove {
                self.remove_state(cell + 1, state);
            }
            cell += 1;
        }
    }

    fn update_prev(&mut self, cell: usize) {
        let mut cell = cell;
        while cell > 0 {
            let eligible = self.eligible_prev(cell);
            let to_remove: Vec<usize> = self.possible_states[cell - 1]
                .iter()
                .copied()
                .filter(|s| !eligible.contains(s))
                .collect();
            if to_remove.is_empty() {
                return;
            }
            for state in to_remove {
                self.remove_state(cell - 1, state);
            }
            cell -= 1;
        }
    }

    /// Count of still-possible states per color at `cell`. All counts in one
    /// color means the cell is certain; all zero means contradiction.
    pub fn color_counts(&self, cell: usize) -> Vec<u32> {
        let mut counts = vec![0u32; self.color_count];
        for &state in &self.possible_states[cell] {
            counts[self.automaton.color(state) as usize] += 1;
        }
        counts
    }

    /// Per-color likelihood weights at `cell`.
    ///
    /// Each remaining state contributes its color's correction ratio: the
    /// color's actual cell count in any solved line over the summed size of
    /// the color's possible-cell sets. A display heuristic, not a
    /// probability derived from enumerating completions.
    pub fn color_scores(&self, cell: usize) -> Vec<f64> {
        let mut possible = vec![0f64; self.color_count];
        let mut actual = vec![0f64; self.color_count];
        for state in 0..self.automaton.state_count() {
            let color = self.automaton.color(state) as usize;
            possible[color] += self.possible_cells[state].len() as f64;
            actual[color] += 1.0;
        }
        actual[0] = self.size() as f64 - actual[1..].iter().sum::<f64>();
        let ratio: Vec<f64> = (0..self.color_count)
            .map(|c| actual[c] / possible[c])
            .collect();
        let mut scores = vec![0f64; self.color_count];
        for &state in &self.possible_states[cell] {
            let color = self.automaton.color(state) as usize;
            scores[color] += ratio[color];
        }
        scores
    }

    /// Cells whose color follows directly from assuming `cell` is `color`.
    ///
    /// Runs the hypothesis on a fresh tracker seeded from `colors` (the
    /// line's committed cells) and reports every other undetermined cell
    /// left with a single possible color. If the assumption empties some
    /// cell entirely the hypothesis is contradictory and the list is empty;
    /// the caller surfaces that through the main tracker instead.
    pub fn direct_implications(
        &self,
        colors: &[Option<u8>],
        cell: usize,
        color: u8,
    ) -> Vec<(usize, u8)> {
        let mut copy = LineTracker::new(Rc::clone(&self.automaton), self.color_count, colors);
        copy.set_color(cell, color);
        let mut deduced = Vec::new();
        for c in 0..self.size() {
            if c == cell || colors[c].is_some() {
                continue;
            }
            let counts = copy.color_counts(c);
            let total: u32 = counts.iter().sum();
            if total == 0 {
                return Vec::new();
            }
            if let Some(forced) = counts.iter().position(|&n| n == total) {
                deduced.push((c, forced as u8));
            }
        }
        deduced
    }

    /// Still-possible states at `cell`.
    pub fn possible_states(&self, cell: usize) -> &BTreeSet<usize> {
        &self.possible_states[cell]
    }

    /// Cells a state remains possible for (the inverse index).
    pub fn possible_cells(&self, state: usize) -> &BTreeSet<usize> {
        &self.possible_cells[state]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::LineSpec;
    use proptest::prelude::*;

    fn tracker(text: &str, size: usize) -> LineTracker {
        let spec = LineSpec::parse(text, size).unwrap();
        let automaton = Rc::new(LineAutomaton::build(&spec).unwrap());
        LineTracker::new(automaton, 2, &vec![None; size])
    }

    fn snapshot(t: &LineTracker) -> Vec<BTreeSet<usize>> {
        (0..t.size()).map(|c| t.possible_states(c).clone()).collect()
    }

    fn assert_inverse_indexes(t: &LineTracker) {
        for cell in 0..t.size() {
            for &state in t.possible_states(cell) {
                assert!(
                    t.possible_cells(state).contains(&cell),
                    "state {} at cell {} missing from inverse index",
                    state,
                    cell
                );
            }
        }
        for state in 0..t.automaton.state_count() {
            for &cell in t.possible_cells(state) {
                assert!(
                    t.possible_states(cell).contains(&state),
                    "cell {} for state {} missing from forward index",
                    cell,
                    state
                );
            }
        }
    }

    #[test]
    fn test_overconstrained_middle_cell_is_certain() {
        // A 3-block in 5 cells always covers the middle cell.
        let t = tracker("3", 5);
        assert_eq!(t.color_counts(2), vec![0, 3]);
        // The ends stay open.
        assert_eq!(t.color_counts(0), vec![1, 1]);
    }

    #[test]
    fn test_set_color_propagates_both_ways() {
        let mut t = tracker("2", 3);
        t.set_color(0, 1);
        assert_eq!(t.color_counts(0), vec![0, 1]);
        assert_eq!(t.color_counts(1), vec![0, 1]);
        assert_eq!(t.color_counts(2), vec![1, 0]);
        assert_inverse_indexes(&t);
    }

    #[test]
    fn test_set_color_is_idempotent() {
        let mut t = tracker("2.1", 7);
        t.set_color(3, 0);
        let after_first = snapshot(&t);
        t.set_color(3, 0);
        assert_eq!(snapshot(&t), after_first);
    }

    #[test]
    fn test_reset_restores_initial_windows_and_replays() {
        let mut t = tracker("2", 3);
        t.set_color(0, 1);
        t.reset(&[None, None, None]);
        assert_eq!(t.color_counts(0), vec![1, 1]);
        t.reset(&[Some(1), None, None]);
        assert_eq!(t.color_counts(2), vec![1, 0]);
        assert_inverse_indexes(&t);
    }

    #[test]
    fn test_direct_implications_forces_the_rest_of_the_line() {
        let t = tracker("2", 3);
        let implied = t.direct_implications(&[None, None, None], 0, 1);
        assert_eq!(implied, vec![(1, 1), (2, 0)]);
    }

    #[test]
    fn test_direct_implications_skips_committed_cells() {
        let spec = LineSpec::parse("2", 3).unwrap();
        let automaton = Rc::new(LineAutomaton::build(&spec).unwrap());
        let colors = [None, None, Some(0)];
        let t = LineTracker::new(Rc::clone(&automaton), 2, &colors);
        let implied = t.direct_implications(&colors, 0, 1);
        assert_eq!(implied, vec![(1, 1)]);
    }

    #[test]
    fn test_contradictory_hypothesis_reports_nothing() {
        // A 2-block in 3 cells always covers the middle cell, so assuming it
        // blank wipes the line out.
        let t = tracker("2", 3);
        assert_eq!(t.direct_implications(&[None, None, None], 1, 0), vec![]);
    }

    #[test]
    fn test_color_scores_weight_by_line_footprint() {
        let t = tracker("1", 2);
        // possible: blank 2, run 2; actual: blank 1, run 1; ratio 0.5 each.
        assert_eq!(t.color_scores(0), vec![0.5, 0.5]);
        assert_eq!(t.color_scores(1), vec![0.5, 0.5]);
    }

    proptest! {
        /// Random color assignments never break the two indexes' inverse
        /// relationship, and possible sets only ever shrink.
        #[test]
        fn prop_indexes_stay_inverse_and_monotone(
            ops in proptest::collection::vec((0usize..7, 0u8..2), 1..20)
        ) {
            let mut t = tracker("2.1", 7);
            for (cell, color) in ops {
                let before = snapshot(&t);
                t.set_color(cell, color);
                assert_inverse_indexes(&t);
                for (prev, now) in before.iter().zip(snapshot(&t).iter()) {
                    prop_assert!(now.is_subset(prev));
                }
            }
        }
    }
}
