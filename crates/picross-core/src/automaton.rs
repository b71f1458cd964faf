//! Per-line finite automaton derived from a line specification.
//!
//! A line's cells, read left to right, walk through a fixed sequence of
//! states: an optional stretch of blank filler, one state per cell of each
//! block, a blank filler after every block. Blank states may repeat (a cell
//! and its right neighbor can sit in the same filler), run states must
//! advance. Every coloring of the line consistent with the specification is
//! exactly a monotone walk through this automaton.

use crate::spec::LineSpec;
use crate::SpecError;

/// One automaton node: a blank filler or one cell of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct State {
    /// 0 for a blank filler, the owning block's color otherwise.
    pub color: u8,
    /// States a cell's left neighbor may occupy. Blank states include
    /// themselves (a filler may repeat), run states only their predecessor.
    pub preceding: Vec<usize>,
    /// Mirror of `preceding` for the right neighbor.
    pub following: Vec<usize>,
}

impl State {
    fn blank(index: usize) -> Self {
        State {
            color: 0,
            preceding: vec![index],
            following: vec![index],
        }
    }

    fn run(color: u8) -> Self {
        State {
            color,
            preceding: Vec::new(),
            following: Vec::new(),
        }
    }
}

/// The automaton for one line: its state sequence plus the precomputed
/// initial validity window of every cell. Immutable once built; resizing a
/// line means building a new automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAutomaton {
    states: Vec<State>,
    /// Inclusive `(first, last)` state-index window per cell.
    windows: Vec<(usize, usize)>,
    size: usize,
}

impl LineAutomaton {
    /// Build the automaton for `spec` and validate that every cell of the
    /// line has a non-empty initial window.
    pub fn build(spec: &LineSpec) -> Result<Self, SpecError> {
        let mut states = vec![State::blank(0)];
        for block in spec.blocks() {
            for _ in 0..block.length {
                states.push(State::run(block.color));
            }
            states.push(State::blank(states.len()));
        }
        // Degenerate all-blank line: the single leading filler is shared.
        if spec.blocks().is_empty() {
            debug_assert_eq!(states.len(), 1);
        } else {
            debug_assert_eq!(states.len(), spec.min_size() + 2);
        }

        // Structural adjacency on top of the fillers' self-loops.
        for i in 1..states.len() {
            states[i].preceding.push(i - 1);
            states[i - 1].following.push(i);
        }

        let size = spec.size();
        let nb_states = states.len();
        let mut windows = Vec::with_capacity(size);
        for cell in 0..size {
            // At most `cell + 1` states can have been consumed reaching this
            // cell; the `size - cell - 1` cells to the right must be able to
            // consume the rest of the automaton.
            let first = (nb_states + cell).saturating_sub(size + 1);
            let last = (nb_states - 1).min(cell + 1);
            if last < first {
                return Err(SpecError::WindowEmpty {
                    spec: spec.to_string(),
                    cell,
                    size,
                });
            }
            windows.push((first, last));
        }

        Ok(LineAutomaton {
            states,
            windows,
            size,
        })
    }

    /// Number of states. `min_size + 2` when the spec has blocks, 1 otherwise.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of cells in the line this automaton was built for.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Color of a state, 0 for blank fillers.
    pub fn color(&self, state: usize) -> u8 {
        self.states[state].color
    }

    /// Inclusive state-index window initially possible at `cell`.
    pub fn initial_window(&self, cell: usize) -> (usize, usize) {
        self.windows[cell]
    }

    pub(crate) fn state(&self, state: usize) -> &State {
        &self.states[state]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::LineSpec;

    fn automaton(text: &str, size: usize) -> LineAutomaton {
        LineAutomaton::build(&LineSpec::parse(text, size).unwrap()).unwrap()
    }

    #[test]
    fn test_state_layout_single_color() {
        let auto = automaton("1.1.2", 10);
        assert_eq!(auto.state_count(), 8);
        let colors: Vec<u8> = (0..8).map(|s| auto.color(s)).collect();
        assert_eq!(colors, vec![0, 1, 0, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn test_initial_windows_at_boundaries() {
        let auto = automaton("1.1.2", 10);
        assert_eq!(auto.initial_window(0), (0, 1));
        assert_eq!(auto.initial_window(9), (6, 7));
        // Middle cells widen to the full reachable span.
        assert_eq!(auto.initial_window(3), (0, 4));
    }

    #[test]
    fn test_blank_line_is_a_single_filler() {
        let auto = automaton("", 5);
        assert_eq!(auto.state_count(), 1);
        for cell in 0..5 {
            assert_eq!(auto.initial_window(cell), (0, 0));
        }
    }

    #[test]
    fn test_fillers_repeat_runs_advance() {
        let auto = automaton("2", 5);
        // States: blank, run, run, blank.
        assert!(auto.state(0).following.contains(&0));
        assert!(auto.state(3).preceding.contains(&3));
        assert_eq!(auto.state(1).following, vec![2]);
        assert_eq!(auto.state(2).preceding, vec![1]);
    }

    #[test]
    fn test_separator_between_blocks_of_any_color() {
        // Two adjacent blocks of different colors still get a filler between
        // them: blank, run(1), blank, run(2), blank.
        let auto = automaton("1.1|2", 3);
        assert_eq!(auto.state_count(), 5);
        let colors: Vec<u8> = (0..5).map(|s| auto.color(s)).collect();
        assert_eq!(colors, vec![0, 1, 0, 2, 0]);
    }

    #[test]
    fn test_exact_fit_line_is_fully_forced() {
        let auto = automaton("4", 4);
        // Every window collapses to the single run state for that cell.
        for cell in 0..4 {
            assert_eq!(auto.initial_window(cell), (cell + 1, cell + 1));
        }
    }
}
