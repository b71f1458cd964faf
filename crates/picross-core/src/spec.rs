//! Puzzle specifications: run-length blocks per line, parsing and
//! serialization of the text format, and derivation from drawn grids.
//!
//! Text grammar: a block is `"<length>"` or `"<length>|<color>"`, a line is
//! dot-separated blocks (empty for an all-blank line), a full puzzle is
//! `"<title?>;<row specs comma-separated>;<col specs comma-separated>"`.

use crate::SpecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One maximal run of same-colored cells in a line specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub length: usize,
    pub color: u8,
}

impl Block {
    /// Create a block, rejecting non-positive length or color.
    pub fn new(length: usize, color: u8) -> Result<Self, SpecError> {
        if length == 0 || color == 0 {
            return Err(SpecError::BadBlock {
                text: format!("{}|{}", length, color),
            });
        }
        Ok(Block { length, color })
    }

    /// Parse `"<length>"` (color 1 implied) or `"<length>|<color>"`.
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let bad = || SpecError::BadBlock {
            text: text.to_string(),
        };
        let mut parts = text.splitn(2, '|');
        let length: usize = parts
            .next()
            .ok_or_else(bad)?
            .parse()
            .map_err(|_| bad())?;
        let color: u8 = match parts.next() {
            Some(c) => c.parse().map_err(|_| bad())?,
            None => 1,
        };
        Block::new(length, color).map_err(|_| bad())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.color == 1 {
            write!(f, "{}", self.length)
        } else {
            write!(f, "{}|{}", self.length, self.color)
        }
    }
}

/// The ordered blocks of one row or column, plus the line's cell count.
///
/// A blank separator is mandatory between every pair of adjacent blocks, so
/// the minimum space the blocks can occupy is the sum of their lengths plus
/// one cell per gap. Construction fails when that exceeds `size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpec {
    blocks: Vec<Block>,
    size: usize,
}

impl LineSpec {
    pub fn new(blocks: Vec<Block>, size: usize) -> Result<Self, SpecError> {
        let spec = LineSpec { blocks, size };
        if spec.min_size() > size {
            return Err(SpecError::DoesNotFit {
                spec: spec.to_string(),
                min_size: spec.min_size(),
                size,
            });
        }
        Ok(spec)
    }

    /// Parse a dot-separated block list sized for a line of `size` cells.
    pub fn parse(text: &str, size: usize) -> Result<Self, SpecError> {
        let blocks = text
            .split('.')
            .filter(|part| !part.is_empty())
            .map(Block::parse)
            .collect::<Result<Vec<_>, _>>()?;
        LineSpec::new(blocks, size)
    }

    /// Derive the specification of a concrete line of colors (0 = blank) by
    /// run-length encoding its maximal non-blank runs.
    ///
    /// Adjacent runs of different colors encode as adjacent blocks, which a
    /// later `new`/automaton build may reject since blocks always require a
    /// separating blank.
    pub fn from_cells(colors: &[u8]) -> LineSpec {
        let mut blocks = Vec::new();
        let mut run: Option<(u8, usize)> = None;
        for &color in colors {
            run = match run {
                Some((c, len)) if c == color => Some((c, len + 1)),
                prev => {
                    if let Some((c, len)) = prev {
                        if c > 0 {
                            blocks.push(Block { length: len, color: c });
                        }
                    }
                    Some((color, 1))
                }
            };
        }
        if let Some((c, len)) = run {
            if c > 0 {
                blocks.push(Block { length: len, color: c });
            }
        }
        LineSpec {
            blocks,
            size: colors.len(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Smallest line the blocks fit in: total length plus one separator per
    /// gap. 0 for an all-blank line.
    pub fn min_size(&self) -> usize {
        if self.blocks.is_empty() {
            return 0;
        }
        let total: usize = self.blocks.iter().map(|b| b.length).sum();
        total + self.blocks.len() - 1
    }

    fn max_color(&self) -> u8 {
        self.blocks.iter().map(|b| b.color).max().unwrap_or(0)
    }
}

impl fmt::Display for LineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, block) in self.blocks.iter().enumerate() {
            if n > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

/// A full puzzle specification: an optional title plus one `LineSpec` per
/// row and per column. Row specs are sized to the grid width, column specs
/// to its height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSpec {
    pub title: Option<String>,
    row_specs: Vec<LineSpec>,
    col_specs: Vec<LineSpec>,
}

impl PuzzleSpec {
    /// Assemble a spec from per-line block lists, validating every line
    /// against the grid dimensions.
    pub fn new(
        title: Option<String>,
        rows: Vec<Vec<Block>>,
        cols: Vec<Vec<Block>>,
    ) -> Result<Self, SpecError> {
        let height = rows.len();
        let width = cols.len();
        let row_specs = rows
            .into_iter()
            .map(|blocks| LineSpec::new(blocks, width))
            .collect::<Result<Vec<_>, _>>()?;
        let col_specs = cols
            .into_iter()
            .map(|blocks| LineSpec::new(blocks, height))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PuzzleSpec {
            title,
            row_specs,
            col_specs,
        })
    }

    /// Parse `"<title?>;<rows>;<cols>"` (the title segment may be absent
    /// altogether, leaving two segments).
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let parts: Vec<&str> = text.split(';').collect();
        let (title, rows, cols) = match parts.as_slice() {
            [rows, cols] => (None, *rows, *cols),
            [title, rows, cols, ..] => {
                let title = (!title.is_empty()).then(|| title.to_string());
                (title, *rows, *cols)
            }
            _ => {
                return Err(SpecError::Malformed {
                    text: text.to_string(),
                })
            }
        };
        let rows: Vec<Vec<Block>> = rows
            .split(',')
            .map(parse_blocks)
            .collect::<Result<_, _>>()?;
        let cols: Vec<Vec<Block>> = cols
            .split(',')
            .map(parse_blocks)
            .collect::<Result<_, _>>()?;
        PuzzleSpec::new(title, rows, cols)
    }

    /// Derive a full spec from a drawn grid of colors (0 = blank), row-major.
    pub fn from_grid(title: Option<String>, rows: &[Vec<u8>]) -> Result<Self, SpecError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if height == 0 || width == 0 || rows.iter().any(|r| r.len() != width) {
            return Err(SpecError::BadDump { height, width });
        }
        let row_blocks = rows
            .iter()
            .map(|r| LineSpec::from_cells(r).blocks.clone())
            .collect();
        let col_blocks = (0..width)
            .map(|j| {
                let column: Vec<u8> = (0..height).map(|i| rows[i][j]).collect();
                LineSpec::from_cells(&column).blocks.clone()
            })
            .collect();
        PuzzleSpec::new(title, row_blocks, col_blocks)
    }

    pub fn height(&self) -> usize {
        self.row_specs.len()
    }

    pub fn width(&self) -> usize {
        self.col_specs.len()
    }

    pub fn row_specs(&self) -> &[LineSpec] {
        &self.row_specs
    }

    pub fn col_specs(&self) -> &[LineSpec] {
        &self.col_specs
    }

    /// Number of distinct cell colors including blank: one past the highest
    /// block color, never below 2.
    pub fn color_count(&self) -> usize {
        let max = self
            .row_specs
            .iter()
            .chain(&self.col_specs)
            .map(|s| s.max_color())
            .max()
            .unwrap_or(0);
        (max as usize + 1).max(2)
    }
}

fn parse_blocks(text: &str) -> Result<Vec<Block>, SpecError> {
    text.split('.')
        .filter(|part| !part.is_empty())
        .map(Block::parse)
        .collect()
}

impl fmt::Display for PuzzleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};", self.title.as_deref().unwrap_or(""))?;
        for (n, spec) in self.row_specs.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", spec)?;
        }
        write!(f, ";")?;
        for (n, spec) in self.col_specs.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", spec)?;
        }
        Ok(())
    }
}
