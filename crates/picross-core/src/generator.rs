//! Random puzzle generation: draw a grid, derive its specification.

use crate::{GridDump, PuzzleSpec, SpecError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Configuration for puzzle generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub height: usize,
    pub width: usize,
    /// Probability that a cell is filled.
    pub fill_ratio: f64,
    /// Number of fill colors (1 = classic black and white).
    pub colors: u8,
    /// Multi-color grids can place differently-colored runs back to back,
    /// which no specification can express; retry up to this many draws.
    pub max_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            height: 10,
            width: 10,
            fill_ratio: 0.5,
            colors: 1,
            max_attempts: 100,
        }
    }
}

/// Seedable puzzle generator.
pub struct Generator {
    rng: StdRng,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Generator {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible puzzles.
    pub fn with_seed(seed: u64) -> Self {
        Generator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw a random grid at the configured density.
    pub fn generate_grid(&mut self, config: &GeneratorConfig) -> GridDump {
        let fill_ratio = config.fill_ratio.clamp(0.0, 1.0);
        let rows = (0..config.height)
            .map(|_| {
                (0..config.width)
                    .map(|_| {
                        if self.rng.gen_bool(fill_ratio) {
                            self.rng.gen_range(1..=config.colors.max(1))
                        } else {
                            0
                        }
                    })
                    .collect()
            })
            .collect();
        GridDump {
            height: config.height,
            width: config.width,
            rows,
        }
    }

    /// Draw grids until one yields a valid specification.
    pub fn generate(&mut self, config: &GeneratorConfig) -> Result<PuzzleSpec, SpecError> {
        let mut last_err = None;
        for attempt in 0..config.max_attempts.max(1) {
            let dump = self.generate_grid(config);
            match PuzzleSpec::from_grid(None, &dump.rows) {
                Ok(spec) => {
                    debug!(attempt, "generated {}x{} puzzle", config.height, config.width);
                    return Ok(spec);
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or(SpecError::BadDump {
            height: config.height,
            width: config.width,
        }))
    }
}
