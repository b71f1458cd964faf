//! Terminal front-end: parse, solve, and inspect picross puzzles.

use clap::{Args, Parser, Subcommand};
use picross_core::{CellStatus, Generator, GeneratorConfig, GridTracker};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "picross", about = "Solve and inspect picross puzzles", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a spec and print the grid with its initial verdicts.
    Show {
        #[command(flatten)]
        source: SpecSource,
    },
    /// Run forced-move sweeps and print the resulting grid.
    Solve {
        #[command(flatten)]
        source: SpecSource,
        /// Repeat sweeps until nothing more is forced.
        #[arg(long)]
        fixpoint: bool,
        /// Number of sweeps when not running to fixpoint.
        #[arg(long, default_value_t = 1)]
        passes: usize,
        /// Emit every cell's status report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Report hypothesis pairs refuted by two-step implication collisions.
    Cornering {
        #[command(flatten)]
        source: SpecSource,
    },
    /// Generate a random puzzle and print its spec text.
    Generate {
        #[arg(long, default_value_t = 10)]
        height: usize,
        #[arg(long, default_value_t = 10)]
        width: usize,
        /// Probability that a cell is filled.
        #[arg(long, default_value_t = 0.5)]
        density: f64,
        /// Fix the RNG seed for a reproducible puzzle.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Where the spec text comes from: an argument, stdin, or a catalogue file
/// with one spec per line.
#[derive(Args)]
struct SpecSource {
    /// Spec text (`<title?>;<rows>;<cols>`), `-` for stdin.
    spec: Option<String>,
    /// Read specs from a file, one per line.
    #[arg(long, conflicts_with = "spec")]
    file: Option<PathBuf>,
    /// Which line of `--file` to use.
    #[arg(long, default_value_t = 0, requires = "file")]
    index: usize,
}

impl SpecSource {
    fn load(&self) -> io::Result<String> {
        if let Some(path) = &self.file {
            let content = fs::read_to_string(path)?;
            return content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .nth(self.index)
                .map(str::to_string)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no spec at line index {} in {}", self.index, path.display()),
                    )
                });
        }
        match self.spec.as_deref() {
            Some("-") | None => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text)?;
                Ok(text.trim().to_string())
            }
            Some(text) => Ok(text.to_string()),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Show { source } => {
            let tracker = GridTracker::from_string(&source.load()?)?;
            print_grid(&tracker);
        }
        Command::Solve {
            source,
            fixpoint,
            passes,
            json,
        } => {
            let mut tracker = GridTracker::from_string(&source.load()?)?;
            let solved = if fixpoint {
                tracker.solve_to_fixpoint()
            } else {
                (0..passes).map(|_| tracker.try_solve_all()).sum()
            };
            if json {
                let reports: Vec<Vec<_>> = (0..tracker.height())
                    .map(|i| {
                        (0..tracker.width())
                            .map(|j| tracker.get_status(i, j))
                            .collect()
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print_grid(&tracker);
                println!(
                    "{} cell(s) committed, {}",
                    solved,
                    if tracker.is_complete() {
                        "puzzle complete"
                    } else {
                        "puzzle incomplete"
                    }
                );
            }
        }
        Command::Cornering { source } => {
            let tracker = GridTracker::from_string(&source.load()?)?;
            let conflicts = tracker.cornering_solver().two_steps_impossible();
            if conflicts.is_empty() {
                println!("no two-step contradictions");
            }
            for (hypothesis, collision) in conflicts {
                println!(
                    "({},{})={} is refutable: it forces ({},{}) both ways (first chain ends on color {})",
                    hypothesis.i,
                    hypothesis.j,
                    hypothesis.color,
                    collision.i,
                    collision.j,
                    collision.color,
                );
            }
        }
        Command::Generate {
            height,
            width,
            density,
            seed,
        } => {
            let config = GeneratorConfig {
                height,
                width,
                fill_ratio: density,
                ..GeneratorConfig::default()
            };
            let mut generator = match seed {
                Some(seed) => Generator::with_seed(seed),
                None => Generator::new(),
            };
            println!("{}", generator.generate(&config)?);
        }
    }
    Ok(())
}

/// Print the grid, one character per cell: committed colors as `.` (blank),
/// `#` (color 1) or the color digit, open cells by their current verdict.
fn print_grid(tracker: &GridTracker) {
    if let Some(title) = &tracker.puzzle().spec().title {
        println!("{title}");
    }
    for i in 0..tracker.height() {
        let mut line = String::with_capacity(tracker.width());
        for j in 0..tracker.width() {
            line.push(match tracker.puzzle().color(i, j) {
                Some(0) => '.',
                Some(1) => '#',
                Some(c) => char::from_digit(c as u32 % 10, 10).unwrap_or('#'),
                None => match tracker.status_code(i, j) {
                    CellStatus::Black => '!',
                    CellStatus::White => ',',
                    CellStatus::Error => 'E',
                    _ => '?',
                },
            });
        }
        println!("{line}");
    }
}
