//! The `solve` command: evolve a program for the built-in regression target.

use super::symreg;
use super::{CliError, OutputFormat};
use arbor::{Trainer, TrainerConfig};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// JSON summary of a solve run.
#[derive(Debug, Serialize)]
struct JsonRunResult {
    best_score: f64,
    best_cycle: usize,
    cycles_run: usize,
    solved: bool,
    subroutines: usize,
    exact_points: usize,
    total_points: usize,
    program: String,
}

/// Execute the solve command.
#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
pub(crate) fn execute(
    population: usize,
    generations: usize,
    samples: usize,
    max_depth: usize,
    max_width: usize,
    seed: Option<u64>,
    format: OutputFormat,
    progress: bool,
    verbose: bool,
) -> Result<(), CliError> {
    let seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(42)
    });

    let config = TrainerConfig {
        population_size: population,
        cycles: generations,
        num_params: 2,
        max_depth,
        max_width,
        seed,
        verbose,
        ..TrainerConfig::default()
    };

    let points = symreg::sample_points(samples, seed);
    let utility = symreg::utility(points.clone());
    let mut trainer = Trainer::new(config, symreg::palette(), symreg::null_node());

    let bar = if progress {
        let bar = ProgressBar::new(generations as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cycles {msg}")
                .expect("valid template")
                .progress_chars("=>-"),
        );
        Some(bar)
    } else {
        None
    };

    let mut cycles_run = 0;
    for _ in 0..generations {
        let stats = trainer.step(&utility)?;
        cycles_run += 1;
        if let Some(bar) = &bar {
            bar.set_message(format!("best {:.1}", stats.best_score));
            bar.inc(1);
        }
        if trainer.solved() {
            break;
        }
    }
    trainer.finish(&utility)?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let champion = trainer
        .best()
        .ok_or_else(|| CliError::new("no champion recorded; was the cycle budget zero?"))?;
    let exact = symreg::exact_points(&champion.tree, &points)?;

    match format {
        OutputFormat::Text => {
            println!("Training complete!");
            println!("  Best score: {:.4}", champion.score);
            println!("  Found in cycle: {}", champion.cycle);
            println!("  Cycles run: {cycles_run}");
            println!("  Extracted subroutines: {}", trainer.library().len());
            println!("  Exact on {exact}/{} sample points", points.len());
            println!();
            println!("Best program:");
            print!("{}", champion.tree);
        }
        OutputFormat::Json => {
            let result = JsonRunResult {
                best_score: champion.score,
                best_cycle: champion.cycle,
                cycles_run,
                solved: trainer.solved(),
                subroutines: trainer.library().len(),
                exact_points: exact,
                total_points: points.len(),
                program: champion.tree.to_string(),
            };
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
