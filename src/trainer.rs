//! The generational training loop.
//!
//! A [`Trainer`] drives fill → score → rank → vary cycles over a population,
//! with periodic minification and subroutine extrapolation, and tracks the
//! best individual ever seen. The caller owns the loop: each [`Trainer::step`]
//! is one atomic cycle, and [`Trainer::run`] is the convenience loop with
//! early termination on an exact fit.

// Progress lines go to stderr; exact-zero termination compares floats by design
#![allow(clippy::print_stderr, clippy::float_cmp, clippy::cast_precision_loss)]

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::crossover::crossover;
use crate::error::EngineResult;
use crate::library::{Library, extrapolate};
use crate::minify::minify;
use crate::mutation::{mutate, mutate_constant};
use crate::node::Node;
use crate::population::{Generation, ScoreStats};
use crate::rng::{RandomSource, UniformSource};
use crate::tree::Tree;

/// Configuration for a training run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Population size each cycle is padded back up to.
    pub population_size: usize,
    /// Cycle budget for [`Trainer::run`].
    pub cycles: usize,
    /// Call parameters every tree in the run accepts.
    pub num_params: usize,
    /// Depth bound for randomly generated trees.
    pub max_depth: usize,
    /// Width budget for randomly generated trees.
    pub max_width: usize,
    /// Per-elite probability of appending a structurally mutated clone.
    pub mutation_rate: f64,
    /// Per-elite probability of appending a crossed-over pair.
    pub crossover_rate: f64,
    /// Per-elite probability of appending a constant-perturbed clone.
    pub constant_mutation_rate: f64,
    /// Fraction of the ranked population treated as elite.
    pub elite_fraction: f64,
    /// Minify the elites every N cycles (0 disables).
    pub simplify_interval: usize,
    /// Run the extrapolation pass every N cycles (0 disables).
    pub extract_interval: usize,
    /// Per-individual occurrence count a subtree needs before extraction.
    pub extract_threshold: usize,
    /// Iteration bound for the trailing cleanup minification.
    pub cleanup_limit: usize,
    /// RNG seed; equal seeds give bit-identical runs.
    pub seed: u64,
    /// Print per-cycle progress to stderr.
    pub verbose: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            cycles: 500,
            num_params: 2,
            max_depth: 5,
            max_width: 6,
            mutation_rate: 0.2,
            crossover_rate: 0.2,
            constant_mutation_rate: 0.2,
            elite_fraction: 0.1,
            simplify_interval: 10,
            extract_interval: 10,
            extract_threshold: 5,
            cleanup_limit: 16,
            seed: 42,
            verbose: false,
        }
    }
}

/// Statistics for a single cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CycleStats {
    /// Cycle number, starting at 0.
    pub cycle: usize,
    /// Population size at scoring time.
    pub population: usize,
    /// Best (lowest) score in the cycle.
    pub best_score: f64,
    /// Mean score.
    pub mean_score: f64,
    /// Score standard deviation.
    pub score_std: f64,
}

/// Overall statistics from a training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingStats {
    /// Statistics per cycle, in order.
    pub cycles: Vec<CycleStats>,
    /// Best score achieved over the whole run.
    pub best_score: f64,
    /// Cycle where the best score was first reached.
    pub best_cycle: usize,
    /// Wall-clock duration in seconds.
    pub elapsed_seconds: f64,
}

/// The best individual found so far.
#[derive(Debug, Clone)]
pub struct Champion<T> {
    /// The winning tree.
    pub tree: Tree<T>,
    /// Its score.
    pub score: f64,
    /// The cycle it was recorded in.
    pub cycle: usize,
}

/// Orchestrates the evolutionary search.
#[derive(Debug)]
pub struct Trainer<T> {
    config: TrainerConfig,
    palette: Vec<Node<T>>,
    null_node: Node<T>,
    library: Library<T>,
    generation: Generation<T>,
    best: Option<Champion<T>>,
    rng: UniformSource,
    cycle: usize,
}

impl<T: Clone + Send + Sync> Trainer<T> {
    /// Create a trainer over the given instruction palette.
    ///
    /// The palette grows over the run as subroutines are extracted. The null
    /// node is the zero-arity, zero-effect sentinel used by minification.
    ///
    /// # Panics
    ///
    /// Panics if `config.num_params` is zero.
    #[must_use]
    pub fn new(config: TrainerConfig, palette: Vec<Node<T>>, null_node: Node<T>) -> Self {
        assert!(config.num_params > 0, "trees require at least one call parameter");
        Self {
            rng: UniformSource::seeded(config.seed),
            config,
            palette,
            null_node,
            library: Library::new(),
            generation: Generation::new(),
            best: None,
            cycle: 0,
        }
    }

    /// The best individual found so far.
    #[must_use]
    pub fn best(&self) -> Option<&Champion<T>> {
        self.best.as_ref()
    }

    /// Whether an exact fit (score of exactly zero) has been found.
    #[must_use]
    pub fn solved(&self) -> bool {
        self.best.as_ref().is_some_and(|champion| champion.score == 0.0)
    }

    /// The extrapolation library accumulated so far.
    #[must_use]
    pub fn library(&self) -> &Library<T> {
        &self.library
    }

    /// The live instruction palette, including extracted subroutines.
    #[must_use]
    pub fn palette(&self) -> &[Node<T>] {
        &self.palette
    }

    /// Number of completed cycles.
    #[must_use]
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Run one full cycle: fill, score, rank, periodically minify and
    /// extrapolate, then vary into the next generation.
    ///
    /// Once an exact fit is on record, the ranked generation is left intact
    /// and no further variation happens.
    ///
    /// # Errors
    ///
    /// Propagates utility-function errors as-is; the run is not retried.
    pub fn step<F>(&mut self, utility: &F) -> EngineResult<CycleStats>
    where
        F: Fn(&Tree<T>) -> EngineResult<f64> + Sync,
    {
        let config = self.config;

        self.generation.fill(
            config.population_size,
            config.num_params,
            config.max_depth,
            config.max_width,
            &self.palette,
            &mut self.rng,
        );
        self.generation.score(utility)?;
        self.generation.rank();
        self.update_best();

        let scores = ScoreStats::from_scores(self.generation.scores());
        let report = CycleStats {
            cycle: self.cycle,
            population: self.generation.len(),
            best_score: scores.best,
            mean_score: scores.mean,
            score_std: scores.std_dev,
        };
        if config.verbose {
            eprintln!(
                "Cycle {:>5}: best={:.4} mean={:.4} std={:.4} pop={}",
                report.cycle, report.best_score, report.mean_score, report.score_std, report.population
            );
        }

        if !self.solved() {
            let elite = self.generation.elite_count(config.elite_fraction);

            if config.simplify_interval > 0 && self.cycle.is_multiple_of(config.simplify_interval) {
                self.simplify_elites(elite, usize::MAX, utility)?;
                self.update_best();
            }

            if config.extract_interval > 0 && self.cycle.is_multiple_of(config.extract_interval) {
                let extracted = extrapolate(
                    &self.generation.members[..elite],
                    &mut self.library,
                    &mut self.palette,
                    config.extract_threshold,
                );
                if let Some(name) = extracted.filter(|_| config.verbose) {
                    eprintln!("  extracted subroutine {name}");
                }
            }

            self.vary(elite);
        }

        self.cycle += 1;
        Ok(report)
    }

    /// The trailing cleanup: bounded minification passes over the elites,
    /// run regardless of how the main loop ended.
    ///
    /// # Errors
    ///
    /// Propagates utility-function errors as-is.
    pub fn finish<F>(&mut self, utility: &F) -> EngineResult<()>
    where
        F: Fn(&Tree<T>) -> EngineResult<f64> + Sync,
    {
        if !self.generation.is_scored() {
            self.generation.score(utility)?;
            self.generation.rank();
            self.update_best();
        }
        let elite = self.generation.elite_count(self.config.elite_fraction);
        self.simplify_elites(elite, self.config.cleanup_limit, utility)?;
        self.update_best();
        Ok(())
    }

    /// Run the full training loop: up to the configured cycle budget, with
    /// early termination on an exact fit, then the trailing cleanup.
    ///
    /// # Errors
    ///
    /// Propagates utility-function errors as-is.
    pub fn run<F>(&mut self, utility: F) -> EngineResult<TrainingStats>
    where
        F: Fn(&Tree<T>) -> EngineResult<f64> + Sync,
    {
        let started = Instant::now();
        let mut cycles = Vec::new();

        for _ in 0..self.config.cycles {
            cycles.push(self.step(&utility)?);
            if self.solved() {
                break;
            }
        }
        self.finish(&utility)?;

        let (best_score, best_cycle) = self
            .best
            .as_ref()
            .map_or((f64::INFINITY, 0), |champion| (champion.score, champion.cycle));
        Ok(TrainingStats {
            cycles,
            best_score,
            best_cycle,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }

    /// Record the current generation's minimum as the running best, never
    /// overwriting a better previous champion.
    fn update_best(&mut self) {
        let mut minimum: Option<(usize, f64)> = None;
        for (i, &score) in self.generation.scores().iter().enumerate() {
            if minimum.is_none_or(|(_, s)| score < s) {
                minimum = Some((i, score));
            }
        }
        if let Some((index, score)) = minimum {
            let improved = self.best.as_ref().is_none_or(|champion| score < champion.score);
            if improved {
                self.best = Some(Champion {
                    tree: self.generation.members[index].clone(),
                    score,
                    cycle: self.cycle,
                });
            }
        }
    }

    /// Minify each elite individual to a fixed point, bounded by `limit`
    /// iterations per individual, keeping its score current.
    fn simplify_elites<F>(&mut self, elite: usize, limit: usize, utility: &F) -> EngineResult<()>
    where
        F: Fn(&Tree<T>) -> EngineResult<f64> + Sync,
    {
        let elite = elite.min(self.generation.members.len());
        for i in 0..elite {
            let mut baseline = self.generation.scores[i];
            let mut iterations = 0;
            while iterations < limit {
                if !minify(&mut self.generation.members[i], baseline, utility, &self.null_node)? {
                    break;
                }
                baseline = utility(&self.generation.members[i])?;
                self.generation.scores[i] = baseline;
                iterations += 1;
            }
        }
        Ok(())
    }

    /// Build the next generation from the elites: each is carried forward
    /// unconditionally, plus a mutated clone, a crossed-over pair (parents
    /// drawn uniformly from the elite set), and a constant-perturbed clone,
    /// each on an independent coin flip. The result has variable size; the
    /// next cycle's fill pads it back up.
    fn vary(&mut self, elite: usize) {
        let config = self.config;
        let elite = elite.min(self.generation.members.len());
        let mut next: Vec<Tree<T>> = Vec::with_capacity(elite * 2);

        for i in 0..elite {
            next.push(self.generation.members[i].clone());

            if self.rng.chance(config.mutation_rate) {
                let mut mutant = self.generation.members[i].clone();
                mutate(
                    &mut mutant,
                    config.max_depth,
                    config.max_width,
                    &self.palette,
                    &mut self.rng,
                );
                next.push(mutant);
            }

            if self.rng.chance(config.crossover_rate) {
                let first = self.rng.index(elite);
                let second = self.rng.index(elite);
                let mut left = self.generation.members[first].clone();
                let mut right = self.generation.members[second].clone();
                crossover(&mut left, &mut right, &mut self.rng);
                next.push(left);
                next.push(right);
            }

            if self.rng.chance(config.constant_mutation_rate) {
                let mut perturbed = self.generation.members[i].clone();
                mutate_constant(&mut perturbed, &mut self.rng);
                next.push(perturbed);
            }
        }

        self.generation.replace(next);
    }
}
