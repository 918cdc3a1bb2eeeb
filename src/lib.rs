// Allow unwrap and loose casts in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::cast_possible_truncation, clippy::cast_precision_loss))]
//! Arbor: a tree-based genetic programming engine.
//!
//! Candidate programs are expression trees over a caller-supplied instruction
//! set. A population of trees is evolved against a lower-is-better utility
//! function, and successful programs are progressively simplified
//! (minification) and specialized (subroutine extrapolation).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           Trainer Loop              │
//! ├─────────────────────────────────────┤
//! │  Mutation │ Crossover │ Minify      │
//! ├─────────────────────────────────────┤
//! │     Population Scoring (rayon)      │
//! ├─────────────────────────────────────┤
//! │        Tree ← Node palette          │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use arbor::{Node, Trainer, TrainerConfig, Tree};
//!
//! let palette = vec![
//!     Node::op("add", 2, |v: &[i64], _: &[f64]| v[0].wrapping_add(v[1])),
//!     Node::op("mul", 2, |v: &[i64], _: &[f64]| v[0].wrapping_mul(v[1])),
//! ];
//! let null = Node::op("null", 0, |_: &[i64], _: &[f64]| 0);
//!
//! let config = TrainerConfig {
//!     population_size: 50,
//!     cycles: 5,
//!     num_params: 1,
//!     ..TrainerConfig::default()
//! };
//! let mut trainer = Trainer::new(config, palette, null);
//!
//! // Fit f(x) = x * x over a few sample points.
//! let stats = trainer
//!     .run(|tree: &Tree<i64>| {
//!         let mut total = 0.0;
//!         for x in [-2i64, 1, 3] {
//!             total += (tree.call(&[x])? - x * x).abs() as f64;
//!         }
//!         Ok(total)
//!     })
//!     .expect("utility never fails");
//! assert!(stats.best_score >= 0.0);
//! ```

pub mod crossover;
pub mod error;
pub mod library;
pub mod minify;
pub mod mutation;
pub mod node;
pub mod population;
pub mod rng;
pub mod trainer;
pub mod tree;

pub use crossover::crossover;
pub use error::{EngineError, EngineResult};
pub use library::{Library, Subroutine, extrapolate, structural_index, structure_hash};
pub use minify::minify;
pub use mutation::{mutate, mutate_constant};
pub use node::{CONST_NODE, EvalFn, Node};
pub use population::{Generation, ScoreStats};
pub use rng::{RandomSource, UniformSource};
pub use trainer::{Champion, CycleStats, Trainer, TrainerConfig, TrainingStats};
pub use tree::Tree;
