//! Generation state: an ordered population with parallel fitness scores.
//!
//! Lower score means more fit throughout the engine. Scoring fans out over
//! rayon and synchronizes before ranking; ranking is a stable sort, so equal
//! scores keep their original order.

// Statistics cast counts to f64 intentionally
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use rayon::prelude::*;

use crate::error::EngineResult;
use crate::node::Node;
use crate::rng::RandomSource;
use crate::tree::Tree;

/// One generation of individuals and their scores.
#[derive(Debug)]
pub struct Generation<T> {
    pub(crate) members: Vec<Tree<T>>,
    pub(crate) scores: Vec<f64>,
}

impl<T> Default for Generation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Generation<T> {
    /// An empty generation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// Number of individuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the generation holds no individuals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The individuals, in current order.
    #[must_use]
    pub fn members(&self) -> &[Tree<T>] {
        &self.members
    }

    /// The scores parallel to [`Self::members`]; empty until scored.
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Whether every individual currently has a score.
    #[must_use]
    pub fn is_scored(&self) -> bool {
        !self.members.is_empty() && self.scores.len() == self.members.len()
    }

    /// Swap in the next generation's members, invalidating all scores.
    pub fn replace(&mut self, next: Vec<Tree<T>>) {
        self.members = next;
        self.scores.clear();
    }

    /// Number of elite individuals for a ranked generation.
    #[must_use]
    pub fn elite_count(&self, fraction: f64) -> usize {
        if self.members.is_empty() {
            return 0;
        }
        ((self.members.len() as f64 * fraction) as usize)
            .max(1)
            .min(self.members.len())
    }

    /// The rank-0 individual and score; meaningful after [`Self::rank`].
    #[must_use]
    pub fn best(&self) -> Option<(&Tree<T>, f64)> {
        match (self.members.first(), self.scores.first()) {
            (Some(tree), Some(&score)) => Some((tree, score)),
            _ => None,
        }
    }

    /// Stable-sort individuals ascending by score.
    ///
    /// # Panics
    ///
    /// Panics if the member and score arrays have diverged; that is a
    /// programming-contract violation, never silently recovered.
    pub fn rank(&mut self) {
        assert_eq!(
            self.members.len(),
            self.scores.len(),
            "population and score arrays out of sync"
        );
        let mut paired: Vec<(Tree<T>, f64)> = std::mem::take(&mut self.members)
            .into_iter()
            .zip(std::mem::take(&mut self.scores))
            .collect();
        paired.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let (members, scores): (Vec<Tree<T>>, Vec<f64>) = paired.into_iter().unzip();
        self.members = members;
        self.scores = scores;
    }
}

impl<T: Clone> Generation<T> {
    /// Pad with freshly generated random trees up to the target size.
    pub fn fill<R: RandomSource>(
        &mut self,
        target: usize,
        num_params: usize,
        max_depth: usize,
        max_width: usize,
        palette: &[Node<T>],
        rng: &mut R,
    ) {
        while self.members.len() < target {
            self.members
                .push(Tree::random(num_params, max_depth, max_width, palette, rng));
        }
    }
}

impl<T: Send + Sync> Generation<T> {
    /// Score every individual with the caller's utility function.
    ///
    /// Evaluation is embarrassingly parallel and fans out over rayon; the
    /// scores land in member order.
    ///
    /// # Errors
    ///
    /// Propagates the first utility-function error as-is.
    pub fn score<F>(&mut self, utility: &F) -> EngineResult<()>
    where
        F: Fn(&Tree<T>) -> EngineResult<f64> + Sync,
    {
        self.scores = self
            .members
            .par_iter()
            .map(utility)
            .collect::<EngineResult<Vec<f64>>>()?;
        Ok(())
    }
}

/// Aggregate score statistics for one generation.
#[derive(Debug, Clone, Copy)]
pub struct ScoreStats {
    /// Lowest (best) score.
    pub best: f64,
    /// Highest (worst) score.
    pub worst: f64,
    /// Mean score.
    pub mean: f64,
    /// Standard deviation of the scores.
    pub std_dev: f64,
}

impl ScoreStats {
    /// Compute statistics from raw scores.
    #[must_use]
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                best: 0.0,
                worst: 0.0,
                mean: 0.0,
                std_dev: 0.0,
            };
        }

        let sum: f64 = scores.iter().sum();
        let mean = sum / scores.len() as f64;
        let best = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let worst = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance =
            scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;

        Self {
            best,
            worst,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::UniformSource;

    fn leaf(index: usize) -> Tree<i64> {
        Tree::leaf(Node::param(index), 4)
    }

    #[test]
    fn test_fill_pads_to_target() {
        let mut rng = UniformSource::seeded(42);
        let palette = vec![Node::op("add", 2, |v: &[i64], _: &[f64]| v[0] + v[1])];
        let mut generation = Generation::new();

        generation.fill(10, 2, 4, 4, &palette, &mut rng);
        assert_eq!(generation.len(), 10);

        // Already at target: no change.
        generation.fill(10, 2, 4, 4, &palette, &mut rng);
        assert_eq!(generation.len(), 10);
    }

    #[test]
    fn test_rank_sorts_ascending_and_stable() {
        let mut generation = Generation {
            members: vec![leaf(0), leaf(1), leaf(2), leaf(3)],
            scores: vec![2.0, 1.0, 2.0, 1.0],
        };
        generation.rank();

        assert_eq!(generation.scores(), &[1.0, 1.0, 2.0, 2.0]);
        let order: Vec<&str> = generation.members().iter().map(|t| t.node().name()).collect();
        assert_eq!(order, vec!["p1", "p3", "p0", "p2"]);
    }

    #[test]
    fn test_rank_all_equal_preserves_order() {
        let mut generation = Generation {
            members: vec![leaf(0), leaf(1), leaf(2)],
            scores: vec![5.0, 5.0, 5.0],
        };
        generation.rank();
        let order: Vec<&str> = generation.members().iter().map(|t| t.node().name()).collect();
        assert_eq!(order, vec!["p0", "p1", "p2"]);
    }

    #[test]
    #[should_panic(expected = "out of sync")]
    fn test_rank_mismatch_is_fatal() {
        let mut generation = Generation {
            members: vec![leaf(0), leaf(1)],
            scores: vec![1.0],
        };
        generation.rank();
    }

    #[test]
    fn test_score_in_member_order() {
        let mut generation = Generation {
            members: vec![leaf(0), leaf(1)],
            scores: Vec::new(),
        };
        let utility = |t: &Tree<i64>| Ok(if t.node().name() == "p0" { 1.0 } else { 2.0 });
        generation.score(&utility).unwrap();
        assert_eq!(generation.scores(), &[1.0, 2.0]);
        assert!(generation.is_scored());
    }

    #[test]
    fn test_score_propagates_utility_error() {
        use crate::error::EngineError;

        let mut generation = Generation {
            members: vec![leaf(0)],
            scores: Vec::new(),
        };
        let utility = |_: &Tree<i64>| Err(EngineError::Utility("boom".to_string()));
        assert!(generation.score(&utility).is_err());
    }

    #[test]
    fn test_elite_count() {
        let members: Vec<Tree<i64>> = (0..40).map(|_| leaf(0)).collect();
        let generation = Generation {
            members,
            scores: Vec::new(),
        };
        assert_eq!(generation.elite_count(0.1), 4);
        assert_eq!(Generation::<i64>::new().elite_count(0.1), 0);

        let tiny = Generation {
            members: vec![leaf(0), leaf(1)],
            scores: Vec::new(),
        };
        // Small populations still keep at least one elite.
        assert_eq!(tiny.elite_count(0.1), 1);
    }

    #[test]
    fn test_score_stats() {
        let stats = ScoreStats::from_scores(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert!((stats.best - 1.0).abs() < 0.001);
        assert!((stats.worst - 5.0).abs() < 0.001);
        assert!(stats.std_dev > 0.0);
    }
}
