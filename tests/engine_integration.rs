//! End-to-end tests of the training loop.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use arbor::{
    CONST_NODE, EngineResult, Generation, Node, Trainer, TrainerConfig, Tree, UniformSource,
};

fn palette() -> Vec<Node<i64>> {
    vec![
        Node::op("add", 2, |v: &[i64], _: &[f64]| v[0].wrapping_add(v[1])),
        Node::op("mul", 2, |v: &[i64], _: &[f64]| v[0].wrapping_mul(v[1])),
        Node::with_constants(CONST_NODE, 0, vec![0.0], |_: &[i64], c: &[f64]| c[0] as i64),
    ]
}

fn null_node() -> Node<i64> {
    Node::op("null", 0, |_: &[i64], _: &[f64]| 0)
}

/// The regression target: `f(x, y) = x^3 + y(y + 5) + 3`.
fn target(x: i64, y: i64) -> i64 {
    x * x * x + y * (y + 5) + 3
}

fn sample_points() -> Vec<(i64, i64)> {
    use arbor::RandomSource;

    let mut rng = UniformSource::seeded(2024);
    (0..24)
        .map(|_| (rng.uniform_int(-50, 50), rng.uniform_int(-50, 50)))
        .collect()
}

fn regression_utility(points: Vec<(i64, i64)>) -> impl Fn(&Tree<i64>) -> EngineResult<f64> + Sync {
    move |tree| {
        let mut total = 0.0;
        for &(x, y) in &points {
            let value = tree.call(&[x, y])?;
            total += (i128::from(value) - i128::from(target(x, y))).unsigned_abs() as f64;
        }
        Ok(total)
    }
}

#[test]
fn test_regression_run_terminates_with_coherent_champion() {
    let points = sample_points();
    let utility = regression_utility(points.clone());

    let config = TrainerConfig {
        population_size: 400,
        cycles: 30,
        num_params: 2,
        max_depth: 5,
        max_width: 6,
        seed: 99,
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(config, palette(), null_node());
    let stats = trainer.run(&utility).unwrap();

    // The run stops on an exact fit or on budget exhaustion, never later.
    assert!(stats.cycles.len() <= 30);
    assert!(!stats.cycles.is_empty());

    let champion = trainer.best().unwrap();
    assert!(champion.score.is_finite());
    assert!(champion.score >= 0.0);
    assert_eq!(champion.score, stats.best_score);

    // The champion never scores worse than any cycle's ranked best.
    for cycle in &stats.cycles {
        assert!(stats.best_score <= cycle.best_score);
    }

    // An exact fit must reproduce the target on every training point.
    if trainer.solved() {
        for &(x, y) in &points {
            assert_eq!(champion.tree.call(&[x, y]).unwrap(), target(x, y));
        }
    }
}

#[test]
fn test_best_score_never_worsens_across_steps() {
    let points = sample_points();
    let utility = regression_utility(points);

    let config = TrainerConfig {
        population_size: 100,
        num_params: 2,
        seed: 5,
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(config, palette(), null_node());

    let mut previous = f64::INFINITY;
    for _ in 0..10 {
        trainer.step(&utility).unwrap();
        let best = trainer.best().map(|c| c.score).unwrap();
        assert!(best <= previous);
        previous = best;
        if trainer.solved() {
            break;
        }
    }
}

#[test]
fn test_identical_scores_rank_stably_and_select_top_decile() {
    let mut rng = UniformSource::seeded(123);
    let mut generation: Generation<i64> = Generation::new();
    generation.fill(40, 2, 5, 6, &palette(), &mut rng);

    let before: Vec<String> = generation.members().iter().map(ToString::to_string).collect();

    // Every individual scores identically.
    let flat = |_: &Tree<i64>| Ok(7.0);
    generation.score(&flat).unwrap();
    generation.rank();

    // Stable ranking: ties keep their original index order.
    let after: Vec<String> = generation.members().iter().map(ToString::to_string).collect();
    assert_eq!(before, after);

    // Elitism still selects exactly the top 10% by count.
    assert_eq!(generation.elite_count(0.1), 4);
}

#[test]
fn test_palette_grows_through_extrapolation() {
    use arbor::{Library, extrapolate, structural_index};

    // Six elites sharing the same interior structure.
    let mut rng = UniformSource::seeded(77);
    let shared = Tree::random(2, 4, 4, &palette(), &mut rng);
    let elites: Vec<Tree<i64>> = (0..6).map(|_| shared.clone()).collect();

    let mut library = Library::new();
    let mut live_palette = palette();
    let before = live_palette.len();

    let extracted = extrapolate(&elites, &mut library, &mut live_palette, 5);
    if structural_index(&shared).is_empty() {
        // A terminal-only tree has nothing to extract.
        assert!(extracted.is_none());
    } else {
        let name = extracted.unwrap();
        assert_eq!(live_palette.len(), before + 1);
        assert_eq!(live_palette[before].name(), name);

        // The bound node computes exactly what its body computes.
        let body = &library.entries()[0].body;
        let bound = Tree::leaf(live_palette[before].clone(), 2);
        assert_eq!(bound.call(&[3, -2]).unwrap(), body.call(&[3, -2]).unwrap());
    }
}
