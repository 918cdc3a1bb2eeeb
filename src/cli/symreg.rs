//! Shared instruction set and target function for the demo commands.

// The const node narrows its f64 constant to the i64 state type by design
#![allow(clippy::cast_possible_truncation)]

use arbor::{CONST_NODE, EngineResult, Node, RandomSource, Tree, UniformSource};

/// The arithmetic instruction palette: `add/2`, `mul/2`, `const/0`.
pub(crate) fn palette() -> Vec<Node<i64>> {
    vec![
        Node::op("add", 2, |v: &[i64], _: &[f64]| v[0].wrapping_add(v[1])),
        Node::op("mul", 2, |v: &[i64], _: &[f64]| v[0].wrapping_mul(v[1])),
        Node::with_constants(CONST_NODE, 0, vec![0.0], |_: &[i64], c: &[f64]| c[0] as i64),
    ]
}

/// The zero-effect sentinel used by minification.
pub(crate) fn null_node() -> Node<i64> {
    Node::op("null", 0, |_: &[i64], _: &[f64]| 0)
}

/// The regression target: `f(x, y) = x^3 + y(y + 5) + 3`.
pub(crate) fn target(x: i64, y: i64) -> i64 {
    x * x * x + y * (y + 5) + 3
}

/// Draw sample points uniformly over `x, y in [-50, 50]`.
pub(crate) fn sample_points(count: usize, seed: u64) -> Vec<(i64, i64)> {
    let mut rng = UniformSource::seeded(seed);
    (0..count)
        .map(|_| (rng.uniform_int(-50, 50), rng.uniform_int(-50, 50)))
        .collect()
}

/// Total absolute error of a tree against the target over the sample points.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn utility(points: Vec<(i64, i64)>) -> impl Fn(&Tree<i64>) -> EngineResult<f64> + Sync {
    move |tree| {
        let mut total = 0.0;
        for &(x, y) in &points {
            let value = tree.call(&[x, y])?;
            total += (i128::from(value) - i128::from(target(x, y))).unsigned_abs() as f64;
        }
        Ok(total)
    }
}

/// Count the sample points a tree reproduces exactly.
pub(crate) fn exact_points(tree: &Tree<i64>, points: &[(i64, i64)]) -> EngineResult<usize> {
    let mut exact = 0;
    for &(x, y) in points {
        if tree.call(&[x, y])? == target(x, y) {
            exact += 1;
        }
    }
    Ok(exact)
}
