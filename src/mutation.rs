//! Mutation operators.
//!
//! Structural mutation grafts a freshly generated subtree into the tree;
//! constant mutation nudges the embedded constant of a `"const"`-named
//! position. Both recover gracefully from "nothing to mutate" conditions by
//! reporting that no mutation occurred.

use crate::node::{CONST_NODE, Node};
use crate::rng::RandomSource;
use crate::tree::Tree;

/// Structural mutation: replace one child subtree with a random one.
///
/// A uniformly selected position gates the operation: it must have children.
/// The replacement itself always targets a uniformly-random child slot of the
/// root, not the selected position; this root bias is inherited behavior,
/// kept as-is.
///
/// Returns whether a replacement occurred.
pub fn mutate<T: Clone, R: RandomSource>(
    tree: &mut Tree<T>,
    max_depth: usize,
    max_width: usize,
    palette: &[Node<T>],
    rng: &mut R,
) -> bool {
    let Some(position) = tree.random_position(None, rng) else {
        return false;
    };
    match tree.get(position) {
        Some(selected) if !selected.children().is_empty() => {}
        _ => return false,
    }

    let slot = rng.index(tree.children.len());
    tree.children[slot] = Tree::random(tree.num_params(), max_depth, max_width, palette, rng);
    true
}

/// Constant mutation: perturb the first constant of a random `"const"` node.
///
/// The step is drawn uniformly from `{-1, 0, +1}`. Returns whether a
/// perturbation happened; there is no constant-bearing position to perturb in
/// trees without `"const"` nodes, and those report `false`.
pub fn mutate_constant<T, R: RandomSource>(tree: &mut Tree<T>, rng: &mut R) -> bool {
    let Some(position) = tree.random_position(Some(CONST_NODE), rng) else {
        return false;
    };
    let Some(target) = tree.get_mut(position) else {
        return false;
    };
    if target.node.constants.is_empty() {
        return false;
    }

    #[allow(clippy::cast_precision_loss)]
    let step = rng.uniform_int(-1, 1) as f64;
    target.node.constants[0] += step;
    true
}
