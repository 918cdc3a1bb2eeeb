//! Greedy, fitness-guided tree simplification.
//!
//! Each pass tries one rewrite at a time: replacing a child with the null
//! sentinel, or hoisting a grandchild over its parent. A trial edit is
//! applied, the whole tree is re-scored, and the edit is committed only when
//! the score does not exceed the supplied baseline; otherwise it is rolled
//! back exactly. The pass stops at the first committed rewrite, so callers
//! repeat it until it reports a fixed point.

use std::mem;

use crate::error::EngineResult;
use crate::node::Node;
use crate::tree::Tree;

/// Attempt one simplification of the tree.
///
/// Scans every non-root position with children, child slot by child slot,
/// trying the nulling rule before the hoisting rule. Returns `Ok(true)` as
/// soon as one rewrite keeps the utility at or below `baseline`; `Ok(false)`
/// when no rewrite anywhere qualifies.
///
/// # Errors
///
/// Propagates the first utility-function error; the tree is rolled back to
/// its pre-trial shape before the error surfaces.
pub fn minify<T, F>(
    tree: &mut Tree<T>,
    baseline: f64,
    utility: &F,
    null_node: &Node<T>,
) -> EngineResult<bool>
where
    T: Clone,
    F: Fn(&Tree<T>) -> EngineResult<f64>,
{
    let num_params = tree.num_params();
    let size = tree.size();

    for pos in 1..size {
        let arity = match tree.get(pos) {
            Some(site) => site.children().len(),
            None => continue,
        };
        if arity == 0 {
            continue;
        }

        for slot in 0..arity {
            // Nulling rule: substitute the null sentinel for the child.
            let already_null = tree
                .get(pos)
                .and_then(|site| site.children().get(slot))
                .is_some_and(|child| child.node().name() == null_node.name());
            if !already_null {
                let replacement = Tree::leaf(null_node.clone(), num_params);
                let saved = match tree.get_mut(pos) {
                    Some(site) => mem::replace(&mut site.children[slot], replacement),
                    None => continue,
                };
                match utility(tree) {
                    Ok(score) if score <= baseline => return Ok(true),
                    Ok(_) => restore(tree, pos, slot, saved),
                    Err(e) => {
                        restore(tree, pos, slot, saved);
                        return Err(e);
                    }
                }
            }

            // Hoisting rule: promote each grandchild over the child.
            let grandchildren = tree
                .get(pos)
                .and_then(|site| site.children().get(slot))
                .map_or(0, |child| child.children().len());
            for grandchild in 0..grandchildren {
                let saved = match tree.get_mut(pos) {
                    Some(site) => {
                        let promoted = site.children[slot].children[grandchild].clone();
                        mem::replace(&mut site.children[slot], promoted)
                    }
                    None => continue,
                };
                match utility(tree) {
                    // Committing discards the demoted subtree.
                    Ok(score) if score <= baseline => return Ok(true),
                    Ok(_) => restore(tree, pos, slot, saved),
                    Err(e) => {
                        restore(tree, pos, slot, saved);
                        return Err(e);
                    }
                }
            }
        }
    }

    Ok(false)
}

fn restore<T>(tree: &mut Tree<T>, pos: usize, slot: usize, saved: Tree<T>) {
    if let Some(site) = tree.get_mut(pos) {
        site.children[slot] = saved;
    }
}
