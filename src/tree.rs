//! Expression trees and their structural primitives.
//!
//! A [`Tree`] owns its node and all of its children exclusively; cloning a
//! tree deep-copies every position, so no subtree is ever shared between two
//! live trees. Positions are addressed by pre-order index, with index 0 being
//! the root.

// Random generation casts palette sizes through i64 intentionally
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::node::{Node, NodeKind};
use crate::rng::RandomSource;

/// A recursively owned expression tree.
///
/// Every valid tree satisfies `children.len() == node.arity()` at every
/// position, and every tree in one evolutionary run shares the same
/// `num_params`.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    pub(crate) node: Node<T>,
    pub(crate) num_params: usize,
    pub(crate) children: Vec<Tree<T>>,
}

impl<T: Clone> Tree<T> {
    /// Build a tree from a node and its children.
    ///
    /// # Panics
    ///
    /// Panics if the child count does not match the node's arity; this is a
    /// programming-contract violation, not a recoverable condition.
    #[must_use]
    pub fn new(node: Node<T>, num_params: usize, children: Vec<Tree<T>>) -> Self {
        assert_eq!(
            children.len(),
            node.arity(),
            "node {:?} requires {} children, got {}",
            node.name(),
            node.arity(),
            children.len()
        );
        Self {
            node,
            num_params,
            children,
        }
    }

    /// Build a single-node tree from a terminal.
    ///
    /// # Panics
    ///
    /// Panics if the node is not a terminal.
    #[must_use]
    pub fn leaf(node: Node<T>, num_params: usize) -> Self {
        Self::new(node, num_params, Vec::new())
    }

    /// Generate a random tree over the given palette.
    ///
    /// The provisional result is always a parameter terminal, so every
    /// recursion path produces a well-formed tree even when the depth or
    /// width budget is exhausted. A palette draw of `palette.len()`
    /// re-selects the terminal; a drawn node whose arity exceeds the width
    /// budget falls back to the terminal as well. Children compete for the
    /// parent's width budget minus what the node itself consumed.
    ///
    /// # Panics
    ///
    /// Panics if `num_params` is zero.
    pub fn random<R: RandomSource>(
        num_params: usize,
        max_depth: usize,
        max_width: usize,
        palette: &[Node<T>],
        rng: &mut R,
    ) -> Self {
        assert!(num_params > 0, "trees require at least one call parameter");

        let terminal = Node::param(rng.index(num_params));
        if max_depth <= 1 || max_width <= 1 {
            return Self::leaf(terminal, num_params);
        }

        let drawn = rng.uniform_int(0, palette.len() as i64) as usize;
        if drawn == palette.len() {
            return Self::leaf(terminal, num_params);
        }

        let node = palette[drawn].clone();
        if node.arity() > max_width {
            return Self::leaf(terminal, num_params);
        }

        let children = (0..node.arity())
            .map(|_| {
                Self::random(
                    num_params,
                    max_depth - 1,
                    max_width - node.arity(),
                    palette,
                    rng,
                )
            })
            .collect();
        Self {
            node,
            num_params,
            children,
        }
    }

    /// Evaluate the tree on a parameter vector.
    ///
    /// Child values aggregate upward in child order; parameter terminals
    /// index into `params`, bound subroutines recurse with the same `params`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ArityMismatch`] when `params.len()` differs
    /// from the tree's configured parameter count.
    pub fn call(&self, params: &[T]) -> EngineResult<T> {
        if params.len() != self.num_params {
            return Err(EngineError::ArityMismatch {
                expected: self.num_params,
                actual: params.len(),
            });
        }
        Ok(self.eval(params))
    }

    fn eval(&self, params: &[T]) -> T {
        match &self.node.kind {
            NodeKind::Param(index) => params[*index].clone(),
            NodeKind::Subroutine(body) => body.eval(params),
            NodeKind::Op(eval) => {
                let values: Vec<T> = self.children.iter().map(|c| c.eval(params)).collect();
                eval(&values, &self.node.constants)
            }
        }
    }
}

impl<T> Tree<T> {
    /// The node at this position.
    #[must_use]
    pub fn node(&self) -> &Node<T> {
        &self.node
    }

    /// The ordered child subtrees.
    #[must_use]
    pub fn children(&self) -> &[Tree<T>] {
        &self.children
    }

    /// Number of call parameters this tree accepts.
    #[must_use]
    pub fn num_params(&self) -> usize {
        self.num_params
    }

    /// Total node count.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Tree::size).sum::<usize>()
    }

    /// Longest root-to-leaf path, the root counting as 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Tree::depth).max().unwrap_or(0)
    }

    /// The subtree at the given pre-order index, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Tree<T>> {
        if index == 0 {
            return Some(self);
        }
        let mut index = index - 1;
        for child in &self.children {
            let span = child.size();
            if index < span {
                return child.get(index);
            }
            index -= span;
        }
        None
    }

    /// Mutable access to the subtree at the given pre-order index.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Tree<T>> {
        if index == 0 {
            return Some(self);
        }
        let mut index = index - 1;
        for child in &mut self.children {
            let span = child.size();
            if index < span {
                return child.get_mut(index);
            }
            index -= span;
        }
        None
    }

    /// Pre-order indices of all positions, optionally restricted to nodes
    /// with the given name.
    #[must_use]
    pub fn positions(&self, filter: Option<&str>) -> Vec<usize> {
        let mut out = Vec::new();
        let mut next = 0;
        self.collect_positions(filter, &mut next, &mut out);
        out
    }

    fn collect_positions(&self, filter: Option<&str>, next: &mut usize, out: &mut Vec<usize>) {
        if filter.is_none_or(|name| self.node.name() == name) {
            out.push(*next);
        }
        *next += 1;
        for child in &self.children {
            child.collect_positions(filter, next, out);
        }
    }

    /// Uniformly select one position, optionally restricted by node name.
    ///
    /// Returns `None` when no position matches; the caller treats this as an
    /// expected no-op, not an error.
    pub fn random_position<R: RandomSource>(
        &self,
        filter: Option<&str>,
        rng: &mut R,
    ) -> Option<usize> {
        let matching = self.positions(filter);
        if matching.is_empty() {
            None
        } else {
            Some(matching[rng.index(matching.len())])
        }
    }
}

impl<T> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl<T> Tree<T> {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            write!(f, "\t")?;
        }
        write!(f, "[{}] ({})", self.node.name(), self.children.len())?;
        if !self.node.constants().is_empty() {
            write!(f, " {{")?;
            for (i, c) in self.node.constants().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{c}")?;
            }
            write!(f, "}}")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::CONST_NODE;
    use crate::rng::UniformSource;

    fn palette() -> Vec<Node<i64>> {
        vec![
            Node::op("add", 2, |v: &[i64], _: &[f64]| v[0].wrapping_add(v[1])),
            Node::op("mul", 2, |v: &[i64], _: &[f64]| v[0].wrapping_mul(v[1])),
            Node::with_constants(CONST_NODE, 0, vec![0.0], |_: &[i64], c: &[f64]| c[0] as i64),
        ]
    }

    fn assert_arity_invariant(tree: &Tree<i64>) {
        assert_eq!(tree.children().len(), tree.node().arity());
        for child in tree.children() {
            assert_arity_invariant(child);
        }
    }

    #[test]
    fn test_random_tree_respects_invariants() {
        let mut rng = UniformSource::seeded(42);
        for _ in 0..200 {
            let tree = Tree::random(2, 5, 6, &palette(), &mut rng);
            assert_arity_invariant(&tree);
            assert!(tree.depth() <= 5);
        }
    }

    #[test]
    fn test_random_tree_empty_palette_is_terminal() {
        let mut rng = UniformSource::seeded(1);
        let tree: Tree<i64> = Tree::random(3, 5, 6, &[], &mut rng);
        assert_eq!(tree.size(), 1);
        assert!(tree.node().name().starts_with('p'));
    }

    #[test]
    fn test_call_arity_mismatch() {
        let mut rng = UniformSource::seeded(2);
        let tree = Tree::random(2, 4, 4, &palette(), &mut rng);
        let err = tree.call(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            EngineError::ArityMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert!(tree.call(&[1, 2]).is_ok());
    }

    #[test]
    fn test_call_evaluates_bottom_up() {
        // add(p0, mul(p1, const 3))
        let pal = palette();
        let c = Tree::leaf(
            {
                let mut n = pal[2].clone();
                n.constants[0] = 3.0;
                n
            },
            2,
        );
        let mul = Tree::new(pal[1].clone(), 2, vec![Tree::leaf(Node::param(1), 2), c]);
        let tree = Tree::new(pal[0].clone(), 2, vec![Tree::leaf(Node::param(0), 2), mul]);

        assert_eq!(tree.call(&[10, 4]).unwrap(), 22);
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_preorder_get() {
        let pal = palette();
        let inner = Tree::new(
            pal[0].clone(),
            2,
            vec![Tree::leaf(Node::param(0), 2), Tree::leaf(Node::param(1), 2)],
        );
        let tree = Tree::new(pal[1].clone(), 2, vec![inner, Tree::leaf(Node::param(0), 2)]);

        assert_eq!(tree.get(0).map(|t| t.node().name()), Some("mul"));
        assert_eq!(tree.get(1).map(|t| t.node().name()), Some("add"));
        assert_eq!(tree.get(2).map(|t| t.node().name()), Some("p0"));
        assert_eq!(tree.get(3).map(|t| t.node().name()), Some("p1"));
        assert_eq!(tree.get(4).map(|t| t.node().name()), Some("p0"));
        assert!(tree.get(5).is_none());
    }

    #[test]
    fn test_positions_filter() {
        let pal = palette();
        let tree = Tree::new(
            pal[0].clone(),
            2,
            vec![
                Tree::leaf(pal[2].clone(), 2),
                Tree::leaf(Node::param(1), 2),
            ],
        );
        assert_eq!(tree.positions(None), vec![0, 1, 2]);
        assert_eq!(tree.positions(Some(CONST_NODE)), vec![1]);
        assert!(tree.positions(Some("missing")).is_empty());
    }

    #[test]
    fn test_random_position_empty_filter_is_none() {
        let mut rng = UniformSource::seeded(3);
        let tree: Tree<i64> = Tree::leaf(Node::param(0), 1);
        assert!(tree.random_position(Some(CONST_NODE), &mut rng).is_none());
        assert_eq!(tree.random_position(None, &mut rng), Some(0));
    }

    #[test]
    fn test_clone_is_deep() {
        let pal = palette();
        let original = Tree::new(
            pal[0].clone(),
            2,
            vec![
                Tree::leaf(pal[2].clone(), 2),
                Tree::leaf(Node::param(0), 2),
            ],
        );
        let mut copy = original.clone();
        if let Some(pos) = copy.get_mut(1) {
            pos.node.constants[0] = 99.0;
        }
        assert_eq!(original.get(1).map(|t| t.node().constants()[0]), Some(0.0));
        assert_eq!(copy.get(1).map(|t| t.node().constants()[0]), Some(99.0));
    }

    #[test]
    fn test_display_annotates_children_and_constants() {
        let pal = palette();
        let mut c = pal[2].clone();
        c.constants[0] = -2.0;
        let tree = Tree::new(
            pal[0].clone(),
            2,
            vec![Tree::leaf(c, 2), Tree::leaf(Node::param(0), 2)],
        );
        let text = tree.to_string();
        assert!(text.contains("[add] (2)"));
        assert!(text.contains("\t[const] (0) {-2}"));
        assert!(text.contains("\t[p0] (0)"));
    }
}
