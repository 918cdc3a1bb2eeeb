//! Primitive operation descriptors.
//!
//! A [`Node`] names an operation, fixes its arity and embedded constants, and
//! carries the code that evaluates it. Trees copy nodes per position, so the
//! constants of one position drift independently of every other position.

use std::fmt;
use std::sync::Arc;

use crate::tree::Tree;

/// Conventional name for constant-bearing terminals.
///
/// Constant mutation restricts its search to positions carrying this name.
pub const CONST_NODE: &str = "const";

/// Evaluation function: child values and embedded constants in, one value out.
///
/// Must be pure and deterministic. It is always invoked with exactly `arity`
/// child values and exactly `constant_count` constants; the tree layer
/// enforces this, the function never has to.
pub type EvalFn<T> = Arc<dyn Fn(&[T], &[f64]) -> T + Send + Sync>;

/// What a node does when evaluated.
#[derive(Clone)]
pub(crate) enum NodeKind<T> {
    /// Look up one of the tree's call parameters.
    Param(usize),
    /// Apply a caller-supplied evaluation function.
    Op(EvalFn<T>),
    /// Forward the call to an extracted library subtree.
    ///
    /// The library owns the canonical entry; this handle shares its immutable
    /// body for the remainder of the run.
    Subroutine(Arc<Tree<T>>),
}

/// A named primitive operation.
#[derive(Clone)]
pub struct Node<T> {
    pub(crate) name: String,
    pub(crate) arity: usize,
    pub(crate) constants: Vec<f64>,
    pub(crate) kind: NodeKind<T>,
}

impl<T> Node<T> {
    /// An operator without embedded constants.
    pub fn op(
        name: impl Into<String>,
        arity: usize,
        eval: impl Fn(&[T], &[f64]) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            constants: Vec::new(),
            kind: NodeKind::Op(Arc::new(eval)),
        }
    }

    /// An operator with embedded per-instance constants.
    pub fn with_constants(
        name: impl Into<String>,
        arity: usize,
        constants: Vec<f64>,
        eval: impl Fn(&[T], &[f64]) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            constants,
            kind: NodeKind::Op(Arc::new(eval)),
        }
    }

    /// A terminal that reads call parameter `index`.
    #[must_use]
    pub fn param(index: usize) -> Self {
        Self {
            name: format!("p{index}"),
            arity: 0,
            constants: Vec::new(),
            kind: NodeKind::Param(index),
        }
    }

    /// A terminal bound to an extracted library subtree.
    #[must_use]
    pub fn subroutine(name: impl Into<String>, body: Arc<Tree<T>>) -> Self {
        Self {
            name: name.into(),
            arity: 0,
            constants: Vec::new(),
            kind: NodeKind::Subroutine(body),
        }
    }

    /// The node's display and search name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required number of child operands.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Embedded constants for this instance.
    #[must_use]
    pub fn constants(&self) -> &[f64] {
        &self.constants
    }

    /// Number of embedded constants.
    #[must_use]
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    /// Whether this node takes no children.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.arity == 0
    }
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Param(i) => format!("Param({i})"),
            NodeKind::Op(_) => "Op".to_string(),
            NodeKind::Subroutine(_) => "Subroutine".to_string(),
        };
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("constants", &self.constants)
            .field("kind", &kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_node() {
        let add: Node<i64> = Node::op("add", 2, |v, _| v[0] + v[1]);
        assert_eq!(add.name(), "add");
        assert_eq!(add.arity(), 2);
        assert_eq!(add.constant_count(), 0);
        assert!(!add.is_terminal());
    }

    #[test]
    fn test_const_node() {
        let c: Node<i64> =
            Node::with_constants(CONST_NODE, 0, vec![3.0], |_: &[i64], c: &[f64]| c[0] as i64);
        assert_eq!(c.name(), "const");
        assert!(c.is_terminal());
        assert_eq!(c.constants(), &[3.0]);
    }

    #[test]
    fn test_param_node_name() {
        let p: Node<i64> = Node::param(1);
        assert_eq!(p.name(), "p1");
        assert_eq!(p.arity(), 0);
    }

    #[test]
    fn test_debug_format() {
        let p: Node<i64> = Node::param(0);
        let debug = format!("{p:?}");
        assert!(debug.contains("p0"));
        assert!(debug.contains("Param"));
    }
}
