//! Structural hashing and the subroutine library.
//!
//! Recurring subtrees among high-fitness individuals are detected by a
//! structural hash, cloned into an append-only library, and surfaced back to
//! the palette as zero-arity nodes bound to the extracted body. Entries are
//! never removed for the duration of a run.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::node::Node;
use crate::tree::Tree;

/// Hash of a tree's structure: node name, arity, and constant count, folded
/// over the pre-order traversal.
///
/// Two trees with the same structure hash identically; constant values are
/// not part of the structure and do not distinguish trees.
#[must_use]
pub fn structure_hash<T>(tree: &Tree<T>) -> u64 {
    let mut hasher = DefaultHasher::new();
    fold_structure(tree, &mut hasher);
    hasher.finish()
}

fn fold_structure<T>(tree: &Tree<T>, hasher: &mut DefaultHasher) {
    tree.node().name().hash(hasher);
    tree.node().arity().hash(hasher);
    tree.node().constant_count().hash(hasher);
    for child in tree.children() {
        fold_structure(child, hasher);
    }
}

/// Map from subtree structure hash to one pre-order position bearing it.
///
/// Pure terminals are uninformative and excluded; only positions with
/// children are indexed. When a structure recurs within one tree, the last
/// pre-order occurrence wins.
#[must_use]
pub fn structural_index<T>(tree: &Tree<T>) -> HashMap<u64, usize> {
    let mut index = HashMap::new();
    let mut next = 0;
    collect_index(tree, &mut next, &mut index);
    index
}

fn collect_index<T>(tree: &Tree<T>, next: &mut usize, index: &mut HashMap<u64, usize>) {
    if !tree.children().is_empty() {
        index.insert(structure_hash(tree), *next);
    }
    *next += 1;
    for child in tree.children() {
        collect_index(child, next, index);
    }
}

/// An extracted subroutine: a named, immutable, library-owned subtree.
#[derive(Debug, Clone)]
pub struct Subroutine<T> {
    /// Generated display name, also the palette node name.
    pub name: String,
    /// Structure hash the entry was extracted under.
    pub hash: u64,
    /// The extracted body. Shared immutably with every palette node bound
    /// to it.
    pub body: Arc<Tree<T>>,
}

/// Append-only store of extracted subroutines.
#[derive(Debug, Default)]
pub struct Library<T> {
    entries: Vec<Subroutine<T>>,
    extracted: HashSet<u64>,
}

impl<T> Library<T> {
    /// An empty library.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            extracted: HashSet::new(),
        }
    }

    /// Number of extracted subroutines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been extracted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a structure hash has already been extracted.
    #[must_use]
    pub fn contains(&self, hash: u64) -> bool {
        self.extracted.contains(&hash)
    }

    /// The extracted subroutines, in extraction order.
    #[must_use]
    pub fn entries(&self) -> &[Subroutine<T>] {
        &self.entries
    }

    /// Take ownership of a subtree under a generated name.
    pub fn extract(&mut self, hash: u64, body: Tree<T>) -> &Subroutine<T> {
        let name = format!("sub{}", self.entries.len());
        self.extracted.insert(hash);
        self.entries.push(Subroutine {
            name,
            hash,
            body: Arc::new(body),
        });
        &self.entries[self.entries.len() - 1]
    }
}

/// Run one extrapolation pass over the elite individuals.
///
/// Merges the structural index of every elite, counts per-individual
/// occurrences of each hash, and extracts the most frequent structure with
/// count at or above `threshold` that is not already in the library. The
/// extracted body is appended to the palette as a bound zero-arity node. At
/// most one extraction happens per pass; the new node's name is returned
/// when one does.
pub fn extrapolate<T: Clone>(
    elites: &[Tree<T>],
    library: &mut Library<T>,
    palette: &mut Vec<Node<T>>,
    threshold: usize,
) -> Option<String> {
    let mut counts: HashMap<u64, (usize, usize, usize)> = HashMap::new();
    for (individual, tree) in elites.iter().enumerate() {
        for (hash, pos) in structural_index(tree) {
            let entry = counts.entry(hash).or_insert((0, individual, pos));
            entry.0 += 1;
        }
    }

    // Most frequent first; ties broken by hash so the pass is deterministic.
    let mut ranked: Vec<(u64, (usize, usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(hash_a, (count_a, ..)), (hash_b, (count_b, ..))| {
        count_b.cmp(count_a).then(hash_a.cmp(hash_b))
    });

    for (hash, (count, individual, pos)) in ranked {
        if count < threshold {
            break;
        }
        if library.contains(hash) {
            continue;
        }
        let body = elites[individual].get(pos)?.clone();
        let entry = library.extract(hash, body);
        palette.push(Node::subroutine(entry.name.clone(), Arc::clone(&entry.body)));
        return Some(entry.name.clone());
    }
    None
}
