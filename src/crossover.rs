//! Subtree crossover.

use crate::rng::RandomSource;
use crate::tree::Tree;

/// Swap one child subtree between two trees.
///
/// One position is selected uniformly in each tree; both must have at least
/// one child or the whole operation is a no-op returning `false`. On success
/// a uniformly-chosen child slot of each position is exchanged wholesale, so
/// the combined node count of the two trees is conserved.
pub fn crossover<T, R: RandomSource>(a: &mut Tree<T>, b: &mut Tree<T>, rng: &mut R) -> bool {
    debug_assert_eq!(a.num_params(), b.num_params());

    let Some(pos_a) = a.random_position(None, rng) else {
        return false;
    };
    let Some(pos_b) = b.random_position(None, rng) else {
        return false;
    };

    let Some(site_a) = a.get_mut(pos_a) else {
        return false;
    };
    if site_a.children.is_empty() {
        return false;
    }
    let Some(site_b) = b.get_mut(pos_b) else {
        return false;
    };
    if site_b.children.is_empty() {
        return false;
    }

    let slot_a = rng.index(site_a.children.len());
    let slot_b = rng.index(site_b.children.len());
    std::mem::swap(&mut site_a.children[slot_a], &mut site_b.children[slot_b]);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::rng::UniformSource;

    fn palette() -> Vec<Node<i64>> {
        vec![
            Node::op("add", 2, |v: &[i64], _: &[f64]| v[0].wrapping_add(v[1])),
            Node::op("mul", 2, |v: &[i64], _: &[f64]| v[0].wrapping_mul(v[1])),
        ]
    }

    #[test]
    fn test_crossover_conserves_total_size() {
        let mut rng = UniformSource::seeded(42);
        let pal = palette();

        for seed in 0..50u64 {
            let mut gen_rng = UniformSource::seeded(seed);
            let mut a = Tree::random(2, 5, 6, &pal, &mut gen_rng);
            let mut b = Tree::random(2, 5, 6, &pal, &mut gen_rng);
            let total_before = a.size() + b.size();

            let swapped = crossover(&mut a, &mut b, &mut rng);
            assert_eq!(a.size() + b.size(), total_before);
            if swapped {
                assert!(a.call(&[1, 2]).is_ok());
                assert!(b.call(&[1, 2]).is_ok());
            }
        }
    }

    #[test]
    fn test_crossover_childless_is_noop() {
        let mut rng = UniformSource::seeded(1);
        let mut a: Tree<i64> = Tree::leaf(Node::param(0), 2);
        let mut b: Tree<i64> = Tree::leaf(Node::param(1), 2);
        assert!(!crossover(&mut a, &mut b, &mut rng));
        assert_eq!(a.size(), 1);
        assert_eq!(b.size(), 1);
    }

    #[test]
    fn test_crossover_moves_whole_subtrees() {
        let mut rng = UniformSource::seeded(5);
        let pal = palette();

        // Both selected positions must be the roots for the swap to happen,
        // so retry with fresh trees until one lands.
        let mut swapped = false;
        for _ in 0..200 {
            let mut a = Tree::new(
                pal[0].clone(),
                2,
                vec![Tree::leaf(Node::param(0), 2), Tree::leaf(Node::param(0), 2)],
            );
            let mut b = Tree::new(
                pal[1].clone(),
                2,
                vec![Tree::leaf(Node::param(1), 2), Tree::leaf(Node::param(1), 2)],
            );
            if crossover(&mut a, &mut b, &mut rng) {
                // Exactly one p1 leaf crossed into a, and one p0 leaf into b.
                assert_eq!(a.positions(Some("p1")).len(), 1);
                assert_eq!(b.positions(Some("p0")).len(), 1);
                swapped = true;
                break;
            }
        }
        assert!(swapped);
    }
}
