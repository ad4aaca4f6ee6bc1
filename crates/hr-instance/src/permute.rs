use hr_types::Hyperedge;
use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffles hyperedge order, then the node order inside every node tuple.
/// Marker edges keep their literal field order.
pub fn permute_hyperedges<R: Rng + ?Sized>(hyperedges: &[Hyperedge], rng: &mut R) -> Vec<Hyperedge> {
    let mut permuted = hyperedges.to_vec();
    permuted.shuffle(rng);
    for edge in &mut permuted {
        if let Hyperedge::Nodes(nodes) = edge {
            nodes.shuffle(rng);
        }
    }
    permuted
}
