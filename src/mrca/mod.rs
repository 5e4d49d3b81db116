use hashbrown::HashMap;
use itertools::Itertools;

use crate::tree::{NodeIdx, Tree};

/// MRCA of a leaf set and the MRCA's parent (the second MRCA).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MrcaResult {
    pub mrca: Option<NodeIdx>,
    pub mrca2: Option<NodeIdx>,
}

impl MrcaResult {
    fn at(tree: &Tree, mrca: Option<NodeIdx>) -> Self {
        Self {
            mrca,
            mrca2: mrca.and_then(|idx| tree.parent(&idx)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.mrca.is_some()
    }
}

/// Finds the most recent common ancestor of the given leaves and its parent.
///
/// * No leaves: nothing is resolved.
/// * One leaf: the MRCA is the leaf's parent, since only internal nodes carry ancestral
///   sequences. A leaf that is itself the root resolves to nothing.
/// * Several leaves: the MRCA is the deepest node on every leaf's path to the root.
///
/// The second MRCA is always the parent of the MRCA and is absent when the MRCA is the root.
/// Repeated leaves are counted once and the result does not depend on the leaf order.
///
/// # Example
/// ```
/// use mrca_asr::mrca::resolve;
/// use mrca_asr::tree::tree_parser::from_newick;
/// let tree = from_newick("(((A,B)N1,C)N2,(D,E)N3)N4;").unwrap().remove(0);
/// let leaves = [tree.try_idx("A").unwrap(), tree.try_idx("B").unwrap()];
/// let res = resolve(&tree, &leaves);
/// assert_eq!(res.mrca, Some(tree.try_idx("N1").unwrap()));
/// assert_eq!(res.mrca2, Some(tree.try_idx("N2").unwrap()));
/// ```
pub fn resolve(tree: &Tree, leaves: &[NodeIdx]) -> MrcaResult {
    let leaves: Vec<NodeIdx> = leaves.iter().copied().unique().collect();
    match leaves.as_slice() {
        [] => MrcaResult::default(),
        [leaf] => MrcaResult::at(tree, tree.parent(leaf)),
        _ => MrcaResult::at(tree, Some(common_ancestor(tree, &leaves))),
    }
}

// Counts how many root paths pass through each node, linear in the summed path lengths.
fn common_ancestor(tree: &Tree, leaves: &[NodeIdx]) -> NodeIdx {
    let mut counts = HashMap::<NodeIdx, usize>::new();
    for leaf in leaves {
        for node in tree.path_to_root(leaf) {
            *counts.entry(node).or_insert(0) += 1;
        }
    }
    tree.path_to_root(&leaves[0])
        .into_iter()
        .find(|node| counts.get(node) == Some(&leaves.len()))
        .unwrap_or(tree.root)
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
