use itertools::Itertools;
use rstest::*;

use crate::mrca::{resolve, MrcaResult};
use crate::tree;
use crate::tree::{NodeIdx, Tree};

const EXAMPLE: &str = "(((A,B)N1,C)N2,(D,E)N3)N4;";

fn idx(tree: &Tree, id: &str) -> NodeIdx {
    tree.try_idx(id).unwrap()
}

fn resolve_ids(tree: &Tree, ids: &[&str]) -> (Option<String>, Option<String>) {
    let leaves: Vec<NodeIdx> = ids.iter().map(|id| idx(tree, id)).collect();
    let res = resolve(tree, &leaves);
    (
        res.mrca.map(|n| tree.node_id(&n).to_string()),
        res.mrca2.map(|n| tree.node_id(&n).to_string()),
    )
}

#[rstest]
#[case::cherry(&["A", "B"], Some("N1"), Some("N2"))]
#[case::cherry_reversed(&["B", "A"], Some("N1"), Some("N2"))]
#[case::other_cherry(&["D", "E"], Some("N3"), Some("N4"))]
#[case::nested(&["A", "C"], Some("N2"), Some("N4"))]
#[case::three(&["C", "B", "A"], Some("N2"), Some("N4"))]
#[case::across_root(&["A", "E"], Some("N4"), None)]
#[case::all(&["A", "B", "C", "D", "E"], Some("N4"), None)]
#[case::singleton(&["A"], Some("N1"), Some("N2"))]
#[case::singleton_below_root(&["C"], Some("N2"), Some("N4"))]
#[case::repeated_leaf(&["A", "A"], Some("N1"), Some("N2"))]
fn example_tree(
    #[case] ids: &[&str],
    #[case] mrca: Option<&str>,
    #[case] mrca2: Option<&str>,
) {
    let tree = tree!(EXAMPLE);
    assert_eq!(
        resolve_ids(&tree, ids),
        (mrca.map(String::from), mrca2.map(String::from))
    );
}

#[test]
fn empty_leaf_set() {
    let tree = tree!(EXAMPLE);
    assert_eq!(resolve(&tree, &[]), MrcaResult::default());
    assert!(!resolve(&tree, &[]).is_resolved());
}

#[test]
fn singleton_child_of_root() {
    let tree = tree!("(A,(B,C)X)R;");
    assert_eq!(
        resolve_ids(&tree, &["A"]),
        (Some(String::from("R")), None)
    );
}

#[test]
fn single_leaf_tree() {
    let tree = tree!("A;");
    assert_eq!(resolve(&tree, &[tree.root]), MrcaResult::default());
}

#[test]
fn multifurcating_root() {
    let tree = tree!("(A,B,C,(D,E)X)R;");
    assert_eq!(resolve_ids(&tree, &["A", "C"]), (Some(String::from("R")), None));
    assert_eq!(
        resolve_ids(&tree, &["D", "E"]),
        (Some(String::from("X")), Some(String::from("R")))
    );
}

#[test]
fn synthetic_names() {
    let tree = tree!("(((A,B),C),(D,E));");
    assert_eq!(
        resolve_ids(&tree, &["A", "B"]),
        (Some(String::from("Node3")), Some(String::from("Node2")))
    );
}

fn is_ancestor(tree: &Tree, ancestor: &NodeIdx, leaf: &NodeIdx) -> bool {
    tree.path_to_root(leaf).contains(ancestor)
}

#[rstest]
#[case::balanced("((((A,B),(C,D)),((E,F),(G,H))),(((I,J),(K,L)),((M,N),(O,P))));")]
#[case::caterpillar("(((((((A,B),C),D),E),F),G),H);")]
#[case::multifurcating("((A,B,C),(D,(E,F,G),H),(I,J));")]
fn mrca_is_minimal_common_ancestor(#[case] newick: &str) {
    let tree = tree!(newick);
    let leaves: Vec<NodeIdx> = tree.leaves().map(|leaf| leaf.idx).collect();
    for size in 2..=3 {
        for subset in leaves.iter().copied().combinations(size) {
            let res = resolve(&tree, &subset);
            let mrca = res.mrca.unwrap();
            assert!(subset.iter().all(|leaf| is_ancestor(&tree, &mrca, leaf)));
            for child in tree.children(&mrca) {
                assert!(!subset.iter().all(|leaf| is_ancestor(&tree, child, leaf)));
            }
            assert_eq!(res.mrca2, tree.parent(&mrca));
            assert_eq!(res.mrca2.is_none(), mrca == tree.root);

            let mut reversed = subset.clone();
            reversed.reverse();
            assert_eq!(resolve(&tree, &reversed), res);
        }
    }
}

#[test]
fn singleton_is_parent_of_leaf() {
    let tree = tree!("((((A,B),(C,D)),E),(F,(G,H)));");
    for leaf in tree.leaves() {
        let res = resolve(&tree, &[leaf.idx]);
        let parent = tree.parent(&leaf.idx);
        assert_eq!(res.mrca, parent);
        assert_eq!(res.mrca2, parent.and_then(|p| tree.parent(&p)));
    }
}
