use assert_matches::assert_matches;
use rstest::*;

use crate::clusters::{
    annotate_records, resolve_taxa, split_fields, AnnotationSummary, ClusterAssignment,
    ClusterColumns, ExactMatch, MatchingStrategy, PrefixMatch, SubstringMatch, TaxonMatcher,
};
use crate::io::DataError;
use crate::tree::NodeIdx::Leaf as L;
use crate::{record_wo_desc as record, tree};

fn clusters(table: &str) -> ClusterAssignment {
    ClusterAssignment::from_table(table, &ClusterColumns::default()).unwrap()
}

#[test]
fn groups_in_row_order() {
    let assignment = clusters("Label,Cluster\nB,1\nD,2\nA,1\nE,2\nA,1\n");
    assert_eq!(assignment.len(), 2);
    assert_eq!(assignment.taxa("1").unwrap(), ["B", "A", "A"]);
    assert_eq!(assignment.taxa("2").unwrap(), ["D", "E"]);
    assert_eq!(assignment.taxa("3"), None);
}

#[test]
fn cluster_ids_sorted() {
    let assignment = clusters("Label,Cluster\nA,b\nB,10\nC,2\nD,a\n");
    assert_eq!(assignment.ids().collect::<Vec<_>>(), ["10", "2", "a", "b"]);
}

#[test]
fn extra_columns_and_column_order() {
    let assignment = clusters("Cluster,Depth,Label\n7,0.3,X\n7,0.1,Y\n");
    assert_eq!(assignment.taxa("7").unwrap(), ["X", "Y"]);
}

#[test]
fn tab_separated() {
    let assignment = clusters("Label\tCluster\nA\t1\nB\t2\n");
    assert_eq!(assignment.cluster_of("A"), Some("1"));
    assert_eq!(assignment.cluster_of("B"), Some("2"));
}

#[test]
fn quoted_fields_and_crlf() {
    let assignment = clusters("\"Label\",\"Cluster\"\r\n\"A, strain 1\",\"4\"\r\n\r\nB,4\r\n");
    assert_eq!(assignment.taxa("4").unwrap(), ["A, strain 1", "B"]);
}

#[test]
fn custom_columns() {
    let columns = ClusterColumns {
        label: String::from("taxon"),
        cluster: String::from("group"),
    };
    let assignment = ClusterAssignment::from_table("taxon,group\nA,x\n", &columns).unwrap();
    assert_eq!(assignment.taxa("x").unwrap(), ["A"]);
}

#[test]
fn label_in_two_clusters() {
    let assignment = clusters("Label,Cluster\nA,1\nA,2\n");
    assert_eq!(assignment.taxa("1").unwrap(), ["A"]);
    assert_eq!(assignment.taxa("2").unwrap(), ["A"]);
    assert_eq!(assignment.cluster_of("A"), Some("2"));
}

#[test]
fn short_rows_are_skipped() {
    let assignment = clusters("Label,Cluster\nA\nB,\nC,3\n");
    assert_eq!(assignment.len(), 1);
    assert_eq!(assignment.taxa("3").unwrap(), ["C"]);
}

#[rstest]
#[case::no_cluster_column("Label,Group\nA,1\n")]
#[case::no_label_column("Name,Cluster\nA,1\n")]
#[case::empty("")]
#[case::blank_lines("\n\n")]
fn missing_columns(#[case] table: &str) {
    let res = ClusterAssignment::from_table(table, &ClusterColumns::default());
    assert!(res.is_err());
    assert_matches!(res.unwrap_err().downcast_ref::<DataError>(), Some(_));
}

#[test]
fn header_only() {
    assert!(clusters("Label,Cluster\n").is_empty());
}

#[test]
fn field_splitting() {
    assert_eq!(split_fields("a, b ,c", ','), ["a", "b", "c"]);
    assert_eq!(split_fields("\"a,b\",\"say \"\"hi\"\"\"", ','), ["a,b", "say \"hi\""]);
    assert_eq!(split_fields("a,", ','), ["a", ""]);
}

#[rstest]
#[case::exact(MatchingStrategy::Exact, "A1", false)]
#[case::substring(MatchingStrategy::Substring, "A1", true)]
#[case::prefix(MatchingStrategy::Prefix, "A1", true)]
#[case::prefix_inner(MatchingStrategy::Prefix, "12", false)]
#[case::substring_inner(MatchingStrategy::Substring, "12", true)]
fn matching_strategies(
    #[case] strategy: MatchingStrategy,
    #[case] taxon: &str,
    #[case] expected: bool,
) {
    assert_eq!(strategy.matches("A12|3", taxon), expected);
}

#[test]
fn unit_matchers() {
    assert!(ExactMatch.matches("A", "A"));
    assert!(!ExactMatch.matches("A_1", "A"));
    assert!(SubstringMatch.matches("x_A_1", "A"));
    assert!(PrefixMatch.matches("A_1", "A"));
    assert!(!PrefixMatch.matches("x_A", "A"));
}

#[test]
fn first_leaf_wins() {
    let tree = tree!("((A10,A1),(B,C));");
    assert_eq!(SubstringMatch.find_leaf(&tree, "A1"), Some(L(2)));
    assert_eq!(ExactMatch.find_leaf(&tree, "A1"), Some(L(3)));
    assert_eq!(SubstringMatch.find_leaf(&tree, "Z"), None);
}

#[test]
fn resolving_taxa() {
    let tree = tree!("((A|1,B|1),(C|2,D|2));");
    let taxa = ["B", "X", "A", "B"].map(String::from);
    let (leaves, unmatched) = resolve_taxa(&tree, &taxa, &SubstringMatch);
    assert_eq!(leaves, [L(3), L(2)]);
    assert_eq!(unmatched, ["X"]);

    let (leaves, unmatched) = resolve_taxa(&tree, &taxa, &ExactMatch);
    assert!(leaves.is_empty());
    assert_eq!(unmatched, ["B", "X", "A", "B"]);
}

#[test]
fn annotating_records() {
    let assignment = clusters("Label,Cluster\nseq1,3\nseq2,5\n");
    let records = vec![
        record!("seq1", b"AC-G"),
        record!("seq2", b"A-CG"),
        record!("seq3", b"ACG-"),
    ];
    let (annotated, summary) = annotate_records(&records, &assignment);
    assert_eq!(
        summary,
        AnnotationSummary {
            matched: 2,
            unmatched: 1
        }
    );
    let ids: Vec<&str> = annotated.iter().map(|rec| rec.id()).collect();
    assert_eq!(ids, ["seq1|3", "seq2|5", "seq3"]);
    assert_eq!(annotated[1].seq(), b"A-CG");
}
