use std::fs;
use std::path::PathBuf;

use tempfile::{tempdir, TempDir};

use crate::clusters::ClusterColumns;
use crate::io::DataError;
use crate::pipeline::{
    annotate_alignment, export_ancestral_sequences, extract_clade_ancestors, ExtractionConfig,
};
use crate::tree::tree_parser::ParsingError;

const TREE: &str = "(((A,B)N1,C)N2,(D,E)N3)N4;\n";
const CLUSTERS: &str = "Label,Cluster\nA,1\nB,1\nD,2\nE,2\nX,3\n";
const STATES: &str = "\
# Ancestral state reconstruction
Node\tSite\tState\tp_M
N1\t1\tM\t0.9
N1\t2\tK\t0.9
N2\t1\tQ\t0.9
N2\t2\tR\t0.9
N3\t1\tL\t0.9
N3\t2\tL\t0.9
N4\t1\tZ\t0.9
N4\t2\tZ\t0.9
";

fn setup(dir: &TempDir, tree: &str, clusters: &str, states: &str) -> ExtractionConfig {
    let write = |name: &str, content: &str| -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    };
    ExtractionConfig::new(
        write("tree.newick", tree),
        write("clusters.csv", clusters),
        write("asr.state", states),
        dir.path().join("mrca.fasta"),
    )
}

#[test]
fn extraction_end_to_end() {
    let dir = tempdir().unwrap();
    let cfg = setup(&dir, TREE, CLUSTERS, STATES);
    let report = extract_clade_ancestors(&cfg).unwrap();
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.unmatched_taxa(), 1);
    assert_eq!(report.unresolved_clusters(), 1);
    assert_eq!(
        fs::read_to_string(&cfg.output_file).unwrap(),
        ">N1|cluster_1_MRCA\nMK\n\
         >N2|cluster_1_MRCA2\nQR\n\
         >N3|cluster_2_MRCA\nLL\n\
         >N4|cluster_2_MRCA2\nZZ\n"
    );
}

#[test]
fn repeated_runs_give_identical_output() {
    let dir = tempdir().unwrap();
    let mut cfg = setup(&dir, TREE, CLUSTERS, STATES);
    extract_clade_ancestors(&cfg).unwrap();
    let first = fs::read(&cfg.output_file).unwrap();

    assert!(extract_clade_ancestors(&cfg).is_err());
    cfg.overwrite = true;
    extract_clade_ancestors(&cfg).unwrap();
    assert_eq!(fs::read(&cfg.output_file).unwrap(), first);
}

#[test]
fn malformed_tree_aborts() {
    let dir = tempdir().unwrap();
    let cfg = setup(&dir, "(((A,B)N1,C)N2", CLUSTERS, STATES);
    let err = extract_clade_ancestors(&cfg).unwrap_err();
    assert!(err.downcast_ref::<ParsingError>().is_some());
    assert!(!cfg.output_file.exists());
}

#[test]
fn missing_cluster_column_aborts() {
    let dir = tempdir().unwrap();
    let cfg = setup(&dir, TREE, "Taxon,Cluster\nA,1\n", STATES);
    let err = extract_clade_ancestors(&cfg).unwrap_err();
    assert!(err.downcast_ref::<DataError>().is_some());
}

#[test]
fn unreadable_state_table_aborts() {
    let dir = tempdir().unwrap();
    let mut cfg = setup(&dir, TREE, CLUSTERS, STATES);
    cfg.state_file = dir.path().join("missing.state");
    assert!(extract_clade_ancestors(&cfg).is_err());
}

#[test]
fn no_output_records_still_writes_file() {
    let dir = tempdir().unwrap();
    let cfg = setup(&dir, TREE, CLUSTERS, "# nothing reconstructed\n");
    let report = extract_clade_ancestors(&cfg).unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.missing_nodes(), 4);
    assert_eq!(report.node_overlap, 0.0);
    assert_eq!(fs::read_to_string(&cfg.output_file).unwrap(), "");
}

#[test]
fn exporting_ancestral_sequences() {
    let dir = tempdir().unwrap();
    let state_file = dir.path().join("asr.state");
    fs::write(&state_file, STATES).unwrap();
    let output = dir.path().join("ancestral_sequences.fasta");
    let states = export_ancestral_sequences(&state_file, &output, false).unwrap();
    assert_eq!(states.len(), 4);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        ">N1\nMK\n>N2\nQR\n>N3\nLL\n>N4\nZZ\n"
    );
}

#[test]
fn annotating_alignment() {
    let dir = tempdir().unwrap();
    let alignment = dir.path().join("aln.fasta");
    fs::write(&alignment, ">A\nMK-V\n>B\nMKQV\n>Q\nM--V\n").unwrap();
    let clusters = dir.path().join("clusters.csv");
    fs::write(&clusters, CLUSTERS).unwrap();
    let output = dir.path().join("aln_clusters.fasta");

    let summary =
        annotate_alignment(&alignment, &clusters, &ClusterColumns::default(), &output, false)
            .unwrap();
    assert_eq!(summary.matched, 2);
    assert_eq!(summary.unmatched, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        ">A|1\nMK-V\n>B|1\nMKQV\n>Q\nM--V\n"
    );
}
