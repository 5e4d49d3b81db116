use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use log::info;

use crate::asr::AncestralStateTable;
use crate::assembler::{AssemblyConfig, AssemblyReport, SequenceAssembler};
use crate::clusters::{annotate_records, AnnotationSummary, ClusterColumns};
use crate::io::{
    read_cluster_table, read_sequences, read_state_table, read_tree, write_sequences_to_file,
};
use crate::Result;

/// Inputs, output and policies of one MRCA extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub tree_file: PathBuf,
    pub cluster_file: PathBuf,
    pub state_file: PathBuf,
    pub output_file: PathBuf,
    pub columns: ClusterColumns,
    pub assembly: AssemblyConfig,
    pub overwrite: bool,
}

impl ExtractionConfig {
    pub fn new(
        tree_file: PathBuf,
        cluster_file: PathBuf,
        state_file: PathBuf,
        output_file: PathBuf,
    ) -> ExtractionConfig {
        ExtractionConfig {
            tree_file,
            cluster_file,
            state_file,
            output_file,
            columns: ClusterColumns::default(),
            assembly: AssemblyConfig::default(),
            overwrite: false,
        }
    }
}

impl Display for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tree file: {}", self.tree_file.display())?;
        writeln!(f, "Cluster table: {}", self.cluster_file.display())?;
        writeln!(f, "Ancestral state table: {}", self.state_file.display())?;
        writeln!(f, "Output file: {}", self.output_file.display())?;
        writeln!(
            f,
            "Cluster table columns: {} (taxon), {} (cluster)",
            self.columns.label, self.columns.cluster
        )?;
        writeln!(f, "Taxon matching: {}", self.assembly.matching)?;
        write!(f, "Minimal node overlap: {}", self.assembly.min_node_overlap)
    }
}

/// Loads the tree, cluster table and state table, extracts the MRCA and second MRCA
/// sequence of every cluster and writes them to the output fasta file.
/// Any unparseable input aborts the run; problems with single clusters only end up in the report.
pub fn extract_clade_ancestors(cfg: &ExtractionConfig) -> Result<AssemblyReport> {
    let tree = read_tree(&cfg.tree_file)?;
    let clusters = read_cluster_table(&cfg.cluster_file, &cfg.columns)?;
    let states = read_state_table(&cfg.state_file)?;

    let report = SequenceAssembler::new(&tree, &states)
        .config(cfg.assembly)
        .assemble(&clusters);
    write_sequences_to_file(&report.fasta_records(), &cfg.output_file, cfg.overwrite)?;
    info!(
        "Wrote {} sequences to {}",
        report.records.len(),
        cfg.output_file.display()
    );
    Ok(report)
}

/// Writes every node sequence of an ancestral state table to a fasta file, sorted by node id.
pub fn export_ancestral_sequences(
    state_file: &Path,
    output_file: &Path,
    overwrite: bool,
) -> Result<AncestralStateTable> {
    let states = read_state_table(state_file)?;
    info!("Found {} ancestral nodes", states.len());
    write_sequences_to_file(&states.to_records(), output_file, overwrite)?;
    Ok(states)
}

/// Tags the ids of an alignment with their cluster, see [`annotate_records`].
pub fn annotate_alignment(
    alignment_file: &Path,
    cluster_file: &Path,
    columns: &ClusterColumns,
    output_file: &Path,
    overwrite: bool,
) -> Result<AnnotationSummary> {
    let records = read_sequences(alignment_file)?;
    let clusters = read_cluster_table(cluster_file, columns)?;
    let (annotated, summary) = annotate_records(&records, &clusters);
    write_sequences_to_file(&annotated, output_file, overwrite)?;
    info!(
        "Processed {} sequences, {} matched, {} unmatched",
        annotated.len(),
        summary.matched,
        summary.unmatched
    );
    Ok(summary)
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
