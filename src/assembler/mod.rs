use std::fmt::{self, Display};

use bio::io::fasta::Record;
use log::{info, warn};

use crate::asr::AncestralStateTable;
use crate::clusters::{resolve_taxa, ClusterAssignment, MatchingStrategy};
use crate::mrca::resolve;
use crate::tree::{NodeIdx, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Mrca,
    Mrca2,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Mrca => write!(f, "MRCA"),
            Role::Mrca2 => write!(f, "MRCA2"),
        }
    }
}

/// Ancestral sequence of one cluster's MRCA or second MRCA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSequenceRecord {
    pub cluster: String,
    pub role: Role,
    pub node: String,
    pub sequence: String,
}

impl OutputSequenceRecord {
    /// Record identifier `<node>|cluster_<cluster>_<role>`.
    pub fn id(&self) -> String {
        format!("{}|cluster_{}_{}", self.node, self.cluster, self.role)
    }

    pub fn to_record(&self) -> Record {
        Record::with_attrs(&self.id(), None, self.sequence.as_bytes())
    }
}

/// Recoverable problems met while assembling, none of them stops the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnmatchedTaxon {
        cluster: String,
        taxon: String,
    },
    UnresolvedCluster {
        cluster: String,
    },
    MissingNodeSequence {
        cluster: String,
        role: Role,
        node: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmatchedTaxon { cluster, taxon } => write!(
                f,
                "Cluster {}: taxon {} does not match any tree leaf",
                cluster, taxon
            ),
            Diagnostic::UnresolvedCluster { cluster } => {
                write!(f, "Cluster {}: no taxa resolved to tree leaves", cluster)
            }
            Diagnostic::MissingNodeSequence {
                cluster,
                role,
                node,
            } => write!(
                f,
                "Cluster {}: {} node {} has no sequence in the state table",
                cluster, role, node
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyConfig {
    pub matching: MatchingStrategy,
    /// Warn when a smaller fraction of the tree's internal nodes is found in the state table.
    pub min_node_overlap: f64,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            matching: MatchingStrategy::Substring,
            min_node_overlap: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    pub records: Vec<OutputSequenceRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub clusters: usize,
    pub resolved_clusters: usize,
    pub node_overlap: f64,
    pub skipped_state_rows: usize,
}

impl AssemblyReport {
    pub fn unmatched_taxa(&self) -> usize {
        self.count(|d| matches!(d, Diagnostic::UnmatchedTaxon { .. }))
    }

    pub fn unresolved_clusters(&self) -> usize {
        self.count(|d| matches!(d, Diagnostic::UnresolvedCluster { .. }))
    }

    pub fn missing_nodes(&self) -> usize {
        self.count(|d| matches!(d, Diagnostic::MissingNodeSequence { .. }))
    }

    fn count(&self, kind: impl Fn(&Diagnostic) -> bool) -> usize {
        self.diagnostics.iter().filter(|d| kind(d)).count()
    }

    pub fn fasta_records(&self) -> Vec<Record> {
        self.records.iter().map(OutputSequenceRecord::to_record).collect()
    }
}

impl Display for AssemblyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Clusters processed: {}", self.clusters)?;
        writeln!(f, "Clusters resolved: {}", self.resolved_clusters)?;
        writeln!(f, "Sequences extracted: {}", self.records.len())?;
        writeln!(f, "Taxa unmatched: {}", self.unmatched_taxa())?;
        writeln!(f, "Clusters unresolved: {}", self.unresolved_clusters())?;
        writeln!(f, "Nodes missing from state table: {}", self.missing_nodes())?;
        write!(f, "Malformed state rows skipped: {}", self.skipped_state_rows)
    }
}

#[derive(Default)]
struct ClusterOutcome {
    records: Vec<OutputSequenceRecord>,
    diagnostics: Vec<Diagnostic>,
    resolved: bool,
}

/// Joins MRCA resolution on the tree with the ancestral state table.
pub struct SequenceAssembler<'a> {
    tree: &'a Tree,
    states: &'a AncestralStateTable,
    config: AssemblyConfig,
}

impl<'a> SequenceAssembler<'a> {
    pub fn new(tree: &'a Tree, states: &'a AncestralStateTable) -> SequenceAssembler<'a> {
        SequenceAssembler {
            tree,
            states,
            config: AssemblyConfig::default(),
        }
    }

    pub fn config(mut self, config: AssemblyConfig) -> SequenceAssembler<'a> {
        self.config = config;
        self
    }

    /// Resolves every cluster in id order and collects the MRCA and second MRCA sequences.
    /// Diagnostics are logged as warnings in the order they are produced.
    pub fn assemble(&self, clusters: &ClusterAssignment) -> AssemblyReport {
        let node_overlap = self.check_node_overlap();
        let outcomes = assemble_clusters(self, clusters);

        let mut report = AssemblyReport {
            clusters: clusters.len(),
            node_overlap,
            skipped_state_rows: self.states.skipped_rows(),
            ..Default::default()
        };
        for outcome in outcomes {
            for diagnostic in &outcome.diagnostics {
                warn!("{}", diagnostic);
            }
            for record in &outcome.records {
                info!(
                    "Cluster {}: {} ({})",
                    record.cluster, record.node, record.role
                );
            }
            if outcome.resolved {
                report.resolved_clusters += 1;
            }
            report.records.extend(outcome.records);
            report.diagnostics.extend(outcome.diagnostics);
        }
        info!(
            "Extracted {} ancestral sequence(s) for {} cluster(s)",
            report.records.len(),
            report.clusters
        );
        report
    }

    fn check_node_overlap(&self) -> f64 {
        let overlap = self.states.internal_node_overlap(self.tree);
        if overlap < self.config.min_node_overlap {
            warn!(
                "Only {:.1}% of the tree's internal nodes have sequences in the state table, \
                 node names of the tree and the state table may not correspond",
                overlap * 100.0
            );
        }
        overlap
    }

    fn assemble_cluster(&self, cluster: &str, taxa: &[String]) -> ClusterOutcome {
        let mut outcome = ClusterOutcome::default();
        let (leaves, unmatched) = resolve_taxa(self.tree, taxa, &self.config.matching);
        outcome
            .diagnostics
            .extend(unmatched.into_iter().map(|taxon| Diagnostic::UnmatchedTaxon {
                cluster: cluster.to_string(),
                taxon: taxon.to_string(),
            }));

        let res = resolve(self.tree, &leaves);
        if !res.is_resolved() {
            outcome.diagnostics.push(Diagnostic::UnresolvedCluster {
                cluster: cluster.to_string(),
            });
            return outcome;
        }
        outcome.resolved = true;

        for (node, role) in [(res.mrca, Role::Mrca), (res.mrca2, Role::Mrca2)] {
            if let Some(node) = node {
                match self.sequence_record(cluster, role, &node) {
                    Ok(record) => outcome.records.push(record),
                    Err(diagnostic) => outcome.diagnostics.push(diagnostic),
                }
            }
        }
        outcome
    }

    fn sequence_record(
        &self,
        cluster: &str,
        role: Role,
        node: &NodeIdx,
    ) -> std::result::Result<OutputSequenceRecord, Diagnostic> {
        let node_id = self.tree.node_id(node);
        match self.states.sequence_for(node_id) {
            Some(sequence) => Ok(OutputSequenceRecord {
                cluster: cluster.to_string(),
                role,
                node: node_id.to_string(),
                sequence: sequence.to_string(),
            }),
            None => Err(Diagnostic::MissingNodeSequence {
                cluster: cluster.to_string(),
                role,
                node: node_id.to_string(),
            }),
        }
    }
}

cfg_if::cfg_if! {
if #[cfg(feature = "par-clusters")] {
fn assemble_clusters(
    assembler: &SequenceAssembler,
    clusters: &ClusterAssignment,
) -> Vec<ClusterOutcome> {
    use rayon::prelude::*;
    let clusters: Vec<_> = clusters.iter().collect();
    clusters
        .into_par_iter()
        .map(|(cluster, taxa)| assembler.assemble_cluster(cluster, taxa))
        .collect()
}
} else {
fn assemble_clusters(
    assembler: &SequenceAssembler,
    clusters: &ClusterAssignment,
) -> Vec<ClusterOutcome> {
    clusters
        .iter()
        .map(|(cluster, taxa)| assembler.assemble_cluster(cluster, taxa))
        .collect()
}
}
}

/// Assembles the MRCA and second MRCA sequences of every cluster with the default
/// configuration (substring taxon matching).
///
/// # Example
/// ```
/// use mrca_asr::asr::AncestralStateTable;
/// use mrca_asr::assembler::assemble;
/// use mrca_asr::clusters::{ClusterAssignment, ClusterColumns};
/// use mrca_asr::tree::tree_parser::from_newick;
///
/// let tree = from_newick("(((A,B)N1,C)N2,(D,E)N3)N4;").unwrap().remove(0);
/// let clusters = ClusterAssignment::from_table(
///     "Label,Cluster\nA,1\nB,1\n",
///     &ClusterColumns::default(),
/// )
/// .unwrap();
/// let states = AncestralStateTable::from_table("N1\t1\tM\nN1\t2\tK\nN2\t1\tQ\nN2\t2\tR\n");
/// let records = assemble(&clusters, &tree, &states);
/// assert_eq!(records[0].id(), "N1|cluster_1_MRCA");
/// assert_eq!(records[0].sequence, "MK");
/// assert_eq!(records[1].id(), "N2|cluster_1_MRCA2");
/// ```
pub fn assemble(
    clusters: &ClusterAssignment,
    tree: &Tree,
    states: &AncestralStateTable,
) -> Vec<OutputSequenceRecord> {
    SequenceAssembler::new(tree, states).assemble(clusters).records
}
