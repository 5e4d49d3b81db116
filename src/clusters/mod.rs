use std::collections::BTreeMap;
use std::fmt::{self, Display};

use anyhow::bail;
use bio::io::fasta::Record;
use hashbrown::HashMap;
use log::{info, warn};

use crate::io::DataError;
use crate::tree::{NodeIdx, Tree};
use crate::Result;

mod matching;
pub use matching::{ExactMatch, MatchingStrategy, PrefixMatch, SubstringMatch, TaxonMatcher};

/// Names of the two required columns of a cluster table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterColumns {
    pub label: String,
    pub cluster: String,
}

impl Default for ClusterColumns {
    fn default() -> Self {
        Self {
            label: String::from("Label"),
            cluster: String::from("Cluster"),
        }
    }
}

/// Taxon labels grouped by cluster id. Clusters iterate in lexicographic id order, the
/// taxa of a cluster keep the row order of the table and are not de-duplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterAssignment {
    clusters: BTreeMap<String, Vec<String>>,
    labels: HashMap<String, String>,
}

impl ClusterAssignment {
    /// Parses a delimited cluster table with a header row.
    /// The delimiter is a comma, or a tab when the header has tabs and no commas.
    /// Bails with a [`DataError`] if one of the required columns is missing from the header.
    ///
    /// # Example
    /// ```
    /// use mrca_asr::clusters::{ClusterAssignment, ClusterColumns};
    /// let table = "Label,Cluster\nA,1\nB,1\nD,2\n";
    /// let clusters = ClusterAssignment::from_table(table, &ClusterColumns::default()).unwrap();
    /// assert_eq!(clusters.taxa("1").unwrap(), ["A", "B"]);
    /// assert_eq!(clusters.cluster_of("D"), Some("2"));
    /// ```
    pub fn from_table(table: &str, columns: &ClusterColumns) -> Result<ClusterAssignment> {
        let mut lines = table
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let header = match lines.next() {
            Some((_, header)) => header.trim_start_matches('\u{feff}'),
            None => bail!(DataError {
                message: String::from("Cluster table is empty, no header row found")
            }),
        };
        let delimiter = if header.contains('\t') && !header.contains(',') {
            '\t'
        } else {
            ','
        };
        let header = split_fields(header, delimiter);
        let label_col = column_position(&header, &columns.label)?;
        let cluster_col = column_position(&header, &columns.cluster)?;

        let mut assignment = ClusterAssignment::default();
        for (line_no, line) in lines {
            let fields = split_fields(line, delimiter);
            match (fields.get(label_col), fields.get(cluster_col)) {
                (Some(label), Some(cluster)) if !label.is_empty() && !cluster.is_empty() => {
                    assignment.insert(cluster.clone(), label.clone());
                }
                _ => warn!(
                    "Skipping line {} of the cluster table, no {} or {} value",
                    line_no + 1,
                    columns.label,
                    columns.cluster
                ),
            }
        }
        if assignment.is_empty() {
            warn!("Cluster table has no taxon assignments");
        }
        info!(
            "Read {} cluster(s) with {} taxon assignment(s)",
            assignment.len(),
            assignment.clusters.values().map(Vec::len).sum::<usize>()
        );
        Ok(assignment)
    }

    pub fn insert(&mut self, cluster: String, label: String) {
        self.labels.insert(label.clone(), cluster.clone());
        self.clusters.entry(cluster).or_default().push(label);
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.clusters
            .iter()
            .map(|(id, taxa)| (id.as_str(), taxa.as_slice()))
    }

    pub fn taxa(&self, cluster: &str) -> Option<&[String]> {
        self.clusters.get(cluster).map(Vec::as_slice)
    }

    /// Cluster of a taxon label by exact lookup; for a label listed in several clusters the
    /// last row of the table wins.
    pub fn cluster_of(&self, label: &str) -> Option<&str> {
        self.labels.get(label).map(String::as_str)
    }
}

impl Display for ClusterAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, taxa) in self.iter() {
            writeln!(f, "{}: {}", id, taxa.join(", "))?;
        }
        Ok(())
    }
}

fn column_position(header: &[String], column: &str) -> Result<usize> {
    match header.iter().position(|name| name == column) {
        Some(pos) => Ok(pos),
        None => bail!(DataError {
            message: format!(
                "Cluster table is missing required column '{}', found columns: {}",
                column,
                header.join(", ")
            )
        }),
    }
}

/// Splits a delimited line, honouring double-quoted fields with `""` escapes.
fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            c => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Resolves taxon labels to tree leaves with the given matcher.
/// Returns the matched leaves in taxon order, without repeats, and the unmatched labels.
pub fn resolve_taxa<'a>(
    tree: &Tree,
    taxa: &'a [String],
    matcher: &dyn TaxonMatcher,
) -> (Vec<NodeIdx>, Vec<&'a str>) {
    let mut leaves = Vec::with_capacity(taxa.len());
    let mut unmatched = Vec::new();
    for taxon in taxa {
        match matcher.find_leaf(tree, taxon) {
            Some(leaf) if !leaves.contains(&leaf) => leaves.push(leaf),
            Some(_) => (),
            None => unmatched.push(taxon.as_str()),
        }
    }
    (leaves, unmatched)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub matched: usize,
    pub unmatched: usize,
}

/// Appends the cluster id to every record id that has an exact label in the cluster table,
/// giving `<id>|<cluster>`. Records without a cluster are kept unchanged.
pub fn annotate_records(
    records: &[Record],
    clusters: &ClusterAssignment,
) -> (Vec<Record>, AnnotationSummary) {
    let mut summary = AnnotationSummary::default();
    let annotated = records
        .iter()
        .map(|rec| match clusters.cluster_of(rec.id()) {
            Some(cluster) => {
                summary.matched += 1;
                Record::with_attrs(&format!("{}|{}", rec.id(), cluster), None, rec.seq())
            }
            None => {
                summary.unmatched += 1;
                warn!("No cluster found for {}", rec.id());
                rec.clone()
            }
        })
        .collect();
    (annotated, summary)
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
