use std::collections::BTreeMap;
use std::io::BufRead;

use bio::io::fasta::Record;
use hashbrown::HashMap;
use log::{debug, info};

use crate::tree::Tree;
use crate::Result;

/// Most likely ancestral sequences per node, assembled from a per-site state table
/// such as the `.state` file written by IQ-TREE:
/// ```text
/// # comment lines
/// Node    Site    State   p_A     p_R ...
/// Node1   1       M       0.9     0.01 ...
/// ```
/// Only the first three columns are used. Rows of one node may be interleaved with other
/// nodes and come in any site order; for a repeated (node, site) pair the first row wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AncestralStateTable {
    sequences: BTreeMap<String, String>,
    skipped_rows: usize,
}

impl AncestralStateTable {
    /// Reads a state table. Comment lines, the header and blank lines are ignored, malformed
    /// rows are skipped and counted. Only a failing reader is an error.
    /// Rows that are not valid UTF-8 count as malformed.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<AncestralStateTable> {
        let mut states = HashMap::<String, BTreeMap<usize, String>>::new();
        let mut skipped_rows = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let Ok(line) = std::str::from_utf8(&buf) else {
                debug!("Skipping state row that is not valid UTF-8");
                skipped_rows += 1;
                continue;
            };
            let line = line.trim_end_matches(['\n', '\r']);
            match parse_state_row(line) {
                StateRow::State { node, site, state } => {
                    states
                        .entry(node.to_string())
                        .or_default()
                        .entry(site)
                        .or_insert_with(|| state.to_string());
                }
                StateRow::Ignored => (),
                StateRow::Malformed => {
                    debug!("Skipping malformed state row: {}", line);
                    skipped_rows += 1;
                }
            }
        }
        let sequences = states
            .into_iter()
            .map(|(node, sites)| (node, sites.into_values().collect::<String>()))
            .collect::<BTreeMap<_, _>>();
        info!(
            "Assembled ancestral sequences for {} node(s), skipped {} malformed row(s)",
            sequences.len(),
            skipped_rows
        );
        Ok(AncestralStateTable {
            sequences,
            skipped_rows,
        })
    }

    /// # Example
    /// ```
    /// use mrca_asr::asr::AncestralStateTable;
    /// let table = "Node\tSite\tState\nNode1\t2\tK\nNode1\t1\tM\n";
    /// let states = AncestralStateTable::from_table(table);
    /// assert_eq!(states.sequence_for("Node1"), Some("MK"));
    /// assert_eq!(states.sequence_for("Node2"), None);
    /// ```
    pub fn from_table(table: &str) -> AncestralStateTable {
        // Reading from a string slice cannot fail.
        Self::from_reader(table.as_bytes()).unwrap_or_default()
    }

    pub fn sequence_for(&self, node: &str) -> Option<&str> {
        self.sequences.get(node).map(String::as_str)
    }

    pub fn contains(&self, node: &str) -> bool {
        self.sequences.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Node ids in lexicographic order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sequences
            .iter()
            .map(|(node, seq)| (node.as_str(), seq.as_str()))
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Fraction of the tree's internal nodes that have a sequence in the table.
    /// Returns 1.0 for a tree without internal nodes.
    pub fn internal_node_overlap(&self, tree: &Tree) -> f64 {
        let internals = tree.internals().count();
        if internals == 0 {
            return 1.0;
        }
        let present = tree
            .internals()
            .filter(|node| self.contains(&node.id))
            .count();
        present as f64 / internals as f64
    }

    /// One fasta record per node, sorted by node id.
    pub fn to_records(&self) -> Vec<Record> {
        self.iter()
            .map(|(node, seq)| Record::with_attrs(node, None, seq.as_bytes()))
            .collect()
    }
}

enum StateRow<'a> {
    State {
        node: &'a str,
        site: usize,
        state: &'a str,
    },
    Ignored,
    Malformed,
}

fn parse_state_row(line: &str) -> StateRow<'_> {
    if line.trim().is_empty() || line.starts_with('#') {
        return StateRow::Ignored;
    }
    let mut fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 3 {
        fields = line.split_whitespace().collect();
    }
    if fields.len() < 3 {
        return StateRow::Malformed;
    }
    if fields[0] == "Node" && fields[1] == "Site" {
        return StateRow::Ignored;
    }
    match fields[1].parse::<usize>() {
        Ok(site) if site > 0 && !fields[0].is_empty() && !fields[2].is_empty() => {
            StateRow::State {
                node: fields[0],
                site,
                state: fields[2],
            }
        }
        _ => StateRow::Malformed,
    }
}
