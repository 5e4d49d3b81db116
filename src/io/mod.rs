use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context};
use bio::io::fasta::{Reader, Record, Writer};
use log::{info, warn};

use crate::asr::AncestralStateTable;
use crate::clusters::{ClusterAssignment, ClusterColumns};
use crate::tree::{tree_parser, Tree};
use crate::Result;

pub struct DataError {
    pub(crate) message: String,
}
impl fmt::Debug for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl Error for DataError {}

/// Reads sequences from a fasta file, returning a vector of fasta records.
///
/// # Arguments
/// * `path` - Path to the fasta file.
pub fn read_sequences(path: &Path) -> Result<Vec<Record>> {
    info!("Reading sequences from file {}", path.display());
    let reader = Reader::from_file(path)?;
    let mut sequences = Vec::new();

    for result in reader.records() {
        let rec = result?;
        if let Err(e) = rec.check() {
            bail!(DataError {
                message: e.to_string()
            });
        }
        sequences.push(rec);
    }
    if sequences.is_empty() {
        bail!(DataError {
            message: String::from("No sequences found in file")
        });
    }

    info!("Read {} sequences successfully", sequences.len());
    Ok(sequences)
}

/// Writes fasta sequences to the given file path.
/// Will return an error if the file already exists, unless `overwrite` is set.
///
/// # Arguments
/// * `sequences` - Vector of fasta records.
/// * `path` - Path to the fasta file.
/// * `overwrite` - Replace an existing file.
///
/// # Example
/// ```
/// # use std::fs;
/// use bio::io::fasta::Record;
/// use mrca_asr::io::write_sequences_to_file;
/// let sequences = vec![
///    Record::with_attrs("Node1|cluster_1_MRCA", None, b"MK"),
///    Record::with_attrs("Node2|cluster_1_MRCA2", None, b"QR"),
/// ];
/// let dir = tempfile::tempdir().unwrap();
/// let output_path = dir.path().join("mrca.fasta");
/// write_sequences_to_file(&sequences, &output_path, false).unwrap();
/// # let expected_output = ">Node1|cluster_1_MRCA\nMK\n>Node2|cluster_1_MRCA2\nQR\n";
/// # assert_eq!(fs::read_to_string(&output_path).unwrap(), expected_output);
/// # assert!(write_sequences_to_file(&sequences, &output_path, false).is_err());
/// ```
pub fn write_sequences_to_file(sequences: &[Record], path: &Path, overwrite: bool) -> Result<()> {
    info!("Writing {} sequences to file {}", sequences.len(), path.display());
    if path.exists() && !overwrite {
        bail!(DataError {
            message: format!("File {} already exists", path.display())
        });
    }
    let mut writer = Writer::to_file(path)?;
    for rec in sequences {
        writer.write_record(rec)?;
    }
    writer.flush()?;
    info!("Finished writing successfully");
    Ok(())
}

/// Reads newick trees from a file, returning a vector of trees.
///
/// # Arguments
/// * `path` - Path to the newick file.
pub fn read_newick_from_file(path: &Path) -> Result<Vec<Tree>> {
    info!("Reading newick trees from file {}", path.display());
    let newick = fs::read_to_string(path)?;
    info!("Read file successfully");
    tree_parser::from_newick(&newick)
}

/// Reads the first tree of a newick file, any further trees are ignored with a warning.
///
/// # Example
/// ```
/// # use std::fs;
/// use mrca_asr::io::read_tree;
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("tree.newick");
/// fs::write(&path, "((A,B),C);").unwrap();
/// let tree = read_tree(&path).unwrap();
/// assert_eq!(tree.internal_ids(), ["Node1", "Node2"]);
/// ```
pub fn read_tree(path: &Path) -> Result<Tree> {
    let mut trees = read_newick_from_file(path)
        .with_context(|| format!("Failed to read tree file {}", path.display()))?;
    if trees.len() > 1 {
        warn!(
            "Found {} trees in {}, only the first one is used",
            trees.len(),
            path.display()
        );
    }
    if trees.is_empty() {
        bail!(DataError {
            message: format!("No trees found in {}", path.display())
        });
    }
    Ok(trees.swap_remove(0))
}

/// Reads a delimited taxon to cluster table, see [`ClusterAssignment::from_table`].
pub fn read_cluster_table(path: &Path, columns: &ClusterColumns) -> Result<ClusterAssignment> {
    info!("Reading cluster assignments from file {}", path.display());
    fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|table| ClusterAssignment::from_table(&table, columns))
        .with_context(|| format!("Failed to read cluster table {}", path.display()))
}

/// Reads an ancestral state table, only failing if the file cannot be read.
pub fn read_state_table(path: &Path) -> Result<AncestralStateTable> {
    info!("Reading ancestral states from file {}", path.display());
    File::open(path)
        .map_err(anyhow::Error::from)
        .and_then(|file| AncestralStateTable::from_reader(BufReader::new(file)))
        .with_context(|| format!("Failed to read ancestral state table {}", path.display()))
}
