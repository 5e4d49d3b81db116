use std::fmt::{self, Display};
use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use mrca_asr::assembler::AssemblyConfig;
use mrca_asr::clusters::{ClusterColumns, MatchingStrategy};
use mrca_asr::pipeline::ExtractionConfig;

use crate::Result;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// Log debug messages
    #[arg(short, long, global = true)]
    pub(super) verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub(super) quiet: bool,

    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Subcommand)]
pub(super) enum Commands {
    /// Extracts the ancestral sequences at the MRCA and the MRCA's parent of every cluster
    Mrca {
        /// Tree file in newick format, internal node names must match the state table
        #[arg(value_name = "TREE_FILE")]
        tree_file: PathBuf,

        /// Table assigning taxon labels to clusters
        #[arg(value_name = "CLUSTER_FILE")]
        cluster_file: PathBuf,

        /// Ancestral state table, e.g. the .state file of IQ-TREE
        #[arg(value_name = "STATE_FILE")]
        state_file: PathBuf,

        /// Output fasta file
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,

        /// How taxon labels are matched to tree leaf ids
        #[arg(short, long, value_enum, default_value_t = Matching::Substring)]
        matching: Matching,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Warn if a smaller fraction of internal tree nodes is found in the state table
        #[arg(long, default_value_t = 0.5)]
        min_node_overlap: f64,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },
    /// Converts an ancestral state table into a fasta file with one sequence per node
    Extract {
        /// Ancestral state table, e.g. the .state file of IQ-TREE
        #[arg(value_name = "STATE_FILE")]
        state_file: PathBuf,

        /// Output fasta file
        #[arg(value_name = "OUTPUT_FILE", default_value = "ancestral_sequences.fasta")]
        output_file: PathBuf,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },
    /// Appends the cluster id to every sequence id of an alignment
    Annotate {
        /// Aligned sequences in fasta format
        #[arg(value_name = "ALIGNMENT_FILE")]
        alignment_file: PathBuf,

        /// Table assigning taxon labels to clusters
        #[arg(value_name = "CLUSTER_FILE")]
        cluster_file: PathBuf,

        /// Output fasta file
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Args)]
pub(super) struct ColumnArgs {
    /// Column of the cluster table holding taxon labels
    #[arg(long, default_value = "Label")]
    label_column: String,

    /// Column of the cluster table holding cluster ids
    #[arg(long, default_value = "Cluster")]
    cluster_column: String,
}

impl From<ColumnArgs> for ClusterColumns {
    fn from(args: ColumnArgs) -> Self {
        ClusterColumns {
            label: args.label_column,
            cluster: args.cluster_column,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Matching {
    Exact,
    Substring,
    Prefix,
}

impl From<Matching> for MatchingStrategy {
    fn from(matching: Matching) -> Self {
        match matching {
            Matching::Exact => MatchingStrategy::Exact,
            Matching::Substring => MatchingStrategy::Substring,
            Matching::Prefix => MatchingStrategy::Prefix,
        }
    }
}

pub(super) enum Task {
    Mrca(ExtractionConfig),
    Extract {
        state_file: PathBuf,
        output_file: PathBuf,
        overwrite: bool,
    },
    Annotate {
        alignment_file: PathBuf,
        cluster_file: PathBuf,
        columns: ClusterColumns,
        output_file: PathBuf,
        overwrite: bool,
    },
}

pub(super) struct Config {
    pub(super) task: Task,
}

impl Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.task {
            Task::Mrca(cfg) => write!(f, "Extracting cluster MRCA sequences.\n{}", cfg),
            Task::Extract {
                state_file,
                output_file,
                ..
            } => write!(
                f,
                "Exporting ancestral sequences from {} to {}.",
                state_file.display(),
                output_file.display()
            ),
            Task::Annotate {
                alignment_file,
                cluster_file,
                output_file,
                ..
            } => write!(
                f,
                "Annotating {} with clusters from {}, writing to {}.",
                alignment_file.display(),
                cluster_file.display(),
                output_file.display()
            ),
        }
    }
}

pub(super) struct ConfigBuilder {
    pub(super) log_level: LevelFilter,
    task: Task,
}

impl From<Cli> for ConfigBuilder {
    fn from(cli: Cli) -> Self {
        let log_level = if cli.verbose {
            LevelFilter::Debug
        } else if cli.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        };
        let task = match cli.command {
            Commands::Mrca {
                tree_file,
                cluster_file,
                state_file,
                output_file,
                matching,
                columns,
                min_node_overlap,
                force,
            } => {
                let mut cfg = ExtractionConfig::new(tree_file, cluster_file, state_file, output_file);
                cfg.columns = columns.into();
                cfg.assembly = AssemblyConfig {
                    matching: matching.into(),
                    min_node_overlap,
                };
                cfg.overwrite = force;
                Task::Mrca(cfg)
            }
            Commands::Extract {
                state_file,
                output_file,
                force,
            } => Task::Extract {
                state_file,
                output_file,
                overwrite: force,
            },
            Commands::Annotate {
                alignment_file,
                cluster_file,
                output_file,
                columns,
                force,
            } => Task::Annotate {
                alignment_file,
                cluster_file,
                columns: columns.into(),
                output_file,
                overwrite: force,
            },
        };
        ConfigBuilder { log_level, task }
    }
}

impl ConfigBuilder {
    /// Checks that all input files exist before any of them is parsed.
    pub(super) fn setup(self) -> Result<Config> {
        let inputs = match &self.task {
            Task::Mrca(cfg) => vec![&cfg.tree_file, &cfg.cluster_file, &cfg.state_file],
            Task::Extract { state_file, .. } => vec![state_file],
            Task::Annotate {
                alignment_file,
                cluster_file,
                ..
            } => vec![alignment_file, cluster_file],
        };
        for input in inputs {
            if !input.is_file() {
                bail!("Input file {} does not exist", input.display());
            }
        }
        if let Task::Mrca(cfg) = &self.task {
            if !(0.0..=1.0).contains(&cfg.assembly.min_node_overlap) {
                bail!(
                    "Minimal node overlap must be between 0 and 1, got {}",
                    cfg.assembly.min_node_overlap
                );
            }
        }
        Ok(Config { task: self.task })
    }
}
