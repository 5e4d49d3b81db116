use anyhow::{anyhow, bail, Error};
use clap::{error::ErrorKind, Parser};
use ftail::Ftail;
use log::info;

use mrca_asr::pipeline::{annotate_alignment, export_ancestral_sequences, extract_clade_ancestors};

mod cli;
use crate::cli::{Cli, ConfigBuilder, Task};

type Result<T> = std::result::Result<T, Error>;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => error.exit(),
            _ => bail!("Unable to parse command line arguments: \n {}", error),
        },
    };
    let cfg_build: ConfigBuilder = cli.into();
    Ftail::new()
        .console(cfg_build.log_level)
        .init()
        .map_err(|e| anyhow!("Unable to set up logging: {:?}", e))?;
    info!("Successfully parsed the command line parameters");
    let cfg = cfg_build.setup()?;

    info!("mrca-asr run started.");
    info!("{}", cfg);

    match cfg.task {
        Task::Mrca(extraction) => {
            let report = extract_clade_ancestors(&extraction)?;
            info!("Run summary:\n{}", report);
            println!("{}", report);
            println!(
                "Wrote {} sequences to {}",
                report.records.len(),
                extraction.output_file.display()
            );
        }
        Task::Extract {
            state_file,
            output_file,
            overwrite,
        } => {
            let states = export_ancestral_sequences(&state_file, &output_file, overwrite)?;
            println!("Found {} ancestral nodes", states.len());
            for (node, seq) in states.iter().take(5) {
                println!("  {}: {} states", node, seq.len());
            }
            if states.len() > 5 {
                println!("  ... and {} more nodes", states.len() - 5);
            }
            if states.skipped_rows() > 0 {
                println!("Skipped {} malformed rows", states.skipped_rows());
            }
        }
        Task::Annotate {
            alignment_file,
            cluster_file,
            columns,
            output_file,
            overwrite,
        } => {
            let summary = annotate_alignment(
                &alignment_file,
                &cluster_file,
                &columns,
                &output_file,
                overwrite,
            )?;
            println!("Matched: {}", summary.matched);
            println!("Unmatched: {}", summary.unmatched);
            println!("Written to: {}", output_file.display());
        }
    }
    Ok(())
}
