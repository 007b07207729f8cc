mod alignment_block;
mod assembly;
mod cigar_walker;
mod cli;
mod conflict_resolver;
mod globals;
mod int_range;
mod logger;
mod misassembly;
mod paf;
mod reconcile;
mod run_stats;
mod segment;
mod sequence_emitter;

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;

use camino::Utf8Path;
use hhmmss::Hhmmss;
use log::{error, info};

use crate::assembly::FaidxAssembly;
use crate::conflict_resolver::{ConflictResolver, ResolutionPolicy};
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_logger;
use crate::misassembly::MisassemblyIndex;
use crate::paf::read_alignment_blocks;
use crate::reconcile::reconcile;
use crate::run_stats::{RunStats, write_run_stats};
use crate::sequence_emitter::emit;

fn create_output_file(filename: &Utf8Path) -> Result<BufWriter<File>, Box<dyn Error>> {
    info!("Writing to file: '{filename}'");
    let f = File::create(filename).map_err(|e| {
        std::io::Error::new(e.kind(), format!("Unable to create file: '{filename}': {e}"))
    })?;
    Ok(BufWriter::new(f))
}

/// Load misassembly regions for both assemblies, as required by the resolution policy
///
fn load_misassembly_indexes(
    settings: &cli::Settings,
) -> Result<(MisassemblyIndex, MisassemblyIndex), Box<dyn Error>> {
    let load = |filename: Option<&String>, label: &str| -> Result<_, Box<dyn Error>> {
        match settings.policy {
            ResolutionPolicy::Misassembly => match filename {
                Some(x) => Ok(MisassemblyIndex::from_bed(x, label)?),
                None => Err(format!("No {label} misassembly file specified").into()),
            },
            ResolutionPolicy::GapOnly => {
                if let Some(x) = filename {
                    info!(
                        "Ignoring {label} misassembly file '{x}' for policy '{}'",
                        settings.policy
                    );
                }
                Ok(MisassemblyIndex::empty())
            }
        }
    };
    let target_index = load(settings.target_misassemblies_filename.as_ref(), "target")?;
    let query_index = load(settings.query_misassemblies_filename.as_ref(), "query")?;
    Ok((target_index, query_index))
}

fn run(settings: &cli::Settings) -> Result<(), Box<dyn Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    info!("Resolution policy: {}", settings.policy);

    let start = std::time::Instant::now();
    let mut run_stats = RunStats::default();

    let target = FaidxAssembly::from_path(&settings.target_fasta_filename, "target")?;
    let query = FaidxAssembly::from_path(&settings.query_fasta_filename, "query")?;

    let (target_index, query_index) = load_misassembly_indexes(settings)?;
    run_stats.misassembly_input.target_interval_count = target_index.interval_count();
    run_stats.misassembly_input.query_interval_count = query_index.interval_count();

    let (blocks, alignment_stats) = read_alignment_blocks(
        &settings.paf_filename,
        &settings.get_paf_filter(),
        &target,
        &query,
    )?;
    run_stats.alignment_input = alignment_stats;

    let resolver = ConflictResolver::new(settings.policy, &target_index, &query_index);
    let segments = reconcile(
        &blocks,
        &resolver,
        &mut run_stats.walk,
        &mut run_stats.output,
    );

    if segments.is_empty() {
        info!("No consensus segments found, skipping sequence output");
    } else {
        let mut fasta_writer: Box<dyn Write> = match &settings.output_fasta_filename {
            Some(x) => Box::new(create_output_file(x)?),
            None => Box::new(BufWriter::new(std::io::stdout().lock())),
        };
        let mut bed_writer = match &settings.output_bed_filename {
            Some(x) => Some(create_output_file(x)?),
            None => None,
        };

        run_stats.output.emitted_base_count = emit(
            &segments,
            &target,
            &query,
            settings.get_output_mode(),
            &mut fasta_writer,
            bed_writer.as_mut().map(|x| x as &mut dyn Write),
        )?;

        fasta_writer.flush()?;
        if let Some(x) = bed_writer.as_mut() {
            x.flush()?;
        }
    }

    run_stats.total_runtime_secs = start.elapsed().as_secs_f64();
    run_stats.log_summary();
    if let Some(filename) = &settings.run_stats_filename {
        write_run_stats(filename, &run_stats)?;
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    if let Err(e) = setup_logger(settings.log_filename.as_deref(), settings.debug) {
        eprintln!("Unable to setup logger: {e}");
        process::exit(exitcode::IOERR);
    }

    if let Err(err) = run(&settings) {
        error!("{err}");
        let code = if err.is::<std::io::Error>() {
            exitcode::IOERR
        } else {
            exitcode::DATAERR
        };
        process::exit(code);
    }
}
