mod utils;

use camino::Utf8PathBuf;
use chrono::Datelike;
use clap::Parser;
use simple_error::{SimpleResult, bail};

use self::utils::{check_optional_filename, check_required_filename};
use crate::conflict_resolver::ResolutionPolicy;
use crate::paf::PafFilterSettings;
use crate::sequence_emitter::OutputMode;

pub const MIN_MAPQ: u8 = 60;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    after_help = format!("Copyright (C) 2004-{}     Pacific Biosciences of California, Inc.
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()),
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(rename_all = "kebab_case")]
pub struct Settings {
    /// Alignment of the query assembly to the target assembly in PAF format, broken into blocks
    ///
    /// Each record must carry the alignment edit script in a 'cg:Z:' tag. Contig names may use the
    /// '<contig>:<start>-<end>' window form, in which case coordinates are shifted by the window
    /// start. The file may be bgzipped.
    ///
    #[arg(short = 'i', long = "paf", value_name = "FILE")]
    pub paf_filename: String,

    /// Target assembly in FASTA format
    ///
    /// The target assembly provides the backbone of the consensus sequence.
    ///
    #[arg(short = 'r', long = "target-fasta", value_name = "FILE")]
    pub target_fasta_filename: String,

    /// Query assembly in FASTA format
    #[arg(short = 'q', long = "query-fasta", value_name = "FILE")]
    pub query_fasta_filename: String,

    /// Misassembly regions of the target assembly, in BED-like format
    ///
    /// Columns are contig, start, end and category, with 1-indexed fully-closed coordinates.
    /// Categories are GAP, MISJOIN, COLLAPSE and COLLAPSE_VAR. Required for the 'misassembly'
    /// policy.
    ///
    #[arg(long = "target-misassemblies", value_name = "FILE")]
    pub target_misassemblies_filename: Option<String>,

    /// Misassembly regions of the query assembly, in the same format as the target regions
    #[arg(long = "query-misassemblies", value_name = "FILE")]
    pub query_misassemblies_filename: Option<String>,

    /// Consensus sequence output in FASTA format. Written to stdout if not specified.
    #[arg(short = 'o', long = "output-fasta", value_name = "FILE")]
    pub output_fasta_filename: Option<Utf8PathBuf>,

    /// Write the source contig and coordinates of every consensus segment to this file
    #[arg(short = 'b', long = "output-bed", value_name = "FILE")]
    pub output_bed_filename: Option<Utf8PathBuf>,

    /// Write the consensus as a single FASTA record instead of one record per segment
    #[arg(long)]
    pub merge: bool,

    /// Method used to choose the source assembly at each alignment indel
    #[arg(long, value_enum, default_value_t = ResolutionPolicy::Misassembly)]
    pub policy: ResolutionPolicy,

    /// Minimum MAPQ value for alignment records to be used
    #[arg(long, default_value_t = MIN_MAPQ)]
    pub min_mapq: u8,

    /// Use alignment records which are not marked as primary ('tp:A:P')
    #[arg(long)]
    pub include_secondary: bool,

    /// Write run statistics to this file in JSON format
    #[arg(long = "run-stats", value_name = "FILE")]
    pub run_stats_filename: Option<Utf8PathBuf>,

    /// Copy all log output to this file
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_filename: Option<Utf8PathBuf>,

    /// Turn on extra debug logging
    ///
    /// This includes a description of every alignment indel overlapping a misassembly region.
    ///
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    pub fn get_output_mode(&self) -> OutputMode {
        if self.merge {
            OutputMode::Merged
        } else {
            OutputMode::PerSegment
        }
    }

    pub fn get_paf_filter(&self) -> PafFilterSettings {
        PafFilterSettings {
            min_mapq: self.min_mapq,
            include_secondary: self.include_secondary,
        }
    }
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_settings_impl(settings: Settings) -> SimpleResult<Settings> {
    check_required_filename(&settings.paf_filename, "alignment")?;
    check_required_filename(&settings.target_fasta_filename, "target assembly")?;
    check_required_filename(&settings.query_fasta_filename, "query assembly")?;

    check_optional_filename(
        settings.target_misassemblies_filename.as_ref(),
        "target misassembly",
    )?;
    check_optional_filename(
        settings.query_misassemblies_filename.as_ref(),
        "query misassembly",
    )?;

    if settings.policy == ResolutionPolicy::Misassembly {
        if settings.target_misassemblies_filename.is_none() {
            bail!("--target-misassemblies is required for the 'misassembly' policy");
        }
        if settings.query_misassemblies_filename.is_none() {
            bail!("--query-misassemblies is required for the 'misassembly' policy");
        }
    }

    if let (Some(fasta), Some(bed)) = (
        &settings.output_fasta_filename,
        &settings.output_bed_filename,
    ) {
        if fasta == bed {
            bail!("--output-fasta and --output-bed must be different files: '{fasta}'");
        }
    }

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
