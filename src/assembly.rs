//! Random access to assembly contig sequences
//!

use std::collections::HashMap;

use log::info;
use rust_htslib::faidx;
use simple_error::{SimpleResult, bail};

use crate::int_range::IntRange;

/// Contig length and subsequence lookup for one assembly
///
pub trait SequenceSource {
    /// Describes the assembly in log and error messages
    fn label(&self) -> &str;

    fn contig_length(&self, contig: &str) -> Option<i64>;

    /// Get the subsequence of `contig` in the 0-indexed half-open `range`
    ///
    /// An unknown contig or a range extending outside of the contig is an error.
    ///
    fn fetch(&self, contig: &str, range: &IntRange) -> SimpleResult<Vec<u8>>;
}

/// Check a fetch request against the contig length
///
fn check_fetch_range(
    source: &impl SequenceSource,
    contig: &str,
    range: &IntRange,
) -> SimpleResult<()> {
    let Some(contig_len) = source.contig_length(contig) else {
        bail!(
            "Can't fetch {} sequence for unknown contig '{contig}'",
            source.label()
        );
    };
    if range.start < 0 || range.end > contig_len || range.start > range.end {
        bail!(
            "Requested {} sequence range {contig}:{}-{} is outside of contig length {contig_len}",
            source.label(),
            range.start,
            range.end
        );
    }
    Ok(())
}

/// Assembly sequence access through an htslib fasta index
///
/// The fasta index is created if it does not already exist.
///
pub struct FaidxAssembly {
    label: String,
    reader: faidx::Reader,
    contig_lengths: HashMap<String, i64>,
}

impl FaidxAssembly {
    pub fn from_path(filename: &str, label: &str) -> SimpleResult<Self> {
        info!("Opening {label} assembly fasta file '{filename}'");

        let reader = match faidx::Reader::from_path(filename) {
            Ok(x) => x,
            Err(e) => bail!("Unable to open {label} assembly fasta file '{filename}': {e}"),
        };
        let names = match reader.seq_names() {
            Ok(x) => x,
            Err(e) => bail!("Unable to read contig names from {label} assembly '{filename}': {e}"),
        };

        let contig_lengths = names
            .into_iter()
            .map(|name| {
                let len = reader.fetch_seq_len(&name) as i64;
                (name, len)
            })
            .collect::<HashMap<_, _>>();

        info!(
            "Found {} contigs in {label} assembly",
            contig_lengths.len()
        );

        Ok(Self {
            label: label.to_string(),
            reader,
            contig_lengths,
        })
    }
}

impl SequenceSource for FaidxAssembly {
    fn label(&self) -> &str {
        &self.label
    }

    fn contig_length(&self, contig: &str) -> Option<i64> {
        self.contig_lengths.get(contig).copied()
    }

    fn fetch(&self, contig: &str, range: &IntRange) -> SimpleResult<Vec<u8>> {
        check_fetch_range(self, contig, range)?;
        if range.is_empty() {
            return Ok(Vec::new());
        }

        // htslib uses an inclusive end position:
        let seq = match self
            .reader
            .fetch_seq(contig, range.start as usize, (range.end - 1) as usize)
        {
            Ok(x) => x,
            Err(e) => bail!(
                "Failed to fetch {} sequence {contig}:{}-{}: {e}",
                self.label,
                range.start,
                range.end
            ),
        };
        if seq.len() as i64 != range.size() {
            bail!(
                "Fetched {} bases of {} sequence {contig}:{}-{}, expected {}",
                seq.len(),
                self.label,
                range.start,
                range.end,
                range.size()
            );
        }
        Ok(seq)
    }
}

/// Assembly sequence held fully in memory
///
#[cfg(test)]
pub struct InMemoryAssembly {
    label: String,
    contigs: HashMap<String, Vec<u8>>,
}

#[cfg(test)]
impl InMemoryAssembly {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            contigs: HashMap::new(),
        }
    }

    pub fn add_contig(&mut self, name: &str, seq: &[u8]) {
        self.contigs.insert(name.to_string(), seq.to_vec());
    }

    /// Read all records of a fasta file into memory
    ///
    pub fn from_fasta(filename: &str, label: &str) -> SimpleResult<Self> {
        use bio::io::fasta;
        use std::fs::File;

        info!("Reading {label} assembly from fasta file '{filename}'");

        let file = match File::open(filename) {
            Ok(x) => x,
            Err(e) => bail!("Unable to open {label} assembly fasta file '{filename}': {e}"),
        };

        let mut assembly = Self::new(label);
        for result in fasta::Reader::new(file).records() {
            let record = match result {
                Ok(x) => x,
                Err(e) => bail!("Error parsing fasta record in '{filename}': {e}"),
            };
            assembly.add_contig(record.id(), record.seq());
        }
        Ok(assembly)
    }
}

#[cfg(test)]
impl SequenceSource for InMemoryAssembly {
    fn label(&self) -> &str {
        &self.label
    }

    fn contig_length(&self, contig: &str) -> Option<i64> {
        self.contigs.get(contig).map(|x| x.len() as i64)
    }

    fn fetch(&self, contig: &str, range: &IntRange) -> SimpleResult<Vec<u8>> {
        check_fetch_range(self, contig, range)?;
        let seq = &self.contigs[contig];
        Ok(seq[range.start as usize..range.end as usize].to_vec())
    }
}
