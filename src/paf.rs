//! Read broken pairwise alignments from PAF into alignment blocks
//!

use log::{debug, info};
use simple_error::{SimpleResult, bail};

use crate::alignment_block::{AlignmentBlock, Orientation, parse_edit_script};
use crate::assembly::SequenceSource;
use crate::int_range::IntRange;
use crate::run_stats::AlignmentInputStats;

/// Number of required leading PAF columns
const PAF_REQUIRED_COLUMN_COUNT: usize = 12;

pub struct PafFilterSettings {
    /// Alignment records below this mapping quality are skipped
    pub min_mapq: u8,

    /// If false, only records tagged as primary alignments are used
    pub include_secondary: bool,
}

/// Fields of one PAF line, in the window-local coordinates of the record
///
#[derive(Debug)]
pub struct PafRecord {
    pub query_name: String,
    pub query_start: i64,
    pub query_end: i64,
    pub strand: Orientation,
    pub target_name: String,
    pub target_start: i64,
    pub target_end: i64,
    pub mapq: u8,

    /// Value of the 'tp:A' tag
    pub alignment_type: Option<char>,

    /// Value of the 'cg:Z' tag
    pub cigar: Option<String>,
}

impl PafRecord {
    /// Records without an alignment type tag are treated as primary
    pub fn is_primary(&self) -> bool {
        self.alignment_type.is_none_or(|x| x == 'P')
    }
}

pub fn parse_paf_line(line: &str) -> SimpleResult<PafRecord> {
    let words = line.trim_end_matches('\r').split('\t').collect::<Vec<_>>();
    if words.len() < PAF_REQUIRED_COLUMN_COUNT {
        bail!(
            "Expected at least {PAF_REQUIRED_COLUMN_COUNT} columns but found {}",
            words.len()
        );
    }

    fn parse_int(label: &str, word: &str) -> SimpleResult<i64> {
        match word.parse::<i64>() {
            Ok(x) if x >= 0 => Ok(x),
            Ok(_) => bail!("Negative {label} value '{word}'"),
            Err(_) => bail!("Can't parse {label} value '{word}'"),
        }
    }

    // Length and match count columns are validated but not otherwise used:
    parse_int("query length", words[1])?;
    parse_int("target length", words[6])?;
    parse_int("residue match count", words[9])?;
    parse_int("alignment block length", words[10])?;

    let mapq = match words[11].parse::<u8>() {
        Ok(x) => x,
        Err(_) => bail!("Can't parse mapping quality value '{}'", words[11]),
    };

    let mut alignment_type = None;
    let mut cigar = None;
    for word in words[PAF_REQUIRED_COLUMN_COUNT..].iter() {
        if let Some(val) = word.strip_prefix("tp:A:") {
            alignment_type = val.chars().next();
        } else if let Some(val) = word.strip_prefix("cg:Z:") {
            cigar = Some(val.to_string());
        }
    }

    Ok(PafRecord {
        query_name: words[0].to_string(),
        query_start: parse_int("query start", words[2])?,
        query_end: parse_int("query end", words[3])?,
        strand: Orientation::from_strand_str(words[4])?,
        target_name: words[5].to_string(),
        target_start: parse_int("target start", words[7])?,
        target_end: parse_int("target end", words[8])?,
        mapq,
        alignment_type,
        cigar,
    })
}

/// Split a sequence window name in the format `<contig>:<start>-<end>` into the base contig name
/// and the window start
///
/// Names without a parsable window suffix are returned whole with a window start of 0.
///
pub fn decode_window_name(name: &str) -> (&str, i64) {
    let window_start = name.rsplit_once(':').and_then(|(base, window)| {
        let (start, end) = window.split_once('-')?;
        let start = start.parse::<i64>().ok()?;
        end.parse::<i64>().ok()?;
        if base.is_empty() {
            None
        } else {
            Some((base, start))
        }
    });
    window_start.unwrap_or((name, 0))
}

/// Shift a window-local range to base contig coordinates
///
fn get_shifted_range(start: i64, end: i64, offset: i64, label: &str) -> SimpleResult<IntRange> {
    match (start.checked_add(offset), end.checked_add(offset)) {
        (Some(start), Some(end)) => Ok(IntRange::from_pair(start, end)),
        _ => bail!("Window offset {offset} overflows the {label} range {start}-{end}"),
    }
}

/// Convert one PAF record into an alignment block in base contig coordinates
///
fn get_alignment_block(
    record: PafRecord,
    target: &impl SequenceSource,
    query: &impl SequenceSource,
) -> SimpleResult<AlignmentBlock> {
    let (target_contig, target_offset) = decode_window_name(&record.target_name);
    let (query_contig, query_offset) = decode_window_name(&record.query_name);

    let Some(target_contig_len) = target.contig_length(target_contig) else {
        bail!(
            "Alignment target contig '{target_contig}' is not found in the {} assembly",
            target.label()
        );
    };
    let Some(query_contig_len) = query.contig_length(query_contig) else {
        bail!(
            "Alignment query contig '{query_contig}' is not found in the {} assembly",
            query.label()
        );
    };

    let Some(cigar) = record.cigar.as_ref() else {
        bail!("Alignment record is missing the 'cg:Z' edit script tag");
    };

    let block = AlignmentBlock {
        target_contig: target_contig.to_string(),
        target_range: get_shifted_range(
            record.target_start,
            record.target_end,
            target_offset,
            "target",
        )?,
        target_contig_len,
        query_contig: query_contig.to_string(),
        query_range: get_shifted_range(
            record.query_start,
            record.query_end,
            query_offset,
            "query",
        )?,
        query_contig_len,
        orientation: record.strand,
        mapq: record.mapq,
        edit_ops: parse_edit_script(cigar)?,
    };
    block.validate()?;
    Ok(block)
}

/// Order blocks so that consecutive blocks on the same target contig are adjacent in target
/// coordinate order
///
pub fn sort_blocks_for_traversal(blocks: &mut [AlignmentBlock]) {
    blocks.sort_by(|a, b| {
        a.target_contig
            .cmp(&b.target_contig)
            .then(a.target_range.start.cmp(&b.target_range.start))
            .then(a.query_contig.cmp(&b.query_contig))
            .then(a.query_range.start.cmp(&b.query_range.start))
    });
}

/// Read alignment blocks from PAF text
///
/// Returned blocks are filtered, joined to their base contig lengths and sorted for traversal.
///
pub fn parse_alignment_blocks(
    content: &str,
    filter: &PafFilterSettings,
    target: &impl SequenceSource,
    query: &impl SequenceSource,
) -> SimpleResult<(Vec<AlignmentBlock>, AlignmentInputStats)> {
    let mut stats = AlignmentInputStats::default();
    let mut blocks = Vec::new();
    for (line_index, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;
        let record = match parse_paf_line(line) {
            Ok(x) => x,
            Err(e) => bail!("Invalid alignment record on line {line_no}: {e}"),
        };
        stats.records_read += 1;

        if record.mapq < filter.min_mapq {
            stats.records_filtered_mapq += 1;
            continue;
        }
        if !(filter.include_secondary || record.is_primary()) {
            stats.records_filtered_secondary += 1;
            continue;
        }

        let block = match get_alignment_block(record, target, query) {
            Ok(x) => x,
            Err(e) => bail!("Invalid alignment record on line {line_no}: {e}"),
        };
        debug!(
            "Alignment block {}:{:?} {:?} {}:{:?} mapq {}",
            block.target_contig,
            block.target_range,
            block.orientation,
            block.query_contig,
            block.query_range,
            block.mapq
        );
        blocks.push(block);
    }

    sort_blocks_for_traversal(&mut blocks);
    stats.blocks_used = blocks.len();
    Ok((blocks, stats))
}

/// Read alignment blocks from a PAF file
///
/// The file may be uncompressed or bgzipped.
///
pub fn read_alignment_blocks(
    filename: &str,
    filter: &PafFilterSettings,
    target: &impl SequenceSource,
    query: &impl SequenceSource,
) -> SimpleResult<(Vec<AlignmentBlock>, AlignmentInputStats)> {
    use rust_htslib::bgzf;
    use std::io::Read;

    info!("Reading alignments from file '{filename}'");

    let mut reader = match bgzf::Reader::from_path(filename) {
        Ok(x) => x,
        Err(e) => bail!("Unable to open alignment file: '{filename}': {e}"),
    };

    let mut content = String::new();
    if let Err(e) = reader.read_to_string(&mut content) {
        bail!("Can't read text from alignment file: '{filename}': {e}");
    }

    let (blocks, stats) = match parse_alignment_blocks(&content, filter, target, query) {
        Ok(x) => x,
        Err(e) => bail!("Error in alignment file '{filename}': {e}"),
    };

    info!(
        "Read {} alignment records, {} filtered for mapping quality, {} filtered as non-primary, {} used",
        stats.records_read,
        stats.records_filtered_mapq,
        stats.records_filtered_secondary,
        stats.blocks_used
    );
    Ok((blocks, stats))
}
