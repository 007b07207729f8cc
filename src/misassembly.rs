//! Per-contig lookup of annotated misassembly regions
//!

use std::collections::HashMap;

use bio::data_structures::interval_tree::IntervalTree;
use log::{info, warn};
use serde::Serialize;
use simple_error::{SimpleResult, bail};

use crate::int_range::IntRange;

/// Closed set of misassembly annotation categories
///
/// Annotation labels outside of the named categories are kept as `Unrecognized`, so that they
/// still take part in overlap selection.
///
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum MisassemblyCategory {
    #[strum(to_string = "GAP")]
    Gap,
    #[strum(to_string = "MISJOIN")]
    Misjoin,
    #[strum(to_string = "COLLAPSE")]
    Collapse,
    #[strum(to_string = "COLLAPSE_VAR", serialize = "COLLAPSE_VARIANT")]
    CollapseVariant,
    #[strum(to_string = "UNRECOGNIZED")]
    Unrecognized,
}

impl MisassemblyCategory {
    /// Map a free-text annotation label to its category
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(MisassemblyCategory::Unrecognized)
    }
}

/// One row of a misassembly annotation table, in the table's 1-indexed fully-closed convention
///
#[derive(Clone, Debug, PartialEq)]
pub struct MisassemblyRow {
    pub contig: String,
    pub start: i64,
    pub end: i64,
    pub category: MisassemblyCategory,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MisassemblyInterval {
    pub contig: String,
    pub range: IntRange,
    pub category: MisassemblyCategory,
}

/// Misassembly regions on a single contig which can be efficiently queried
///
#[derive(Clone, Debug)]
struct ContigMisassemblies {
    regions: IntervalTree<i64, MisassemblyCategory>,
}

impl ContigMisassemblies {
    fn new() -> Self {
        Self {
            regions: IntervalTree::new(),
        }
    }
}

/// Misassembly regions for all contigs of one assembly
///
/// The index is immutable once built.
///
#[derive(Clone, Debug)]
pub struct MisassemblyIndex {
    contigs: HashMap<String, ContigMisassemblies>,
    interval_count: usize,
}

impl MisassemblyIndex {
    /// An index with no regions, every query on it returns an empty result
    pub fn empty() -> Self {
        Self {
            contigs: HashMap::new(),
            interval_count: 0,
        }
    }

    /// Build the index from annotation rows
    ///
    /// Both row bounds are shifted down by one, so the 1-indexed row [start,end] is stored as the
    /// half-open interval [start-1,end-1). This matches the established output of the tool and
    /// drops the final base of each annotated region.
    ///
    /// Rows which become empty after this conversion can't be stored and are skipped.
    ///
    /// Returns the index and the number of skipped rows.
    ///
    pub fn build(rows: impl IntoIterator<Item = MisassemblyRow>) -> (Self, usize) {
        let mut index = Self::empty();
        let mut skipped_count = 0;
        for row in rows {
            let range = IntRange::from_pair(row.start - 1, row.end - 1);
            if range.is_empty() {
                skipped_count += 1;
                continue;
            }
            index
                .contigs
                .entry(row.contig)
                .or_insert_with(ContigMisassemblies::new)
                .regions
                .insert(range.as_range(), row.category);
            index.interval_count += 1;
        }
        (index, skipped_count)
    }

    /// Create a new index from a misassembly annotation file
    ///
    /// The file may be uncompressed or bgzipped.
    ///
    /// # Arguments
    ///
    /// * `label` - Used in log and error messages to describe which assembly the table belongs to
    ///
    pub fn from_bed(filename: &str, label: &str) -> SimpleResult<Self> {
        use rust_htslib::bgzf;
        use std::io::Read;

        info!("Reading {label} misassembly regions from file '{filename}'");

        let mut reader = match bgzf::Reader::from_path(filename) {
            Ok(x) => x,
            Err(e) => bail!("Unable to open {label} misassembly file: '{filename}': {e}"),
        };

        let mut content = String::new();
        if let Err(e) = reader.read_to_string(&mut content) {
            bail!("Can't read text from {label} misassembly file: '{filename}': {e}");
        }

        let mut rows = Vec::new();
        for (line_index, line) in content.lines().enumerate() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_misassembly_line(line) {
                Ok(row) => rows.push(row),
                Err(e) => bail!(
                    "Invalid record in {label} misassembly file '{filename}' line {}: {e}",
                    line_index + 1
                ),
            }
        }

        let row_count = rows.len();
        let unrecognized_count = rows
            .iter()
            .filter(|x| x.category == MisassemblyCategory::Unrecognized)
            .count();
        if unrecognized_count > 0 {
            info!(
                "Found {unrecognized_count} {label} misassembly regions with unrecognized category labels"
            );
        }

        let (index, skipped_count) = Self::build(rows);
        if skipped_count > 0 {
            warn!(
                "Skipped {skipped_count} zero-length {label} misassembly regions in file '{filename}'"
            );
        }
        info!(
            "Loaded {} of {row_count} {label} misassembly regions on {} contigs",
            index.interval_count,
            index.contigs.len()
        );
        Ok(index)
    }

    /// Find all stored intervals on `contig` intersecting `range`
    ///
    /// Results are sorted by interval position. An unknown contig yields no intervals.
    ///
    pub fn query(&self, contig: &str, range: &IntRange) -> Vec<MisassemblyInterval> {
        if range.is_empty() {
            return Vec::new();
        }
        let Some(contig_regions) = self.contigs.get(contig) else {
            return Vec::new();
        };
        let mut overlaps = contig_regions
            .regions
            .find(range.as_range())
            .map(|x| MisassemblyInterval {
                contig: contig.to_string(),
                range: IntRange::from_pair(x.interval().start, x.interval().end),
                category: *x.data(),
            })
            .collect::<Vec<_>>();
        overlaps.sort_by(|a, b| {
            a.range
                .cmp(&b.range)
                .then(a.category.cmp(&b.category))
        });
        overlaps
    }

    pub fn interval_count(&self) -> usize {
        self.interval_count
    }
}

/// Parse one tab-delimited annotation line: contig, 1-indexed start, 1-indexed end, category
///
/// Columns beyond the fourth are ignored.
///
pub fn parse_misassembly_line(line: &str) -> SimpleResult<MisassemblyRow> {
    let words = line.trim_end_matches('\r').split('\t').collect::<Vec<_>>();
    if words.len() < 4 {
        bail!("Expected at least 4 columns but found {}", words.len());
    }

    let parse_pos = |label: &str, word: &str| -> SimpleResult<i64> {
        match word.parse::<i64>() {
            Ok(x) => Ok(x),
            Err(_) => bail!("Can't parse {label} coordinate '{word}'"),
        }
    };
    let start = parse_pos("start", words[1])?;
    let end = parse_pos("end", words[2])?;

    let category = MisassemblyCategory::from_label(words[3]);

    Ok(MisassemblyRow {
        contig: words[0].to_string(),
        start,
        end,
        category,
    })
}

/// Select the representative interval among a set of overlapping misassemblies
///
/// The selection maximizes `start - end`, which is never positive, so the narrowest interval is
/// chosen. Ties go to the first interval in `overlaps`.
///
/// TODO: Check this key against reference outputs, the widest interval may be what is intended.
///
pub fn select_largest(overlaps: &[MisassemblyInterval]) -> Option<&MisassemblyInterval> {
    overlaps
        .iter()
        .rev()
        .max_by_key(|x| x.range.start - x.range.end)
}
