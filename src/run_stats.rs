//! Track stats for the whole asmstitch run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::Serialize;
use simple_error::{SimpleResult, bail};

use crate::conflict_resolver::{Decision, ReservedCell};

#[derive(Debug, Default, Serialize)]
pub struct AlignmentInputStats {
    pub records_read: usize,
    pub records_filtered_mapq: usize,
    pub records_filtered_secondary: usize,
    pub blocks_used: usize,
}

#[derive(Default, Serialize)]
pub struct MisassemblyInputStats {
    pub target_interval_count: usize,
    pub query_interval_count: usize,
}

/// Outcome counts for one type of indel
#[derive(Default, Serialize)]
pub struct IndelDecisionCounts {
    pub unflagged: usize,
    pub excluded: usize,
    pub query_sourced: usize,
    pub reserved_collapse: usize,
    pub reserved_unrecognized: usize,
    pub reserved_query_flagged: usize,
    pub reserved_both_flagged: usize,
}

impl IndelDecisionCounts {
    pub fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Unflagged => self.unflagged += 1,
            Decision::Exclude => self.excluded += 1,
            Decision::UseQuery => self.query_sourced += 1,
            Decision::Reserved(ReservedCell::TargetCollapse) => self.reserved_collapse += 1,
            Decision::Reserved(ReservedCell::TargetUnrecognized) => {
                self.reserved_unrecognized += 1
            }
            Decision::Reserved(ReservedCell::QueryFlagged) => self.reserved_query_flagged += 1,
            Decision::Reserved(ReservedCell::BothFlagged) => self.reserved_both_flagged += 1,
        }
    }

    pub fn reserved(&self) -> usize {
        self.reserved_collapse
            + self.reserved_unrecognized
            + self.reserved_query_flagged
            + self.reserved_both_flagged
    }

    pub fn total(&self) -> usize {
        self.unflagged + self.excluded + self.query_sourced + self.reserved()
    }
}

#[derive(Default, Serialize)]
pub struct WalkStats {
    pub match_events: usize,
    pub other_events: usize,
    pub bridge_events: usize,
    pub deletions: IndelDecisionCounts,
    pub insertions: IndelDecisionCounts,
}

#[derive(Default, Serialize)]
pub struct OutputStats {
    pub attribution_count: usize,
    pub target_segment_count: usize,
    pub query_segment_count: usize,
    pub emitted_base_count: usize,
}

#[derive(Default, Serialize)]
pub struct RunStats {
    pub alignment_input: AlignmentInputStats,
    pub misassembly_input: MisassemblyInputStats,
    pub walk: WalkStats,
    pub output: OutputStats,
    pub total_runtime_secs: f64,
}

impl RunStats {
    /// Summarize indel resolution in the log
    pub fn log_summary(&self) {
        let w = &self.walk;
        info!(
            "Deletions: {} total, {} excluded, {} reserved ({} collapse, {} unrecognized, {} query-flagged, {} both-flagged)",
            w.deletions.total(),
            w.deletions.excluded,
            w.deletions.reserved(),
            w.deletions.reserved_collapse,
            w.deletions.reserved_unrecognized,
            w.deletions.reserved_query_flagged,
            w.deletions.reserved_both_flagged,
        );
        info!(
            "Insertions: {} total, {} taken from query, {} reserved ({} collapse, {} unrecognized, {} query-flagged, {} both-flagged)",
            w.insertions.total(),
            w.insertions.query_sourced,
            w.insertions.reserved(),
            w.insertions.reserved_collapse,
            w.insertions.reserved_unrecognized,
            w.insertions.reserved_query_flagged,
            w.insertions.reserved_both_flagged,
        );
        info!(
            "Output: {} target segments, {} query segments, {} bases",
            self.output.target_segment_count,
            self.output.query_segment_count,
            self.output.emitted_base_count
        );
    }
}

/// Write run_stats structure out in json format
pub fn write_run_stats(filename: &Utf8Path, run_stats: &RunStats) -> SimpleResult<()> {
    info!("Writing run statistics to file: '{filename}'");

    let f = match File::create(filename) {
        Ok(x) => x,
        Err(e) => bail!("Unable to create run statistics json file: '{filename}': {e}"),
    };

    if let Err(e) = serde_json::to_writer_pretty(&f, &run_stats) {
        bail!("Unable to write run statistics json file: '{filename}': {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indel_decision_counts() {
        let mut counts = IndelDecisionCounts::default();
        counts.record(Decision::Exclude);
        counts.record(Decision::Exclude);
        counts.record(Decision::UseQuery);
        counts.record(Decision::Reserved(ReservedCell::BothFlagged));
        counts.record(Decision::Reserved(ReservedCell::TargetUnrecognized));
        counts.record(Decision::Unflagged);

        assert_eq!(counts.excluded, 2);
        assert_eq!(counts.query_sourced, 1);
        assert_eq!(counts.reserved_both_flagged, 1);
        assert_eq!(counts.reserved_unrecognized, 1);
        assert_eq!(counts.reserved(), 2);
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn test_write_run_stats() {
        let dir = tempfile::tempdir().unwrap();
        let filename = camino::Utf8PathBuf::from_path_buf(dir.path().join("stats.json")).unwrap();

        let mut run_stats = RunStats::default();
        run_stats.walk.match_events = 3;
        write_run_stats(&filename, &run_stats).unwrap();

        let content = std::fs::read_to_string(&filename).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["walk"]["match_events"], 3);
    }
}
