//! Merge source attributions into final output segments
//!

use itertools::Itertools;
use serde::Serialize;

use crate::int_range::IntRange;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributionSource {
    Target,
    Query,

    /// Never output, only used to split runs of the other sources
    Placeholder,
}

/// Assignment of one stretch of output sequence to a source assembly
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribution {
    pub contig: String,
    pub source: AttributionSource,
    pub range: IntRange,
    pub contig_len: i64,
}

impl Attribution {
    pub fn target(contig: &str, range: IntRange, contig_len: i64) -> Self {
        Self {
            contig: contig.to_string(),
            source: AttributionSource::Target,
            range,
            contig_len,
        }
    }

    pub fn query(contig: &str, range: IntRange, contig_len: i64) -> Self {
        Self {
            contig: contig.to_string(),
            source: AttributionSource::Query,
            range,
            contig_len,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            contig: String::new(),
            source: AttributionSource::Placeholder,
            range: IntRange::from_pair(1, 1),
            contig_len: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SegmentSource {
    Target,
    Query,
}

/// One same-source stretch of the stitched output sequence
///
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Segment {
    pub contig: String,
    pub source: SegmentSource,
    pub range: IntRange,
}

/// Merge consecutive attributions from the same source into segments
///
/// Each run takes the contig name of its first attribution and spans from the minimum start to
/// the maximum end of the run. Placeholder runs are then removed, and the outer segment bounds
/// are extended to the start of the first segment's contig and the end of the last segment's
/// contig.
///
pub fn aggregate(attributions: &[Attribution]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_contig_len = 0;
    for (source, run) in &attributions.iter().chunk_by(|x| x.source) {
        let source = match source {
            AttributionSource::Target => SegmentSource::Target,
            AttributionSource::Query => SegmentSource::Query,
            AttributionSource::Placeholder => continue,
        };

        let mut run = run.peekable();
        let Some(first) = run.peek().copied() else {
            continue;
        };
        let mut range = first.range.clone();
        for x in run {
            range.merge(&x.range);
        }

        last_contig_len = first.contig_len;
        segments.push(Segment {
            contig: first.contig.clone(),
            source,
            range,
        });
    }

    if let Some(first) = segments.first_mut() {
        first.range.start = 0;
    }
    if let Some(last) = segments.last_mut() {
        last.range.end = last_contig_len;
    }
    segments
}
