//! Reconcile alignment blocks into consensus segments
//!

use log::info;

use crate::alignment_block::AlignmentBlock;
use crate::cigar_walker::{WalkEventKind, adjacent_block_pairs, walk_block_with_bridge};
use crate::conflict_resolver::{ConflictResolver, IndelKind};
use crate::run_stats::{OutputStats, WalkStats};
use crate::segment::{Attribution, Segment, SegmentSource, aggregate};

/// Get the source attribution stream for all blocks in traversal order
///
/// Matched, unclassified and bridging target sequence is always attributed to the target. Indels
/// are attributed according to `resolver`.
///
pub fn get_attributions(
    blocks: &[AlignmentBlock],
    resolver: &ConflictResolver,
    stats: &mut WalkStats,
) -> Vec<Attribution> {
    let mut attributions = Vec::new();
    for (block, next_block) in adjacent_block_pairs(blocks) {
        for event in walk_block_with_bridge(block, next_block) {
            let indel_kind = match event.kind {
                WalkEventKind::Match | WalkEventKind::Other | WalkEventKind::Bridge => {
                    match event.kind {
                        WalkEventKind::Match => stats.match_events += 1,
                        WalkEventKind::Other => stats.other_events += 1,
                        _ => stats.bridge_events += 1,
                    }
                    attributions.push(Attribution::target(
                        &block.target_contig,
                        event.target_range(),
                        block.target_contig_len,
                    ));
                    continue;
                }
                WalkEventKind::TargetOnlyGap => IndelKind::TargetOnlyGap,
                WalkEventKind::QueryOnlyGap => IndelKind::QueryOnlyGap,
            };

            let (decision, attribution) = resolver.resolve(indel_kind, block, &event);
            match indel_kind {
                IndelKind::TargetOnlyGap => stats.deletions.record(decision),
                IndelKind::QueryOnlyGap => stats.insertions.record(decision),
            }
            attributions.extend(attribution);
        }
    }
    attributions
}

/// Produce the final consensus segments for all alignment blocks
///
pub fn reconcile(
    blocks: &[AlignmentBlock],
    resolver: &ConflictResolver,
    walk_stats: &mut WalkStats,
    output_stats: &mut OutputStats,
) -> Vec<Segment> {
    let attributions = get_attributions(blocks, resolver, walk_stats);
    let segments = aggregate(&attributions);

    output_stats.attribution_count = attributions.len();
    output_stats.target_segment_count = segments
        .iter()
        .filter(|x| x.source == SegmentSource::Target)
        .count();
    output_stats.query_segment_count = segments.len() - output_stats.target_segment_count;

    info!(
        "Reconciled {} alignment blocks into {} attributions and {} segments",
        blocks.len(),
        attributions.len(),
        segments.len()
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_block::tests::get_test_block;
    use crate::assembly::InMemoryAssembly;
    use crate::conflict_resolver::ResolutionPolicy;
    use crate::int_range::IntRange;
    use crate::misassembly::{MisassemblyCategory, MisassemblyIndex, MisassemblyRow};
    use crate::segment::AttributionSource;
    use crate::sequence_emitter::{OutputMode, emit};

    fn get_index(rows: Vec<(&str, i64, i64, MisassemblyCategory)>) -> MisassemblyIndex {
        let rows = rows.into_iter().map(|(contig, start, end, category)| MisassemblyRow {
            contig: contig.to_string(),
            start,
            end,
            category,
        });
        MisassemblyIndex::build(rows).0
    }

    fn run_reconcile(
        blocks: &[AlignmentBlock],
        target_index: &MisassemblyIndex,
        query_index: &MisassemblyIndex,
    ) -> (Vec<Segment>, WalkStats) {
        let resolver =
            ConflictResolver::new(ResolutionPolicy::Misassembly, target_index, query_index);
        let mut walk_stats = WalkStats::default();
        let mut output_stats = OutputStats::default();
        let segments = reconcile(blocks, &resolver, &mut walk_stats, &mut output_stats);
        (segments, walk_stats)
    }

    /// Check the structural guarantees of every final segment list
    fn check_segment_bounds(segments: &[Segment], last_contig_len: i64) {
        assert_eq!(segments.first().unwrap().range.start, 0);
        assert_eq!(segments.last().unwrap().range.end, last_contig_len);
        assert!(segments.iter().all(|x| x.range.start <= x.range.end));
    }

    #[test]
    fn test_baseline_single_match_block() {
        let blocks = vec![get_test_block("t", 0, 5000, "q", 0, 5000, "5000=")];
        let empty = MisassemblyIndex::empty();
        let (segments, stats) = run_reconcile(&blocks, &empty, &empty);

        assert_eq!(
            segments,
            vec![Segment {
                contig: "t".to_string(),
                source: SegmentSource::Target,
                range: IntRange::from_pair(0, 5000),
            }]
        );
        assert_eq!(stats.match_events, 1);
    }

    #[test]
    fn test_baseline_with_contig_end_slack() {
        let blocks = vec![get_test_block("t", 100, 5000, "q", 0, 5000, "4000=")];
        let empty = MisassemblyIndex::empty();
        let (segments, _) = run_reconcile(&blocks, &empty, &empty);
        assert_eq!(segments.len(), 1);
        check_segment_bounds(&segments, 5000);
    }

    #[test]
    fn test_unflagged_indels_are_absorbed() {
        let blocks = vec![get_test_block("t", 0, 3000, "q", 0, 3000, "1000=5D1000=7I995=")];
        let empty = MisassemblyIndex::empty();
        let (segments, stats) = run_reconcile(&blocks, &empty, &empty);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].range, IntRange::from_pair(0, 3000));
        assert_eq!(stats.deletions.unflagged, 1);
        assert_eq!(stats.insertions.unflagged, 1);
    }

    #[test]
    fn test_misjoin_deletion_splits_output() {
        // 10bp deletion at target [1505,1515), inside the target misjoin at [1500,1520)
        let blocks = vec![get_test_block("t", 0, 4000, "q", 0, 4000, "1505=10D2485=")];
        let target_index = get_index(vec![("t", 1501, 1521, MisassemblyCategory::Misjoin)]);
        let query_index = MisassemblyIndex::empty();

        let resolver =
            ConflictResolver::new(ResolutionPolicy::Misassembly, &target_index, &query_index);
        let mut walk_stats = WalkStats::default();
        let attributions = get_attributions(&blocks, &resolver, &mut walk_stats);
        assert_eq!(attributions[1].source, AttributionSource::Placeholder);

        let (segments, stats) = run_reconcile(&blocks, &target_index, &query_index);
        assert_eq!(stats.deletions.excluded, 1);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].range, IntRange::from_pair(0, 1505));
        assert_eq!(segments[1].range, IntRange::from_pair(1515, 4000));
        assert!(segments.iter().all(|x| x.source == SegmentSource::Target));
        check_segment_bounds(&segments, 4000);

        // The excluded target sequence is not emitted
        let mut target = InMemoryAssembly::new("target");
        let mut seq = vec![b'A'; 4000];
        seq[1505..1515].copy_from_slice(b"XXXXXXXXXX");
        target.add_contig("t", &seq);
        let query = InMemoryAssembly::new("query");

        let mut fasta = Vec::new();
        let base_count = emit(
            &segments,
            &target,
            &query,
            OutputMode::Merged,
            &mut fasta,
            None,
        )
        .unwrap();
        assert_eq!(base_count, 3990);
        assert!(!fasta.contains(&b'X'));
    }

    #[test]
    fn test_misjoin_insertion_takes_query_sequence() {
        // 10bp insertion anchored at target 1505, inside the target misjoin at [1500,1520)
        let blocks = vec![get_test_block("t", 0, 3000, "q", 0, 3010, "1505=10I1495=")];
        let target_index = get_index(vec![("t", 1501, 1521, MisassemblyCategory::Misjoin)]);
        let query_index = MisassemblyIndex::empty();

        let (segments, stats) = run_reconcile(&blocks, &target_index, &query_index);
        assert_eq!(stats.insertions.query_sourced, 1);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].source, SegmentSource::Target);
        assert_eq!(segments[0].range, IntRange::from_pair(0, 1505));
        assert_eq!(
            segments[1],
            Segment {
                contig: "q".to_string(),
                source: SegmentSource::Query,
                range: IntRange::from_pair(1505, 1515),
            }
        );
        assert_eq!(segments[2].source, SegmentSource::Target);
        assert_eq!(segments[2].range, IntRange::from_pair(1505, 3000));
        check_segment_bounds(&segments, 3000);

        let mut target = InMemoryAssembly::new("target");
        target.add_contig("t", &[b'A'; 3000]);
        let mut query = InMemoryAssembly::new("query");
        let mut qseq = vec![b'A'; 3010];
        qseq[1505..1515].copy_from_slice(b"GGGGGGGGGG");
        query.add_contig("q", &qseq);

        let mut fasta = Vec::new();
        emit(
            &segments,
            &target,
            &query,
            OutputMode::Merged,
            &mut fasta,
            None,
        )
        .unwrap();
        let fasta = String::from_utf8(fasta).unwrap();
        let seq = fasta.lines().nth(1).unwrap();
        assert_eq!(seq.len(), 3010);
        assert_eq!(&seq[1505..1515], "GGGGGGGGGG");
    }

    #[test]
    fn test_collapse_indels_are_reserved() {
        let blocks = vec![get_test_block("t", 0, 3000, "q", 0, 3000, "1505=10D500=10I975=")];
        let target_index = get_index(vec![
            ("t", 1501, 1521, MisassemblyCategory::Collapse),
            ("t", 2001, 2031, MisassemblyCategory::CollapseVariant),
        ]);
        let query_index = MisassemblyIndex::empty();

        let (segments, stats) = run_reconcile(&blocks, &target_index, &query_index);
        assert_eq!(stats.deletions.reserved_collapse, 1);
        assert_eq!(stats.insertions.reserved_collapse, 1);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_both_flagged_is_reserved() {
        let blocks = vec![get_test_block("t", 0, 3000, "q", 0, 3010, "1505=10I1495=")];
        let target_index = get_index(vec![("t", 1501, 1521, MisassemblyCategory::Misjoin)]);
        let query_index = get_index(vec![("q", 1501, 1521, MisassemblyCategory::Gap)]);

        let (segments, stats) = run_reconcile(&blocks, &target_index, &query_index);
        assert_eq!(stats.insertions.reserved_both_flagged, 1);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source, SegmentSource::Target);
    }

    #[test]
    fn test_unrecognized_label_is_kept_but_not_rewritten() {
        // The narrow unrecognized region is selected over the wide misjoin for both indels
        let blocks = vec![get_test_block("t", 0, 3000, "q", 0, 3000, "1505=10D500=10I975=")];
        let target_index = get_index(vec![
            ("t", 1001, 2501, MisassemblyCategory::Misjoin),
            ("t", 1501, 1521, MisassemblyCategory::from_label("HET")),
            ("t", 2001, 2031, MisassemblyCategory::from_label("HET")),
        ]);
        let query_index = MisassemblyIndex::empty();

        let (segments, stats) = run_reconcile(&blocks, &target_index, &query_index);
        assert_eq!(stats.deletions.reserved_unrecognized, 1);
        assert_eq!(stats.insertions.reserved_unrecognized, 1);
        assert_eq!(stats.deletions.excluded, 0);
        assert_eq!(stats.insertions.query_sourced, 0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source, SegmentSource::Target);
        check_segment_bounds(&segments, 3000);
    }

    #[test]
    fn test_bridge_between_blocks() {
        let blocks = vec![
            get_test_block("t", 0, 5000, "q", 0, 5000, "1000="),
            get_test_block("t", 1200, 5000, "q", 1000, 5000, "1000="),
        ];
        let empty = MisassemblyIndex::empty();
        let resolver = ConflictResolver::new(ResolutionPolicy::Misassembly, &empty, &empty);
        let mut walk_stats = WalkStats::default();
        let attributions = get_attributions(&blocks, &resolver, &mut walk_stats);

        assert_eq!(walk_stats.bridge_events, 1);
        assert_eq!(attributions.len(), 3);
        assert_eq!(attributions[1].range, IntRange::from_pair(1000, 1200));

        let segments = aggregate(&attributions);
        assert_eq!(segments.len(), 1);
        check_segment_bounds(&segments, 5000);
    }

    #[test]
    fn test_empty_blocks() {
        let empty = MisassemblyIndex::empty();
        let (segments, _) = run_reconcile(&[], &empty, &empty);
        assert!(segments.is_empty());
    }
}
