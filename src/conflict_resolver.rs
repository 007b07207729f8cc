//! Choose the source assembly for each alignment indel
//!

use log::debug;

use crate::alignment_block::AlignmentBlock;
use crate::cigar_walker::WalkEvent;
use crate::misassembly::{
    MisassemblyCategory, MisassemblyIndex, MisassemblyInterval, select_largest,
};
use crate::segment::Attribution;

/// Indel resolution policies
///
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// Use both assemblies' misassembly annotations to decide the source of each indel
    Misassembly,

    /// Ignore misassembly annotations, stitching the target across alignment gaps
    GapOnly,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndelKind {
    /// Sequence present in the target but missing from the query
    TargetOnlyGap,

    /// Sequence present in the query but missing from the target
    QueryOnlyGap,
}

/// Decision table cells with no rewrite rule yet
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReservedCell {
    /// Only the target is flagged, as a collapse
    TargetCollapse,

    /// Only the target is flagged, with an unrecognized category label
    TargetUnrecognized,

    /// Only the query is flagged
    QueryFlagged,

    /// Both assemblies are flagged
    BothFlagged,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Neither assembly is flagged, the indel is absorbed by the surrounding target sequence
    Unflagged,

    /// The target sequence is excess and must not be used, split the output here
    Exclude,

    /// The target is missing sequence which the query supplies
    UseQuery,

    Reserved(ReservedCell),
}

/// Indel decision table
///
/// `target` and `query` are the categories of the representative misassembly overlapping the
/// indel on each assembly, if any.
///
pub fn decide(
    kind: IndelKind,
    target: Option<MisassemblyCategory>,
    query: Option<MisassemblyCategory>,
) -> Decision {
    use IndelKind::*;
    use MisassemblyCategory::*;
    use ReservedCell::*;

    match (kind, target, query) {
        (TargetOnlyGap, None, None) => Decision::Unflagged,
        (TargetOnlyGap, Some(Misjoin | Gap), None) => Decision::Exclude,
        (TargetOnlyGap, Some(Collapse | CollapseVariant), None) => {
            Decision::Reserved(TargetCollapse)
        }
        (TargetOnlyGap, Some(Unrecognized), None) => Decision::Reserved(TargetUnrecognized),
        (TargetOnlyGap, None, Some(_)) => Decision::Reserved(QueryFlagged),
        (TargetOnlyGap, Some(_), Some(_)) => Decision::Reserved(BothFlagged),

        (QueryOnlyGap, None, None) => Decision::Unflagged,
        (QueryOnlyGap, Some(Misjoin | Gap), None) => Decision::UseQuery,
        (QueryOnlyGap, Some(Collapse | CollapseVariant), None) => {
            Decision::Reserved(TargetCollapse)
        }
        (QueryOnlyGap, Some(Unrecognized), None) => Decision::Reserved(TargetUnrecognized),
        (QueryOnlyGap, None, Some(_)) => Decision::Reserved(QueryFlagged),
        (QueryOnlyGap, Some(_), Some(_)) => Decision::Reserved(BothFlagged),
    }
}

/// Apply the decision table to one indel given the misassemblies overlapping it on each assembly
///
/// Returns the decision and the attribution it produces, if any.
///
pub fn resolve_indel(
    kind: IndelKind,
    target_overlaps: &[MisassemblyInterval],
    query_overlaps: &[MisassemblyInterval],
    block: &AlignmentBlock,
    event: &WalkEvent,
) -> (Decision, Option<Attribution>) {
    let target_category = select_largest(target_overlaps).map(|x| x.category);
    let query_category = select_largest(query_overlaps).map(|x| x.category);

    let decision = decide(kind, target_category, query_category);
    let attribution = match decision {
        Decision::Exclude => Some(Attribution::placeholder()),
        Decision::UseQuery => Some(Attribution::query(
            &block.query_contig,
            event.query_range(),
            block.query_contig_len,
        )),
        Decision::Unflagged | Decision::Reserved(_) => None,
    };
    (decision, attribution)
}

/// Resolve indels against the misassembly indexes of both assemblies
///
pub struct ConflictResolver<'a> {
    policy: ResolutionPolicy,
    target_index: &'a MisassemblyIndex,
    query_index: &'a MisassemblyIndex,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(
        policy: ResolutionPolicy,
        target_index: &'a MisassemblyIndex,
        query_index: &'a MisassemblyIndex,
    ) -> Self {
        Self {
            policy,
            target_index,
            query_index,
        }
    }

    /// Both misassembly lookups use the indel's target-anchored interval
    ///
    pub fn resolve(
        &self,
        kind: IndelKind,
        block: &AlignmentBlock,
        event: &WalkEvent,
    ) -> (Decision, Option<Attribution>) {
        if self.policy == ResolutionPolicy::GapOnly {
            return (Decision::Unflagged, None);
        }

        let lookup_range = event.target_range();
        let target_overlaps = self.target_index.query(&block.target_contig, &lookup_range);
        let query_overlaps = self.query_index.query(&block.query_contig, &lookup_range);

        let (decision, attribution) =
            resolve_indel(kind, &target_overlaps, &query_overlaps, block, event);

        if !(target_overlaps.is_empty() && query_overlaps.is_empty()) {
            debug!(
                "{kind:?} at {}:{lookup_range:?} (query {}:{:?}) target overlaps: {target_overlaps:?} query overlaps: {query_overlaps:?} decision: {decision:?}",
                block.target_contig,
                block.query_contig,
                event.query_range(),
            );
        }
        (decision, attribution)
    }
}
