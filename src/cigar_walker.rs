//! Walk alignment block edit scripts to produce events in absolute contig coordinates
//!

use crate::alignment_block::{AlignmentBlock, EditOpKind};
use crate::int_range::{IntRange, get_int_range_gap};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WalkEventKind {
    Match,
    TargetOnlyGap,
    QueryOnlyGap,
    Other,

    /// Unaligned target sequence between two consecutive blocks on the same target contig
    Bridge,
}

impl From<EditOpKind> for WalkEventKind {
    fn from(kind: EditOpKind) -> Self {
        match kind {
            EditOpKind::Match => WalkEventKind::Match,
            EditOpKind::TargetOnlyGap => WalkEventKind::TargetOnlyGap,
            EditOpKind::QueryOnlyGap => WalkEventKind::QueryOnlyGap,
            EditOpKind::Other => WalkEventKind::Other,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WalkEvent {
    pub kind: WalkEventKind,

    /// Absolute target position where the event starts
    pub target_start: i64,

    /// Absolute query position where the event starts
    pub query_start: i64,

    pub len: i64,
}

impl WalkEvent {
    /// Target interval of event length anchored at the event's target position
    ///
    /// For a query-only gap this range does not correspond to target sequence consumed by the
    /// alignment, it is the alignment position used for misassembly lookups.
    ///
    pub fn target_range(&self) -> IntRange {
        IntRange::from_start_size(self.target_start, self.len)
    }

    pub fn query_range(&self) -> IntRange {
        IntRange::from_start_size(self.query_start, self.len)
    }
}

/// Iterate through all edit operations of `block`, tracking the bases added on each axis
///
pub fn walk_block(block: &AlignmentBlock) -> Vec<WalkEvent> {
    let mut target_bp_added = 0;
    let mut query_bp_added = 0;
    let mut events = Vec::with_capacity(block.edit_ops.len());
    for op in block.edit_ops.iter() {
        events.push(WalkEvent {
            kind: op.kind.into(),
            target_start: block.target_range.start + target_bp_added,
            query_start: block.query_range.start + query_bp_added,
            len: op.len,
        });
        target_bp_added += op.target_offset();
        query_bp_added += op.query_offset();
    }
    events
}

/// Get the event spanning unaligned target sequence between `block` and the next block
///
/// No event is returned at the end of the block list, when the next block is on another target
/// contig, or when the next block does not start after the end of this block.
///
pub fn get_bridge_event(
    block: &AlignmentBlock,
    next_block: Option<&AlignmentBlock>,
) -> Option<WalkEvent> {
    let next_block = next_block?;
    if next_block.target_contig != block.target_contig {
        return None;
    }
    let gap = get_int_range_gap(&block.target_range, &next_block.target_range)?;
    Some(WalkEvent {
        kind: WalkEventKind::Bridge,
        target_start: gap.start,
        query_start: block.query_range.end,
        len: gap.size(),
    })
}

/// Pair each block with the block following it in traversal order
///
pub fn adjacent_block_pairs(
    blocks: &[AlignmentBlock],
) -> impl Iterator<Item = (&AlignmentBlock, Option<&AlignmentBlock>)> {
    blocks
        .iter()
        .zip(blocks.iter().skip(1).map(Some).chain(std::iter::once(None)))
}

/// Walk one block followed by the bridge to the next block, if any
///
pub fn walk_block_with_bridge(
    block: &AlignmentBlock,
    next_block: Option<&AlignmentBlock>,
) -> Vec<WalkEvent> {
    let mut events = walk_block(block);
    events.extend(get_bridge_event(block, next_block));
    events
}
