//! Alignment block and edit script types
//!

use simple_error::{SimpleResult, bail};

use crate::int_range::IntRange;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn from_strand_str(s: &str) -> SimpleResult<Self> {
        match s {
            "+" => Ok(Orientation::Forward),
            "-" => Ok(Orientation::Reverse),
            _ => bail!("Unexpected strand value '{s}'"),
        }
    }
}

/// Edit script operation types
///
/// Any operation outside of `=`, `D` and `I` is treated as `Other`, which advances both axes.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EditOpKind {
    Match,

    /// Sequence present in the target but missing from the query ("D")
    TargetOnlyGap,

    /// Sequence present in the query but missing from the target ("I")
    QueryOnlyGap,

    Other,
}

impl EditOpKind {
    fn from_op_char(c: char) -> Self {
        match c {
            '=' => EditOpKind::Match,
            'D' => EditOpKind::TargetOnlyGap,
            'I' => EditOpKind::QueryOnlyGap,
            _ => EditOpKind::Other,
        }
    }

    pub fn advances_target(&self) -> bool {
        !matches!(self, EditOpKind::QueryOnlyGap)
    }

    pub fn advances_query(&self) -> bool {
        !matches!(self, EditOpKind::TargetOnlyGap)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EditOp {
    pub kind: EditOpKind,
    pub len: i64,
}

impl EditOp {
    pub fn new(kind: EditOpKind, len: i64) -> Self {
        Self { kind, len }
    }

    pub fn target_offset(&self) -> i64 {
        if self.kind.advances_target() {
            self.len
        } else {
            0
        }
    }

    pub fn query_offset(&self) -> i64 {
        if self.kind.advances_query() {
            self.len
        } else {
            0
        }
    }
}

/// Parse an edit script in cigar format, such as "10=1D5=2I3=", into edit operations
///
pub fn parse_edit_script(script: &str) -> SimpleResult<Vec<EditOp>> {
    if script.is_empty() {
        bail!("Empty edit script");
    }

    let mut ops = Vec::new();
    let mut len_start = 0;
    for (i, c) in script.char_indices() {
        if c.is_ascii_digit() {
            continue;
        }
        let len_str = &script[len_start..i];
        if len_str.is_empty() {
            bail!("Missing length for operation '{c}' in edit script '{script}'");
        }
        let len = match len_str.parse::<i64>() {
            Ok(x) => x,
            Err(_) => bail!("Can't parse operation length '{len_str}' in edit script '{script}'"),
        };
        if len == 0 {
            bail!("Zero length operation '{c}' in edit script '{script}'");
        }
        ops.push(EditOp::new(EditOpKind::from_op_char(c), len));
        len_start = i + c.len_utf8();
    }

    if len_start != script.len() {
        bail!("Edit script '{script}' ends without an operation");
    }
    Ok(ops)
}

/// One block of a broken pairwise alignment between the target and query assemblies
///
/// All coordinates are absolute positions on the base contigs.
///
#[derive(Clone, Debug)]
pub struct AlignmentBlock {
    pub target_contig: String,
    pub target_range: IntRange,
    pub target_contig_len: i64,

    pub query_contig: String,
    pub query_range: IntRange,
    pub query_contig_len: i64,

    pub orientation: Orientation,
    pub mapq: u8,
    pub edit_ops: Vec<EditOp>,
}

impl AlignmentBlock {
    /// Total edit script length along the target axis, or None on overflow
    pub fn target_edit_span(&self) -> Option<i64> {
        self.edit_ops
            .iter()
            .try_fold(0i64, |acc, op| acc.checked_add(op.target_offset()))
    }

    /// Total edit script length along the query axis, or None on overflow
    pub fn query_edit_span(&self) -> Option<i64> {
        self.edit_ops
            .iter()
            .try_fold(0i64, |acc, op| acc.checked_add(op.query_offset()))
    }

    /// Check that the block ranges are well-formed and that the edit script reconciles with them
    ///
    pub fn validate(&self) -> SimpleResult<()> {
        if self.target_range.is_empty() {
            bail!(
                "Empty target range {:?} on '{}'",
                self.target_range,
                self.target_contig
            );
        }
        if self.query_range.is_empty() {
            bail!(
                "Empty query range {:?} on '{}'",
                self.query_range,
                self.query_contig
            );
        }

        let Some(target_span) = self.target_edit_span() else {
            bail!("Edit script target length overflows");
        };
        if target_span != self.target_range.size() {
            bail!(
                "Edit script covers {target_span} target bases but the target range {:?} has size {}",
                self.target_range,
                self.target_range.size()
            );
        }
        let Some(query_span) = self.query_edit_span() else {
            bail!("Edit script query length overflows");
        };
        if query_span != self.query_range.size() {
            bail!(
                "Edit script covers {query_span} query bases but the query range {:?} has size {}",
                self.query_range,
                self.query_range.size()
            );
        }
        Ok(())
    }
}
