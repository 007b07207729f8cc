//! Write the stitched consensus sequence and its segment coordinates
//!

use std::io::Write;

use simple_error::{SimpleResult, bail};

use crate::assembly::SequenceSource;
use crate::segment::{Segment, SegmentSource};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputMode {
    /// One fasta record for each segment, named by the segment's contig and range
    PerSegment,

    /// A single fasta record named after the first segment's contig, with no newline after the
    /// sequence
    Merged,
}

/// Fetch the sequence of every segment from its source assembly
///
pub fn fetch_segment_sequences(
    segments: &[Segment],
    target: &impl SequenceSource,
    query: &impl SequenceSource,
) -> SimpleResult<Vec<Vec<u8>>> {
    segments
        .iter()
        .map(|segment| match segment.source {
            SegmentSource::Target => target.fetch(&segment.contig, &segment.range),
            SegmentSource::Query => query.fetch(&segment.contig, &segment.range),
        })
        .collect()
}

/// Write segment sequences in fasta format
///
/// Sequences are written on a single line per record.
///
pub fn write_fasta(
    writer: &mut impl Write,
    segments: &[Segment],
    seqs: &[Vec<u8>],
    mode: OutputMode,
) -> std::io::Result<()> {
    assert_eq!(segments.len(), seqs.len());
    match mode {
        OutputMode::PerSegment => {
            for (segment, seq) in segments.iter().zip(seqs) {
                writeln!(
                    writer,
                    ">{}:{}-{}",
                    segment.contig, segment.range.start, segment.range.end
                )?;
                writer.write_all(seq)?;
                writeln!(writer)?;
            }
        }
        OutputMode::Merged => {
            let Some(first) = segments.first() else {
                return Ok(());
            };
            writeln!(writer, ">{}", first.contig)?;
            for seq in seqs {
                writer.write_all(seq)?;
            }
        }
    }
    Ok(())
}

/// Write segments as a tab-delimited table without header: contig, source, start, end
///
pub fn write_segment_table<W: Write + ?Sized>(
    writer: &mut W,
    segments: &[Segment],
) -> std::io::Result<()> {
    for segment in segments {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            segment.contig, segment.source, segment.range.start, segment.range.end
        )?;
    }
    Ok(())
}

/// Fetch all segment sequences and write them out, with an optional coordinate table
///
/// All sequences are fetched before anything is written, so a failed fetch leaves the outputs
/// empty.
///
/// Returns the total number of sequence bases written.
///
pub fn emit(
    segments: &[Segment],
    target: &impl SequenceSource,
    query: &impl SequenceSource,
    mode: OutputMode,
    fasta_writer: &mut impl Write,
    table_writer: Option<&mut dyn Write>,
) -> SimpleResult<usize> {
    let seqs = fetch_segment_sequences(segments, target, query)?;

    if let Err(e) = write_fasta(fasta_writer, segments, &seqs, mode) {
        bail!("Failed to write consensus fasta output: {e}");
    }
    if let Some(table_writer) = table_writer {
        if let Err(e) = write_segment_table(table_writer, segments) {
            bail!("Failed to write segment coordinate output: {e}");
        }
    }

    Ok(seqs.iter().map(|x| x.len()).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::InMemoryAssembly;
    use crate::int_range::IntRange;

    fn get_test_assemblies() -> (InMemoryAssembly, InMemoryAssembly) {
        let mut target = InMemoryAssembly::new("target");
        target.add_contig("t", b"AAAAACCCCCGGGGGTTTTT");
        let mut query = InMemoryAssembly::new("query");
        query.add_contig("q", b"acgtacgtac");
        (target, query)
    }

    fn get_test_segments() -> Vec<Segment> {
        vec![
            Segment {
                contig: "t".to_string(),
                source: SegmentSource::Target,
                range: IntRange::from_pair(0, 5),
            },
            Segment {
                contig: "q".to_string(),
                source: SegmentSource::Query,
                range: IntRange::from_pair(2, 6),
            },
            Segment {
                contig: "t".to_string(),
                source: SegmentSource::Target,
                range: IntRange::from_pair(10, 20),
            },
        ]
    }

    #[test]
    fn test_emit_per_segment() {
        let (target, query) = get_test_assemblies();
        let segments = get_test_segments();

        let mut fasta = Vec::new();
        let mut table = Vec::new();
        let base_count = emit(
            &segments,
            &target,
            &query,
            OutputMode::PerSegment,
            &mut fasta,
            Some(&mut table as &mut dyn Write),
        )
        .unwrap();

        assert_eq!(base_count, 19);
        assert_eq!(
            String::from_utf8(fasta).unwrap(),
            ">t:0-5\nAAAAA\n>q:2-6\ngtac\n>t:10-20\nGGGGGTTTTT\n"
        );
        assert_eq!(
            String::from_utf8(table).unwrap(),
            "t\ttarget\t0\t5\nq\tquery\t2\t6\nt\ttarget\t10\t20\n"
        );
    }

    #[test]
    fn test_emit_merged() {
        let (target, query) = get_test_assemblies();
        let segments = get_test_segments();

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

        let total_span = segments.iter().map(|x| x.range.size()).sum::<i64>();
        assert_eq!(base_count as i64, total_span);
        assert_eq!(
            String::from_utf8(fasta).unwrap(),
            ">t\nAAAAAgtacGGGGGTTTTT"
        );
    }

    #[test]
    fn test_emit_is_deterministic() {
        let (target, query) = get_test_assemblies();
        let segments = get_test_segments();

        let run = || {
            let mut fasta = Vec::new();
            emit(
                &segments,
                &target,
                &query,
                OutputMode::PerSegment,
                &mut fasta,
                None,
            )
            .unwrap();
            fasta
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_emit_fetch_error_writes_nothing() {
        let (target, query) = get_test_assemblies();
        let mut segments = get_test_segments();
        segments[2].range.end = 21;

        let mut fasta = Vec::new();
        let result = emit(
            &segments,
            &target,
            &query,
            OutputMode::PerSegment,
            &mut fasta,
            None,
        );
        assert!(result.is_err());
        assert!(fasta.is_empty());
    }
}
