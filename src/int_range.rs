use std::fmt;

use serde::Serialize;

/// A simple type for integer ranges
///
/// All ranges follow the bed file range convention: 0-indexed, half-closed, [start,end)
///
/// This struct is used instead of the native rust Range type just to focus on the specific goals of
/// contig coordinate intervals.
///
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct IntRange {
    pub start: i64,
    pub end: i64,
}

impl IntRange {
    pub fn from_pair(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Create a range of `size` starting at `start`
    pub fn from_start_size(start: i64, size: i64) -> Self {
        Self {
            start,
            end: start + size,
        }
    }

    pub fn size(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Expand this range to cover `other`
    pub fn merge(&mut self, other: &IntRange) {
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }

    pub fn as_range(&self) -> std::ops::Range<i64> {
        self.start..self.end
    }
}

impl fmt::Debug for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

/// Get the range strictly between 2 ranges, where `ir2` is expected to follow `ir1`
///
///    [---------)            [-----------)
///        R1    [-----------)     R2
///                  gap
///
/// Returns None if the ranges intersect, are adjacent, or `ir2` does not follow `ir1`
///
pub fn get_int_range_gap(ir1: &IntRange, ir2: &IntRange) -> Option<IntRange> {
    if ir2.start > ir1.end {
        Some(IntRange::from_pair(ir1.end, ir2.start))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let mut r1 = IntRange::from_pair(10, 20);
        r1.merge(&IntRange::from_pair(5, 12));
        assert_eq!(r1, IntRange::from_pair(5, 20));
        r1.merge(&IntRange::from_pair(30, 40));
        assert_eq!(r1, IntRange::from_pair(5, 40));
    }

    #[test]
    fn test_get_int_range_gap() {
        let r1 = IntRange::from_pair(1, 4);
        let r2 = IntRange::from_pair(6, 8);
        let r3 = IntRange::from_pair(8, 9);
        let r4 = IntRange::from_pair(7, 9);

        assert_eq!(get_int_range_gap(&r1, &r2), Some(IntRange::from_pair(4, 6)));
        assert_eq!(get_int_range_gap(&r2, &r1), None);
        assert_eq!(get_int_range_gap(&r2, &r3), None);
        assert_eq!(get_int_range_gap(&r2, &r4), None);
    }

    #[test]
    fn test_from_start_size() {
        let r = IntRange::from_start_size(100, 10);
        assert_eq!(r.size(), 10);
        assert!(!r.is_empty());
        assert!(IntRange::from_start_size(5, 0).is_empty());
    }
}
