//! Serpentine scan planning.
//!
//! Even rows run left to right, odd rows right to left, so the head never
//! makes an idle return stroke. Each row is cut into segments small enough
//! for one pad burst on the wire.

/// Physical direction of travel along a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Left to right, column order
    Forward,
    /// Right to left, reversed column order
    Reverse,
}

impl ScanDirection {
    pub fn for_row(row: u32) -> Self {
        if row & 1 == 0 {
            Self::Forward
        } else {
            Self::Reverse
        }
    }

    /// Image column visited at logical scan position `i`
    pub fn column(self, i: u32, cols: u32) -> u32 {
        match self {
            Self::Forward => i,
            Self::Reverse => cols - 1 - i,
        }
    }
}

/// Run of samples within one row, in scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Logical scan position of the first sample
    pub start: u32,
    /// Number of samples
    pub len: u32,
}

impl Segment {
    /// Logical scan position of the last sample
    pub fn last(&self) -> u32 {
        self.start + self.len - 1
    }
}

/// One row of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPlan {
    pub row: u32,
    pub direction: ScanDirection,
    pub segments: Vec<Segment>,
}

impl RowPlan {
    /// Image columns in the order the head visits them
    pub fn columns(&self, cols: u32) -> impl Iterator<Item = u32> + '_ {
        let direction = self.direction;
        (0..cols).map(move |i| direction.column(i, cols))
    }
}

/// Number of segments per row. Always one more than the count of whole
/// `max_bytes_per_segment` runs, even when `cols` divides evenly.
pub fn segment_count(cols: u32, max_bytes_per_segment: u32) -> u32 {
    cols / max_bytes_per_segment + 1
}

/// Split `cols` into [`segment_count`] runs as evenly as possible. Larger
/// runs come first so the last one absorbs the shortfall.
///
/// # Panics
///
/// If `cols` is zero or `max_bytes_per_segment` is below 2; either would
/// leave a row with an empty segment.
pub fn segment_row(cols: u32, max_bytes_per_segment: u32) -> Vec<Segment> {
    assert!(cols > 0, "cannot segment an empty row");
    assert!(
        max_bytes_per_segment >= 2,
        "max bytes per segment {} must be at least 2",
        max_bytes_per_segment
    );
    let count = segment_count(cols, max_bytes_per_segment);
    let base = cols / count;
    let extra = cols % count;

    let mut segments = Vec::with_capacity(count as usize);
    let mut start = 0;
    for i in 0..count {
        let len = base + u32::from(i < extra);
        segments.push(Segment { start, len });
        start += len;
    }
    segments
}

/// Plan every row. Panics under the same conditions as [`segment_row`].
pub fn plan(rows: u32, cols: u32, max_bytes_per_segment: u32) -> Vec<RowPlan> {
    let segments = segment_row(cols, max_bytes_per_segment);
    (0..rows)
        .map(|row| RowPlan {
            row,
            direction: ScanDirection::for_row(row),
            segments: segments.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_by_parity() {
        assert_eq!(ScanDirection::for_row(0), ScanDirection::Forward);
        assert_eq!(ScanDirection::for_row(1), ScanDirection::Reverse);
        assert_eq!(ScanDirection::for_row(2), ScanDirection::Forward);
        assert_eq!(ScanDirection::for_row(7), ScanDirection::Reverse);
    }

    #[test]
    fn test_reverse_columns_mirror() {
        let plan = plan(2, 4, 4);
        assert_eq!(plan[0].columns(4).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(plan[1].columns(4).collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_plan_shape() {
        let shapes = [
            (1, 2),
            (4, 4),
            (10, 4),
            (239, 240),
            (240, 240),
            (1000, 240),
            (7, 2),
        ];
        for (cols, max) in shapes {
            let plan = plan(5, cols, max);
            assert_eq!(plan.len(), 5);
            for row in &plan {
                assert_eq!(row.segments.len() as u32, cols / max + 1);
                assert_eq!(row.segments.iter().map(|s| s.len).sum::<u32>(), cols);
                assert!(row.segments.iter().all(|s| s.len >= 1 && s.len <= max));
            }
        }
    }

    #[test]
    fn test_segments_are_contiguous() {
        let segments = segment_row(10, 4);
        assert_eq!(
            segments,
            vec![
                Segment { start: 0, len: 4 },
                Segment { start: 4, len: 3 },
                Segment { start: 7, len: 3 },
            ]
        );
        assert_eq!(segments[2].last(), 9);
    }

    #[test]
    fn test_even_division_still_adds_a_segment() {
        // 4 / 4 + 1 = 2 segments of 2
        let segments = segment_row(4, 4);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment { start: 0, len: 2 });
        assert_eq!(segments[1], Segment { start: 2, len: 2 });
    }

    #[test]
    #[should_panic(expected = "must be at least 2")]
    fn test_single_byte_segments_rejected() {
        segment_row(4, 1);
    }

    #[test]
    #[should_panic(expected = "empty row")]
    fn test_empty_row_rejected() {
        plan(3, 0, 240);
    }

    #[test]
    fn test_final_segment_never_larger() {
        for cols in 1..200 {
            let segments = segment_row(cols, 16);
            let last = segments[segments.len() - 1].len;
            assert!(segments.iter().all(|s| s.len >= last), "cols {}", cols);
        }
    }
}
