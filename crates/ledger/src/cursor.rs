//! Forward-only cursors.
//!
//! Each cursor borrows the list it walks and keeps `{position, last_value}`
//! plus the last week it answered. Build one per scan: a cursor that has
//! answered week 20 cannot answer week 19.

use crate::error::{LedgerError, Result};
use glow_types::{DepositSplitSegment, Week};

/// One point of a farm's distribution timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePoint {
    /// Week of the distribution.
    pub week: Week,
    /// Total distributed through `week`, inclusive.
    pub cumulative_wei: u128,
}

/// Cursor over an ascending distribution timeline.
#[derive(Debug)]
pub struct TimelineCursor<'a> {
    points: &'a [TimelinePoint],
    position: usize,
    last_value: u128,
    last_week: Option<Week>,
}

impl<'a> TimelineCursor<'a> {
    /// Fresh cursor positioned before the first point.
    pub fn new(points: &'a [TimelinePoint]) -> Self {
        Self {
            points,
            position: 0,
            last_value: 0,
            last_week: None,
        }
    }

    /// Cumulative distributed at `week`: the last point with `point.week <= week`, or 0.
    pub fn cumulative_at(&mut self, week: Week) -> Result<u128> {
        if let Some(last) = self.last_week {
            if week < last {
                return Err(LedgerError::CursorRewind {
                    requested: week,
                    last,
                });
            }
        }

        while let Some(point) = self.points.get(self.position) {
            if point.week > week {
                break;
            }
            self.last_value = point.cumulative_wei;
            self.position += 1;
        }

        self.last_week = Some(week);
        Ok(self.last_value)
    }
}

/// Cursor over one farm's split segments, sorted by start week.
#[derive(Debug)]
pub struct SegmentCursor<'a> {
    segments: &'a [DepositSplitSegment],
    position: usize,
    last_week: Option<Week>,
}

impl<'a> SegmentCursor<'a> {
    /// Fresh cursor positioned at the first segment.
    pub fn new(segments: &'a [DepositSplitSegment]) -> Self {
        Self {
            segments,
            position: 0,
            last_week: None,
        }
    }

    /// Split percentage (scaled6) active at `week`, or 0 outside every segment.
    pub fn split_at(&mut self, week: Week) -> Result<u128> {
        if let Some(last) = self.last_week {
            if week < last {
                return Err(LedgerError::CursorRewind {
                    requested: week,
                    last,
                });
            }
        }
        self.last_week = Some(week);

        while let Some(segment) = self.segments.get(self.position) {
            if segment.end_week >= week {
                break;
            }
            self.position += 1;
        }

        Ok(match self.segments.get(self.position) {
            Some(segment) if segment.contains(week) => segment.split_scaled6,
            _ => 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline() -> Vec<TimelinePoint> {
        vec![
            TimelinePoint {
                week: 5,
                cumulative_wei: 10,
            },
            TimelinePoint {
                week: 8,
                cumulative_wei: 25,
            },
        ]
    }

    fn segment(start: Week, end: Week, split: u128) -> DepositSplitSegment {
        DepositSplitSegment {
            farm_id: "farm".to_string(),
            start_week: start,
            end_week: end,
            split_scaled6: split,
        }
    }

    #[test]
    fn test_timeline_cursor_advances() {
        let points = timeline();
        let mut cursor = TimelineCursor::new(&points);
        assert_eq!(cursor.cumulative_at(4), Ok(0));
        assert_eq!(cursor.cumulative_at(5), Ok(10));
        assert_eq!(cursor.cumulative_at(7), Ok(10));
        assert_eq!(cursor.cumulative_at(8), Ok(25));
        assert_eq!(cursor.cumulative_at(100), Ok(25));
    }

    #[test]
    fn test_timeline_cursor_repeat_week_is_allowed() {
        let points = timeline();
        let mut cursor = TimelineCursor::new(&points);
        assert_eq!(cursor.cumulative_at(6), Ok(10));
        assert_eq!(cursor.cumulative_at(6), Ok(10));
    }

    #[test]
    fn test_timeline_cursor_rejects_rewind() {
        let points = timeline();
        let mut cursor = TimelineCursor::new(&points);
        cursor.cumulative_at(8).expect("forward");
        assert_eq!(
            cursor.cumulative_at(5),
            Err(LedgerError::CursorRewind {
                requested: 5,
                last: 8
            })
        );
    }

    #[test]
    fn test_segment_cursor_gaps_are_zero() {
        let segments = vec![segment(10, 12, 500_000), segment(15, 20, 250_000)];
        let mut cursor = SegmentCursor::new(&segments);
        assert_eq!(cursor.split_at(9), Ok(0));
        assert_eq!(cursor.split_at(10), Ok(500_000));
        assert_eq!(cursor.split_at(12), Ok(500_000));
        assert_eq!(cursor.split_at(13), Ok(0));
        assert_eq!(cursor.split_at(15), Ok(250_000));
        assert_eq!(cursor.split_at(21), Ok(0));
    }

    #[test]
    fn test_segment_cursor_rejects_rewind() {
        let segments = vec![segment(10, 12, 500_000)];
        let mut cursor = SegmentCursor::new(&segments);
        cursor.split_at(12).expect("forward");
        assert!(matches!(
            cursor.split_at(10),
            Err(LedgerError::CursorRewind { .. })
        ));
    }
}
