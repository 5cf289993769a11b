//! Track geometry
//!
//! A track is a single-lap length, a lap count and an ordered set of
//! fractional segments tagged straight or corner. The integrator only ever
//! asks one question: does a given lap fraction fall inside a corner. Lap
//! fractions not covered by any segment read as straight.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{EngineError, Result};

/// Segment surface type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Straight,
    Corner,
}

/// A fractional slice of one lap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start of the slice, fraction of one lap
    pub start_frac: f64,
    /// End of the slice (exclusive), fraction of one lap
    pub end_frac: f64,
    pub kind: SegmentKind,
}

impl Segment {
    pub fn new(start_frac: f64, end_frac: f64, kind: SegmentKind) -> Self {
        Self {
            start_frac,
            end_frac,
            kind,
        }
    }

    /// Check if a lap fraction falls inside this slice
    #[inline]
    pub fn contains(&self, lap_frac: f64) -> bool {
        lap_frac >= self.start_frac && lap_frac < self.end_frac
    }
}

/// Static race-track geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Single-lap length in meters-equivalent units
    pub length: f64,
    /// Lap count
    pub laps: u32,
    /// Ordered slices over [0, 1)
    pub segments: Vec<Segment>,
    /// Whether volatility events keep their multiplier inside corners
    pub allow_events_in_corners: bool,
}

impl Track {
    /// The standard two-lap track: two straights, two corners
    pub fn standard() -> Self {
        Self {
            length: TRACK_LENGTH,
            laps: DEFAULT_LAPS,
            segments: vec![
                Segment::new(0.0, 0.42, SegmentKind::Straight),
                Segment::new(0.42, 0.5, SegmentKind::Corner),
                Segment::new(0.5, 0.92, SegmentKind::Straight),
                Segment::new(0.92, 1.0, SegmentKind::Corner),
            ],
            allow_events_in_corners: false,
        }
    }

    /// Total race distance across all laps
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.length * f64::from(self.laps)
    }

    /// Check whether a lap fraction falls inside a corner segment
    pub fn is_corner(&self, lap_frac: f64) -> bool {
        self.segments
            .iter()
            .any(|s| s.kind == SegmentKind::Corner && s.contains(lap_frac))
    }

    /// Reject geometry the integrator cannot run
    pub fn validate(&self) -> Result<()> {
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(EngineError::InvalidTrack {
                reason: format!("track length must be positive, got {}", self.length),
            });
        }
        if self.laps == 0 {
            return Err(EngineError::InvalidTrack {
                reason: "lap count must be at least 1".into(),
            });
        }
        let mut prev_end = 0.0;
        for (i, seg) in self.segments.iter().enumerate() {
            if !seg.start_frac.is_finite() || !seg.end_frac.is_finite() {
                return Err(EngineError::InvalidTrack {
                    reason: format!("segment {i} has non-finite bounds"),
                });
            }
            if seg.start_frac < 0.0 || seg.end_frac > 1.0 || seg.start_frac >= seg.end_frac {
                return Err(EngineError::InvalidTrack {
                    reason: format!(
                        "segment {i} bounds [{}, {}) outside [0, 1) or empty",
                        seg.start_frac, seg.end_frac
                    ),
                });
            }
            if seg.start_frac < prev_end {
                return Err(EngineError::InvalidTrack {
                    reason: format!("segment {i} overlaps or is out of order"),
                });
            }
            prev_end = seg.end_frac;
        }
        Ok(())
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_track_corners() {
        let track = Track::standard();
        assert!(!track.is_corner(0.0));
        assert!(!track.is_corner(0.2));
        assert!(track.is_corner(0.42));
        assert!(track.is_corner(0.45));
        assert!(!track.is_corner(0.5));
        assert!(track.is_corner(0.95));
        assert_eq!(track.total_distance(), 2000.0);
    }

    #[test]
    fn test_uncovered_fraction_reads_straight() {
        let track = Track {
            segments: vec![Segment::new(0.4, 0.6, SegmentKind::Corner)],
            ..Track::standard()
        };
        assert!(!track.is_corner(0.1));
        assert!(track.is_corner(0.5));
        assert!(!track.is_corner(0.9));
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut track = Track::standard();
        track.length = 0.0;
        assert!(track.validate().is_err());

        let mut track = Track::standard();
        track.laps = 0;
        assert!(track.validate().is_err());

        let mut track = Track::standard();
        track.segments[1] = Segment::new(0.3, 0.45, SegmentKind::Corner);
        assert!(track.validate().is_err(), "overlap must be rejected");

        let mut track = Track::standard();
        track.segments[0] = Segment::new(0.2, 0.2, SegmentKind::Straight);
        assert!(track.validate().is_err(), "empty segment must be rejected");
    }

    #[test]
    fn test_validate_accepts_standard() {
        assert!(Track::standard().validate().is_ok());
    }
}
