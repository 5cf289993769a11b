//! Volatility events
//!
//! Randomly placed, time-windowed multiplicative speed perturbations. Each
//! runner draws 0-2 events before the race; during the race the active events
//! compose into one multiplier on the target velocity. The window ramps with a
//! squared-sine bump rather than stepping, so speed never jumps
//! discontinuously.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::rng::RaceRng;
use crate::sim::state::Attributes;

/// Perturbation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Boost,
    Stumble,
}

/// One pre-drawn perturbation window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEvent {
    pub kind: EventKind,
    /// Window start as a fraction of total race distance
    pub start_frac: f64,
    /// Window length as a fraction of total race distance
    pub duration_frac: f64,
    /// Peak multiplier strength (non-negative)
    pub magnitude: f64,
}

impl VolatilityEvent {
    /// Window end fraction (may exceed 1; the race simply ends first)
    #[inline]
    pub fn end_frac(&self) -> f64 {
        self.start_frac + self.duration_frac
    }
}

/// Draw how many events a runner suffers. Low stability shifts weight from
/// zero toward one or two.
fn draw_event_count(stability: f64, rng: &mut RaceRng) -> usize {
    let u = (100.0 - stability) / 100.0;
    let p2 = (0.05 + 0.3 * u).clamp(0.0, 0.35);
    let p1 = (0.15 + 0.4 * u).clamp(0.0, 0.75);
    let p0 = (1.0 - p1 - p2).max(0.0);
    let total = p0 + p1 + p2;
    let total = if total > 0.0 { total } else { 1.0 };

    let r = rng.next_float() * total;
    if r < p0 {
        0
    } else if r < p0 + p1 {
        1
    } else {
        2
    }
}

/// Build a runner's event list, sorted by start fraction.
///
/// Lower stability biases kind toward Stumble and scales magnitude up; stamina
/// dampens how hard a stumble bites.
pub fn build_events(attrs: &Attributes, rng: &mut RaceRng) -> Vec<VolatilityEvent> {
    let u = (100.0 - attrs.stability) / 100.0;
    let count = draw_event_count(attrs.stability, rng);

    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        let start_frac = rng.next_range(EVENT_START_MIN, EVENT_START_MAX);
        let duration_frac = rng.next_range(EVENT_DUR_MIN, EVENT_DUR_MAX);
        let p_stumble = (0.45 + 0.35 * u).clamp(0.45, 0.8);
        let kind = if rng.next_float() < p_stumble {
            EventKind::Stumble
        } else {
            EventKind::Boost
        };
        let base_mag = rng.next_range(EVENT_MAG_MIN, EVENT_MAG_MAX);
        let mut magnitude = base_mag * (0.5 + 0.8 * u);
        if kind == EventKind::Stumble {
            magnitude *= 1.0 - 0.6 * (attrs.stamina / 100.0);
        }
        events.push(VolatilityEvent {
            kind,
            start_frac,
            duration_frac,
            magnitude,
        });
    }
    events.sort_by(|a, b| a.start_frac.total_cmp(&b.start_frac));
    events
}

/// Combined multiplier of all events active at `pos_frac`.
///
/// Concurrent events compose multiplicatively; the product is clamped to >= 0.
/// Inside a corner the multiplier is 1 unless events are allowed in corners.
pub fn event_multiplier(
    events: &[VolatilityEvent],
    pos_frac: f64,
    in_corner: bool,
    allow_in_corners: bool,
) -> f64 {
    let mut mult = 1.0;
    for ev in events {
        if ev.duration_frac <= 0.0 {
            continue;
        }
        if pos_frac < ev.start_frac || pos_frac > ev.end_frac() {
            continue;
        }
        if in_corner && !allow_in_corners {
            continue;
        }
        let z = (pos_frac - ev.start_frac) / ev.duration_frac;
        let bump = (std::f64::consts::PI * z).sin().powi(2);
        let delta = ev.magnitude * bump;
        mult *= match ev.kind {
            EventKind::Boost => 1.0 + delta,
            EventKind::Stumble => 1.0 - delta,
        };
    }
    mult.max(0.0)
}
