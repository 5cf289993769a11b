//! Runner attributes and per-race derived state
//!
//! A roster entry carries five normalized ability scores. At race start each
//! runner derives its physical capacities (top speed, acceleration rate) and
//! samples a single condition multiplier that stays fixed for the whole race.
//! Everything mutable lives in `RunnerState` and is touched only by the tick
//! loop.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{EngineError, Result};
use crate::lerp;
use crate::rng::{RaceRng, Seed};
use crate::sim::event::{VolatilityEvent, build_events};

/// Normalized ability scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Top-speed potential
    pub speed: f64,
    /// How quickly the runner closes on its target velocity
    pub accel: f64,
    /// Resistance to fatigue and to stumble severity
    pub stamina: f64,
    /// Consistency: narrows the condition spread and suppresses events
    pub stability: f64,
    /// Corner speed retention
    pub cornering: f64,
}

impl Attributes {
    /// Reject non-finite or out-of-range scores before simulation starts
    pub fn validate(&self, id: &str) -> Result<()> {
        for (attribute, value) in [
            ("speed", self.speed),
            ("accel", self.accel),
            ("stamina", self.stamina),
            ("stability", self.stability),
            ("cornering", self.cornering),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(EngineError::InvalidAttribute {
                    id: id.to_string(),
                    attribute,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runner {
    pub id: String,
    pub name: String,
    pub attrs: Attributes,
}

/// Sample the race-day condition multiplier.
///
/// The spread widens as stability drops; the sample is clamped to the
/// configured band and never re-drawn mid-race.
pub fn sample_condition(stability: f64, rng: &mut RaceRng) -> f64 {
    let instability = (100.0 - stability) / 100.0;
    let sigma = lerp(COND_SIGMA_MIN, COND_SIGMA_MAX, instability);
    rng.normal(1.0, sigma).clamp(COND_MIN, COND_MAX)
}

/// Mutable per-runner simulation state
#[derive(Debug, Clone)]
pub struct RunnerState {
    /// Roster index (stable iteration and tie-break order)
    pub idx: usize,
    pub attrs: Attributes,
    /// Top-speed capacity after condition scaling
    pub vmax: f64,
    /// Acceleration-rate capacity after condition scaling
    pub accel: f64,
    /// Distance covered, monotone non-decreasing
    pub pos: f64,
    /// Current velocity, never negative
    pub vel: f64,
    /// Condition multiplier sampled once at race start
    pub condition: f64,
    /// Pre-drawn volatility events, sorted by start fraction
    pub events: Vec<VolatilityEvent>,
    /// Enhanced fidelity: energy reserve in [0, 1]
    pub energy: f64,
    /// Enhanced fidelity: corner heat in [0, 1]
    pub heat: f64,
}

impl RunnerState {
    /// Derive a runner's race state from its attributes and the race sub-seed.
    ///
    /// Condition and events draw from independently salted sub-streams so the
    /// event roll of one runner can never shift another's condition.
    pub fn build(idx: usize, runner: &Runner, seed_used: u64) -> Self {
        let race_seed = Seed::Int(seed_used);
        let mut cond_rng = RaceRng::from_salted(&race_seed, &format!("runner-{idx}"));
        let mut event_rng = RaceRng::from_salted(&race_seed, &format!("events-{idx}"));

        let attrs = runner.attrs;
        let condition = sample_condition(attrs.stability, &mut cond_rng);
        let vmax = (VMAX0 + VMAX1 * attrs.speed / 100.0) * condition;
        let accel = (ACCEL0 + ACCEL1 * attrs.accel / 100.0) * condition;

        Self {
            idx,
            attrs,
            vmax,
            accel,
            pos: 0.0,
            vel: 0.0,
            condition,
            events: build_events(&attrs, &mut event_rng),
            energy: 1.0,
            heat: 0.0,
        }
    }
}
