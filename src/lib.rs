//! Furlong - deterministic race-outcome simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic race simulation (track, runner state, events, tick loop)
//! - `rng`: Seeded sub-stream generators and seed/salt hashing
//! - `odds`: Monte-Carlo win-probability and display-odds estimation
//! - `roster`: Seeded generation of a race field
//! - `round`: Pre-race round assembly (field + odds + committed settlement seed)
//!
//! A race is a pure function of {field, track, seed, options}: the same inputs
//! always produce a byte-identical result, on any machine. That property is
//! what lets the house commit to a seed before bets close and lets anyone
//! replay the outcome afterwards.

pub mod error;
pub mod odds;
pub mod rng;
pub mod roster;
pub mod round;
pub mod sim;

pub use error::{EngineError, Result};
pub use odds::{OddsConfig, OddsEstimate, estimate_odds};
pub use rng::{RaceRng, Seed, hash_seed};
pub use roster::generate_field;
pub use round::Round;
pub use sim::{
    Attributes, EventKind, Fidelity, RaceOptions, RaceResult, Runner, Segment, SegmentKind,
    TimelineSample, Track, VolatilityEvent, finish_order, resolve_winner, simulate_race,
};

/// Engine tuning constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const DT: f64 = 1.0 / 60.0;
    /// Hard tick ceiling (~200s of simulated time)
    pub const MAX_TICKS: u32 = 12_000;
    /// Default timeline sampling interval in seconds
    pub const TIMELINE_INTERVAL: f64 = 0.2;

    /// Standard single-lap length in meters-equivalent units
    pub const TRACK_LENGTH: f64 = 1000.0;
    /// Default lap count
    pub const DEFAULT_LAPS: u32 = 2;

    /// Base top speed, and the addition at 100 speed
    pub const VMAX0: f64 = 10.5;
    pub const VMAX1: f64 = 7.5;
    /// Base acceleration rate, and the addition at 100 accel
    pub const ACCEL0: f64 = 0.65;
    pub const ACCEL1: f64 = 0.9;

    /// Condition multiplier band
    pub const COND_MIN: f64 = 0.85;
    pub const COND_MAX: f64 = 1.15;
    /// Condition spread at full / zero stability
    pub const COND_SIGMA_MIN: f64 = 0.02;
    pub const COND_SIGMA_MAX: f64 = 0.1;

    /// Total-distance fraction where fatigue starts ramping
    pub const FAT_START: f64 = 0.55;
    /// Sharpness of the fatigue sigmoid
    pub const FAT_SHARPNESS: f64 = 12.0;
    /// Fatigue ceiling at zero stamina (fraction of top speed lost)
    pub const FAT_CEIL_LOW_STAMINA: f64 = 0.28;
    /// Fatigue ceiling at full stamina
    pub const FAT_CEIL_HIGH_STAMINA: f64 = 0.06;

    /// Corner speed penalty at zero cornering skill
    pub const CORNER_PENALTY_BASE: f64 = 0.1;

    /// Volatility event window and magnitude bounds
    pub const EVENT_START_MIN: f64 = 0.15;
    pub const EVENT_START_MAX: f64 = 0.85;
    pub const EVENT_DUR_MIN: f64 = 0.05;
    pub const EVENT_DUR_MAX: f64 = 0.12;
    pub const EVENT_MAG_MIN: f64 = 0.04;
    pub const EVENT_MAG_MAX: f64 = 0.12;

    /// Finish-time tie-break epsilon (seconds)
    pub const FINISH_EPSILON: f64 = 1e-6;

    /// Generated field attribute band
    pub const STAT_MIN: f64 = 30.0;
    pub const STAT_MAX: f64 = 95.0;

    /// Monte-Carlo odds defaults
    pub const DEFAULT_SIMS: u32 = 1200;
    pub const HOUSE_EDGE: f64 = 0.05;
    /// Display odds clamp band
    pub const ODDS_MIN: f64 = 1.01;
    pub const ODDS_MAX: f64 = 99.0;

    // Enhanced fidelity: energy reserve
    /// Reserve drain per second at rest
    pub const ENERGY_DRAIN_BASE: f64 = 0.001;
    /// Extra drain per second at top speed (scales with speed squared)
    pub const ENERGY_DRAIN_SPEED: f64 = 0.006;
    /// Extra drain per second while cornering
    pub const ENERGY_DRAIN_CORNER: f64 = 0.004;
    /// Stamina cuts total drain by up to this fraction
    pub const ENERGY_STAMINA_RELIEF: f64 = 0.5;
    /// Below this reserve the speed ceiling starts to soften
    pub const ENERGY_SOFT_FLOOR: f64 = 0.2;
    /// Ceiling multiplier with the reserve fully empty
    pub const ENERGY_EMPTY_FACTOR: f64 = 0.7;

    // Enhanced fidelity: corner heat
    /// Heat build per second at top speed in a corner
    pub const HEAT_BUILD: f64 = 0.25;
    /// Heat shed per second on the straights
    pub const HEAT_DECAY: f64 = 0.15;
    /// Corner speed cap: base fraction of top speed, and the cornering-skill addition
    pub const CORNER_CAP_BASE: f64 = 0.7;
    pub const CORNER_CAP_SKILL: f64 = 0.25;
    /// Cap shrink at full heat
    pub const CORNER_CAP_HEAT_LOSS: f64 = 0.3;

    // Enhanced fidelity: late-race overdrive
    /// Total-distance fraction where overdrive becomes available
    pub const OVERDRIVE_START: f64 = 0.8;
    /// Reserve required to engage, before the stability relief
    pub const OVERDRIVE_ENERGY_GATE: f64 = 0.35;
    /// Stability lowers the gate by up to this much
    pub const OVERDRIVE_GATE_RELIEF: f64 = 0.15;
    /// Power boost at full stability
    pub const OVERDRIVE_BOOST: f64 = 0.12;
    /// Velocity-cap headroom over the fatigued ceiling
    pub const OVERDRIVE_HEADROOM: f64 = 0.08;
    /// Extra reserve drain per second while engaged
    pub const OVERDRIVE_DRAIN: f64 = 0.02;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Logistic sigmoid
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
