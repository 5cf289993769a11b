//! Deterministic race simulation module
//!
//! All race logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, one salted sub-stream per concern
//! - Stable iteration order (by roster index)
//! - No I/O, no shared mutable state, no platform dependencies

pub mod event;
pub mod outcome;
pub mod state;
pub mod tick;
pub mod track;

pub use event::{EventKind, VolatilityEvent, build_events, event_multiplier};
pub use outcome::{finish_order, resolve_winner};
pub use state::{Attributes, Runner, RunnerState, sample_condition};
pub use tick::{Fidelity, RaceOptions, RaceResult, TimelineSample, simulate_race};
pub use track::{Segment, SegmentKind, Track};
