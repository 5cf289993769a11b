//! Monte-Carlo odds estimation
//!
//! Runs the race pipeline many times under independently salted seeds to
//! tally win frequencies, then converts the empirical probabilities to
//! decimal display odds under the configured house edge. The odds seed must
//! never be the committed settlement seed: odds are advisory, settlement is
//! the fairness commitment.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{EngineError, Result};
use crate::rng::{Seed, hash_seed};
use crate::sim::state::Runner;
use crate::sim::tick::{RaceOptions, simulate_race};
use crate::sim::track::Track;

/// Estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsConfig {
    /// Number of Monte-Carlo races
    pub sims: u32,
    /// Fractional reduction applied to fair decimal odds
    pub house_edge: f64,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            sims: DEFAULT_SIMS,
            house_edge: HOUSE_EDGE,
        }
    }
}

impl OddsConfig {
    fn validate(&self) -> Result<()> {
        if self.sims == 0 {
            return Err(EngineError::InvalidOddsConfig {
                reason: "sims must be at least 1".into(),
            });
        }
        if !self.house_edge.is_finite() || !(0.0..1.0).contains(&self.house_edge) {
            return Err(EngineError::InvalidOddsConfig {
                reason: format!("house edge must be in [0, 1), got {}", self.house_edge),
            });
        }
        Ok(())
    }
}

/// Empirical win probabilities and the display odds derived from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsEstimate {
    /// Smoothed win probability per runner, each strictly inside (0, 1)
    pub win_probs: Vec<f64>,
    /// Decimal payout odds after the house edge, clamped to the display band
    pub display_odds: Vec<f64>,
    pub house_edge: f64,
    pub sims: u32,
}

/// Estimate win probabilities and display odds for a field.
///
/// Each simulation runs under `hash(odds_seed, "sim-{i}")` with its own fresh
/// state, so the runs are independent and safe to execute in parallel; the
/// tally is reduced in index order and the estimate is fully deterministic
/// for a fixed odds seed.
pub fn estimate_odds(
    field: &[Runner],
    track: &Track,
    options: &RaceOptions,
    config: &OddsConfig,
    odds_seed: &Seed,
) -> Result<OddsEstimate> {
    config.validate()?;

    // Timelines are dead weight here; estimation only needs winners.
    let sim_options = RaceOptions {
        include_timeline: false,
        ..options.clone()
    };

    let winners: Vec<usize> = (0..config.sims)
        .into_par_iter()
        .map(|i| {
            let sim_seed = Seed::Int(hash_seed(odds_seed, &format!("sim-{i}")));
            simulate_race(field, track, &sim_seed, &sim_options).map(|r| r.winner_index)
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut tallies = vec![0u32; field.len()];
    for w in winners {
        tallies[w] += 1;
    }

    // Add-one smoothing keeps every probability strictly inside (0, 1) even
    // for a runner that never won a single simulation.
    let denom = f64::from(config.sims) + field.len() as f64;
    let win_probs: Vec<f64> = tallies
        .iter()
        .map(|&wins| (f64::from(wins) + 1.0) / denom)
        .collect();

    let display_odds: Vec<f64> = win_probs
        .iter()
        .map(|p| ((1.0 / p) * (1.0 - config.house_edge)).clamp(ODDS_MIN, ODDS_MAX))
        .collect();

    debug!(
        "odds estimated over {} sims for {} runners",
        config.sims,
        field.len()
    );

    Ok(OddsEstimate {
        win_probs,
        display_odds,
        house_edge: config.house_edge,
        sims: config.sims,
    })
}
