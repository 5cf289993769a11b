//! Pre-race round assembly
//!
//! A round is everything the house publishes before bets close: the field,
//! the display odds and the track, plus the sub-seed the settlement race is
//! committed to. Odds run under their own salted seed; the settlement
//! sub-seed is recorded so the eventual race can be checked against the
//! commitment.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::odds::{OddsConfig, OddsEstimate, estimate_odds};
use crate::rng::{Seed, hash_seed};
use crate::roster::generate_field;
use crate::sim::state::Runner;
use crate::sim::tick::{RaceOptions, RaceResult, simulate_race};
use crate::sim::track::Track;

/// A published round: field, odds, track and the committed settlement sub-seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub runners: Vec<Runner>,
    pub odds: OddsEstimate,
    pub track: Track,
    /// Sub-seed the settlement race must run under
    pub seed_used: u64,
}

impl Round {
    /// Assemble a round from a committed seed.
    ///
    /// The field derives from the seed, odds run under the `"odds"` sub-seed
    /// (never the settlement one), and `seed_used` records the `"race"`
    /// sub-seed the settlement run will consume.
    pub fn build(
        seed: &Seed,
        field_size: usize,
        track: Track,
        options: &RaceOptions,
        odds_config: &OddsConfig,
    ) -> Result<Round> {
        let runners = generate_field(seed, field_size);
        let odds_seed = Seed::Int(hash_seed(seed, "odds"));
        let odds = estimate_odds(&runners, &track, options, odds_config, &odds_seed)?;
        Ok(Round {
            runners,
            odds,
            track,
            seed_used: hash_seed(seed, "race"),
        })
    }

    /// Run the authoritative settlement race for this round.
    ///
    /// The seed must be the one the round was built from; anything else is a
    /// broken fairness commitment and is rejected, not retried.
    pub fn settle(&self, seed: &Seed, options: &RaceOptions) -> Result<RaceResult> {
        let got = hash_seed(seed, "race");
        if got != self.seed_used {
            return Err(EngineError::SeedMismatch {
                expected: self.seed_used,
                got,
            });
        }
        let result = simulate_race(&self.runners, &self.track, seed, options)?;
        debug_assert_eq!(result.seed_used, self.seed_used);
        Ok(result)
    }
}
