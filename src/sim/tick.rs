//! Fixed-timestep race integration
//!
//! The core loop that advances every runner each tick: fatigue, corner
//! penalty, event multiplier, first-order velocity lag, position integration,
//! interpolated finish detection. One canonical loop serves both fidelity
//! levels; Enhanced adds energy, heat and overdrive on top of the Standard
//! model rather than forking the integrator.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{EngineError, Result};
use crate::rng::{Seed, hash_seed};
use crate::sim::event::{VolatilityEvent, event_multiplier};
use crate::sim::outcome::resolve_winner;
use crate::sim::state::{Runner, RunnerState};
use crate::sim::track::Track;
use crate::{lerp, sigmoid};

/// Integrator fidelity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Settlement-grade baseline: fatigue, corners, events
    #[default]
    Standard,
    /// Adds energy reserve, corner heat and late-race overdrive
    Enhanced,
}

/// Per-race options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceOptions {
    /// Record periodic position/speed snapshots for replay
    pub include_timeline: bool,
    /// Seconds between timeline samples
    pub timeline_interval: f64,
    /// Overrides the track's allow-events-in-corners flag when set
    pub allow_events_in_corners: Option<bool>,
    /// Overrides the track's lap count when set
    pub laps: Option<u32>,
    pub fidelity: Fidelity,
}

impl Default for RaceOptions {
    fn default() -> Self {
        Self {
            include_timeline: false,
            timeline_interval: TIMELINE_INTERVAL,
            allow_events_in_corners: None,
            laps: None,
            fidelity: Fidelity::default(),
        }
    }
}

/// Periodic position/speed snapshot, one entry per runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSample {
    /// Simulated time in seconds
    pub t: f64,
    pub positions: Vec<f64>,
    pub speeds: Vec<f64>,
}

/// Immutable outcome of one race.
///
/// Write-once: produced by `simulate_race`, consumed by settlement, replay and
/// odds estimation, never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub winner_index: usize,
    /// Seconds to cross the finish distance; stragglers freeze to the final
    /// simulated time
    pub finish_times: Vec<f64>,
    /// Final distances, clamped to the total race distance
    pub final_positions: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineSample>>,
    /// Per-runner volatility events, in roster order
    pub events: Vec<Vec<VolatilityEvent>>,
    /// Per-runner condition multipliers, in roster order
    pub conditions: Vec<f64>,
    /// The concrete sub-seed the race ran under
    pub seed_used: u64,
}

fn validate(field: &[Runner], track: &Track, options: &RaceOptions) -> Result<()> {
    if field.is_empty() {
        return Err(EngineError::EmptyField);
    }
    for runner in field {
        runner.attrs.validate(&runner.id)?;
    }
    track.validate()?;
    if options.laps == Some(0) {
        return Err(EngineError::InvalidOptions {
            reason: "lap override must be at least 1".into(),
        });
    }
    if !options.timeline_interval.is_finite() || options.timeline_interval <= 0.0 {
        return Err(EngineError::InvalidOptions {
            reason: format!(
                "timeline interval must be positive, got {}",
                options.timeline_interval
            ),
        });
    }
    Ok(())
}

/// Enhanced-fidelity adjustments for one runner tick: drains the energy
/// reserve, accumulates corner heat, applies the heat-shrunk cornering cap and
/// the late-race overdrive. Returns the adjusted target velocity.
fn enhanced_target(
    st: &mut RunnerState,
    mut v_target: f64,
    vmax_fatigued: f64,
    in_corner: bool,
    total_frac: f64,
) -> f64 {
    let stamina = st.attrs.stamina / 100.0;
    let stability = st.attrs.stability / 100.0;
    let speed_frac = if st.vmax > 0.0 {
        (st.vel / st.vmax).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // Reserve drains with speed squared plus cornering load.
    let mut drain = ENERGY_DRAIN_BASE + ENERGY_DRAIN_SPEED * speed_frac * speed_frac;
    if in_corner {
        drain += ENERGY_DRAIN_CORNER;
    }

    // Heat builds under cornering load and sheds on the straights.
    if in_corner {
        st.heat = (st.heat + HEAT_BUILD * speed_frac * DT).min(1.0);
    } else {
        st.heat = (st.heat - HEAT_DECAY * DT).max(0.0);
    }

    // Heat eats the lateral budget: cap corner speed and brake down to it.
    if in_corner {
        let cap = st.vmax
            * (CORNER_CAP_BASE + CORNER_CAP_SKILL * st.attrs.cornering / 100.0)
            * (1.0 - CORNER_CAP_HEAT_LOSS * st.heat);
        if v_target > cap {
            v_target = cap;
        }
    }

    // Late-race overdrive: spend reserve for cap headroom and extra power.
    let gate = OVERDRIVE_ENERGY_GATE - OVERDRIVE_GATE_RELIEF * stability;
    if total_frac >= OVERDRIVE_START && st.energy > gate {
        let boost = 1.0 + OVERDRIVE_BOOST * stability;
        v_target = (v_target * boost).min(vmax_fatigued * (1.0 + OVERDRIVE_HEADROOM));
        drain += OVERDRIVE_DRAIN;
    }

    st.energy = (st.energy - drain * (1.0 - ENERGY_STAMINA_RELIEF * stamina) * DT).max(0.0);

    // A drained reserve softens the ceiling.
    if st.energy < ENERGY_SOFT_FLOOR {
        v_target *= lerp(ENERGY_EMPTY_FACTOR, 1.0, st.energy / ENERGY_SOFT_FLOOR);
    }

    v_target.max(0.0)
}

/// Run one deterministic race.
///
/// The same {field, track, seed, options} always produce a byte-identical
/// result. The loop terminates when every runner finishes or at the tick
/// ceiling; hitting the ceiling is a warning, not an error, and the result is
/// still fully populated.
pub fn simulate_race(
    field: &[Runner],
    track: &Track,
    seed: &Seed,
    options: &RaceOptions,
) -> Result<RaceResult> {
    validate(field, track, options)?;

    let seed_used = hash_seed(seed, "race");
    let allow_in_corners = options
        .allow_events_in_corners
        .unwrap_or(track.allow_events_in_corners);
    let laps = options.laps.unwrap_or(track.laps);
    let total_length = track.length * f64::from(laps);

    let mut states: Vec<RunnerState> = field
        .iter()
        .enumerate()
        .map(|(i, r)| RunnerState::build(i, r, seed_used))
        .collect();
    let conditions: Vec<f64> = states.iter().map(|s| s.condition).collect();
    let events: Vec<Vec<VolatilityEvent>> = states.iter().map(|s| s.events.clone()).collect();

    let mut finish_times = vec![f64::INFINITY; field.len()];
    let mut final_positions = vec![0.0; field.len()];
    let mut timeline: Option<Vec<TimelineSample>> = options.include_timeline.then(Vec::new);

    let mut t = 0.0;
    let mut next_sample = 0.0;
    let mut finished = 0;

    for _ in 0..MAX_TICKS {
        if finished == field.len() {
            break;
        }

        for st in &mut states {
            if finish_times[st.idx].is_finite() {
                continue;
            }

            let total_frac = st.pos / total_length;
            let lap_frac = (st.pos % track.length) / track.length;
            let in_corner = track.is_corner(lap_frac);

            // Fatigue narrows the speed ceiling as the race wears on.
            let fatigue_curve = sigmoid((total_frac - FAT_START) * FAT_SHARPNESS);
            let fatigue_ceiling = lerp(
                FAT_CEIL_LOW_STAMINA,
                FAT_CEIL_HIGH_STAMINA,
                st.attrs.stamina / 100.0,
            );
            let vmax_fatigued = st.vmax * (1.0 - fatigue_ceiling * fatigue_curve);

            let corner_mult = if in_corner {
                let penalty = CORNER_PENALTY_BASE
                    * (1.0 - st.attrs.cornering / 100.0)
                    * (1.0 - 0.5 * st.attrs.stamina / 100.0);
                (1.0 - penalty).max(0.0)
            } else {
                1.0
            };

            let ev_mult = event_multiplier(&st.events, total_frac, in_corner, allow_in_corners);
            let mut v_target = vmax_fatigued * corner_mult * ev_mult;

            if options.fidelity == Fidelity::Enhanced {
                v_target = enhanced_target(st, v_target, vmax_fatigued, in_corner, total_frac);
            }

            // First-order lag toward the target, scaled by accel capacity.
            st.vel += (v_target - st.vel) * st.accel * DT;
            if st.vel < 0.0 {
                st.vel = 0.0;
            }

            let step_dist = st.vel * DT;
            st.pos += step_dist;

            if st.pos >= total_length {
                // Interpolate the crossing instant inside this tick.
                let overshoot = st.pos - total_length;
                let frac_past = if step_dist > 0.0 {
                    (overshoot / step_dist).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                finish_times[st.idx] = t + DT * (1.0 - frac_past);
                st.pos = total_length;
                final_positions[st.idx] = total_length;
                finished += 1;
            } else {
                final_positions[st.idx] = st.pos;
            }
        }

        t += DT;

        if let Some(samples) = timeline.as_mut() {
            if t >= next_sample {
                samples.push(TimelineSample {
                    t,
                    positions: states.iter().map(|s| s.pos).collect(),
                    speeds: states.iter().map(|s| s.vel).collect(),
                });
                next_sample += options.timeline_interval;
            }
        }
    }

    // Stragglers freeze to the final simulated time: still deterministic,
    // still a fully-populated result.
    if finished < field.len() {
        warn!(
            "race {seed_used:#018x} hit the {MAX_TICKS}-tick ceiling with {} of {} runners unfinished",
            field.len() - finished,
            field.len()
        );
        for ft in &mut finish_times {
            if !ft.is_finite() {
                *ft = t;
            }
        }
    }

    debug_assert!(
        finish_times.iter().all(|ft| ft.is_finite()),
        "non-finite finish time is an implementation bug"
    );

    let winner_index = resolve_winner(&finish_times);

    Ok(RaceResult {
        winner_index,
        finish_times,
        final_positions,
        timeline,
        events,
        conditions,
        seed_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::outcome::finish_order;
    use crate::sim::state::Attributes;
    use crate::sim::track::{Segment, SegmentKind};
    use proptest::prelude::*;

    fn flat(v: f64) -> Attributes {
        Attributes {
            speed: v,
            accel: v,
            stamina: v,
            stability: v,
            cornering: v,
        }
    }

    fn runner(id: &str, attrs: Attributes) -> Runner {
        Runner {
            id: id.into(),
            name: id.into(),
            attrs,
        }
    }

    fn straight_track() -> Track {
        Track {
            length: 1000.0,
            laps: 2,
            segments: vec![Segment::new(0.0, 1.0, SegmentKind::Straight)],
            allow_events_in_corners: false,
        }
    }

    fn field_of(n: usize) -> Vec<Runner> {
        (0..n)
            .map(|i| runner(&format!("r{i}"), flat((50.0 + 6.0 * i as f64).min(100.0))))
            .collect()
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let opts = RaceOptions::default();
        let seed = Seed::Int(1);
        assert_eq!(
            simulate_race(&[], &Track::standard(), &seed, &opts),
            Err(EngineError::EmptyField)
        );

        let mut bad = field_of(2);
        bad[1].attrs.speed = f64::INFINITY;
        assert!(matches!(
            simulate_race(&bad, &Track::standard(), &seed, &opts),
            Err(EngineError::InvalidAttribute { .. })
        ));

        let bad_opts = RaceOptions {
            laps: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            simulate_race(&field_of(2), &Track::standard(), &seed, &bad_opts),
            Err(EngineError::InvalidOptions { .. })
        ));

        let bad_opts = RaceOptions {
            timeline_interval: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            simulate_race(&field_of(2), &Track::standard(), &seed, &bad_opts),
            Err(EngineError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_determinism_byte_identical() {
        let field = field_of(6);
        let opts = RaceOptions {
            include_timeline: true,
            ..Default::default()
        };
        let seed = Seed::Text("commit-abc".into());
        let a = simulate_race(&field, &Track::standard(), &seed, &opts).unwrap();
        let b = simulate_race(&field, &Track::standard(), &seed, &opts).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_different_seeds_diverge() {
        let field = field_of(6);
        let opts = RaceOptions::default();
        let a = simulate_race(&field, &Track::standard(), &Seed::Int(1), &opts).unwrap();
        let b = simulate_race(&field, &Track::standard(), &Seed::Int(2), &opts).unwrap();
        assert_ne!(a.finish_times, b.finish_times);
    }

    #[test]
    fn test_everyone_finishes_on_standard_track() {
        let field = field_of(8);
        let result =
            simulate_race(&field, &Track::standard(), &Seed::Int(7), &RaceOptions::default())
                .unwrap();
        for (i, &ft) in result.finish_times.iter().enumerate() {
            assert!(ft.is_finite() && ft > 0.0);
            assert_eq!(result.final_positions[i], 2000.0);
        }
    }

    #[test]
    fn test_timeline_positions_monotone() {
        let field = field_of(5);
        let opts = RaceOptions {
            include_timeline: true,
            ..Default::default()
        };
        let result = simulate_race(&field, &Track::standard(), &Seed::Int(9), &opts).unwrap();
        let timeline = result.timeline.unwrap();
        assert!(!timeline.is_empty());
        for pair in timeline.windows(2) {
            assert!(pair[1].t > pair[0].t);
            for i in 0..field.len() {
                assert!(pair[1].positions[i] >= pair[0].positions[i]);
            }
        }
    }

    #[test]
    fn test_winner_is_argmin_of_finish_times() {
        let field = field_of(8);
        let result =
            simulate_race(&field, &Track::standard(), &Seed::Int(31), &RaceOptions::default())
                .unwrap();
        assert_eq!(result.winner_index, resolve_winner(&result.finish_times));
        assert_eq!(
            result.winner_index,
            finish_order(&result.finish_times)[0]
        );
    }

    #[test]
    fn test_identical_field_seed_42_stable_winner() {
        // Two identical runners, seed 42: the winner must be the same runner
        // on every one of 100 repeated invocations.
        let field = vec![runner("a", flat(60.0)), runner("b", flat(60.0))];
        let seed = Seed::Int(42);
        let first =
            simulate_race(&field, &Track::standard(), &seed, &RaceOptions::default()).unwrap();
        for _ in 0..99 {
            let again =
                simulate_race(&field, &Track::standard(), &seed, &RaceOptions::default()).unwrap();
            assert_eq!(again.winner_index, first.winner_index);
            assert_eq!(again.finish_times, first.finish_times);
        }
    }

    #[test]
    fn test_stamina_decides_on_a_clean_track() {
        // A at zero stamina, B at full, all other sources of separation
        // disabled: no corners, stability maxed. Fatigue must cost A at least
        // as much time as B.
        let mut a = flat(60.0);
        a.stamina = 0.0;
        a.stability = 100.0;
        let mut b = flat(60.0);
        b.stamina = 100.0;
        b.stability = 100.0;

        let field = vec![runner("a", a), runner("b", b)];
        let result = simulate_race(
            &field,
            &straight_track(),
            &Seed::Int(42),
            &RaceOptions::default(),
        )
        .unwrap();
        assert!(result.finish_times[0] >= result.finish_times[1]);
    }

    #[test]
    fn test_finish_time_interpolated_inside_tick() {
        // 1000 x 2 laps: the crossing happens mid-tick, so the finish time
        // must not land on a tick boundary.
        let field = vec![runner("solo", flat(80.0))];
        let result =
            simulate_race(&field, &Track::standard(), &Seed::Int(5), &RaceOptions::default())
                .unwrap();
        let ft = result.finish_times[0];
        let ticks = ft / DT;
        assert!(
            (ticks - ticks.round()).abs() > 1e-9,
            "finish time {ft} snapped to a tick boundary"
        );
        assert_eq!(result.final_positions[0], 2000.0);
    }

    #[test]
    fn test_tick_ceiling_freezes_stragglers() {
        // A race too long to finish inside the ceiling: every runner freezes
        // to the same final simulated time and the result stays populated.
        let track = Track {
            length: 1.0e9,
            laps: 1,
            segments: vec![Segment::new(0.0, 1.0, SegmentKind::Straight)],
            allow_events_in_corners: false,
        };
        let field = field_of(3);
        let result =
            simulate_race(&field, &track, &Seed::Int(3), &RaceOptions::default()).unwrap();
        let end_time = result.finish_times[0];
        assert!(end_time.is_finite());
        for (i, &ft) in result.finish_times.iter().enumerate() {
            assert_eq!(ft, end_time);
            assert!(result.final_positions[i] < track.total_distance());
        }
        assert_eq!(result.winner_index, 0, "frozen tie resolves to index 0");
    }

    #[test]
    fn test_lap_override_changes_distance() {
        let field = field_of(4);
        let short = RaceOptions {
            laps: Some(1),
            ..Default::default()
        };
        let long = RaceOptions {
            laps: Some(2),
            ..Default::default()
        };
        let seed = Seed::Int(17);
        let a = simulate_race(&field, &Track::standard(), &seed, &short).unwrap();
        let b = simulate_race(&field, &Track::standard(), &seed, &long).unwrap();
        assert_eq!(a.final_positions[a.winner_index], 1000.0);
        assert_eq!(b.final_positions[b.winner_index], 2000.0);
        assert!(b.finish_times[b.winner_index] > a.finish_times[a.winner_index]);
    }

    #[test]
    fn test_enhanced_fidelity_deterministic_and_divergent() {
        let field = field_of(6);
        let seed = Seed::Int(77);
        let standard = RaceOptions::default();
        let enhanced = RaceOptions {
            fidelity: Fidelity::Enhanced,
            ..Default::default()
        };
        let e1 = simulate_race(&field, &Track::standard(), &seed, &enhanced).unwrap();
        let e2 = simulate_race(&field, &Track::standard(), &seed, &enhanced).unwrap();
        assert_eq!(
            serde_json::to_string(&e1).unwrap(),
            serde_json::to_string(&e2).unwrap()
        );

        let s = simulate_race(&field, &Track::standard(), &seed, &standard).unwrap();
        assert_ne!(
            s.finish_times, e1.finish_times,
            "enhanced physics must actually change the race"
        );
        for &ft in &e1.finish_times {
            assert!(ft.is_finite() && ft > 0.0);
        }
    }

    #[test]
    fn test_event_windows_contained_after_clipping() {
        let field = field_of(10);
        let result =
            simulate_race(&field, &Track::standard(), &Seed::Int(55), &RaceOptions::default())
                .unwrap();
        for events in &result.events {
            for ev in events {
                let start = ev.start_frac.max(0.0);
                let end = ev.end_frac().min(1.0);
                assert!((0.0..=1.0).contains(&start));
                assert!((0.0..=1.0).contains(&end));
                assert!(start <= end);
            }
        }
    }

    #[test]
    fn test_conditions_reported_in_band() {
        let field = field_of(10);
        let result =
            simulate_race(&field, &Track::standard(), &Seed::Int(4), &RaceOptions::default())
                .unwrap();
        for &c in &result.conditions {
            assert!((COND_MIN..=COND_MAX).contains(&c));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn race_invariants_hold_for_random_fields(
            seed in 0u64..10_000,
            speeds in proptest::collection::vec(0.0f64..100.0, 2..6),
        ) {
            let field: Vec<Runner> = speeds
                .iter()
                .enumerate()
                .map(|(i, &s)| {
                    runner(&format!("r{i}"), Attributes {
                        speed: s,
                        accel: 30.0 + s / 2.0,
                        stamina: 100.0 - s,
                        stability: s,
                        cornering: s / 2.0 + 25.0,
                    })
                })
                .collect();
            let opts = RaceOptions { include_timeline: true, ..Default::default() };
            let result =
                simulate_race(&field, &Track::standard(), &Seed::Int(seed), &opts).unwrap();

            // Winner consistency
            prop_assert_eq!(result.winner_index, resolve_winner(&result.finish_times));

            // Monotone positions, speeds never negative
            let timeline = result.timeline.unwrap();
            for pair in timeline.windows(2) {
                for i in 0..field.len() {
                    prop_assert!(pair[1].positions[i] >= pair[0].positions[i]);
                    prop_assert!(pair[1].speeds[i] >= 0.0);
                }
            }

            // Finish times finite and positive
            for &ft in &result.finish_times {
                prop_assert!(ft.is_finite() && ft > 0.0);
            }
        }
    }
}
