//! Seeded field generation
//!
//! Builds a race field from a seed: every attribute draws uniformly from the
//! configured band through a per-runner salted sub-stream, so field N of round
//! X is the same on every machine that knows the seed.

use crate::consts::*;
use crate::rng::{RaceRng, Seed};
use crate::sim::state::{Attributes, Runner};

/// Stable name pool for generated runners
const NAMES: &[&str] = &[
    "Midnight Ledger",
    "Copper Furlong",
    "Salt Flat Sprinter",
    "Paper Lantern",
    "Iron Paddock",
    "Quiet Thunder",
    "Gilded Turn",
    "North Straight",
    "Ember Gait",
    "Last Call",
    "Harbor Mile",
    "Dust Devil",
    "Crooked Silks",
    "Penny Ante",
    "Stone Bridge",
    "Velvet Odds",
];

/// Generate a deterministic field of `count` runners from a seed.
///
/// Attributes draw in a fixed order (speed, accel, stamina, stability,
/// cornering) followed by the name pick, so the layout of each sub-stream is
/// part of the engine's reproducibility contract.
pub fn generate_field(seed: &Seed, count: usize) -> Vec<Runner> {
    let mut field = Vec::with_capacity(count);
    for i in 0..count {
        let mut rng = RaceRng::from_salted(seed, &format!("field-{i}"));
        let attrs = Attributes {
            speed: rng.next_range(STAT_MIN, STAT_MAX),
            accel: rng.next_range(STAT_MIN, STAT_MAX),
            stamina: rng.next_range(STAT_MIN, STAT_MAX),
            stability: rng.next_range(STAT_MIN, STAT_MAX),
            cornering: rng.next_range(STAT_MIN, STAT_MAX),
        };
        let pick = rng.next_int(0, NAMES.len() as i64 - 1) as usize;
        let base_name = NAMES[pick];
        // Qualify repeats deterministically so a big field stays readable.
        let name = if field.iter().any(|r: &Runner| r.name.starts_with(base_name)) {
            format!("{base_name} {}", i + 1)
        } else {
            base_name.to_string()
        };
        field.push(Runner {
            id: format!("runner-{}", i + 1),
            name,
            attrs,
        });
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_deterministic() {
        let seed = Seed::Text("round-15".into());
        assert_eq!(generate_field(&seed, 8), generate_field(&seed, 8));
    }

    #[test]
    fn test_field_attributes_within_band() {
        let field = generate_field(&Seed::Int(88), 20);
        assert_eq!(field.len(), 20);
        for r in &field {
            assert!(r.attrs.validate(&r.id).is_ok());
            for v in [
                r.attrs.speed,
                r.attrs.accel,
                r.attrs.stamina,
                r.attrs.stability,
                r.attrs.cornering,
            ] {
                assert!((STAT_MIN..STAT_MAX).contains(&v));
            }
        }
    }

    #[test]
    fn test_ids_and_names_unique() {
        let field = generate_field(&Seed::Int(3), 30);
        for (i, a) in field.iter().enumerate() {
            for b in &field[i + 1..] {
                assert_ne!(a.id, b.id);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_field(&Seed::Int(1), 6);
        let b = generate_field(&Seed::Int(2), 6);
        assert_ne!(a, b);
    }
}
