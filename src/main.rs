//! Demo driver: build a round, estimate odds, settle the race, print JSON.
//!
//! Usage: furlong [SEED] [--runners N] [--sims N] [--enhanced] [--timeline]

use furlong::{Fidelity, OddsConfig, RaceOptions, Round, Seed, Track, finish_order};

struct Args {
    seed: Seed,
    runners: usize,
    sims: u32,
    fidelity: Fidelity,
    include_timeline: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        seed: Seed::Int(42),
        runners: 6,
        sims: furlong::consts::DEFAULT_SIMS,
        fidelity: Fidelity::Standard,
        include_timeline: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--runners" => {
                let v = iter.next().ok_or("--runners needs a value")?;
                args.runners = v.parse().map_err(|_| format!("bad runner count: {v}"))?;
            }
            "--sims" => {
                let v = iter.next().ok_or("--sims needs a value")?;
                args.sims = v.parse().map_err(|_| format!("bad sim count: {v}"))?;
            }
            "--enhanced" => args.fidelity = Fidelity::Enhanced,
            "--timeline" => args.include_timeline = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown flag: {other}"));
            }
            seed => {
                // Numeric seeds hash like their string rendering, so either
                // form of the committed value works here.
                args.seed = match seed.parse::<u64>() {
                    Ok(n) => Seed::Int(n),
                    Err(_) => Seed::Text(seed.to_string()),
                };
            }
        }
    }
    Ok(args)
}

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!("usage: furlong [SEED] [--runners N] [--sims N] [--enhanced] [--timeline]");
            std::process::exit(2);
        }
    };

    let options = RaceOptions {
        include_timeline: args.include_timeline,
        fidelity: args.fidelity,
        ..Default::default()
    };
    let odds_config = OddsConfig {
        sims: args.sims,
        ..Default::default()
    };

    let round = match Round::build(
        &args.seed,
        args.runners,
        Track::standard(),
        &options,
        &odds_config,
    ) {
        Ok(round) => round,
        Err(err) => {
            eprintln!("round build failed: {err}");
            std::process::exit(1);
        }
    };

    println!("field (seed {}):", args.seed);
    for (runner, odds) in round.runners.iter().zip(&round.odds.display_odds) {
        println!("  {:<10} {:<20} odds {:.2}", runner.id, runner.name, odds);
    }

    let result = match round.settle(&args.seed, &options) {
        Ok(result) => result,
        Err(err) => {
            // A settlement failure is fatal for the round; never retried.
            eprintln!("settlement failed: {err}");
            std::process::exit(1);
        }
    };

    let order = finish_order(&result.finish_times);
    println!("\nfinish order:");
    for (place, &idx) in order.iter().enumerate() {
        println!(
            "  {}. {:<20} {:.3}s",
            place + 1,
            round.runners[idx].name,
            result.finish_times[idx]
        );
    }

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("\nresult:\n{json}"),
        Err(err) => eprintln!("serialization failed: {err}"),
    }
}
