//! Neon Defender headless runner
//!
//! Plays a seeded session under the demo pilot and prints a summary.
//!
//! Usage: `neon-defender [SEED] [SECONDS] [--save-dir DIR]`. Saves go to the
//! platform data directory unless `--save-dir` or `NEON_DEFENDER_SAVE_DIR`
//! points elsewhere.

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

/// Command-line arguments for the headless runner
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for the world RNG
    #[arg(default_value_t = 12345)]
    seed: u64,
    /// Simulated seconds to play
    #[arg(default_value_t = 120)]
    seconds: u32,
    /// Directory holding the save slots
    #[arg(long, value_name = "DIR", env = "NEON_DEFENDER_SAVE_DIR")]
    save_dir: Option<std::path::PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use neon_defender::consts::SIM_DT;
    use neon_defender::persistence::{SaveSlot, SaveStore};
    use neon_defender::sim::tick::DIFFICULTY_PER_BOSS;
    use neon_defender::sim::{ShipClass, autopilot};
    use neon_defender::Session;

    env_logger::init();

    let args = Args::parse();
    log::info!("Neon Defender (headless) starting: seed {}, {}s", args.seed, args.seconds);

    let store = args
        .save_dir
        .or_else(SaveStore::default_location)
        .map(SaveStore::new);
    let mut session = match store {
        Some(store) => {
            log::info!("Saving to {}", store.dir().display());
            Session::with_store(store, SaveSlot::Auto, args.seed, ShipClass::Interceptor)
        }
        None => {
            log::warn!("No save directory available; running without saves");
            Session::new(args.seed, ShipClass::Interceptor)
        }
    };

    let frames = args.seconds as u64 * 60;
    let mut runs = 1;
    let mut bosses = 0;
    // Difficulty starts at 1.0 and only bosses raise it
    let bosses_this_run = |difficulty: f32| ((difficulty - 1.0) / DIFFICULTY_PER_BOSS).round() as u32;
    for _ in 0..frames {
        let input = autopilot::drive(session.world());
        session.update(SIM_DT, &input);
        if session.world().is_over() {
            bosses += bosses_this_run(session.world().difficulty);
            session.restart(ShipClass::Interceptor);
            runs += 1;
        }
    }
    bosses += bosses_this_run(session.world().difficulty);
    session.autosave();

    let world = session.world();
    println!("Simulated {} ticks over {} run(s)", world.time_ticks, runs);
    println!("Score: {}  Credits: {}", world.ledger.score, world.ledger.currency);
    println!("Bosses defeated: {bosses}");
    let unlocked = world.achievements.unlocked_ids();
    if unlocked.is_empty() {
        println!("No achievements unlocked");
    } else {
        println!("Achievements: {}", unlocked.join(", "));
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation core is a library on the web; there is no entry point here
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["neon-defender"]).expect("defaults parse");
        assert_eq!(args.seed, 12345);
        assert_eq!(args.seconds, 120);
    }

    #[test]
    fn test_cli_rejects_bad_seed() {
        assert!(Args::try_parse_from(["neon-defender", "seven", "2"]).is_err());
    }

    #[test]
    fn test_cli_positional_and_save_dir() {
        let args = Args::try_parse_from(["neon-defender", "7", "30", "--save-dir", "saves"]).expect("parse");
        assert_eq!(args.seed, 7);
        assert_eq!(args.seconds, 30);
        assert_eq!(args.save_dir.as_deref(), Some(std::path::Path::new("saves")));
    }
}
