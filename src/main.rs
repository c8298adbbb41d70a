//! Plinktrix headless runner
//!
//! Runs one drop on the native target and prints where the balls landed.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use plinktrix::sim::{BallCounts, DropSummary};
    use plinktrix::{BoardVariant, Game, PlayerLedger, Settings};

    /// Drop balls through a Plinko board and report the payout
    #[derive(Debug, Parser)]
    #[command(name = "plinktrix", version, about)]
    struct Args {
        /// Regular balls to drop
        #[arg(short, long, default_value_t = 10)]
        regular: u32,
        /// Bonus (double payout) balls to drop
        #[arg(short, long, default_value_t = 0)]
        bonus: u32,
        /// RNG seed
        #[arg(short, long, default_value_t = 1)]
        seed: u64,
        /// Board preset (classic, compact); ignored with --config
        #[arg(long, default_value = "classic")]
        variant: String,
        /// Settings JSON file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Regular balls the player owns
        #[arg(long, default_value_t = 100)]
        stock_regular: u32,
        /// Bonus balls the player owns
        #[arg(long, default_value_t = 10)]
        stock_bonus: u32,
        /// Safety limit on simulated ticks
        #[arg(long, default_value_t = 60 * 60 * 10)]
        max_ticks: u64,
        /// Print the drop summary as JSON
        #[arg(long)]
        json: bool,
    }

    fn settings_for(args: &Args) -> Settings {
        if let Some(path) = &args.config {
            return Settings::load_or_default(path);
        }
        match BoardVariant::from_str(&args.variant) {
            Some(variant) => Settings::from_preset(variant),
            None => {
                log::warn!("Unknown variant '{}', using Classic", args.variant);
                Settings::default()
            }
        }
    }

    fn print_summary(summary: &DropSummary, ledger: &PlayerLedger) {
        println!("{:>8} {:>8} {:>8}", "prize", "regular", "bonus");
        for (value, count) in summary.tally.counts.iter().rev() {
            println!("{:>8} {:>8} {:>8}", value, count.regular, count.bonus);
        }
        println!();
        println!("Total score: {}", summary.total_score);
        println!("Ticks:       {}", summary.ticks);
        println!(
            "Ledger:      {} regular, {} bonus, score {}",
            ledger.regular_balls, ledger.bonus_balls, ledger.current_score
        );
    }

    pub fn run() -> std::process::ExitCode {
        env_logger::init();
        let args = Args::parse();

        let settings = settings_for(&args);
        log::info!("Plinktrix ({} board) starting...", settings.variant.as_str());

        let ledger = PlayerLedger::new(BallCounts::new(args.stock_regular, args.stock_bonus));
        let mut game = Game::new(settings, args.seed, ledger);

        if let Err(rejection) = game.drop_balls(BallCounts::new(args.regular, args.bonus)) {
            eprintln!("Drop refused: {}", rejection);
            return std::process::ExitCode::FAILURE;
        }

        let Some(summary) = game.run_to_completion(args.max_ticks) else {
            eprintln!("Drop did not settle within {} ticks", args.max_ticks);
            return std::process::ExitCode::FAILURE;
        };

        if args.json {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    eprintln!("Failed to encode summary: {}", err);
                    return std::process::ExitCode::FAILURE;
                }
            }
        } else {
            print_summary(&summary, &game.ledger);
        }
        std::process::ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web; hosts drive `plinktrix::Game` directly
}
