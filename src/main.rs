//! Bubble Pop entry point
//!
//! The browser build is a library (see `web.rs`). Natively this runs a
//! headless round with an autoplayer, which is handy for balancing presets.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use bubble_pop::consts::SIM_DT;
    use bubble_pop::settings::{Difficulty, Settings};
    use bubble_pop::sim::{BubbleId, RoundConfig, RoundController, RoundEvent, Rule, ScoreKind};
    use clap::Parser;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    #[derive(Parser, Debug)]
    #[command(name = "bubble-pop")]
    #[command(about = "Play a headless bubble pop round with an autoplayer")]
    struct Args {
        /// RNG seed (default: derived from the current time)
        #[arg(long)]
        seed: Option<u64>,

        /// Difficulty preset (easy, normal, hard)
        #[arg(short = 'd', long, default_value = "normal")]
        difficulty: String,

        /// Starting rule (odd, even, multiple_of_3); random if omitted
        #[arg(short = 'r', long)]
        rule: Option<String>,

        /// Round config JSON file (overrides difficulty and rule)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Simulated seconds before giving up on an endless round
        #[arg(long, default_value = "120.0")]
        seconds: f32,

        /// Chance the autoplayer picks a correct bubble (0.0-1.0)
        #[arg(long, default_value = "0.85")]
        accuracy: f64,

        /// Seconds between autoplayer taps
        #[arg(long, default_value = "0.6")]
        reaction: f32,
    }

    /// Taps the highest bubble that matches (or, on a bad day, doesn't
    /// match) the rule on the banner
    struct AutoPlayer {
        rng: Pcg32,
        accuracy: f64,
        reaction: f32,
        cooldown: f32,
    }

    impl AutoPlayer {
        fn new(seed: u64, accuracy: f64, reaction: f32) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed ^ 0x5EED_B0B),
                accuracy: accuracy.clamp(0.0, 1.0),
                reaction: reaction.max(SIM_DT),
                cooldown: reaction,
            }
        }

        fn choose(&mut self, controller: &RoundController, dt: f32) -> Option<BubbleId> {
            self.cooldown -= dt;
            if self.cooldown > 0.0 {
                return None;
            }
            self.cooldown = self.reaction;

            let arena = controller.arena();
            let rule = arena.rule();
            let wants_correct = self.rng.random_bool(self.accuracy);
            arena
                .bubbles()
                .iter()
                .filter(|b| b.is_alive() && rule.classify(b.value()) == wants_correct)
                .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
                .map(|b| b.id)
        }
    }

    fn load_config(args: &Args, seed: u64) -> Result<RoundConfig, Box<dyn std::error::Error>> {
        if let Some(path) = &args.config {
            let json = std::fs::read_to_string(path)?;
            log::info!("Loaded round config from {}", path.display());
            return Ok(RoundConfig::from_json(&json)?);
        }

        let difficulty = Difficulty::from_str(&args.difficulty).unwrap_or_else(|| {
            log::warn!("Unknown difficulty '{}', using Normal", args.difficulty);
            Difficulty::Normal
        });
        let starting_rule = match &args.rule {
            Some(name) => Some(Rule::from_str(name).ok_or_else(|| format!("unknown rule '{name}'"))?),
            None => None,
        };
        let settings = Settings {
            difficulty,
            starting_rule,
            ..Settings::load()
        };
        Ok(settings.round_config(seed % 2 == 0))
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        env_logger::init();
        let args = Args::parse();

        let seed = args.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
        let config = load_config(&args, seed)?;
        log::info!("Bubble Pop (native) starting with seed {}", seed);

        let mut controller = RoundController::new();
        controller.start(config, seed)?;
        let mut player = AutoPlayer::new(seed, args.accuracy, args.reaction);

        let max_steps = (args.seconds.max(0.0) / SIM_DT).ceil() as u64;
        let mut steps = 0;
        while controller.is_running() && steps < max_steps {
            controller.step(SIM_DT);
            if let Some(id) = player.choose(&controller, SIM_DT) {
                controller.pop(id);
            }
            for event in controller.drain_events() {
                match event {
                    RoundEvent::Score { event, score } => {
                        let verdict = match event.kind {
                            ScoreKind::Hit => "correct",
                            ScoreKind::Miss => "oops",
                        };
                        log::debug!("Popped {} ({}), score {}", event.value, verdict, score);
                    }
                    RoundEvent::LifeLost { lives } => log::info!("Life lost, {} left", lives),
                    RoundEvent::LevelUp { level, rule, .. } => {
                        println!("Level {}! {}", level, rule.banner());
                    }
                    RoundEvent::RoundEnd(end) => {
                        println!(
                            "Game over ({:?}): score {}, level {}, {} star(s)",
                            end.reason, end.final_score, end.level, end.stars
                        );
                        println!("{}", controller.arena().rule().encouragement(end.stars));
                    }
                    _ => {}
                }
            }
            steps += 1;
        }

        if controller.is_running() {
            controller.stop();
            let board = controller.scoreboard();
            println!(
                "Stopped after {:.0}s: score {}, level {}, lives {}",
                args.seconds, board.score, board.level, board.lives
            );
        }
        let board = controller.scoreboard();
        println!(
            "Hits {}, misses {}, floated away {}",
            board.hits, board.misses, board.expired
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::wasm_start, this is just to satisfy the compiler
}
