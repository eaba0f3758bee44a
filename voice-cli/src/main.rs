use clap::Parser;
use rand::Rng;
use std::path::PathBuf;

use battle_voice_core::{run, RandomiserSettings};

mod config;

#[derive(Debug, Parser)]
#[command(name = "battle-voice", version, about = "Battle voice randomiser for SCD sound containers")]
struct Args {
    /// Extracted game folder. Remembered for later runs.
    #[arg(long)]
    game_dir: Option<PathBuf>,

    /// Voice language folder, e.g. "us" or "jp". Remembered for later runs.
    #[arg(long)]
    language: Option<String>,

    /// Where the mod folder is created.
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Seed for the shuffle. A random one is picked and logged when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Also pack the mod folder into a zip next to it.
    #[arg(long, default_value_t = false)]
    zip: bool,

    /// Write a spoiler log of where every voice ended up.
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut cfg = config::load_config();
    let mut changed = false;
    if let Some(dir) = args.game_dir {
        cfg.game_dir = Some(dir);
        changed = true;
    }
    if let Some(language) = args.language {
        cfg.language = language;
        changed = true;
    }

    let Some(game_dir) = cfg.game_dir.clone() else {
        eprintln!("Error: no game folder configured; pass --game-dir once to set it");
        std::process::exit(1);
    };
    if changed {
        config::save_config(&cfg);
    }

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!("seed: {seed}");

    let settings = RandomiserSettings {
        seed,
        game_dir,
        language: cfg.language,
        output_path: args.output,
        package_zip: args.zip,
        debug: args.debug,
    };

    match run(settings) {
        Ok(report) => {
            log::info!(
                "done: {} primary and {} remastered voices across {} files in {}",
                report.primary_voices,
                report.remastered_voices,
                report.written.len(),
                report.out_root.display()
            );
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
