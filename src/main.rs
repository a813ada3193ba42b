use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use eartrainer::utils::note_name;
use eartrainer::{
    AudioPlayer, CpalPlayer, DifficultyTier, EarError, EarTrainingSession, GuessOutcome, NullPlayer,
    SessionConfig, SessionSnapshot, Solfege,
};

#[derive(Parser, Debug)]
#[command(name = "eartrainer", about = "Solfege ear training in the terminal")]
struct Args {
    /// Session profile file (`key: value` lines)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    key: Option<String>,
    #[arg(long)]
    difficulty: Option<DifficultyTier>,
    #[arg(long)]
    seed: Option<u64>,
    /// Render rounds without opening an audio device
    #[arg(long)]
    silent: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), EarError> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(mode) = &args.mode {
        config.mode = eartrainer::Mode::named(mode)?.name().to_string();
    }
    if let Some(key) = &args.key {
        config.key = key.parse()?;
    }
    if let Some(tier) = args.difficulty {
        config.difficulty = tier;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let player: Box<dyn AudioPlayer> = if args.silent {
        Box::new(NullPlayer)
    } else {
        match CpalPlayer::new() {
            Ok(player) => Box::new(player),
            Err(e) => {
                warn!("{}; continuing without sound", e);
                Box::new(NullPlayer)
            }
        }
    };

    let mut session = EarTrainingSession::new(config, player)?;
    session.start()?;
    let outcome = prompt_loop(&mut session);
    let stopped = session.stop();
    outcome.and(stopped)
}

fn prompt_loop(session: &mut EarTrainingSession) -> Result<(), EarError> {
    let syllables: Vec<&str> = Solfege::ALL.iter().map(|s| s.syllable()).collect();
    println!("Guess with: {}", syllables.join(" "));
    println!("Commands: remove, replay, skip, exit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| EarError::FileError(e.to_string()))?;

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|e| EarError::FileError(e.to_string()))?;
        if read == 0 {
            return Ok(()); // EOF
        }

        match line.trim().to_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" => return Ok(()),
            "remove" => {
                session.remove_last_guess();
            }
            "replay" => session.replay()?,
            "skip" => session.restart_round()?,
            token => match session.submit_guess(token) {
                Ok(GuessOutcome::Pending { .. }) => {}
                Ok(GuessOutcome::Scored(outcome)) => {
                    let marks: String = outcome.detailed_match.iter().map(|m| if *m { 'o' } else { 'x' }).collect();
                    println!(
                        "{} [{}] +{:.2} points{}",
                        if outcome.overall_match { "Correct!" } else { "Not quite." },
                        marks,
                        outcome.points_delta,
                        if outcome.leveled_up { format!(", LEVEL UP -> {}", outcome.level) } else { String::new() },
                    );
                    if !outcome.overall_match {
                        let names: Vec<String> = outcome.answer.iter().map(|n| note_name(*n)).collect();
                        println!("Answer: {}", names.join(" "));
                    }
                }
                Err(EarError::UnknownSolfege(t)) => {
                    println!("Not a valid solfege input: {}", t);
                    continue;
                }
                Err(e) => return Err(e),
            },
        }

        print_state(&session.snapshot());
    }
}

fn print_state(s: &SessionSnapshot) {
    println!(
        "[{:>6.1}s] level {} | {:.2}/{:.2} pts | {} in {} | guesses {}/{}: {:?}",
        s.elapsed.as_secs_f64(),
        s.level,
        s.gamepoints,
        s.required_gamepoints,
        s.mode,
        s.key,
        s.guesses.len(),
        s.notes_needed,
        s.guesses,
    );
}
