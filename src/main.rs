mod config;
mod error;
mod keymap;
mod note;
mod repl;
mod scheduler;
mod synth;
mod theory;
mod view;
mod visualizer;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, MAX_OCTAVE, check_semitones};
use crate::error::Result;
use crate::note::PitchClass;
use crate::scheduler::TrainerState;
use crate::theory::Direction;

#[derive(Parser)]
#[command(name = "earsteps", about = "Chromatic interval ear trainer")]
#[command(version)]
struct Cli {
    /// Settings file (default: ~/.config/earsteps/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive trainer in the terminal
    Live {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Play one configured interval through speakers
    Play {
        /// Position in the interval list (0-based)
        index: usize,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Print the note an interval lands on
    Resolve {
        /// Base note, e.g. C, F#, Bb
        base: String,

        semitones: u32,

        /// Descend instead of ascending
        #[arg(long)]
        down: bool,
    },

    /// Print the chromatic path of an interval
    Path {
        /// Base note, e.g. C, F#, Bb
        base: String,

        semitones: u32,

        /// Descend instead of ascending
        #[arg(long)]
        down: bool,

        /// Play forward then backward
        #[arg(long)]
        palindrome: bool,

        /// Start a descending path this many semitones above the base
        #[arg(long, default_value_t = 0)]
        anchor: u32,
    },
}

/// Overrides for values from the settings file.
#[derive(Args)]
struct SessionArgs {
    /// Base note
    #[arg(long)]
    base: Option<String>,

    /// Base octave (0-8)
    #[arg(long)]
    octave: Option<i32>,

    /// Seconds per step
    #[arg(long)]
    duration: Option<f64>,

    /// Restart the sequence when it ends
    #[arg(long = "loop")]
    looping: bool,
}

impl SessionArgs {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(base) = &self.base {
            config.base_note = base.parse()?;
        }
        if let Some(octave) = self.octave {
            config.base_octave = octave.clamp(0, MAX_OCTAVE);
        }
        if let Some(duration) = self.duration {
            config::step_duration(duration)?;
            config.step_duration = duration;
        }
        if self.looping {
            config.looping = true;
        }
        Ok(())
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Live { session } => {
            let config = load_config(cli.config, &session)?;
            repl::run(TrainerState::from_config(&config)?, config.synth)
        }
        Command::Play { index, session } => {
            let config = load_config(cli.config, &session)?;
            if let Some(spec) = config.intervals.get(index) {
                println!(
                    "Playing: {} from {}, {:.2} s per step",
                    spec.label,
                    config.base_note.label(config.base_octave),
                    config.step_duration
                );
                println!();
            }
            repl::play(TrainerState::from_config(&config)?, config.synth, index)
        }
        Command::Resolve {
            base,
            semitones,
            down,
        } => {
            let base: PitchClass = base.parse()?;
            let direction = direction(down);
            let result = theory::resolve(base, semitones, direction);
            println!(
                "{} {} {} semitone{} -> {} (octave offset {:+})",
                base,
                direction,
                semitones,
                if semitones != 1 { "s" } else { "" },
                result.class,
                result.octave_offset
            );
            Ok(())
        }
        Command::Path {
            base,
            semitones,
            down,
            palindrome,
            anchor,
        } => {
            let base: PitchClass = base.parse()?;
            let mut spec = theory::IntervalSpec::new("cli", "cli", check_semitones(semitones)?);
            spec.direction = direction(down);
            spec.palindrome = palindrome;
            spec.anchor = check_semitones(anchor)?;
            print_path(&theory::build_sequence(base, &spec));
            Ok(())
        }
    }
}

fn direction(down: bool) -> Direction {
    if down { Direction::Down } else { Direction::Up }
}

fn load_config(path: Option<PathBuf>, session: &SessionArgs) -> Result<Config> {
    let mut config = config::load(path.as_deref())?;
    session.apply(&mut config)?;
    Ok(config)
}

fn print_path(path: &[note::PitchRef]) {
    println!("Steps: {}", path.len());
    println!();
    for (i, pitch) in path.iter().enumerate() {
        println!(
            "  {:>3}  {:<2} (octave offset {:+})",
            i, pitch.class, pitch.octave_offset
        );
    }
}
