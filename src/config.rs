//! Trainer settings loaded from `~/.config/earsteps/config.toml`.
//!
//! Every field is optional; anything missing falls back to the defaults below.
//!
//! ```text
//! base_note = "G"
//! base_octave = 4
//! step_duration = 0.5
//! looping = false
//!
//! [synth]
//! attack = 0.01
//! release = 0.1
//! volume = 0.3
//!
//! [[intervals]]
//! id = "5th"
//! label = "5 Steps (Semi)"
//! semitones = 5
//! direction = "down"
//! palindrome = true
//! anchor = 7
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::note::PitchClass;
use crate::theory::IntervalSpec;

/// Largest interval (and anchor) accepted from a config file.
pub const MAX_SEMITONES: u32 = 48;

pub const MAX_OCTAVE: i32 = 8;

/// Seconds per step as a `Duration`. Rejects zero, negative, non-finite and
/// out-of-range values.
pub fn step_duration(secs: f64) -> Result<Duration> {
    if secs <= 0.0 {
        return Err(Error::InvalidDuration(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| Error::InvalidDuration(secs))
}

pub fn check_semitones(semitones: u32) -> Result<u32> {
    if semitones > MAX_SEMITONES {
        return Err(Error::IntervalTooLarge {
            semitones,
            max: MAX_SEMITONES,
        });
    }
    Ok(semitones)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_note: PitchClass,
    pub base_octave: i32,
    /// Seconds per step
    pub step_duration: f64,
    pub looping: bool,
    pub intervals: Vec<IntervalSpec>,
    pub synth: SynthSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_note: PitchClass::G,
            base_octave: 4,
            step_duration: 0.5,
            looping: false,
            intervals: vec![
                IntervalSpec::new("3rd", "3 Steps (Semi)", 3),
                IntervalSpec::new("5th", "5 Steps (Semi)", 5),
                IntervalSpec::new("8th", "8 Steps (Semi)", 8),
            ],
            synth: SynthSettings::default(),
        }
    }
}

/// Voice envelope for the sine engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSettings {
    /// Attack time in seconds (0 → peak)
    pub attack: f64,
    /// Release time in seconds at the end of each note
    pub release: f64,
    /// Output gain (0.0..=1.0)
    pub volume: f64,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            attack: 0.01,
            release: 0.1,
            volume: 0.3,
        }
    }
}

pub fn default_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("earsteps")
            .join("config.toml")
    })
}

/// Load settings. An explicit `path` must exist and parse; the default
/// location is optional and a broken file there is only logged.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_file(path)?,
        None => match default_path() {
            Some(path) if path.exists() => load_file(&path).unwrap_or_else(|e| {
                log::warn!("ignoring {}", e);
                Config::default()
            }),
            _ => Config::default(),
        },
    };
    config.validate(path.unwrap_or_else(|| Path::new("<default>")))?;
    Ok(config)
}

fn load_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config = parse(&content).map_err(|message| Error::Config {
        path: path.to_path_buf(),
        message,
    })?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

pub fn parse(content: &str) -> std::result::Result<Config, String> {
    let mut config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
    config.synth.volume = config.synth.volume.clamp(0.0, 1.0);
    Ok(config)
}

impl Config {
    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: String| Error::Config {
            path: path.to_path_buf(),
            message,
        };

        step_duration(self.step_duration)?;
        if !(0..=MAX_OCTAVE).contains(&self.base_octave) {
            return Err(invalid(format!(
                "base_octave {} outside 0..={}",
                self.base_octave, MAX_OCTAVE
            )));
        }
        for spec in &self.intervals {
            if spec.semitones > MAX_SEMITONES || spec.anchor > MAX_SEMITONES {
                return Err(invalid(format!(
                    "interval '{}' exceeds {} semitones",
                    spec.id, MAX_SEMITONES
                )));
            }
        }
        if self.synth.attack < 0.0 || self.synth.release < 0.0 {
            return Err(invalid("synth envelope times must be >= 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::Direction;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.intervals.len(), 3);
        assert_eq!(config.base_note, PitchClass::G);
    }

    #[test]
    fn test_parse_intervals() {
        let config = parse(
            r#"
base_note = "Eb"
step_duration = 0.25

[[intervals]]
id = "5th"
label = "Fifth"
semitones = 7
direction = "down"
palindrome = true
anchor = 7
"#,
        )
        .unwrap();
        assert_eq!(config.base_note, PitchClass::DSharp);
        assert_eq!(config.step_duration, 0.25);
        assert_eq!(config.intervals.len(), 1);
        let spec = &config.intervals[0];
        assert_eq!(spec.direction, Direction::Down);
        assert!(spec.palindrome);
        assert_eq!(spec.anchor, 7);
    }

    #[test]
    fn test_unknown_note_is_rejected() {
        let err = parse("base_note = \"H\"").unwrap_err();
        assert!(err.contains("invalid pitch class"), "{}", err);
    }

    #[test]
    fn test_volume_is_clamped() {
        let config = parse("[synth]\nvolume = 4.0").unwrap();
        assert_eq!(config.synth.volume, 1.0);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_octave = 3\nlooping = true").unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.base_octave, 3);
        assert!(config.looping);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(load(Some(path.as_path())), Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_rejects_non_positive_duration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "step_duration = 0.0").unwrap();
        assert!(matches!(
            load(Some(file.path())),
            Err(Error::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_load_rejects_unrepresentable_duration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "step_duration = 1e20").unwrap();
        assert!(matches!(
            load(Some(file.path())),
            Err(Error::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_step_duration_bounds() {
        assert_eq!(step_duration(0.25).unwrap(), Duration::from_millis(250));
        for bad in [0.0, -1.0, 1e20, f64::NAN, f64::INFINITY] {
            assert!(matches!(step_duration(bad), Err(Error::InvalidDuration(_))));
        }
    }

    #[test]
    fn test_semitone_limit() {
        assert_eq!(check_semitones(MAX_SEMITONES).unwrap(), MAX_SEMITONES);
        assert!(matches!(
            check_semitones(u32::MAX),
            Err(Error::IntervalTooLarge { semitones: u32::MAX, .. })
        ));
    }

    #[test]
    fn test_load_rejects_huge_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[intervals]]\nid = \"x\"\nlabel = \"x\"\nsemitones = 99"
        )
        .unwrap();
        assert!(matches!(load(Some(file.path())), Err(Error::Config { .. })));
    }
}
