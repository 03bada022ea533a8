use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Pitch classes of the chromatic scale, in cyclic order starting at C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// Number of pitch classes in one octave.
    pub const SIZE: usize = 12;

    pub const ALL: [PitchClass; Self::SIZE] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Position within the octave (C=0, B=11)
    pub fn index(self) -> usize {
        match self {
            PitchClass::C => 0,
            PitchClass::CSharp => 1,
            PitchClass::D => 2,
            PitchClass::DSharp => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::FSharp => 6,
            PitchClass::G => 7,
            PitchClass::GSharp => 8,
            PitchClass::A => 9,
            PitchClass::ASharp => 10,
            PitchClass::B => 11,
        }
    }

    /// Cyclic lookup: any integer maps onto the 12 classes.
    pub fn at(index: i64) -> PitchClass {
        Self::ALL[index.rem_euclid(Self::SIZE as i64) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Next class up, wrapping B to C.
    pub fn succ(self) -> PitchClass {
        Self::at(self.index() as i64 + 1)
    }

    /// Next class down, wrapping C to B.
    pub fn pred(self) -> PitchClass {
        Self::at(self.index() as i64 - 1)
    }

    /// MIDI note number for this class in `octave`.
    /// Middle C (C4) = MIDI 60
    pub fn to_midi(self, octave: i32) -> i32 {
        (octave + 1) * 12 + self.index() as i32
    }

    /// Frequency in Hz (A4 = 440 Hz)
    pub fn to_freq(self, octave: i32) -> f64 {
        let midi = self.to_midi(octave) as f64;
        440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
    }

    /// Combined label such as "C#4".
    pub fn label(self, octave: i32) -> String {
        format!("{}{}", self.name(), octave)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let class = match s.trim().to_ascii_lowercase().as_str() {
            "c" | "b#" => PitchClass::C,
            "c#" | "db" => PitchClass::CSharp,
            "d" => PitchClass::D,
            "d#" | "eb" => PitchClass::DSharp,
            "e" | "fb" => PitchClass::E,
            "f" | "e#" => PitchClass::F,
            "f#" | "gb" => PitchClass::FSharp,
            "g" => PitchClass::G,
            "g#" | "ab" => PitchClass::GSharp,
            "a" => PitchClass::A,
            "a#" | "bb" => PitchClass::ASharp,
            "b" | "cb" => PitchClass::B,
            _ => return Err(Error::InvalidPitchClass(s.to_string())),
        };
        Ok(class)
    }
}

impl TryFrom<String> for PitchClass {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PitchClass> for String {
    fn from(class: PitchClass) -> String {
        class.name().to_string()
    }
}

/// A pitch class with an octave offset relative to some reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchRef {
    pub class: PitchClass,
    pub octave_offset: i32,
}

impl PitchRef {
    pub fn new(class: PitchClass, octave_offset: i32) -> Self {
        Self {
            class,
            octave_offset,
        }
    }

    /// Absolute octave once placed on top of `base_octave`.
    pub fn octave(self, base_octave: i32) -> i32 {
        base_octave + self.octave_offset
    }
}

impl fmt::Display for PitchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:+}", self.class, self.octave_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_c_midi() {
        assert_eq!(PitchClass::C.to_midi(4), 60);
    }

    #[test]
    fn test_a4_frequency() {
        let freq = PitchClass::A.to_freq(4);
        assert!((freq - 440.0).abs() < 0.01);
    }

    #[test]
    fn test_index_roundtrip() {
        for (i, class) in PitchClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(PitchClass::at(i as i64), *class);
        }
    }

    #[test]
    fn test_cyclic_lookup() {
        assert_eq!(PitchClass::at(12), PitchClass::C);
        assert_eq!(PitchClass::at(-7), PitchClass::F);
        assert_eq!(PitchClass::at(-1), PitchClass::B);
        assert_eq!(PitchClass::B.succ(), PitchClass::C);
        assert_eq!(PitchClass::C.pred(), PitchClass::B);
    }

    #[test]
    fn test_parse() {
        assert_eq!("C#".parse::<PitchClass>().unwrap(), PitchClass::CSharp);
        assert_eq!("bb".parse::<PitchClass>().unwrap(), PitchClass::ASharp);
        assert_eq!(" g ".parse::<PitchClass>().unwrap(), PitchClass::G);
    }

    #[test]
    fn test_parse_rejects_unknown_symbol() {
        match "H".parse::<PitchClass>() {
            Err(Error::InvalidPitchClass(s)) => assert_eq!(s, "H"),
            other => panic!("expected InvalidPitchClass, got {:?}", other),
        }
    }

    #[test]
    fn test_label() {
        assert_eq!(PitchClass::DSharp.label(5), "D#5");
        assert_eq!(PitchRef::new(PitchClass::F, -1).to_string(), "F-1");
    }
}
