//! Interval arithmetic over the chromatic circle.
//!
//! Offsets are always computed with floor division so that a descending
//! resolution below the reference lands in the octave underneath, never in
//! octave zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::note::{PitchClass, PitchRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
        })
    }
}

/// One trainable interval as the user configured it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpec {
    pub id: String,
    pub label: String,
    pub semitones: u32,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub palindrome: bool,
    /// Descending paths start this many semitones above the base (0 = base).
    #[serde(default)]
    pub anchor: u32,
}

impl IntervalSpec {
    pub fn new(id: &str, label: &str, semitones: u32) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            semitones,
            direction: Direction::Up,
            palindrome: false,
            anchor: 0,
        }
    }
}

/// Resolve `semitones` away from `base` in `direction`.
pub fn resolve(base: PitchClass, semitones: u32, direction: Direction) -> PitchRef {
    let size = PitchClass::SIZE as i64;
    let base = base.index() as i64;
    let target = match direction {
        Direction::Up => base + semitones as i64,
        Direction::Down => base - semitones as i64,
    };
    PitchRef::new(PitchClass::at(target), target.div_euclid(size) as i32)
}

/// Every pitch from `base` to the interval's target, one semitone apart.
/// Element `i` is `resolve(base, i, direction)`.
pub fn chromatic_path(base: PitchClass, semitones: u32, direction: Direction) -> Vec<PitchRef> {
    (0..=semitones)
        .map(|step| resolve(base, step, direction))
        .collect()
}

/// Forward then backward; the turning point is played twice.
pub fn palindrome(path: &[PitchRef]) -> Vec<PitchRef> {
    path.iter().chain(path.iter().rev()).copied().collect()
}

/// Like `chromatic_path`, but a descending path with a non-zero anchor starts
/// from `resolve(base, anchor, Up)`. Offsets stay relative to `base`.
pub fn anchored_path(
    base: PitchClass,
    semitones: u32,
    direction: Direction,
    anchor: u32,
) -> Vec<PitchRef> {
    if direction == Direction::Up || anchor == 0 {
        return chromatic_path(base, semitones, direction);
    }

    let root = resolve(base, anchor, Direction::Up);
    chromatic_path(root.class, semitones, direction)
        .into_iter()
        .map(|p| PitchRef::new(p.class, p.octave_offset + root.octave_offset))
        .collect()
}

/// The full sequence a session plays for `spec`.
pub fn build_sequence(base: PitchClass, spec: &IntervalSpec) -> Vec<PitchRef> {
    let path = anchored_path(base, spec.semitones, spec.direction, spec.anchor);
    if spec.palindrome {
        palindrome(&path)
    } else {
        path
    }
}

/// The note the interval lands on (last element of the unmirrored path).
pub fn target(base: PitchClass, spec: &IntervalSpec) -> PitchRef {
    let path = anchored_path(base, spec.semitones, spec.direction, spec.anchor);
    // A path always holds at least its starting pitch.
    path[path.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::PitchClass::*;

    fn p(class: PitchClass, octave_offset: i32) -> PitchRef {
        PitchRef::new(class, octave_offset)
    }

    #[test]
    fn test_major_third_up_from_c() {
        assert_eq!(resolve(C, 4, Direction::Up), p(E, 0));
        assert_eq!(
            chromatic_path(C, 4, Direction::Up),
            vec![p(C, 0), p(CSharp, 0), p(D, 0), p(DSharp, 0), p(E, 0)]
        );
    }

    #[test]
    fn test_fifth_down_from_c_uses_floor_division() {
        assert_eq!(resolve(C, 7, Direction::Down), p(F, -1));
    }

    #[test]
    fn test_exact_octaves() {
        assert_eq!(resolve(C, 12, Direction::Up), p(C, 1));
        assert_eq!(resolve(C, 12, Direction::Down), p(C, -1));
        assert_eq!(resolve(C, 24, Direction::Down), p(C, -2));
        assert_eq!(resolve(A, 0, Direction::Down), p(A, 0));
    }

    #[test]
    fn test_wraps_past_b() {
        assert_eq!(resolve(G, 5, Direction::Up), p(C, 1));
        assert_eq!(resolve(B, 1, Direction::Up), p(C, 1));
        assert_eq!(resolve(D, 3, Direction::Down), p(B, -1));
    }

    #[test]
    fn test_up_then_complement_returns_one_octave_higher() {
        for base in PitchClass::ALL {
            for s in 1..12 {
                let first = resolve(base, s, Direction::Up);
                let second = resolve(first.class, 12 - s, Direction::Up);
                assert_eq!(second.class, base);
                assert_eq!(first.octave_offset + second.octave_offset, 1);
            }
        }
    }

    #[test]
    fn test_down_then_up_is_inverse() {
        for base in PitchClass::ALL {
            for n in 0..=36 {
                let down = resolve(base, n, Direction::Down);
                let up = resolve(down.class, n, Direction::Up);
                assert_eq!(up.class, base);
                assert_eq!(down.octave_offset + up.octave_offset, 0, "{} by {}", base, n);
            }
        }
    }

    #[test]
    fn test_zero_length_path() {
        for base in PitchClass::ALL {
            assert_eq!(chromatic_path(base, 0, Direction::Up), vec![p(base, 0)]);
            assert_eq!(chromatic_path(base, 0, Direction::Down), vec![p(base, 0)]);
        }
    }

    #[test]
    fn test_descending_path_crosses_octave() {
        let path = chromatic_path(C, 2, Direction::Down);
        assert_eq!(path, vec![p(C, 0), p(B, -1), p(ASharp, -1)]);
    }

    #[test]
    fn test_palindrome_duplicates_turning_point() {
        let path = chromatic_path(G, 5, Direction::Up);
        let k = path.len();
        let mirrored = palindrome(&path);
        assert_eq!(mirrored.len(), 2 * k);
        assert_eq!(mirrored[k], mirrored[k - 1]);
        assert_eq!(mirrored[0], mirrored[2 * k - 1]);
        assert_eq!(mirrored[k - 1], p(C, 1));
    }

    #[test]
    fn test_anchor_fifth_above_g() {
        // 7 + 7 = 14 lands on D in the next octave.
        let root = resolve(G, 7, Direction::Up);
        assert_eq!(root, p(D, 1));

        let path = anchored_path(G, 3, Direction::Down, 7);
        assert_eq!(path, vec![p(D, 1), p(CSharp, 1), p(C, 1), p(B, 0)]);
    }

    #[test]
    fn test_anchor_shifts_offsets_by_root() {
        let root = resolve(E, 7, Direction::Up);
        assert_eq!(root, p(B, 0));
        let path = anchored_path(E, 12, Direction::Down, 7);
        assert_eq!(path.first(), Some(&p(B, 0)));
        assert_eq!(path.last(), Some(&p(B, -1)));
    }

    #[test]
    fn test_anchor_ignored_when_ascending() {
        assert_eq!(
            anchored_path(C, 4, Direction::Up, 7),
            chromatic_path(C, 4, Direction::Up)
        );
    }

    #[test]
    fn test_build_sequence_lengths() {
        let mut spec = IntervalSpec::new("5th", "5 Steps", 5);
        assert_eq!(build_sequence(G, &spec).len(), 6);
        spec.palindrome = true;
        assert_eq!(build_sequence(G, &spec).len(), 12);
        assert_eq!(target(G, &spec), p(C, 1));
        spec.direction = Direction::Down;
        assert_eq!(target(G, &spec), p(D, 0));
    }
}
