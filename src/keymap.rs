use crossterm::event::KeyCode;

use crate::note::PitchClass;
use crate::theory::Direction;

/// Seconds added or removed by the tempo keys.
pub const DURATION_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    SelectPrev,
    SelectNext,
    /// Play or stop the selected interval
    Toggle,
    Direction(Direction),
    Palindrome,
    Loop,
    /// Change the step duration by this many seconds
    Tempo(f64),
    Octave(i32),
    BaseNote(PitchClass),
    /// Move the base note one semitone up (+1) or down (-1)
    BaseStep(i32),
    PlayBase,
}

/// Map a keyboard character to a pitch class, laid out like a piano:
/// the home row holds the naturals, the row above the sharps.
pub fn char_to_note(c: char) -> Option<PitchClass> {
    match c {
        // Home row: natural notes
        'a' => Some(PitchClass::C),
        's' => Some(PitchClass::D),
        'd' => Some(PitchClass::E),
        'f' => Some(PitchClass::F),
        'g' => Some(PitchClass::G),
        'h' => Some(PitchClass::A),
        'j' => Some(PitchClass::B),

        // Top row: sharps
        'w' => Some(PitchClass::CSharp),
        'e' => Some(PitchClass::DSharp),
        't' => Some(PitchClass::FSharp),
        'y' => Some(PitchClass::GSharp),
        'u' => Some(PitchClass::ASharp),

        _ => None,
    }
}

pub fn action_for(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Up => Some(Action::SelectPrev),
        KeyCode::Down => Some(Action::SelectNext),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Toggle),
        KeyCode::Left => Some(Action::Direction(Direction::Down)),
        KeyCode::Right => Some(Action::Direction(Direction::Up)),
        KeyCode::Char('m') => Some(Action::Palindrome),
        KeyCode::Char('r') => Some(Action::Loop),
        KeyCode::Char('-') => Some(Action::Tempo(-DURATION_STEP)),
        KeyCode::Char('=') | KeyCode::Char('+') => Some(Action::Tempo(DURATION_STEP)),
        KeyCode::Char('b') => Some(Action::PlayBase),
        KeyCode::Char('[') => Some(Action::BaseStep(-1)),
        KeyCode::Char(']') => Some(Action::BaseStep(1)),
        KeyCode::Char(c) => {
            // Octave change with number keys
            if let Some(digit) = c.to_digit(10) {
                if (1..=8).contains(&digit) {
                    return Some(Action::Octave(digit as i32));
                }
            }
            char_to_note(c).map(Action::BaseNote)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piano_layout() {
        assert_eq!(char_to_note('a'), Some(PitchClass::C));
        assert_eq!(char_to_note('w'), Some(PitchClass::CSharp));
        assert_eq!(char_to_note('j'), Some(PitchClass::B));
        assert_eq!(char_to_note('k'), None);
    }

    #[test]
    fn test_every_class_has_a_key() {
        let keys = "awsedftgyhuj";
        let mut mapped: Vec<usize> = keys
            .chars()
            .filter_map(char_to_note)
            .map(|c| c.index())
            .collect();
        mapped.sort();
        assert_eq!(mapped, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_controls() {
        assert_eq!(action_for(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(action_for(KeyCode::Char(' ')), Some(Action::Toggle));
        assert_eq!(
            action_for(KeyCode::Left),
            Some(Action::Direction(Direction::Down))
        );
        assert_eq!(action_for(KeyCode::Char('3')), Some(Action::Octave(3)));
        assert_eq!(action_for(KeyCode::Char('9')), None);
        assert_eq!(action_for(KeyCode::Char('0')), None);
        assert_eq!(
            action_for(KeyCode::Char('-')),
            Some(Action::Tempo(-DURATION_STEP))
        );
        assert_eq!(
            action_for(KeyCode::Char('y')),
            Some(Action::BaseNote(PitchClass::GSharp))
        );
    }
}
