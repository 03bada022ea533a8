//! Renderers for the trainer state.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};

use crate::scheduler::{Highlight, IntervalIndex, Phase, Render, TrainerState};
use crate::theory;
use crate::visualizer;

const HEADER_ROW: u16 = 3;
const FIRST_INTERVAL_ROW: u16 = 5;
const SCOPE_WIDTH: usize = 64;
const SCOPE_HEIGHT: usize = 9;

const BANNER: &str = "\
earsteps - chromatic interval trainer\r\n\
─────────────────────────────────────────\r\n";

const HELP: &[&str] = &[
    "  Up/Down select   Enter play/stop   Left/Right direction   m mirror",
    "  r loop   -/= tempo   1-8 octave   [/] base -/+   b play base   q quit",
    "  Base note:  a w s e d f t g y h u j  =  C C# D D# E F F# G G# A A# B",
];

pub fn header_line(state: &TrainerState) -> String {
    let phase = match state.phase {
        Phase::Idle | Phase::Ended => "",
        Phase::Scheduled | Phase::Playing => "playing",
        Phase::Looping => "looping",
    };
    format!(
        "  Base: {:<4} Step: {:.2} s   Loop: {:<3}   {}",
        state.base_note.label(state.base_octave),
        state.step.as_secs_f64(),
        if state.looping { "on" } else { "off" },
        phase
    )
}

pub fn interval_line(state: &TrainerState, index: IntervalIndex, selected: bool) -> String {
    let Some(spec) = state.intervals.get(index.0) else {
        return String::new();
    };
    let target = theory::target(state.base_note, spec);
    let playing = state.is_active(index);

    let shown = match (playing, state.highlight) {
        (true, Some(Highlight { pitch, .. })) => {
            format!("♪ {}", pitch.class.label(pitch.octave(state.base_octave)))
        }
        _ => format!("→ {}", target.class.label(target.octave(state.base_octave))),
    };

    format!(
        "{} {:<18} {:<5} {:<7} {:<8} {}",
        if selected { '>' } else { ' ' },
        spec.label,
        spec.direction,
        if spec.palindrome { "mirror" } else { "" },
        shown,
        if playing { "[Stop]" } else { "[Play]" }
    )
}

fn help_row(interval_count: usize) -> u16 {
    FIRST_INTERVAL_ROW + interval_count as u16 + 1
}

/// Full-screen view for the live mode. Owns the terminal's stdout.
pub struct TerminalView {
    stdout: io::Stdout,
    selected: usize,
    status: String,
}

impl TerminalView {
    pub fn new(stdout: io::Stdout) -> Self {
        Self {
            stdout,
            selected: 0,
            status: String::new(),
        }
    }

    pub fn selected(&self) -> IntervalIndex {
        IntervalIndex(self.selected)
    }

    /// Move the cursor by `delta` rows, clamped to `len` intervals.
    pub fn move_selection(&mut self, delta: isize, len: usize) {
        let max = len.saturating_sub(1) as isize;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Redraw the oscilloscope below the help text.
    pub fn draw_scope(&mut self, interval_count: usize, samples: &[f32]) {
        let top = help_row(interval_count) + HELP.len() as u16 + 3;
        for (i, row) in visualizer::trace(samples, SCOPE_WIDTH, SCOPE_HEIGHT)
            .into_iter()
            .enumerate()
        {
            let _ = queue!(
                self.stdout,
                MoveTo(2, top + i as u16),
                Clear(ClearType::CurrentLine),
                Print(row)
            );
        }
        let _ = self.stdout.flush();
    }
}

impl Render for TerminalView {
    fn render(&mut self, state: &TrainerState) {
        let _ = execute!(self.stdout, MoveTo(0, 0), Print(BANNER));
        let _ = queue!(
            self.stdout,
            MoveTo(0, HEADER_ROW),
            Clear(ClearType::CurrentLine),
            Print(header_line(state))
        );

        for i in 0..state.intervals.len() {
            let line = interval_line(state, IntervalIndex(i), i == self.selected);
            let _ = queue!(
                self.stdout,
                MoveTo(0, FIRST_INTERVAL_ROW + i as u16),
                Clear(ClearType::CurrentLine),
                Print(line)
            );
        }

        let row = help_row(state.intervals.len());
        for (i, line) in HELP.iter().enumerate() {
            let _ = queue!(self.stdout, MoveTo(0, row + i as u16), Print(line));
        }
        let _ = queue!(
            self.stdout,
            MoveTo(0, row + HELP.len() as u16 + 1),
            Clear(ClearType::CurrentLine),
            Print(&self.status)
        );
        let _ = self.stdout.flush();
    }
}

/// Prints each played step once, for non-interactive playback.
#[derive(Default)]
pub struct LogRender {
    last: Option<Highlight>,
}

impl Render for LogRender {
    fn render(&mut self, state: &TrainerState) {
        if state.highlight == self.last {
            return;
        }
        self.last = state.highlight;
        if let Some(Highlight { step, pitch }) = state.highlight {
            println!(
                "  {:>3}  Playing {}",
                step,
                pitch.class.label(pitch.octave(state.base_octave))
            );
        }
    }
}
