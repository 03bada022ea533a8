use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};

use crate::config::SynthSettings;
use crate::error::{Error, Result};
use crate::keymap::{self, Action};
use crate::scheduler::{AudioOutput, IntervalIndex, Scheduler, TrainerState};
use crate::synth::{CpalOutput, SignalTap};
use crate::view::{LogRender, TerminalView};

/// How often the oscilloscope is redrawn.
const SCOPE_INTERVAL: Duration = Duration::from_millis(50);

/// Upper bound on timer lateness.
const POLL: Duration = Duration::from_millis(5);

type LiveScheduler = Scheduler<CpalOutput, TerminalView>;

/// Run the interactive trainer until the user quits.
pub fn run(state: TrainerState, synth: SynthSettings) -> Result<()> {
    let audio = CpalOutput::new(synth);
    let tap = audio.tap();

    let mut stdout = io::stdout();

    // Enter raw mode
    terminal::enable_raw_mode().map_err(Error::Terminal)?;
    execute!(
        stdout,
        EnterAlternateScreen,
        Clear(ClearType::All),
        cursor::Hide
    )
    .map_err(Error::Terminal)?;

    let mut scheduler = Scheduler::new(state, audio, TerminalView::new(stdout));
    scheduler.redraw();

    let result = event_loop(&mut scheduler, &tap);

    // Restore terminal
    scheduler.cancel();
    scheduler.audio().silence();
    let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn event_loop(scheduler: &mut LiveScheduler, tap: &SignalTap) -> Result<()> {
    let clock = Instant::now();
    let mut last_scope = Duration::ZERO;

    loop {
        scheduler.advance(clock.elapsed());

        let now = clock.elapsed();
        if now - last_scope >= SCOPE_INTERVAL {
            let count = scheduler.state().intervals.len();
            scheduler.renderer_mut().draw_scope(count, &tap.snapshot());
            last_scope = now;
        }

        if !event::poll(POLL).map_err(Error::Terminal)? {
            continue;
        }

        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event::read().map_err(Error::Terminal)?
        else {
            continue;
        };

        let Some(action) = keymap::action_for(code) else {
            continue;
        };
        if action == Action::Quit {
            return Ok(());
        }

        scheduler.advance(clock.elapsed());
        let status = match apply(scheduler, action) {
            Ok(()) => String::new(),
            Err(e) => {
                log::debug!("rejected {:?}: {}", action, e);
                e.to_string()
            }
        };
        scheduler.renderer_mut().set_status(status);
        scheduler.redraw();
    }
}

fn apply<A: AudioOutput>(scheduler: &mut Scheduler<A, TerminalView>, action: Action) -> Result<()> {
    let selected = scheduler.renderer().selected();

    match action {
        Action::Quit => {}
        Action::SelectPrev | Action::SelectNext => {
            let delta = if action == Action::SelectPrev { -1 } else { 1 };
            let len = scheduler.state().intervals.len();
            scheduler.renderer_mut().move_selection(delta, len);
            scheduler.redraw();
        }
        Action::Toggle => scheduler.toggle(selected)?,
        Action::Direction(direction) => scheduler.set_direction(selected, direction)?,
        Action::Palindrome => scheduler.toggle_palindrome(selected)?,
        Action::Loop => {
            let looping = !scheduler.state().looping;
            scheduler.set_looping(looping);
        }
        Action::Tempo(delta) => scheduler.adjust_step_duration(delta)?,
        Action::Octave(octave) => scheduler.set_base_octave(octave),
        Action::BaseNote(class) => scheduler.set_base_note(class),
        Action::BaseStep(delta) => {
            let base = scheduler.state().base_note;
            scheduler.set_base_note(if delta < 0 { base.pred() } else { base.succ() });
        }
        Action::PlayBase => scheduler.play_base(),
    }
    Ok(())
}

/// Play one interval through the speakers, printing each step.
/// Returns when the session ends; with looping enabled it never does.
pub fn play(state: TrainerState, synth: SynthSettings, index: usize) -> Result<()> {
    let mut audio = CpalOutput::new(synth);
    audio.ensure_ready()?;

    let mut scheduler = Scheduler::new(state, audio, LogRender::default());
    scheduler.start(IntervalIndex(index))?;

    let clock = Instant::now();
    while scheduler.state().active.is_some() {
        scheduler.advance(clock.elapsed());
        thread::sleep(POLL);
    }

    // Brief silence at the end so the last note rings out
    thread::sleep(Duration::from_millis(100));
    scheduler.audio().silence();
    Ok(())
}
