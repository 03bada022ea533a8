//! Turns an interval into timed playback and highlight events.
//!
//! Time is supplied from outside through [`Scheduler::advance`]: the live loop
//! feeds it wall-clock time, tests feed it simulated time. Every pending
//! side effect is a timer owned by the scheduler, tagged with the token of the
//! session that created it. Cancelling clears all timers and bumps the token,
//! so nothing from a stale session can fire.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{self, Config, MAX_OCTAVE};
use crate::error::{Error, Result};
use crate::note::{PitchClass, PitchRef};
use crate::theory::{self, Direction, IntervalSpec};

/// Sound-producing side of the trainer.
pub trait AudioOutput {
    /// One-time readiness handshake. Calls after the first success are no-ops.
    fn ensure_ready(&mut self) -> Result<()>;

    fn is_ready(&self) -> bool;

    /// Play one pitch. Fails with `EngineNotReady` before the handshake.
    fn trigger(&mut self, class: PitchClass, octave: i32, duration: Duration) -> Result<()>;
}

/// Redraws whatever shows the trainer state.
pub trait Render {
    fn render(&mut self, state: &TrainerState);
}

/// Position of an interval in the configured list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scheduled,
    Playing,
    Looping,
    Ended,
}

/// The step currently sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub step: usize,
    pub pitch: PitchRef,
}

/// Everything the user can see or change.
#[derive(Debug, Clone)]
pub struct TrainerState {
    pub base_note: PitchClass,
    pub base_octave: i32,
    pub step: Duration,
    pub looping: bool,
    pub intervals: Vec<IntervalSpec>,
    pub active: Option<IntervalIndex>,
    pub highlight: Option<Highlight>,
    pub phase: Phase,
}

impl TrainerState {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_note: config.base_note,
            base_octave: config.base_octave,
            step: config::step_duration(config.step_duration)?,
            looping: config.looping,
            intervals: config.intervals.clone(),
            active: None,
            highlight: None,
            phase: Phase::Idle,
        })
    }

    pub fn is_active(&self, index: IntervalIndex) -> bool {
        self.active == Some(index)
    }
}

struct Session {
    index: IntervalIndex,
    sequence: Vec<PitchRef>,
    token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Step(usize),
    Restart,
    Finish,
}

#[derive(Debug)]
struct Timer {
    token: u64,
    kind: TimerKind,
}

pub struct Scheduler<A, R> {
    state: TrainerState,
    session: Option<Session>,
    /// Keyed by (due time, insertion order).
    timers: BTreeMap<(Duration, u64), Timer>,
    next_timer: u64,
    token: u64,
    now: Duration,
    audio: A,
    renderer: R,
}

impl<A: AudioOutput, R: Render> Scheduler<A, R> {
    pub fn new(state: TrainerState, audio: A, renderer: R) -> Self {
        Self {
            state,
            session: None,
            timers: BTreeMap::new(),
            next_timer: 0,
            token: 0,
            now: Duration::ZERO,
            audio,
            renderer,
        }
    }

    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn redraw(&mut self) {
        self.renderer.render(&self.state);
    }

    /// Cancel whatever is playing and start interval `index` from its first step.
    pub fn start(&mut self, index: IntervalIndex) -> Result<()> {
        let spec = self.spec(index)?;
        let sequence = theory::build_sequence(self.state.base_note, spec);
        // The session ends one step after its last note.
        u32::try_from(sequence.len())
            .ok()
            .and_then(|steps| self.state.step.checked_mul(steps))
            .and_then(|span| self.now.checked_add(span))
            .ok_or(Error::InvalidDuration(self.state.step.as_secs_f64()))?;
        log::info!(
            "starting '{}' from {}: {} steps",
            spec.label,
            self.state.base_note,
            sequence.len()
        );

        self.clear_session();
        self.await_audio();

        self.token += 1;
        let token = self.token;
        for step in 0..sequence.len() {
            let due = self.now + self.state.step * step as u32;
            self.schedule(due, token, TimerKind::Step(step));
        }

        self.session = Some(Session {
            index,
            sequence,
            token,
        });
        self.state.active = Some(index);
        self.state.phase = Phase::Scheduled;
        self.redraw();
        Ok(())
    }

    /// Drop the active session and every pending timer. No-op when idle.
    pub fn cancel(&mut self) {
        if self.session.is_none() && self.timers.is_empty() {
            return;
        }
        self.clear_session();
        self.redraw();
    }

    /// Play/stop button: stops `index` if it is playing, starts it otherwise.
    pub fn toggle(&mut self, index: IntervalIndex) -> Result<()> {
        if self.state.is_active(index) {
            self.cancel();
            Ok(())
        } else {
            self.start(index)
        }
    }

    /// Fire every timer due at or before `now`, in order.
    pub fn advance(&mut self, now: Duration) {
        while let Some(entry) = self.timers.first_entry() {
            let (due, _) = *entry.key();
            if due > now {
                break;
            }
            let timer = entry.remove();
            self.now = due;
            self.fire(timer);
        }
        self.now = self.now.max(now);
    }

    pub fn set_step_duration(&mut self, secs: f64) -> Result<()> {
        self.state.step = config::step_duration(secs)?;
        self.redraw();
        Ok(())
    }

    pub fn adjust_step_duration(&mut self, delta_secs: f64) -> Result<()> {
        self.set_step_duration(self.state.step.as_secs_f64() + delta_secs)
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.state.looping = looping;
        self.redraw();
    }

    pub fn set_base_note(&mut self, class: PitchClass) {
        self.clear_session();
        self.state.base_note = class;
        self.redraw();
    }

    pub fn set_base_octave(&mut self, octave: i32) {
        self.clear_session();
        self.state.base_octave = octave.clamp(0, MAX_OCTAVE);
        self.redraw();
    }

    pub fn set_direction(&mut self, index: IntervalIndex, direction: Direction) -> Result<()> {
        self.spec(index)?;
        self.clear_session();
        self.state.intervals[index.0].direction = direction;
        self.redraw();
        Ok(())
    }

    pub fn toggle_palindrome(&mut self, index: IntervalIndex) -> Result<()> {
        self.spec(index)?;
        self.clear_session();
        let spec = &mut self.state.intervals[index.0];
        spec.palindrome = !spec.palindrome;
        self.redraw();
        Ok(())
    }

    /// Sound the base note once, outside any session.
    pub fn play_base(&mut self) {
        self.await_audio();
        let (class, octave) = (self.state.base_note, self.state.base_octave);
        if let Err(e) = self.audio.trigger(class, octave, self.state.step) {
            log::warn!("dropped {}: {}", class.label(octave), e);
        }
    }

    fn spec(&self, index: IntervalIndex) -> Result<&IntervalSpec> {
        self.state.intervals.get(index.0).ok_or(Error::InvalidIndex {
            index: index.0,
            len: self.state.intervals.len(),
        })
    }

    fn await_audio(&mut self) {
        if self.audio.is_ready() {
            return;
        }
        match self.audio.ensure_ready() {
            Ok(()) => log::info!("audio engine ready"),
            Err(e) => log::warn!("{}; triggers will be dropped", e),
        }
    }

    fn schedule(&mut self, due: Duration, token: u64, kind: TimerKind) {
        self.timers.insert((due, self.next_timer), Timer { token, kind });
        self.next_timer += 1;
    }

    fn clear_session(&mut self) {
        self.token += 1;
        self.timers.clear();
        self.session = None;
        self.state.active = None;
        self.state.highlight = None;
        self.state.phase = Phase::Idle;
    }

    fn fire(&mut self, timer: Timer) {
        let live = self
            .session
            .as_ref()
            .is_some_and(|s| s.token == timer.token && timer.token == self.token);
        if !live {
            return;
        }
        match timer.kind {
            TimerKind::Step(step) => self.play_step(step),
            TimerKind::Restart => self.restart(),
            TimerKind::Finish => self.finish(),
        }
    }

    fn play_step(&mut self, step: usize) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(&pitch) = session.sequence.get(step) else {
            return;
        };
        let last = step + 1 == session.sequence.len();
        let (index, token) = (session.index, session.token);

        let octave = pitch.octave(self.state.base_octave);
        log::debug!("step {} plays {}", step, pitch.class.label(octave));
        if let Err(e) = self.audio.trigger(pitch.class, octave, self.state.step) {
            log::warn!("dropped {}: {}", pitch.class.label(octave), e);
        }

        self.state.phase = Phase::Playing;
        self.state.highlight = Some(Highlight { step, pitch });

        if last {
            let due = self.now.saturating_add(self.state.step);
            if self.state.looping && self.state.is_active(index) {
                self.state.phase = Phase::Looping;
                self.schedule(due, token, TimerKind::Restart);
            } else {
                self.schedule(due, token, TimerKind::Finish);
            }
        }
        self.redraw();
    }

    fn restart(&mut self) {
        let Some(index) = self.session.as_ref().map(|s| s.index) else {
            return;
        };
        if let Err(e) = self.start(index) {
            log::error!("loop restart failed: {}", e);
            self.finish();
        }
    }

    fn finish(&mut self) {
        log::info!("session ended");
        self.session = None;
        self.state.active = None;
        self.state.highlight = None;
        self.state.phase = Phase::Ended;
        self.redraw();
    }
}
