use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use crate::config::SynthSettings;
use crate::error::{Error, Result};
use crate::note::PitchClass;
use crate::scheduler::AudioOutput;

/// Voices beyond this many steal the oldest one.
const MAX_VOICES: usize = 16;

/// Samples kept for the oscilloscope.
const TAP_CAPACITY: usize = 1024;

/// A command sent to the audio thread
enum AudioCommand {
    /// Start a voice at a given frequency for a duration in seconds
    NoteOn { freq: f64, duration_secs: f64 },
    /// Silence every voice
    AllNotesOff,
}

struct Voice {
    freq: f64,
    age: usize,
    length: usize,
}

impl Voice {
    fn envelope(&self, attack: usize, release: usize) -> f64 {
        let rise = if attack == 0 {
            1.0
        } else {
            (self.age as f64 / attack as f64).min(1.0)
        };
        let left = self.length.saturating_sub(self.age);
        let fall = if release == 0 {
            1.0
        } else {
            (left as f64 / release as f64).min(1.0)
        };
        rise * fall
    }
}

/// Recent output samples, shared between the audio thread and the display.
#[derive(Clone)]
pub struct SignalTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl SignalTap {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(TAP_CAPACITY))),
        }
    }

    /// Never blocks: if the reader holds the lock, this block is skipped.
    fn push(&self, block: &[f32]) {
        let Some(mut samples) = self.samples.try_lock() else {
            return;
        };
        for &s in block {
            if samples.len() == TAP_CAPACITY {
                samples.pop_front();
            }
            samples.push_back(s);
        }
    }

    pub fn snapshot(&self) -> Vec<f32> {
        self.samples.lock().iter().copied().collect()
    }
}

struct Engine {
    // Dropping the stream stops output.
    _stream: cpal::Stream,
    tx: mpsc::Sender<AudioCommand>,
}

/// Sine voices on the default output device, opened on first use.
pub struct CpalOutput {
    settings: SynthSettings,
    tap: SignalTap,
    engine: Option<Engine>,
}

impl CpalOutput {
    pub fn new(settings: SynthSettings) -> Self {
        Self {
            settings,
            tap: SignalTap::new(),
            engine: None,
        }
    }

    pub fn tap(&self) -> SignalTap {
        self.tap.clone()
    }

    pub fn silence(&self) {
        if let Some(engine) = &self.engine {
            let _ = engine.tx.send(AudioCommand::AllNotesOff);
        }
    }

    fn open(&self) -> Result<Engine> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output audio device available".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| Error::Audio(format!("failed to get default output config: {}", e)))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(Error::Audio(format!(
                "unsupported sample format {:?}",
                config.sample_format()
            )));
        }

        let sample_rate = config.sample_rate() as f64;
        let channels = config.channels().max(1) as usize;
        let attack = (self.settings.attack * sample_rate) as usize;
        let release = (self.settings.release * sample_rate) as usize;
        let volume = self.settings.volume;
        let tap = self.tap.clone();

        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let mut voices: Vec<Voice> = Vec::new();
        let mut mono: Vec<f32> = Vec::new();

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Check for new commands (non-blocking)
                    while let Ok(cmd) = rx.try_recv() {
                        match cmd {
                            AudioCommand::NoteOn {
                                freq,
                                duration_secs,
                            } => {
                                if voices.len() == MAX_VOICES {
                                    voices.remove(0);
                                }
                                voices.push(Voice {
                                    freq,
                                    age: 0,
                                    length: (duration_secs * sample_rate) as usize,
                                });
                            }
                            AudioCommand::AllNotesOff => voices.clear(),
                        }
                    }

                    mono.clear();
                    for frame in data.chunks_mut(channels) {
                        let mut value = 0.0_f64;
                        for voice in &mut voices {
                            let t = voice.age as f64 / sample_rate;
                            value += (t * voice.freq * 2.0 * std::f64::consts::PI).sin()
                                * voice.envelope(attack, release);
                            voice.age += 1;
                        }
                        if !voices.is_empty() {
                            value = value / voices.len() as f64 * volume;
                        }
                        voices.retain(|v| v.age < v.length);

                        let sample = value as f32;
                        frame.fill(sample);
                        mono.push(sample);
                    }
                    tap.push(&mono);
                },
                move |err| {
                    log::error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::Audio(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::Audio(format!("failed to play stream: {}", e)))?;

        log::debug!("output stream: {} Hz, {} channel(s)", sample_rate, channels);
        Ok(Engine {
            _stream: stream,
            tx,
        })
    }
}

impl AudioOutput for CpalOutput {
    fn ensure_ready(&mut self) -> Result<()> {
        if self.engine.is_none() {
            self.engine = Some(self.open()?);
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    fn trigger(&mut self, class: PitchClass, octave: i32, duration: Duration) -> Result<()> {
        let engine = self.engine.as_ref().ok_or(Error::EngineNotReady)?;
        engine
            .tx
            .send(AudioCommand::NoteOn {
                freq: class.to_freq(octave),
                duration_secs: duration.as_secs_f64(),
            })
            .map_err(|_| Error::Audio("audio thread disconnected".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let voice = Voice {
            freq: 440.0,
            age: 0,
            length: 100,
        };
        assert_eq!(voice.envelope(10, 10), 0.0);
        let mid = Voice { age: 50, ..voice };
        assert_eq!(mid.envelope(10, 10), 1.0);
        let tail = Voice { age: 95, ..mid };
        assert!((tail.envelope(10, 10) - 0.5).abs() < 1e-9);
        assert_eq!(tail.envelope(0, 0), 1.0);
    }

    #[test]
    fn test_tap_keeps_most_recent_samples() {
        let tap = SignalTap::new();
        let block: Vec<f32> = (0..TAP_CAPACITY + 10).map(|i| i as f32).collect();
        tap.push(&block);
        let snap = tap.snapshot();
        assert_eq!(snap.len(), TAP_CAPACITY);
        assert_eq!(snap[0], 10.0);
    }

    #[test]
    fn test_trigger_before_ready_is_rejected() {
        let mut out = CpalOutput::new(SynthSettings::default());
        assert!(!out.is_ready());
        assert!(matches!(
            out.trigger(PitchClass::A, 4, Duration::from_millis(100)),
            Err(Error::EngineNotReady)
        ));
    }
}
