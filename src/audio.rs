//! Synthesized sound cues.
//!
//! Cues are described as short tone sequences and rendered to mono PCM.
//! Output goes through an [`AudioSink`]; the sink is opened lazily on the
//! first key press and any failure silences audio for the rest of the run.

use std::f32::consts::TAU;
use std::io::{self, Write};

pub const SAMPLE_RATE: u32 = 22_050;

/// Linear fade in/out applied to every tone to avoid clicks.
const FADE_MS: f32 = 4.0;

/// Game moments that make a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Food,
    GameOver,
    Victory,
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample at `phase` in cycles, range [-1, 1].
    fn sample(self, phase: f32) -> f32 {
        let t = phase.fract();
        match self {
            Waveform::Sine => (t * TAU).sin(),
            Waveform::Square => {
                if t < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (t - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * t - 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: u32,
    pub waveform: Waveform,
    pub gain: f32,
}

const fn tone(frequency_hz: f32, duration_ms: u32, waveform: Waveform, gain: f32) -> Tone {
    Tone {
        frequency_hz,
        duration_ms,
        waveform,
        gain,
    }
}

/// Tone sequence for a cue.
pub fn cue_tones(cue: Cue) -> &'static [Tone] {
    const FOOD: [Tone; 2] = [
        tone(660.0, 50, Waveform::Square, 0.25),
        tone(990.0, 60, Waveform::Square, 0.25),
    ];
    const GAME_OVER: [Tone; 3] = [
        tone(330.0, 140, Waveform::Sawtooth, 0.3),
        tone(220.0, 160, Waveform::Sawtooth, 0.3),
        tone(110.0, 320, Waveform::Sawtooth, 0.3),
    ];
    const VICTORY: [Tone; 4] = [
        tone(523.25, 90, Waveform::Triangle, 0.4),
        tone(659.25, 90, Waveform::Triangle, 0.4),
        tone(783.99, 90, Waveform::Triangle, 0.4),
        tone(1046.5, 240, Waveform::Triangle, 0.4),
    ];
    const SAVED: [Tone; 2] = [
        tone(880.0, 80, Waveform::Sine, 0.35),
        tone(1318.5, 160, Waveform::Sine, 0.35),
    ];

    match cue {
        Cue::Food => &FOOD,
        Cue::GameOver => &GAME_OVER,
        Cue::Victory => &VICTORY,
        Cue::Saved => &SAVED,
    }
}

/// Render tones back to back into mono samples in [-1, 1].
///
/// Non-finite or non-positive frequencies render as silence.
pub fn synthesize(tones: &[Tone], sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate.max(1) as f32;
    let fade_samples = (FADE_MS / 1000.0 * rate).max(1.0);
    let mut out = Vec::new();

    for t in tones {
        let n = (t.duration_ms as f32 / 1000.0 * rate) as usize;
        let audible = t.frequency_hz.is_finite() && t.frequency_hz > 0.0 && t.gain.is_finite();
        let gain = if audible { t.gain.clamp(0.0, 1.0) } else { 0.0 };

        for i in 0..n {
            if gain == 0.0 {
                out.push(0.0);
                continue;
            }
            let phase = t.frequency_hz * i as f32 / rate;
            let fade_in = (i as f32 / fade_samples).min(1.0);
            let fade_out = ((n - i) as f32 / fade_samples).min(1.0);
            let sample = t.waveform.sample(phase) * gain * fade_in * fade_out;
            out.push(sample.clamp(-1.0, 1.0));
        }
    }
    out
}

/// Somewhere to send rendered cues.
pub trait AudioSink: Send {
    fn play(&mut self, cue: Cue, samples: &[f32], sample_rate: u32) -> io::Result<()>;
}

/// Rings the terminal bell for cues that deserve attention.
///
/// Terminals can't play PCM, so short cues are dropped and longer ones map
/// to a single BEL.
pub struct TerminalBell<W: Write + Send> {
    out: W,
    min_samples: usize,
}

impl<W: Write + Send> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            // ~200ms at the default rate
            min_samples: (SAMPLE_RATE / 5) as usize,
        }
    }
}

impl<W: Write + Send> AudioSink for TerminalBell<W> {
    fn play(&mut self, _cue: Cue, samples: &[f32], _sample_rate: u32) -> io::Result<()> {
        if samples.len() < self.min_samples {
            return Ok(());
        }
        self.out.write_all(b"\x07")?;
        self.out.flush()
    }
}

type SinkFactory = Box<dyn FnOnce() -> io::Result<Box<dyn AudioSink>> + Send>;

/// Lazily-initialized audio output.
pub struct Audio {
    enabled: bool,
    factory: Option<SinkFactory>,
    sink: Option<Box<dyn AudioSink>>,
}

impl std::fmt::Debug for Audio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Audio")
            .field("enabled", &self.enabled)
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}

impl Audio {
    /// `factory` runs on the first [`unlock`](Self::unlock).
    pub fn new<F>(enabled: bool, factory: F) -> Self
    where
        F: FnOnce() -> io::Result<Box<dyn AudioSink>> + Send + 'static,
    {
        Self {
            enabled,
            factory: Some(Box::new(factory)),
            sink: None,
        }
    }

    /// Terminal bell on stdout.
    pub fn terminal(enabled: bool) -> Self {
        Self::new(enabled, || {
            Ok(Box::new(TerminalBell::new(io::stdout())) as Box<dyn AudioSink>)
        })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            factory: None,
            sink: None,
        }
    }

    /// Open the sink. Called on user input; later calls do nothing.
    pub fn unlock(&mut self) {
        if !self.enabled {
            return;
        }
        let Some(factory) = self.factory.take() else {
            return;
        };
        match factory() {
            Ok(sink) => {
                tracing::debug!("audio output ready");
                self.sink = Some(sink);
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio unavailable");
                self.enabled = false;
            }
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.sink.is_some()
    }

    /// Play a cue if output is available. Never fails.
    pub fn play(&mut self, cue: Cue) {
        if !self.enabled {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let samples = synthesize(cue_tones(cue), SAMPLE_RATE);
        if let Err(e) = sink.play(cue, &samples, SAMPLE_RATE) {
            tracing::warn!(error = %e, ?cue, "audio output failed; muting");
            self.sink = None;
            self.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Cue>>>);

    impl AudioSink for Recorder {
        fn play(&mut self, cue: Cue, samples: &[f32], _rate: u32) -> io::Result<()> {
            assert!(!samples.is_empty());
            self.0.lock().unwrap().push(cue);
            Ok(())
        }
    }

    struct Broken;

    impl AudioSink for Broken {
        fn play(&mut self, _: Cue, _: &[f32], _: u32) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_synthesize_length_and_range() {
        let tones = cue_tones(Cue::Victory);
        let total_ms: u32 = tones.iter().map(|t| t.duration_ms).sum();
        let samples = synthesize(tones, 10_000);
        let expected = (total_ms * 10) as usize;
        assert!(samples.len().abs_diff(expected) <= tones.len());
        assert!(samples.iter().all(|s| s.is_finite() && (-1.0..=1.0).contains(s)));
        assert!(samples.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn test_degenerate_tone_is_silent() {
        let tones = [
            tone(f32::NAN, 10, Waveform::Sine, 0.5),
            tone(-5.0, 10, Waveform::Square, 0.5),
        ];
        let samples = synthesize(&tones, 1_000);
        assert_eq!(samples.len(), 20);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_play_before_unlock_is_silent() {
        let recorder = Recorder::default();
        let log = Arc::clone(&recorder.0);
        let mut audio = Audio::new(true, move || Ok(Box::new(recorder) as Box<dyn AudioSink>));

        audio.play(Cue::Food);
        assert!(log.lock().unwrap().is_empty());

        audio.unlock();
        audio.unlock();
        audio.play(Cue::Food);
        audio.play(Cue::Saved);
        assert_eq!(*log.lock().unwrap(), vec![Cue::Food, Cue::Saved]);
    }

    #[test]
    fn test_failures_degrade_silently() {
        let mut audio = Audio::new(true, || Err(io::Error::new(io::ErrorKind::NotFound, "none")));
        audio.unlock();
        audio.play(Cue::GameOver);
        assert!(!audio.is_unlocked());

        let mut audio = Audio::new(true, || Ok(Box::new(Broken) as Box<dyn AudioSink>));
        audio.unlock();
        audio.play(Cue::GameOver);
        assert!(!audio.is_unlocked());
        audio.play(Cue::GameOver);
    }

    #[test]
    fn test_terminal_bell_skips_short_cues() {
        let mut bell = TerminalBell::new(Vec::new());
        let food = synthesize(cue_tones(Cue::Food), SAMPLE_RATE);
        let over = synthesize(cue_tones(Cue::GameOver), SAMPLE_RATE);
        bell.play(Cue::Food, &food, SAMPLE_RATE).unwrap();
        assert!(bell.out.is_empty());
        bell.play(Cue::GameOver, &over, SAMPLE_RATE).unwrap();
        assert_eq!(bell.out, b"\x07");
    }
}
