use fundsp::prelude64::*;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source, StreamError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sound {
    Jump,
    Point,
    Collision,
    Start,
}

/// Fire-and-forget audio port. Every trigger restarts its sound from the
/// beginning; the music loop is restarted by `music_start` and paused and
/// rewound by `music_stop`.
pub trait AudioOutput {
    fn play(&mut self, sound: Sound);
    fn music_start(&mut self);
    fn music_stop(&mut self);
}

/// Used when no output device is available. Audio failures never affect
/// game state, so the game runs silent instead of erroring out.
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn play(&mut self, _sound: Sound) {}
    fn music_start(&mut self) {}
    fn music_stop(&mut self) {}
}

// ── Synthesis ───────────────────────────────────────────────────────────────
//
// All sounds are fundsp graphs rendered once into sample buffers at startup,
// then replayed through rodio sinks. No asset files.

const SAMPLE_RATE: u32 = 44100;

fn render(mut unit: impl AudioUnit, seconds: f64) -> Vec<f32> {
    let wave = Wave::render(SAMPLE_RATE as f64, seconds, &mut unit);
    (0..wave.len()).map(|i| wave.at(0, i)).collect()
}

fn synth_jump() -> Vec<f32> {
    // Quick upward chirp.
    let freq = lfo(|t: f64| lerp(300.0, 620.0, (t / 0.12).min(1.0)));
    let gain = lfo(|t: f64| (0.12 * (1.0 - t / 0.16)).max(0.0));
    render((freq >> square()) * gain, 0.16)
}

fn synth_point() -> Vec<f32> {
    // Two-note ding.
    let freq = lfo(|t: f64| if t < 0.09 { 987.77 } else { 1318.51 });
    let gain = lfo(|t: f64| (0.15 * (1.0 - t / 0.25)).max(0.0));
    render((freq >> sine()) * gain, 0.25)
}

fn synth_collision() -> Vec<f32> {
    // Falling saw, 400Hz down to 80Hz.
    let freq = lfo(|t: f64| lerp(400.0, 80.0, (t / 0.4).min(1.0)));
    let gain = lfo(|t: f64| lerp(0.15, 0.0, (t / 0.5).min(1.0)));
    render((freq >> saw()) * gain, 0.5)
}

fn synth_start() -> Vec<f32> {
    let freq = lfo(|t: f64| lerp(220.0, 440.0, (t / 0.25).min(1.0)));
    let gain = lfo(|t: f64| (0.15 * (t * 20.0).min(1.0) * (1.0 - t / 0.35)).max(0.0));
    render((freq >> triangle()) * gain, 0.35)
}

fn synth_music() -> Vec<f32> {
    // Eight-step pentatonic loop with a plucked envelope per step.
    const STEP: f64 = 0.35;
    const NOTES: [f64; 8] = [392.0, 440.0, 523.25, 587.33, 523.25, 440.0, 392.0, 329.63];
    let freq = lfo(|t: f64| NOTES[((t / STEP) as usize) % NOTES.len()]);
    let gain = lfo(|t: f64| {
        let phase = (t / STEP).fract();
        0.08 * (1.0 - phase)
    });
    render((freq >> triangle()) * gain, STEP * NOTES.len() as f64)
}

// ── Engine ──────────────────────────────────────────────────────────────────

pub struct AudioEngine {
    stream: OutputStream,
    jump: Vec<f32>,
    point: Vec<f32>,
    collision: Vec<f32>,
    start: Vec<f32>,
    music: Vec<f32>,
    music_sink: Option<Sink>,
}

impl AudioEngine {
    pub fn new() -> Result<Self, StreamError> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        Ok(Self {
            stream,
            jump: synth_jump(),
            point: synth_point(),
            collision: synth_collision(),
            start: synth_start(),
            music: synth_music(),
            music_sink: None,
        })
    }

    fn one_shot(&self, data: &[f32]) {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, data.to_vec()));
        sink.detach();
    }
}

impl AudioOutput for AudioEngine {
    fn play(&mut self, sound: Sound) {
        match sound {
            Sound::Jump => self.one_shot(&self.jump),
            Sound::Point => self.one_shot(&self.point),
            Sound::Collision => self.one_shot(&self.collision),
            Sound::Start => self.one_shot(&self.start),
        }
    }

    fn music_start(&mut self) {
        self.music_sink = None;
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, self.music.clone()).repeat_infinite());
        self.music_sink = Some(sink);
    }

    fn music_stop(&mut self) {
        // Dropping the sink stops playback; the next start begins from the top.
        self.music_sink = None;
    }
}
