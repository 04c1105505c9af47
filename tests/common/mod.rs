//! Scripted decoder and output doubles for driving the audio thread deterministically.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use wavedeck::decode::{DecodeSource, Decoded, Decoders, StreamInfo};
use wavedeck::output::{AudioOutput, AudioSink};
use wavedeck::worker::WorkerSettings;
use wavedeck::{PlaybackError, Player, Track, VisualizationMode};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Shape of a synthetic track.
#[derive(Debug, Clone, Copy)]
pub struct TrackSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_frames: u64,
    /// Whether the length is reported in `StreamInfo`.
    pub known_length: bool,
    pub chunk_frames: u64,
    /// Fail the n-th read (0-based) with a decode error.
    pub fail_at_read: Option<usize>,
}

impl TrackSpec {
    pub fn new(sample_rate: u32, total_frames: u64, chunk_frames: u64) -> Self {
        TrackSpec {
            sample_rate,
            channels: 1,
            total_frames,
            known_length: true,
            chunk_frames,
            fail_at_read: None,
        }
    }

    /// 100 Hz mono, 400-frame (4 s) chunks, 60 s long.
    pub fn minute() -> Self {
        Self::new(100, 6000, 400)
    }

    /// Two short chunks.
    pub fn short() -> Self {
        Self::new(100, 800, 400)
    }

    pub fn stereo(mut self) -> Self {
        self.channels = 2;
        self
    }

    pub fn failing_at(mut self, read: usize) -> Self {
        self.fail_at_read = Some(read);
        self
    }
}

#[derive(Default)]
pub struct MockDecoders {
    tracks: Mutex<HashMap<PathBuf, TrackSpec>>,
    opened: Mutex<Vec<PathBuf>>,
    seeks: Arc<Mutex<Vec<u64>>>,
}

impl MockDecoders {
    pub fn with(self, path: &str, spec: TrackSpec) -> Self {
        lock(&self.tracks).insert(PathBuf::from(path), spec);
        self
    }

    /// Paths passed to `open`, in call order (including failures).
    pub fn opened(&self) -> Vec<PathBuf> {
        lock(&self.opened).clone()
    }

    /// Absolute frame targets passed to `seek`.
    pub fn seeks(&self) -> Vec<u64> {
        lock(&self.seeks).clone()
    }
}

impl Decoders for MockDecoders {
    fn open(&self, path: &Path) -> Result<Box<dyn DecodeSource>, PlaybackError> {
        lock(&self.opened).push(path.to_path_buf());
        let spec = lock(&self.tracks)
            .get(path)
            .copied()
            .ok_or_else(|| PlaybackError::open(path, "no such file"))?;
        Ok(Box::new(MockSource {
            spec,
            position: 0,
            reads: 0,
            seeks: Arc::clone(&self.seeks),
        }))
    }
}

struct MockSource {
    spec: TrackSpec,
    position: u64,
    reads: usize,
    seeks: Arc<Mutex<Vec<u64>>>,
}

impl DecodeSource for MockSource {
    fn info(&self) -> StreamInfo {
        StreamInfo {
            sample_rate: self.spec.sample_rate,
            channels: self.spec.channels,
            total_frames: self.spec.known_length.then_some(self.spec.total_frames),
        }
    }

    fn read_next(&mut self) -> Result<Decoded, PlaybackError> {
        let read = self.reads;
        self.reads += 1;
        if self.spec.fail_at_read == Some(read) {
            return Err(PlaybackError::Decode("corrupt frame".into()));
        }
        if self.position >= self.spec.total_frames {
            return Ok(Decoded::EndOfStream);
        }
        let frames = self.spec.chunk_frames.min(self.spec.total_frames - self.position);
        self.position += frames;
        let samples = (frames * self.spec.channels as u64) as usize;
        Ok(Decoded::Pcm(
            (0..samples).map(|i| ((i % 64) as i16 - 32) * 512).collect(),
        ))
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, frame: u64) -> Result<(), PlaybackError> {
        lock(&self.seeks).push(frame);
        self.position = frame.min(self.spec.total_frames);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Open { sample_rate: u32, channels: u16 },
    Write(usize),
    Stop,
    Start,
    Drain,
    Close,
}

type WriteHook = Box<dyn FnMut(usize) + Send>;

#[derive(Default)]
struct OutputShared {
    events: Mutex<Vec<SinkEvent>>,
    writes: Mutex<usize>,
    hook: Mutex<Option<WriteHook>>,
    fail_open_rate: Option<u32>,
    fail_write_at: Option<usize>,
}

impl OutputShared {
    fn record(&self, event: SinkEvent) {
        lock(&self.events).push(event);
    }
}

/// Output double that logs every call and runs a hook on each write.
#[derive(Default)]
pub struct MockOutput {
    shared: Arc<OutputShared>,
}

impl MockOutput {
    /// Refuse to open streams at this sample rate.
    pub fn failing_open_at_rate(rate: u32) -> Self {
        MockOutput {
            shared: Arc::new(OutputShared {
                fail_open_rate: Some(rate),
                ..OutputShared::default()
            }),
        }
    }

    /// Fail the n-th write (1-based, counted across all streams).
    pub fn failing_write(n: usize) -> Self {
        MockOutput {
            shared: Arc::new(OutputShared {
                fail_write_at: Some(n),
                ..OutputShared::default()
            }),
        }
    }

    /// Run `hook` on the audio thread with the 1-based write count, after each write.
    pub fn on_write(&self, hook: impl FnMut(usize) + Send + 'static) {
        *lock(&self.shared.hook) = Some(Box::new(hook));
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        lock(&self.shared.events).clone()
    }

    pub fn count(&self, event: &SinkEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

impl AudioOutput for MockOutput {
    fn open(&self, sample_rate: u32, channels: u16) -> Result<Box<dyn AudioSink>, PlaybackError> {
        if self.shared.fail_open_rate == Some(sample_rate) {
            return Err(PlaybackError::Output("device busy".into()));
        }
        self.shared.record(SinkEvent::Open {
            sample_rate,
            channels,
        });
        Ok(Box::new(MockSink {
            shared: Arc::clone(&self.shared),
            stopped: false,
        }))
    }
}

struct MockSink {
    shared: Arc<OutputShared>,
    stopped: bool,
}

impl AudioSink for MockSink {
    fn write(&mut self, samples: &[i16]) -> Result<(), PlaybackError> {
        let n = {
            let mut writes = lock(&self.shared.writes);
            *writes += 1;
            *writes
        };
        if self.shared.fail_write_at == Some(n) {
            return Err(PlaybackError::Output("underrun".into()));
        }
        self.shared.record(SinkEvent::Write(samples.len()));
        if let Some(hook) = lock(&self.shared.hook).as_mut() {
            hook(n);
        }
        Ok(())
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.shared.record(SinkEvent::Stop);
        }
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        self.stopped = false;
        self.shared.record(SinkEvent::Start);
        Ok(())
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn drain(&mut self) {
        self.shared.record(SinkEvent::Drain);
    }
}

impl Drop for MockSink {
    fn drop(&mut self) {
        self.shared.record(SinkEvent::Close);
    }
}

pub struct Rig {
    pub player: Player,
    pub decoders: Arc<MockDecoders>,
    pub output: Arc<MockOutput>,
}

pub fn rig(decoders: MockDecoders, output: MockOutput) -> Rig {
    rig_with(decoders, output, WorkerSettings::default(), VisualizationMode::Waveform)
}

pub fn rig_with(
    decoders: MockDecoders,
    output: MockOutput,
    settings: WorkerSettings,
    mode: VisualizationMode,
) -> Rig {
    let decoders = Arc::new(decoders);
    let output = Arc::new(output);
    let player = Player::spawn(
        Arc::clone(&decoders) as Arc<dyn Decoders>,
        Arc::clone(&output) as Arc<dyn AudioOutput>,
        settings,
        mode,
    )
    .expect("spawn audio thread");
    Rig {
        player,
        decoders,
        output,
    }
}

pub fn track(path: &str) -> Track {
    Track::new(path)
}

pub fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
}

/// Poll `cond` until it holds or five seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
