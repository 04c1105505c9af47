//! Output device contract and the rodio-backed implementation.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::time::Duration;

use rodio::{mixer::Mixer, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::error::{OutputInitError, PlaybackError};

/// An opened output stream for one track. Dropping it closes the stream.
pub trait AudioSink: Send {
    /// Queue interleaved frames, blocking until the device accepts them.
    fn write(&mut self, samples: &[i16]) -> Result<(), PlaybackError>;

    /// Halt output without discarding the stream. Idempotent.
    fn stop(&mut self);

    /// Resume after [`stop`](Self::stop).
    fn start(&mut self) -> Result<(), PlaybackError>;

    fn is_stopped(&self) -> bool;

    /// Block until everything written so far has been played. Called on end of stream.
    fn drain(&mut self) {}
}

/// Opens per-track sinks at the track's native rate.
pub trait AudioOutput: Send + Sync {
    fn open(&self, sample_rate: u32, channels: u16) -> Result<Box<dyn AudioSink>, PlaybackError>;
}

/// Chunks buffered between the worker and the device before `write` blocks.
const QUEUED_CHUNKS: usize = 2;

/// Process-wide handle to the default output device.
///
/// Opened once at start-up; must outlive every sink created from it.
pub struct AudioDevice {
    stream: OutputStream,
}

impl AudioDevice {
    pub fn open_default() -> Result<Self, OutputInitError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // The terminal belongs to the UI; keep rodio quiet on drop.
        stream.log_on_drop(false);
        Ok(AudioDevice { stream })
    }

    /// A cloneable, thread-safe opener for per-track sinks.
    pub fn output(&self) -> RodioOutput {
        RodioOutput {
            mixer: self.stream.mixer().clone(),
        }
    }
}

#[derive(Clone)]
pub struct RodioOutput {
    mixer: Mixer,
}

impl AudioOutput for RodioOutput {
    fn open(&self, sample_rate: u32, channels: u16) -> Result<Box<dyn AudioSink>, PlaybackError> {
        if sample_rate == 0 || channels == 0 {
            return Err(PlaybackError::Output(format!(
                "unsupported format: {sample_rate} Hz, {channels} channels"
            )));
        }
        let (tx, rx) = mpsc::sync_channel(QUEUED_CHUNKS);
        let sink = Sink::connect_new(&self.mixer);
        sink.append(ChannelSource::new(rx, channels, sample_rate));
        Ok(Box::new(RodioSink {
            tx: Some(tx),
            sink,
            stopped: false,
        }))
    }
}

pub struct RodioSink {
    tx: Option<SyncSender<Vec<f32>>>,
    sink: Sink,
    stopped: bool,
}

impl AudioSink for RodioSink {
    fn write(&mut self, samples: &[i16]) -> Result<(), PlaybackError> {
        let chunk: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| PlaybackError::Output("stream closed".into()))?;
        tx.send(chunk)
            .map_err(|_| PlaybackError::Output("output stream disconnected".into()))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.sink.pause();
            self.stopped = true;
        }
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        if self.stopped {
            self.sink.play();
            self.stopped = false;
        }
        Ok(())
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn drain(&mut self) {
        if self.stopped {
            return;
        }
        // The source ends once the buffered chunks run out after the sender is gone.
        self.tx.take();
        self.sink.sleep_until_end();
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        // Disconnect first so the source ends, then release the sink.
        self.tx.take();
        self.sink.stop();
    }
}

/// Source fed by the worker through a bounded channel.
///
/// Plays silence on underrun and ends once the sender is dropped.
struct ChannelSource {
    rx: Receiver<Vec<f32>>,
    current: Vec<f32>,
    pos: usize,
    channels: u16,
    sample_rate: u32,
}

impl ChannelSource {
    fn new(rx: Receiver<Vec<f32>>, channels: u16, sample_rate: u32) -> Self {
        ChannelSource {
            rx,
            current: Vec::new(),
            pos: 0,
            channels,
            sample_rate,
        }
    }
}

impl Iterator for ChannelSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        while self.pos >= self.current.len() {
            match self.rx.try_recv() {
                Ok(chunk) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                Err(TryRecvError::Empty) => return Some(0.0),
                Err(TryRecvError::Disconnected) => return None,
            }
        }
        let sample = self.current[self.pos];
        self.pos += 1;
        Some(sample)
    }
}

impl Source for ChannelSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
