//! Per-track control loop: decode -> output -> feature extraction -> publish.
//!
//! Opening -> Streaming <-> Paused -> Closing. Every exit path goes through Closing, which
//! releases the session (transform buffers, output stream, decoder, in that order) and then
//! publishes an idle snapshot.

use std::sync::Arc;

use log::{debug, warn};

use crate::decode::{DecodeSource, Decoded, Decoders, StreamInfo};
use crate::error::PlaybackError;
use crate::features::FeatureExtractor;
use crate::output::{AudioOutput, AudioSink};
use crate::render::{RenderChannel, RenderState};
use crate::track::Track;
use crate::transport::TransportState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Length of the published mono buffer.
    pub waveform_width: usize,
    /// Transform size `N`; the spectrum has `N/2` bins.
    pub spectrum_window: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        WorkerSettings {
            waveform_width: 1024,
            spectrum_window: 1024,
        }
    }
}

/// How a track that opened successfully came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    EndOfStream,
    StopRequested,
    QuitRequested,
}

// Fields drop in declaration order: the reverse of how they are acquired in `open`.
struct Session {
    features: FeatureExtractor,
    sink: Box<dyn AudioSink>,
    decoder: Box<dyn DecodeSource>,
    info: StreamInfo,
}

pub struct PlaybackWorker {
    decoders: Arc<dyn Decoders>,
    output: Arc<dyn AudioOutput>,
    transport: Arc<TransportState>,
    render: Arc<RenderChannel>,
    settings: WorkerSettings,
}

impl PlaybackWorker {
    pub fn new(
        decoders: Arc<dyn Decoders>,
        output: Arc<dyn AudioOutput>,
        transport: Arc<TransportState>,
        render: Arc<RenderChannel>,
        settings: WorkerSettings,
    ) -> Self {
        PlaybackWorker {
            decoders,
            output,
            transport,
            render,
            settings,
        }
    }

    /// Play one track to completion or interruption.
    ///
    /// An `Err` means the track failed (open, decode, output or allocation); the caller
    /// moves on to the next track either way.
    pub fn play(&self, track: &Track) -> Result<TrackOutcome, PlaybackError> {
        let mut session = self.open(track)?;
        let result = self.stream(track, &mut session);
        drop(session);
        self.render
            .publish(RenderState::idle(self.transport.visualization()));
        result
    }

    fn open(&self, track: &Track) -> Result<Session, PlaybackError> {
        let decoder = self.decoders.open(track.path())?;
        let info = decoder.info();
        let sink = self
            .output
            .open(info.sample_rate, info.channels)
            .map_err(|e| match e {
                PlaybackError::Output(reason) => PlaybackError::open(track.path(), reason),
                other => other,
            })?;
        let features =
            FeatureExtractor::new(self.settings.waveform_width, self.settings.spectrum_window)?;
        Ok(Session {
            features,
            sink,
            decoder,
            info,
        })
    }

    fn stop_outcome(&self) -> Option<TrackOutcome> {
        if self.transport.quit_requested() {
            Some(TrackOutcome::QuitRequested)
        } else if self.transport.stop_requested() {
            Some(TrackOutcome::StopRequested)
        } else {
            None
        }
    }

    fn stream(&self, track: &Track, s: &mut Session) -> Result<TrackOutcome, PlaybackError> {
        let channels = s.info.channels as usize;
        let mut snapshot = RenderState {
            track: Some(track.clone()),
            elapsed_secs: 0.0,
            total_secs: s.info.duration_secs(),
            paused: false,
            mode: self.transport.visualization(),
            mono: vec![0; s.features.width()],
            magnitudes: Vec::new(),
        };
        self.render.publish(snapshot.clone());

        loop {
            if let Some(outcome) = self.stop_outcome() {
                return Ok(outcome);
            }

            if self.transport.is_paused() {
                self.pause(s, &mut snapshot)?;
                continue;
            }

            let delta = self.transport.take_seek();
            if delta != 0 {
                self.seek(s, delta, &mut snapshot);
            }

            let pcm = match s.decoder.read_next()? {
                Decoded::EndOfStream => {
                    s.sink.drain();
                    return Ok(TrackOutcome::EndOfStream);
                }
                Decoded::Pcm(pcm) if pcm.is_empty() => continue,
                Decoded::Pcm(pcm) => pcm,
            };

            s.sink.write(&pcm)?;

            let mode = self.transport.visualization();
            let features = s.features.extract(mode, &pcm, channels);
            snapshot.elapsed_secs = s.info.frames_to_secs(s.decoder.position());
            snapshot.clamp_elapsed();
            snapshot.mode = mode;
            snapshot.paused = false;
            snapshot.mono = features.mono;
            snapshot.magnitudes = features.magnitudes;
            self.render.publish(snapshot.clone());
        }
    }

    fn pause(&self, s: &mut Session, snapshot: &mut RenderState) -> Result<(), PlaybackError> {
        s.sink.stop();
        snapshot.paused = true;
        self.render.publish(snapshot.clone());
        debug!("paused at {:.1}s", snapshot.elapsed_secs);

        self.transport.wait_while_paused();
        if self.transport.should_stop() {
            return Ok(());
        }

        if s.sink.is_stopped() {
            s.sink.start()?;
        }
        snapshot.paused = false;
        self.render.publish(snapshot.clone());
        debug!("resumed at {:.1}s", snapshot.elapsed_secs);
        Ok(())
    }

    fn seek(&self, s: &mut Session, delta_secs: i64, snapshot: &mut RenderState) {
        let from = s.decoder.position();
        let target = seek_target(from, delta_secs, s.info.sample_rate, s.info.total_frames);
        debug!("seek {delta_secs:+}s: frame {from} -> {target}");
        if let Err(e) = s.decoder.seek(target) {
            warn!("{e}");
        }
        snapshot.elapsed_secs = s.info.frames_to_secs(s.decoder.position());
        snapshot.clamp_elapsed();
        self.render.publish(snapshot.clone());
    }
}

/// Absolute frame for a relative seek of `delta_secs` from `current`, clamped to
/// `[0, total]` (no upper bound when the total is unknown).
pub fn seek_target(current: u64, delta_secs: i64, sample_rate: u32, total: Option<u64>) -> u64 {
    let target = current as i128 + delta_secs as i128 * sample_rate as i128;
    let target = target.max(0);
    let target = match total {
        Some(total) => target.min(total as i128),
        None => target,
    };
    u64::try_from(target).unwrap_or(u64::MAX)
}
