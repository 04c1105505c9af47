//! Decoder contract and the symphonia-backed implementation.

use std::fs::File;
use std::path::Path;

use log::debug;
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::{FormatOptions, FormatReader, SeekMode, SeekTo},
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
    units::{Time, TimeBase},
};

use crate::error::PlaybackError;

/// Native stream parameters reported when a track is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u16,
    /// Total length in frames, `None` when the container does not say.
    pub total_frames: Option<u64>,
}

impl StreamInfo {
    /// Duration in seconds, 0 when unknown.
    pub fn duration_secs(&self) -> f64 {
        match self.total_frames {
            Some(frames) if self.sample_rate > 0 => frames as f64 / self.sample_rate as f64,
            _ => 0.0,
        }
    }

    pub fn frames_to_secs(&self, frames: u64) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            frames as f64 / self.sample_rate as f64
        }
    }
}

/// Result of one successful read.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Interleaved 16-bit PCM. May be empty (nothing usable in this packet).
    Pcm(Vec<i16>),
    EndOfStream,
}

/// An opened track. Dropping it releases the decoder.
pub trait DecodeSource: Send {
    fn info(&self) -> StreamInfo;

    fn read_next(&mut self) -> Result<Decoded, PlaybackError>;

    /// Current position in frames, i.e. the end of the last decoded chunk.
    fn position(&self) -> u64;

    /// Move to an absolute frame position.
    fn seek(&mut self, frame: u64) -> Result<(), PlaybackError>;
}

/// Opens tracks for the worker.
pub trait Decoders: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn DecodeSource>, PlaybackError>;
}

/// Decoders backed by symphonia's default codec and format registries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoders;

impl Decoders for SymphoniaDecoders {
    fn open(&self, path: &Path) -> Result<Box<dyn DecodeSource>, PlaybackError> {
        Ok(Box::new(SymphoniaSource::open(path)?))
    }
}

pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    time_base: Option<TimeBase>,
    info: StreamInfo,
    sample_buf: Option<SampleBuffer<i16>>,
    position: u64,
    exhausted: bool,
}

impl SymphoniaSource {
    pub fn open(path: &Path) -> Result<Self, PlaybackError> {
        let file = File::open(path).map_err(|e| PlaybackError::open(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| PlaybackError::open(path, e))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlaybackError::open(path, "no supported audio track"))?;

        let params = &track.codec_params;
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| PlaybackError::open(path, "unknown sample rate"))?;
        let channels = params
            .channels
            .map(|c| c.count() as u16)
            .filter(|&c| c > 0)
            .ok_or_else(|| PlaybackError::open(path, "unknown channel layout"))?;
        let time_base = params.time_base;
        let total_frames = match (params.n_frames, time_base) {
            (Some(n), Some(tb)) => Some(time_to_frames(tb.calc_time(n), sample_rate)),
            (Some(n), None) => Some(n),
            _ => None,
        };
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::open(path, e))?;

        let info = StreamInfo {
            sample_rate,
            channels,
            total_frames,
        };
        debug!("opened {} ({info:?})", path.display());

        Ok(SymphoniaSource {
            format,
            decoder,
            track_id,
            time_base,
            info,
            sample_buf: None,
            position: 0,
            exhausted: false,
        })
    }

    fn ts_to_frames(&self, ts: u64) -> u64 {
        match self.time_base {
            Some(tb) => time_to_frames(tb.calc_time(ts), self.info.sample_rate),
            None => ts,
        }
    }
}

fn time_to_frames(time: Time, rate: u32) -> u64 {
    ((time.seconds as f64 + time.frac) * rate as f64).round() as u64
}

fn frames_to_time(frames: u64, rate: u32) -> Time {
    let rate = rate.max(1) as u64;
    Time::new(frames / rate, (frames % rate) as f64 / rate as f64)
}

impl DecodeSource for SymphoniaSource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn read_next(&mut self) -> Result<Decoded, PlaybackError> {
        if self.exhausted {
            return Ok(Decoded::EndOfStream);
        }
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.exhausted = true;
                    return Ok(Decoded::EndOfStream);
                }
                Err(e) => return Err(PlaybackError::Decode(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let end = self.ts_to_frames(packet.ts() + packet.dur());

            match self.decoder.decode(&packet) {
                Ok(audio_buf) => {
                    let spec = *audio_buf.spec();
                    let frames = audio_buf.capacity();
                    let samples = frames * spec.channels.count();
                    if self
                        .sample_buf
                        .as_ref()
                        .is_none_or(|buf| buf.capacity() < samples)
                    {
                        self.sample_buf = Some(SampleBuffer::<i16>::new(frames as u64, spec));
                    }
                    self.position = end;
                    let pcm = match &mut self.sample_buf {
                        Some(buf) => {
                            buf.copy_interleaved_ref(audio_buf);
                            buf.samples().to_vec()
                        }
                        None => Vec::new(),
                    };
                    return Ok(Decoded::Pcm(pcm));
                }
                // A malformed packet is skipped, the stream goes on.
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("skipping undecodable packet: {e}");
                    self.position = end;
                    return Ok(Decoded::Pcm(Vec::new()));
                }
                Err(e) => return Err(PlaybackError::Decode(e.to_string())),
            }
        }
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, frame: u64) -> Result<(), PlaybackError> {
        if let Some(total) = self.info.total_frames {
            if frame >= total {
                self.position = total;
                self.exhausted = true;
                return Ok(());
            }
        }
        let to = SeekTo::Time {
            time: frames_to_time(frame, self.info.sample_rate),
            track_id: Some(self.track_id),
        };
        match self.format.seek(SeekMode::Accurate, to) {
            Ok(seeked) => {
                self.decoder.reset();
                self.position = self.ts_to_frames(seeked.actual_ts);
                self.exhausted = false;
                Ok(())
            }
            Err(SymphoniaError::SeekError(_)) if self.info.total_frames.is_none() => {
                // Past the end of a stream of unknown length.
                self.exhausted = true;
                Ok(())
            }
            Err(e) => Err(PlaybackError::Decode(format!("seek failed: {e}"))),
        }
    }
}
