//! Waveform decimation and magnitude spectrum for the visualizer.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::PlaybackError;
use crate::transport::VisualizationMode;

/// Visual data derived from one PCM chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub mono: Vec<i16>,
    /// Empty in waveform mode.
    pub magnitudes: Vec<f32>,
}

/// Per-track transform plan and buffers. Dropped with the decode session.
pub struct FeatureExtractor {
    width: usize,
    window: usize,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

fn zeroed<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>, PlaybackError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| PlaybackError::ResourceExhaustion { what })?;
    v.resize(len, value);
    Ok(v)
}

impl FeatureExtractor {
    /// `width` is the waveform length, `window` the transform size `N` (even, > 0).
    pub fn new(width: usize, window: usize) -> Result<Self, PlaybackError> {
        let window = window.max(2);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(window);
        let buffer = zeroed(window, Complex::new(0.0, 0.0), "spectrum buffer")?;
        let scratch = zeroed(
            fft.get_inplace_scratch_len(),
            Complex::new(0.0, 0.0),
            "spectrum scratch",
        )?;
        Ok(FeatureExtractor {
            width: width.max(1),
            window,
            fft,
            buffer,
            scratch,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of magnitude bins produced in spectrum mode (`N/2`).
    pub fn bins(&self) -> usize {
        self.window / 2
    }

    pub fn extract(&mut self, mode: VisualizationMode, chunk: &[i16], channels: usize) -> Features {
        let mono = waveform(chunk, channels, self.width);
        let magnitudes = match mode {
            VisualizationMode::Waveform => Vec::new(),
            VisualizationMode::Spectrum => self.spectrum(chunk, channels),
        };
        Features { mono, magnitudes }
    }

    /// Magnitudes of bins `0..N/2` over the first `N` frames of the first channel.
    ///
    /// Rectangular window; shorter chunks are zero-padded.
    pub fn spectrum(&mut self, chunk: &[i16], channels: usize) -> Vec<f32> {
        let channels = channels.max(1);
        let mut frames = chunk.chunks_exact(channels).map(|f| f[0]);
        for slot in self.buffer.iter_mut() {
            let s = frames.next().map(|s| s as f32 / 32768.0).unwrap_or(0.0);
            *slot = Complex::new(s, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        self.buffer[..self.window / 2]
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect()
    }
}

/// Nearest-neighbour decimation of the first channel to `width` columns.
///
/// Column `i` takes frame `round(i / (width - 1) * (frames - 1))`. An empty chunk yields
/// `width` zeros.
pub fn waveform(chunk: &[i16], channels: usize, width: usize) -> Vec<i16> {
    let channels = channels.max(1);
    let frames = chunk.len() / channels;
    let mut out = vec![0i16; width];
    if frames == 0 {
        return out;
    }
    let span = width.saturating_sub(1).max(1) as f64;
    let last = (frames - 1) as f64;
    for (i, slot) in out.iter_mut().enumerate() {
        let idx = ((i as f64 / span) * last).round() as usize;
        *slot = chunk[idx.min(frames - 1) * channels];
    }
    out
}
