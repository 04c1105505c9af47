//! Published playback snapshot: written by the worker, copied out by the UI.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::track::Track;
use crate::transport::VisualizationMode;

/// Everything the UI needs to draw the info and visualizer panes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    /// `None` while idle.
    pub track: Option<Track>,
    pub elapsed_secs: f64,
    /// 0 when the duration is unknown.
    pub total_secs: f64,
    pub paused: bool,
    pub mode: VisualizationMode,
    /// Downsampled first-channel samples, always full length while a track plays.
    pub mono: Vec<i16>,
    /// Spectrum magnitudes; empty unless `mode` is `Spectrum`.
    pub magnitudes: Vec<f32>,
}

impl RenderState {
    /// Idle state published when a track closes.
    pub fn idle(mode: VisualizationMode) -> Self {
        RenderState {
            mode,
            ..RenderState::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.track.is_none()
    }

    /// Clamp `elapsed_secs` into `[0, total_secs]` when the total is known.
    pub fn clamp_elapsed(&mut self) {
        let upper = if self.total_secs > 0.0 {
            self.total_secs
        } else {
            f64::INFINITY
        };
        self.elapsed_secs = self.elapsed_secs.clamp(0.0, upper);
    }

    /// Fraction of the track played, 0 when the total is unknown.
    pub fn progress(&self) -> f64 {
        if self.total_secs > 0.0 {
            (self.elapsed_secs / self.total_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Outcome of [`RenderChannel::wait_for_update`].
#[derive(Debug)]
pub enum Refresh {
    /// A new snapshot was published since the last read.
    Updated(RenderState),
    /// Nothing changed before the timeout; carries the last snapshot.
    Unchanged(RenderState),
}

impl Refresh {
    pub fn state(&self) -> &RenderState {
        match self {
            Refresh::Updated(s) | Refresh::Unchanged(s) => s,
        }
    }

    pub fn into_state(self) -> RenderState {
        match self {
            Refresh::Updated(s) | Refresh::Unchanged(s) => s,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Refresh::Updated(_))
    }
}

struct Slot {
    state: RenderState,
    dirty: bool,
}

/// Single-writer snapshot cell with a dirty flag.
///
/// The state and its dirty flag live under one lock, so a reader that observes `dirty`
/// always copies the complete record that set it.
pub struct RenderChannel {
    slot: Mutex<Slot>,
    cv: Condvar,
}

impl Default for RenderChannel {
    fn default() -> Self {
        Self::new(VisualizationMode::default())
    }
}

impl RenderChannel {
    pub fn new(mode: VisualizationMode) -> Self {
        RenderChannel {
            slot: Mutex::new(Slot {
                state: RenderState::idle(mode),
                dirty: false,
            }),
            cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole snapshot and mark it dirty.
    pub fn publish(&self, state: RenderState) {
        let mut g = self.lock();
        g.state = state;
        g.dirty = true;
        drop(g);
        self.cv.notify_all();
    }

    /// Mark the current snapshot dirty without changing it (e.g. the UI changed a setting
    /// that affects how it is drawn).
    pub fn touch(&self) {
        self.lock().dirty = true;
        self.cv.notify_all();
    }

    /// Copy of the current snapshot; does not clear `dirty`.
    pub fn snapshot(&self) -> RenderState {
        self.lock().state.clone()
    }

    /// Copy the snapshot and clear `dirty` if it is set.
    pub fn take_if_dirty(&self) -> Option<RenderState> {
        let mut g = self.lock();
        if g.dirty {
            g.dirty = false;
            Some(g.state.clone())
        } else {
            None
        }
    }

    /// Block until a snapshot is published or `timeout` elapses.
    pub fn wait_for_update(&self, timeout: Duration) -> Refresh {
        let g = self.lock();
        let (mut g, _) = self
            .cv
            .wait_timeout_while(g, timeout, |slot| !slot.dirty)
            .unwrap_or_else(PoisonError::into_inner);
        if g.dirty {
            g.dirty = false;
            Refresh::Updated(g.state.clone())
        } else {
            Refresh::Unchanged(g.state.clone())
        }
    }
}
