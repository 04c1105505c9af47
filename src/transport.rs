//! Transport flags shared by the UI thread and the audio thread.
//!
//! Ownership per field:
//! - `quit`: written by the UI, read by everyone; only ever goes false -> true.
//! - `stop_current`: set by the UI, reset by the queue consumer when a track is popped.
//! - `paused`: written by the UI, waited on by the worker.
//! - `seek_offset`: accumulated by the UI, drained to zero by the worker.
//! - `visualization`: written by the UI, read by the worker each chunk.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    Waveform,
    Spectrum,
}

impl VisualizationMode {
    pub fn next(self) -> Self {
        match self {
            VisualizationMode::Waveform => VisualizationMode::Spectrum,
            VisualizationMode::Spectrum => VisualizationMode::Waveform,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VisualizationMode::Waveform => "Waveform",
            VisualizationMode::Spectrum => "Spectrum",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            VisualizationMode::Waveform => "Wave",
            VisualizationMode::Spectrum => "Spec",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            VisualizationMode::Waveform => 0,
            VisualizationMode::Spectrum => 1,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => VisualizationMode::Spectrum,
            _ => VisualizationMode::Waveform,
        }
    }
}

pub struct TransportState {
    quit: AtomicBool,
    stop_current: AtomicBool,
    paused: Mutex<bool>,
    pause_cv: Condvar,
    seek_offset: AtomicI64,
    visualization: AtomicU8,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(VisualizationMode::default())
    }
}

impl TransportState {
    pub fn new(mode: VisualizationMode) -> Self {
        TransportState {
            quit: AtomicBool::new(false),
            stop_current: AtomicBool::new(false),
            paused: Mutex::new(false),
            pause_cv: Condvar::new(),
            seek_offset: AtomicI64::new(0),
            visualization: AtomicU8::new(mode.to_u8()),
        }
    }

    fn paused_lock(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Flags that end a pause wait are stored before taking the pause lock, so a waiter
    // either sees them in its predicate or is parked and receives the notification.
    fn wake_pause_waiters(&self) {
        let _g = self.paused_lock();
        self.pause_cv.notify_all();
    }

    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
        self.wake_pause_waiters();
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    /// Ask the in-flight track to stop. Also lifts a pause so the worker can reach Closing.
    pub fn request_stop(&self) {
        self.stop_current.store(true, Ordering::SeqCst);
        let mut paused = self.paused_lock();
        *paused = false;
        self.pause_cv.notify_all();
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_current.load(Ordering::SeqCst)
    }

    /// True when the worker must leave Streaming/Paused for Closing.
    pub fn should_stop(&self) -> bool {
        self.quit_requested() || self.stop_requested()
    }

    /// Called by the queue consumer when a new track begins.
    pub fn begin_track(&self) {
        self.stop_current.store(false, Ordering::SeqCst);
        self.seek_offset.store(0, Ordering::SeqCst);
    }

    pub fn set_paused(&self, paused: bool) {
        let mut g = self.paused_lock();
        *g = paused;
        self.pause_cv.notify_all();
    }

    /// Flip the pause flag and return the new value.
    pub fn toggle_paused(&self) -> bool {
        let mut g = self.paused_lock();
        *g = !*g;
        self.pause_cv.notify_all();
        *g
    }

    pub fn is_paused(&self) -> bool {
        *self.paused_lock()
    }

    /// Block while paused. Returns once the pause is lifted or a stop/quit is requested.
    pub fn wait_while_paused(&self) {
        let g = self.paused_lock();
        let _g = self
            .pause_cv
            .wait_while(g, |paused| *paused && !self.should_stop())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Add a relative seek. Deltas issued before the worker drains them are summed.
    pub fn seek(&self, delta_secs: i64) {
        self.seek_offset.fetch_add(delta_secs, Ordering::SeqCst);
    }

    /// Drain the accumulated seek delta, leaving zero behind.
    pub fn take_seek(&self) -> i64 {
        self.seek_offset.swap(0, Ordering::SeqCst)
    }

    pub fn visualization(&self) -> VisualizationMode {
        VisualizationMode::from_u8(self.visualization.load(Ordering::Relaxed))
    }

    pub fn set_visualization(&self, mode: VisualizationMode) {
        self.visualization.store(mode.to_u8(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn seek_deltas_accumulate_until_taken() {
        let t = TransportState::default();
        t.seek(-5);
        t.seek(-5);
        assert_eq!(t.take_seek(), -10);
        assert_eq!(t.take_seek(), 0);
    }

    #[test]
    fn quit_is_sticky() {
        let t = TransportState::default();
        t.request_quit();
        t.begin_track();
        assert!(t.quit_requested());
        assert!(t.should_stop());
    }

    #[test]
    fn begin_track_clears_stop_and_pending_seek() {
        let t = TransportState::default();
        t.request_stop();
        t.seek(30);
        t.begin_track();
        assert!(!t.stop_requested());
        assert_eq!(t.take_seek(), 0);
    }

    #[test]
    fn stop_lifts_pause() {
        let t = TransportState::default();
        t.set_paused(true);
        t.request_stop();
        assert!(!t.is_paused());
    }

    #[test]
    fn quit_wakes_pause_wait() {
        let t = Arc::new(TransportState::default());
        t.set_paused(true);
        let waiter = {
            let t = Arc::clone(&t);
            thread::spawn(move || t.wait_while_paused())
        };
        thread::sleep(Duration::from_millis(20));
        t.request_quit();
        waiter.join().unwrap();
        assert!(t.is_paused());
    }

    #[test]
    fn resume_wakes_pause_wait() {
        let t = Arc::new(TransportState::default());
        t.set_paused(true);
        let waiter = {
            let t = Arc::clone(&t);
            thread::spawn(move || t.wait_while_paused())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!t.toggle_paused());
        waiter.join().unwrap();
    }

    #[test]
    fn visualization_round_trips_through_atomic() {
        let t = TransportState::new(VisualizationMode::Spectrum);
        assert_eq!(t.visualization(), VisualizationMode::Spectrum);
        t.set_visualization(t.visualization().next());
        assert_eq!(t.visualization(), VisualizationMode::Waveform);
    }
}
