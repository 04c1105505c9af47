//! Audio thread (queue consumer) and the command surface the UI drives it with.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::decode::Decoders;
use crate::output::AudioOutput;
use crate::queue::RingQueue;
use crate::render::RenderChannel;
use crate::track::Track;
use crate::transport::{TransportState, VisualizationMode};
use crate::worker::{PlaybackWorker, WorkerSettings};

/// Discrete UI input events, each mapped to one queue/transport mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Enqueue(Track),
    EnqueueAll(Vec<Track>),
    /// Clear the queue, stop the current track and play this one next.
    ReplaceAndPlay(Track),
    Pause,
    Resume,
    TogglePause,
    /// Relative seek in seconds; rapid seeks accumulate.
    Seek(i64),
    SkipCurrent,
    StopAndClearQueue,
    SetVisualization(VisualizationMode),
    Quit,
}

/// Cloneable handle for issuing commands and reading shared state.
#[derive(Clone)]
pub struct Controls {
    queue: Arc<RingQueue<Track>>,
    transport: Arc<TransportState>,
    render: Arc<RenderChannel>,
    active: Arc<AtomicBool>,
}

impl Controls {
    pub fn send(&self, cmd: Command) {
        debug!("command: {cmd:?}");
        match cmd {
            Command::Enqueue(track) => {
                self.wake_if_idle();
                self.queue.push(track);
            }
            Command::EnqueueAll(tracks) => {
                self.wake_if_idle();
                self.queue.extend(tracks);
            }
            Command::ReplaceAndPlay(track) => {
                // Signalled under the queue lock: the stop hits whatever is playing now,
                // never the replacement.
                self.queue
                    .replace_with(track, || self.transport.request_stop());
            }
            Command::Pause => self.transport.set_paused(true),
            Command::Resume => self.transport.set_paused(false),
            Command::TogglePause => {
                self.transport.toggle_paused();
            }
            Command::Seek(delta) => self.transport.seek(delta),
            Command::SkipCurrent => self.transport.request_stop(),
            Command::StopAndClearQueue => {
                let dropped = self
                    .queue
                    .clear_with(|| self.transport.request_stop());
                debug!("cleared {dropped} queued tracks");
            }
            Command::SetVisualization(mode) => {
                // The snapshot is the worker's to write; the new mode shows up with its
                // next publish.
                self.transport.set_visualization(mode);
                self.render.touch();
            }
            Command::Quit => {
                self.transport.request_quit();
                self.queue.close();
            }
        }
    }

    /// A pause raised with nothing playing belongs to no track; drop it so new work starts.
    fn wake_if_idle(&self) {
        if !self.is_active() && self.transport.is_paused() {
            debug!("lifting pause set while idle");
            self.transport.set_paused(false);
        }
    }

    pub fn render(&self) -> &RenderChannel {
        &self.render
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    /// Pending tracks in play order (excluding the one playing).
    pub fn queued(&self) -> Vec<Track> {
        self.queue.snapshot()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// True while a worker invocation is in progress.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Owns the audio thread. Dropping the player quits and joins it.
pub struct Player {
    controls: Controls,
    audio_thread: Option<JoinHandle<()>>,
}

impl Player {
    pub fn spawn(
        decoders: Arc<dyn Decoders>,
        output: Arc<dyn AudioOutput>,
        settings: WorkerSettings,
        mode: VisualizationMode,
    ) -> io::Result<Self> {
        let controls = Controls {
            queue: Arc::new(RingQueue::new()),
            transport: Arc::new(TransportState::new(mode)),
            render: Arc::new(RenderChannel::new(mode)),
            active: Arc::new(AtomicBool::new(false)),
        };
        let worker = PlaybackWorker::new(
            decoders,
            output,
            Arc::clone(&controls.transport),
            Arc::clone(&controls.render),
            settings,
        );
        let consumer = QueueConsumer {
            queue: Arc::clone(&controls.queue),
            transport: Arc::clone(&controls.transport),
            active: Arc::clone(&controls.active),
            worker,
        };
        let audio_thread = thread::Builder::new()
            .name("audio".into())
            .spawn(move || consumer.run())?;
        Ok(Player {
            controls,
            audio_thread: Some(audio_thread),
        })
    }

    pub fn controls(&self) -> Controls {
        self.controls.clone()
    }

    pub fn send(&self, cmd: Command) {
        self.controls.send(cmd);
    }

    pub fn render(&self) -> &RenderChannel {
        self.controls.render()
    }

    /// Quit and wait for the audio thread to reach Closing and exit.
    pub fn shutdown(mut self) -> thread::Result<()> {
        self.join()
    }

    fn join(&mut self) -> thread::Result<()> {
        self.controls.send(Command::Quit);
        match self.audio_thread.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if self.join().is_err() {
            warn!("audio thread panicked");
        }
    }
}

/// Marks a worker invocation as in progress for as long as it lives.
struct ActiveTrack<'a>(&'a AtomicBool);

impl<'a> ActiveTrack<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        ActiveTrack(flag)
    }
}

impl Drop for ActiveTrack<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct QueueConsumer {
    queue: Arc<RingQueue<Track>>,
    transport: Arc<TransportState>,
    active: Arc<AtomicBool>,
    worker: PlaybackWorker,
}

impl QueueConsumer {
    fn run(self) {
        while let Some(track) = self
            .queue
            .pop_blocking_with(|_| self.transport.begin_track())
        {
            let _active = ActiveTrack::enter(&self.active);
            info!("playing {track}");
            match self.worker.play(&track) {
                Ok(outcome) => info!("{track}: {outcome:?}"),
                Err(e) => warn!("skipping {track}: {e}"),
            }
            if self.transport.quit_requested() {
                break;
            }
        }
        debug!("audio thread exiting");
    }
}
