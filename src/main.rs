mod controls;
mod file_browser;
mod gauge;
mod now_playing;
mod progress;
mod theme;
mod visualizer;

use std::{
    env,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::{info, warn};
use ratatui::{
    layout::{Constraint, Layout},
    DefaultTerminal, Frame,
};

use wavedeck::config::Config;
use wavedeck::decode::SymphoniaDecoders;
use wavedeck::output::AudioDevice;
use wavedeck::{logging, Command, Controls, Player, Refresh, RenderState, Track, VisualizationMode};

use crate::controls::{draw_status_bar, playback_state, status_height, Status};
use crate::file_browser::{FileBrowser, Selection};
use crate::theme::{next_theme, theme_index, THEMES};

struct App {
    browser: FileBrowser,
    controls: Controls,
    theme: usize,
    seek_step: i64,
    snapshot: RenderState,
}

impl App {
    /// Apply one key press. Returns true when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => {
                self.controls.send(Command::Quit);
                return true;
            }
            KeyCode::Up => self.browser.up(),
            KeyCode::Down => self.browser.down(),
            KeyCode::Enter => {
                if let Selection::Play(track) = self.browser.enter() {
                    self.controls.send(Command::ReplaceAndPlay(track));
                }
            }
            KeyCode::Backspace => self.browser.parent(),
            KeyCode::Char('a') => {
                let tracks = self.browser.audio_tracks();
                if !tracks.is_empty() {
                    self.controls.send(Command::EnqueueAll(tracks));
                }
            }
            KeyCode::Char('s') => self.controls.send(Command::SkipCurrent),
            KeyCode::Char('x') => self.controls.send(Command::StopAndClearQueue),
            KeyCode::Char('p') | KeyCode::Char(' ') => self.controls.send(Command::TogglePause),
            KeyCode::Char('1') => self
                .controls
                .send(Command::SetVisualization(VisualizationMode::Waveform)),
            KeyCode::Char('2') => self
                .controls
                .send(Command::SetVisualization(VisualizationMode::Spectrum)),
            KeyCode::Char('v') => {
                let mode = self.controls.transport().visualization().next();
                self.controls.send(Command::SetVisualization(mode));
            }
            KeyCode::Left => self.controls.send(Command::Seek(-self.seek_step)),
            KeyCode::Right => self.controls.send(Command::Seek(self.seek_step)),
            KeyCode::Char('t') => self.theme = next_theme(self.theme),
            _ => {}
        }
        false
    }

    fn draw(&mut self, frame: &mut Frame) {
        let theme = &THEMES[self.theme];
        let status = Status {
            dir: self.browser.dir(),
            queue_len: self.controls.queue_len(),
            mode: self.controls.transport().visualization(),
            state: playback_state(self.controls.is_active(), self.controls.transport().is_paused()),
        };
        let [main, bar] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(status_height(frame.area().width, &status, theme)),
        ])
        .areas(frame.area());
        draw_status_bar(frame, bar, &status, theme);

        let [nav, right] =
            Layout::horizontal([Constraint::Percentage(35), Constraint::Min(0)]).areas(main);
        let [info, progress, vis] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(right);

        let up_next = self.controls.queued().into_iter().next();
        now_playing::draw_now_playing(frame, info, &self.snapshot, up_next.as_ref(), theme);
        progress::draw_progress(frame, progress, &self.snapshot, theme);
        visualizer::draw_visualizer(frame, vis, &self.snapshot, theme);
        self.browser.draw(frame, nav, theme);
    }
}

fn main() -> Result<()> {
    let config = Config::load().context("loading configuration")?;
    if let Some(path) = logging::init(&config) {
        info!("logging to {}", path.display());
    }

    // A directory argument opens the browser there; a file starts playing right away.
    let (start_dir, initial) = match env::args_os().nth(1).map(PathBuf::from) {
        Some(p) if p.is_dir() => (p, None),
        Some(p) => {
            let track = Track::new(p);
            let dir = track
                .path()
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| config.start_dir());
            (dir, Some(track))
        }
        None => (config.start_dir(), None),
    };

    let device = AudioDevice::open_default().context("opening the default audio device")?;
    let player = Player::spawn(
        Arc::new(SymphoniaDecoders),
        Arc::new(device.output()),
        config.worker_settings(),
        config.visualization,
    )
    .context("starting the audio thread")?;
    if let Some(track) = initial {
        player.send(Command::ReplaceAndPlay(track));
    }

    let mut app = App {
        browser: FileBrowser::new(start_dir),
        controls: player.controls(),
        theme: theme_index(&config.theme),
        seek_step: config.seek_step_secs,
        snapshot: player.render().snapshot(),
    };

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app, &config);
    ratatui::restore();

    if player.shutdown().is_err() {
        warn!("audio thread panicked");
    }
    info!("bye");
    result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App, config: &Config) -> Result<()> {
    let refresh = config.refresh_interval();
    let mut last_draw = Instant::now();
    let mut dirty = true;
    loop {
        if dirty || (app.controls.is_active() && last_draw.elapsed() >= refresh) {
            terminal.draw(|f| app.draw(f))?;
            last_draw = Instant::now();
            dirty = false;
        }

        match app.controls.render().wait_for_update(config.input_poll()) {
            Refresh::Updated(state) => {
                app.snapshot = state;
                dirty = true;
            }
            Refresh::Unchanged(state) => app.snapshot = state,
        }

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key.code) {
                        return Ok(());
                    }
                    dirty = true;
                }
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        }
    }
}
