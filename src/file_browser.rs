use std::path::{Path, PathBuf};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState},
    Frame,
};

use wavedeck::listing::{self, Entry};
use wavedeck::Track;

use crate::theme::Theme;

/// What Enter on the selected row resolved to.
#[derive(Debug, PartialEq)]
pub enum Selection {
    Entered,
    Play(Track),
    Nothing,
}

/// Flat single-directory listing with a `..` row when the directory has a parent.
pub struct FileBrowser {
    dir: PathBuf,
    entries: Vec<Entry>,
    state: ListState,
}

impl FileBrowser {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let mut browser = FileBrowser {
            dir: PathBuf::new(),
            entries: Vec::new(),
            state: ListState::default(),
        };
        browser.open(dir.into());
        browser
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn has_parent_row(&self) -> bool {
        self.dir.parent().is_some()
    }

    fn len(&self) -> usize {
        self.entries.len() + usize::from(self.has_parent_row())
    }

    fn open(&mut self, dir: PathBuf) {
        self.entries = listing::list_directory(&dir);
        self.dir = dir;
        self.state.select(if self.len() > 0 { Some(0) } else { None });
    }

    /// Entry under the cursor; `None` on the `..` row.
    pub fn selected(&self) -> Option<&Entry> {
        let idx = self.state.selected()?;
        let offset = usize::from(self.has_parent_row());
        idx.checked_sub(offset).and_then(|i| self.entries.get(i))
    }

    pub fn up(&mut self) {
        if let Some(i) = self.state.selected() {
            self.state.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn down(&mut self) {
        if let Some(i) = self.state.selected() {
            self.state.select(Some((i + 1).min(self.len().saturating_sub(1))));
        }
    }

    /// Go to the parent directory, keeping the cursor on the directory we left.
    pub fn parent(&mut self) {
        let Some(parent) = self.dir.parent().map(Path::to_path_buf) else {
            return;
        };
        let left = std::mem::replace(&mut self.dir, PathBuf::new());
        self.open(parent);
        let offset = usize::from(self.has_parent_row());
        if let Some(pos) = self.entries.iter().position(|e| e.path == left) {
            self.state.select(Some(pos + offset));
        }
    }

    pub fn enter(&mut self) -> Selection {
        if self.state.selected().is_none() {
            return Selection::Nothing;
        }
        let Some(entry) = self.selected().cloned() else {
            self.parent();
            return Selection::Entered;
        };
        if entry.is_dir {
            self.open(entry.path);
            Selection::Entered
        } else if entry.is_audio() {
            Selection::Play(Track::new(entry.path))
        } else {
            Selection::Nothing
        }
    }

    /// Every audio file in the current directory, in listing order.
    pub fn audio_tracks(&self) -> Vec<Track> {
        listing::audio_files(&self.entries)
            .into_iter()
            .map(Track::new)
            .collect()
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut items = Vec::with_capacity(self.len());
        if self.has_parent_row() {
            items.push(ListItem::new(Line::styled(
                "../",
                Style::default().fg(theme.accent),
            )));
        }
        items.extend(self.entries.iter().map(|e| {
            let (label, style) = if e.is_dir {
                (format!("{}/", e.name), Style::default().fg(theme.accent))
            } else if e.is_audio() {
                (e.name.clone(), Style::default().fg(theme.text))
            } else {
                (e.name.clone(), Style::default().fg(theme.dimmed))
            };
            ListItem::new(Line::from(Span::styled(label, style)))
        }));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(" Files "),
            )
            .highlight_style(
                Style::default()
                    .fg(ratatui::style::Color::Black)
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");
        frame.render_stateful_widget(list, area, &mut self.state);
    }
}
