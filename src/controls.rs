use std::path::Path;

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use wavedeck::VisualizationMode;

use crate::theme::Theme;

/// What the status bar reports besides the key help.
pub struct Status<'a> {
    pub dir: &'a Path,
    pub queue_len: usize,
    pub mode: VisualizationMode,
    /// `Idle`, `Play` or `Paused`.
    pub state: &'static str,
}

pub fn playback_state(active: bool, paused: bool) -> &'static str {
    match (active, paused) {
        (false, _) => "Idle",
        (true, true) => "Paused",
        (true, false) => "Play",
    }
}

const KEYS: &[(&str, &str)] = &[
    ("q", "Quit"),
    ("Enter", "Open/Play"),
    ("⌫", "Up Dir"),
    ("a", "Queue All"),
    ("s", "Skip"),
    ("x", "Stop"),
    ("p/Space", "Pause"),
    ("1/2", "Wave/Spec"),
    ("v", "Next Mode"),
    ("←/→", "Seek"),
    ("t", "Theme"),
];

fn build_spans(status: &Status, theme: &Theme) -> Vec<Span<'static>> {
    let key_style = theme.key_style();
    let mut spans = Vec::with_capacity(KEYS.len() * 2 + 8);
    for (key, label) in KEYS {
        spans.push(Span::styled(format!(" {key} "), key_style));
        spans.push(Span::raw(format!(" {label}  ")));
    }
    let dim = Style::default().fg(theme.dimmed);
    let value = Style::default().fg(theme.accent);
    spans.extend([
        Span::styled("Dir ", dim),
        Span::styled(format!("{}  ", status.dir.display()), value),
        Span::styled("Queue ", dim),
        Span::styled(format!("{}  ", status.queue_len), value),
        Span::styled("Mode ", dim),
        Span::styled(format!("{}  ", status.mode.short_label()), value),
        Span::styled("State ", dim),
        Span::styled(status.state, value),
    ]);
    spans
}

/// Wrap spans into lines, breaking at group boundaries (every 2 spans = key + label).
fn wrap_lines(spans: Vec<Span<'static>>, inner_w: usize) -> Vec<Line<'static>> {
    if inner_w == 0 {
        return vec![Line::from(spans)];
    }
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_w: usize = 0;
    for chunk in spans.chunks(2) {
        let group_w: usize = Line::from(chunk.to_vec()).width();
        if current_w + group_w > inner_w && current_w > 0 {
            lines.push(Line::from(std::mem::take(&mut current)));
            current_w = 0;
        }
        current.extend(chunk.iter().cloned());
        current_w += group_w;
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

pub fn status_height(width: u16, status: &Status, theme: &Theme) -> u16 {
    let inner_w = width.saturating_sub(2) as usize;
    wrap_lines(build_spans(status, theme), inner_w).len() as u16 + 2
}

pub fn draw_status_bar(frame: &mut Frame, area: Rect, status: &Status, theme: &Theme) {
    let inner_w = area.width.saturating_sub(2) as usize;
    let lines = wrap_lines(build_spans(status, theme), inner_w);
    let bar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" Controls "),
    );
    frame.render_widget(bar, area);
}
