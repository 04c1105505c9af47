use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use wavedeck::{RenderState, Track};

use crate::theme::Theme;

/// Badge text for the current state.
pub fn status_label(state: &RenderState) -> &'static str {
    match (&state.track, state.paused) {
        (None, _) => "Idle",
        (Some(_), true) => "Paused",
        (Some(_), false) => "Playing",
    }
}

/// Track name with a badge, and the next queued track underneath.
pub fn draw_now_playing(
    frame: &mut Frame,
    area: Rect,
    state: &RenderState,
    up_next: Option<&Track>,
    theme: &Theme,
) {
    let name = state
        .track
        .as_ref()
        .map(Track::name)
        .unwrap_or_else(|| "Nothing playing".into());
    let badge_style = if state.is_idle() {
        theme.key_style()
    } else {
        theme.badge_style(state.paused)
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!(" {} ", status_label(state)), badge_style),
        Span::raw("  "),
        Span::styled(name, Style::default().fg(theme.text)),
    ])];
    if let Some(next) = up_next {
        lines.push(Line::from(vec![
            Span::raw("  Next: "),
            Span::styled(next.name(), Style::default().fg(theme.dimmed)),
        ]));
    }

    let pane = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" Now Playing "),
    );
    frame.render_widget(pane, area);
}
