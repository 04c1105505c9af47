use ratatui::{
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Block, BorderType, Borders},
    Frame,
};

use wavedeck::RenderState;

use crate::gauge::RoundedGauge;
use crate::theme::Theme;

/// `mm:ss`, negative values shown as `00:00`.
pub fn format_time(secs: f64) -> String {
    let t = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    format!("{:02}:{:02}", t / 60, t % 60)
}

pub fn progress_label(state: &RenderState) -> String {
    format!(
        "{} / {}",
        format_time(state.elapsed_secs),
        format_time(state.total_secs)
    )
}

pub fn draw_progress(frame: &mut Frame, area: Rect, state: &RenderState, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Progress ")
        .title(Line::from(format!(" {} ", progress_label(state))).alignment(Alignment::Right));

    let gauge = RoundedGauge::new(state.progress(), theme.accent)
        .empty_color(theme.dimmed)
        .block(block);
    frame.render_widget(gauge, area);
}
