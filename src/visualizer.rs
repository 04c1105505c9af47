use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, BorderType, Borders, Widget},
    Frame,
};

use wavedeck::{RenderState, VisualizationMode};

use crate::theme::Theme;

// Braille dot positions per character cell (2 wide x 4 tall):
//   col0: bits 0,1,2,6  (top to bottom)
//   col1: bits 3,4,5,7  (top to bottom)
const BRAILLE_BASE: u32 = 0x2800;
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40],
    [0x08, 0x10, 0x20, 0x80],
];

/// Dot grid covering a `cols` x `rows` cell area.
struct BrailleGrid {
    cols: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl BrailleGrid {
    fn new(cols: usize, rows: usize) -> Self {
        BrailleGrid {
            cols,
            rows,
            cells: vec![0; cols * rows],
        }
    }

    fn px_width(&self) -> usize {
        self.cols * 2
    }

    fn px_height(&self) -> usize {
        self.rows * 4
    }

    fn set(&mut self, px_x: usize, px_y: usize) {
        let (cx, cy) = (px_x / 2, px_y / 4);
        if cx < self.cols && cy < self.rows {
            self.cells[cy * self.cols + cx] |= BRAILLE_DOTS[px_x % 2][px_y % 4];
        }
    }

    /// `color` gets the cell row and the cell index into `cells`.
    fn draw(&self, area: Rect, buf: &mut Buffer, color: impl Fn(usize, usize) -> Color) {
        for cy in 0..self.rows {
            for cx in 0..self.cols {
                let i = cy * self.cols + cx;
                let ch = char::from_u32(BRAILLE_BASE + self.cells[i] as u32).unwrap_or(' ');
                buf[(area.x + cx as u16, area.y + cy as u16)]
                    .set_char(ch)
                    .set_fg(color(cy, i));
            }
        }
    }
}

/// Pixel row for a sample: full scale maps to the top and bottom edges.
fn sample_row(sample: i16, px_h: usize) -> usize {
    let mid = px_h as f32 / 2.0;
    let v = sample as f32 / 32768.0;
    ((1.0 - v) * mid).clamp(0.0, px_h as f32 - 1.0) as usize
}

/// Bar heights in pixels, one per bar, log-scaled against the loudest bin.
///
/// Bins are split evenly across bars; when there are more bars than bins the
/// extra bars stay empty.
pub fn bar_heights(magnitudes: &[f32], bars: usize, px_h: usize) -> Vec<usize> {
    let mut heights = vec![0; bars];
    if magnitudes.is_empty() || bars == 0 {
        return heights;
    }
    let max = magnitudes.iter().copied().fold(1e-12f32, f32::max) as f64;
    let per_bar = (magnitudes.len() / bars).max(1);
    for (bar, height) in heights.iter_mut().enumerate() {
        let start = bar * per_bar;
        let end = (start + per_bar).min(magnitudes.len());
        if start >= end {
            break;
        }
        let avg = magnitudes[start..end].iter().map(|&m| m as f64).sum::<f64>()
            / (end - start) as f64;
        let ratio = ((avg + 1.0).ln() / (max + 1.0).ln()).clamp(0.0, 1.0);
        *height = ((ratio * px_h as f64).round() as usize).min(px_h);
    }
    heights
}

struct WaveformWidget<'a> {
    mono: &'a [i16],
    theme: &'a Theme,
}

impl Widget for WaveformWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut grid = BrailleGrid::new(area.width as usize, area.height as usize);
        let (px_w, px_h) = (grid.px_width(), grid.px_height());

        let center = px_h / 2;
        for x in 0..px_w {
            grid.set(x, center);
        }
        let reference = grid.cells.clone();

        let last = self.mono.len() - 1;
        let denom = px_w.saturating_sub(1).max(1);
        for x in 0..px_w {
            let idx = ((x as f64 / denom as f64) * last as f64).round() as usize;
            let sample = self.mono[idx.min(last)];
            grid.set(x, sample_row(sample, px_h));
        }

        // Cells holding only the midline stay dim.
        grid.draw(area, buf, |_, i| {
            if grid.cells[i] & !reference[i] != 0 {
                self.theme.positive
            } else {
                self.theme.dimmed
            }
        });
    }
}

struct SpectrumWidget<'a> {
    magnitudes: &'a [f32],
    theme: &'a Theme,
}

impl Widget for SpectrumWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut grid = BrailleGrid::new(area.width as usize, area.height as usize);
        let px_h = grid.px_height();
        let heights = bar_heights(self.magnitudes, grid.cols, px_h);
        for (col, &height) in heights.iter().enumerate() {
            for py in (px_h - height)..px_h {
                grid.set(col * 2, py);
                grid.set(col * 2 + 1, py);
            }
        }
        let rows = grid.rows;
        grid.draw(area, buf, |cy, i| {
            if grid.cells[i] == 0 {
                self.theme.dimmed
            } else if cy * 3 < rows {
                self.theme.negative
            } else if cy * 3 < rows * 2 {
                self.theme.secondary
            } else {
                self.theme.positive
            }
        });
    }
}

fn draw_placeholder(area: Rect, buf: &mut Buffer, msg: &str, theme: &Theme) {
    let width = (msg.len() as u16).min(area.width);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + area.height / 2;
    buf.set_stringn(x, y, msg, width as usize, Style::default().fg(theme.secondary));
}

/// Render the visualizer pane for the latest snapshot.
pub fn draw_visualizer(frame: &mut Frame, area: Rect, state: &RenderState, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" Visualizer - {} ", state.mode.label()));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let buf = frame.buffer_mut();
    match state.mode {
        VisualizationMode::Waveform if state.mono.is_empty() => {
            draw_placeholder(inner, buf, "No data", theme)
        }
        VisualizationMode::Waveform => WaveformWidget {
            mono: &state.mono,
            theme,
        }
        .render(inner, buf),
        VisualizationMode::Spectrum if state.magnitudes.is_empty() => {
            draw_placeholder(inner, buf, "No spectrum", theme)
        }
        VisualizationMode::Spectrum => SpectrumWidget {
            magnitudes: &state.magnitudes,
            theme,
        }
        .render(inner, buf),
    }
}
