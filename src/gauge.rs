use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::{Block, Widget},
};

/// Single-row progress line drawn with box-drawing characters.
pub struct RoundedGauge<'a> {
    ratio: f64,
    filled_color: Color,
    empty_color: Color,
    block: Option<Block<'a>>,
}

impl<'a> RoundedGauge<'a> {
    pub fn new(ratio: f64, filled_color: Color) -> Self {
        RoundedGauge {
            ratio: ratio.clamp(0.0, 1.0),
            filled_color,
            empty_color: Color::DarkGray,
            block: None,
        }
    }

    pub fn empty_color(mut self, color: Color) -> Self {
        self.empty_color = color;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

/// Glyph for column `col` of a `width`-wide gauge with `filled` columns lit.
fn glyph(col: usize, width: usize, filled: usize) -> (char, bool) {
    if col < filled {
        let ch = if col == 0 {
            '╺'
        } else if col == filled - 1 && filled < width {
            '╸'
        } else {
            '━'
        };
        (ch, true)
    } else {
        let ch = if col == 0 {
            '╶'
        } else if col == width - 1 {
            '╴'
        } else {
            '─'
        };
        (ch, false)
    }
}

impl Widget for RoundedGauge<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width < 2 || inner.height == 0 {
            return;
        }

        let width = inner.width as usize;
        let filled = (self.ratio * width as f64).round() as usize;
        for col in 0..width {
            let (ch, lit) = glyph(col, width, filled);
            let fg = if lit { self.filled_color } else { self.empty_color };
            buf[(inner.x + col as u16, inner.y)]
                .set_char(ch)
                .set_fg(fg)
                .set_bg(Color::Reset);
        }
    }
}
