use ratatui::style::{Color, Style};

pub struct Theme {
    pub name: &'static str,
    pub accent: Color,
    pub secondary: Color,
    /// Waveform trace and low spectrum bars.
    pub positive: Color,
    /// Pause badge and spectrum peaks.
    pub negative: Color,
    pub text: Color,
    pub dimmed: Color,
}

impl Theme {
    /// White text and dark grey for secondary text; the four roles vary per theme.
    const fn palette(
        name: &'static str,
        accent: Color,
        secondary: Color,
        positive: Color,
        negative: Color,
    ) -> Self {
        Theme {
            name,
            accent,
            secondary,
            positive,
            negative,
            text: Color::White,
            dimmed: Color::DarkGray,
        }
    }

    pub fn key_style(&self) -> Style {
        Style::default().fg(Color::Black).bg(self.secondary)
    }

    pub fn badge_style(&self, paused: bool) -> Style {
        let bg = if paused { self.negative } else { self.accent };
        Style::default().fg(Color::Black).bg(bg)
    }
}

/// `0xRRGGBB` to a truecolor value.
const fn hex(rgb: u32) -> Color {
    Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

// accent, secondary (key caps), positive (trace), negative (peaks, pause badge)
pub const THEMES: &[Theme] = &[
    Theme::palette("Default", Color::Cyan, Color::Yellow, Color::Green, Color::Red),
    Theme::palette("Dracula", hex(0xbd93f9), hex(0xff79c6), hex(0x50fa7b), hex(0xff5555)),
    Theme::palette("Nord", hex(0x88c0d0), hex(0xebcb8b), hex(0xa3be8c), hex(0xbf616a)),
    Theme::palette("Gruvbox", hex(0xd79921), hex(0xfabd2f), hex(0x98971a), hex(0xcc241d)),
    Theme::palette("Tokyo Night", hex(0x7aa2f7), hex(0xe0af68), hex(0x9ece6a), hex(0xf7768e)),
    Theme::palette("Everforest", hex(0x7fbbb3), hex(0xdbbc7f), hex(0xa7c080), hex(0xe67e80)),
];

/// Index of the theme called `name` (case-insensitive), falling back to the first one.
pub fn theme_index(name: &str) -> usize {
    THEMES
        .iter()
        .position(|t| t.name.eq_ignore_ascii_case(name.trim()))
        .unwrap_or(0)
}

pub fn next_theme(index: usize) -> usize {
    (index + 1) % THEMES.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_themes_by_name() {
        assert_eq!(THEMES[theme_index("nord")].name, "Nord");
        assert_eq!(THEMES[theme_index(" Tokyo Night ")].name, "Tokyo Night");
        assert_eq!(theme_index("no such theme"), 0);
    }

    #[test]
    fn hex_splits_into_channels() {
        assert_eq!(hex(0x88c0d0), Color::Rgb(136, 192, 208));
        assert_eq!(THEMES[theme_index("Dracula")].accent, Color::Rgb(189, 147, 249));
    }

    #[test]
    fn cycling_wraps_around() {
        assert_eq!(next_theme(THEMES.len() - 1), 0);
        assert_eq!(next_theme(0), 1);
    }
}
