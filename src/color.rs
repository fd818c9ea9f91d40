//! Semantic text colors for dashboard fragments

use crossterm::style::{Color, Stylize};

/// What a piece of text means, not how it looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Module headings
    Title,
    /// Values worth noticing (names, counts)
    Accent,
    /// Secondary detail
    Muted,
    Good,
    Warn,
    Bad,
}

impl Tone {
    fn color(self) -> Color {
        match self {
            Tone::Title => Color::Cyan,
            Tone::Accent => Color::Magenta,
            Tone::Muted => Color::DarkGrey,
            Tone::Good => Color::Green,
            Tone::Warn => Color::Yellow,
            Tone::Bad => Color::Red,
        }
    }
}

/// Applies tones as ANSI colors, or passes text through when disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colorizer {
    enabled: bool,
}

impl Colorizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Colors are on unless the config turns them off or `NO_COLOR` is set
    pub fn from_config(colors: bool) -> Self {
        Self::new(colors && std::env::var_os("NO_COLOR").is_none())
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn paint(&self, tone: Tone, text: impl AsRef<str>) -> String {
        let text = text.as_ref();
        if !self.enabled {
            return text.to_string();
        }
        match tone {
            Tone::Title => text.with(tone.color()).bold().to_string(),
            _ => text.with(tone.color()).to_string(),
        }
    }
}
