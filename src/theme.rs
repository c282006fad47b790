use papercut::colors::{Hsl, SpeakerPalette};
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct UiPalette {
    pub base_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub border: Color,
    pub selection_bg: Color,
}

impl Default for UiPalette {
    fn default() -> Self {
        Self {
            base_fg: Color::Gray,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            selection_bg: Color::Rgb(60, 70, 90),
        }
    }
}

impl UiPalette {
    pub fn base_style(&self) -> Style {
        Style::default().fg(self.base_fg)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn selection_style(&self) -> Style {
        Style::default().bg(self.selection_bg)
    }
}

/// Terminal styles derived from one speaker's palette.
#[derive(Debug, Clone, Copy)]
pub struct SpeakerStyles {
    pub label: Style,
    pub edge: Style,
    pub word: Style,
    pub hover: Style,
}

impl SpeakerStyles {
    pub fn from_palette(palette: &SpeakerPalette) -> Self {
        let edge = to_ratatui(palette.edge_line);
        Self {
            label: Style::default().fg(edge).add_modifier(Modifier::BOLD),
            edge: Style::default().fg(edge),
            word: Style::default(),
            hover: Style::default()
                .bg(to_ratatui(palette.word_hover))
                .fg(to_ratatui(palette.text_dark)),
        }
    }

    /// Highlight for a block being dragged or hovered as a drop target.
    pub fn block_highlight(palette: &SpeakerPalette) -> Style {
        Style::default()
            .bg(to_ratatui(palette.block_hover))
            .fg(to_ratatui(palette.text_light))
    }
}

pub fn to_ratatui(color: Hsl) -> Color {
    let (r, g, b) = color.to_rgb();
    Color::Rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::{to_ratatui, SpeakerStyles};
    use papercut::colors::{Hsl, SpeakerPalette};
    use ratatui::style::Color;

    #[test]
    fn converts_hsl_to_rgb() {
        assert_eq!(to_ratatui(Hsl::new(0.0, 100.0, 50.0)), Color::Rgb(255, 0, 0));
    }

    #[test]
    fn speaker_edges_differ() {
        let a = SpeakerStyles::from_palette(&SpeakerPalette::for_index(0));
        let b = SpeakerStyles::from_palette(&SpeakerPalette::for_index(1));
        assert_ne!(a.edge.fg, b.edge.fg);
    }
}
