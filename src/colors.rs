//! Order-based speaker colours.
//!
//! The n-th distinct speaker gets hue `n * 137.508 mod 360` (the golden
//! angle), so consecutive speakers stay far apart on the colour wheel no
//! matter how many there are.

use std::collections::HashMap;

pub const GOLDEN_ANGLE: f64 = 137.508;
pub const SATURATION: f64 = 65.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    pub alpha: f64,
}

impl Hsl {
    pub fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
            alpha: 1.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = self.saturation / 100.0;
        let l = self.lightness / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    pub fn css(self) -> String {
        if self.alpha < 1.0 {
            format!(
                "hsla({}, {}%, {}%, {})",
                self.hue, self.saturation, self.lightness, self.alpha
            )
        } else {
            format!("hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
        }
    }
}

/// The colour variants used to draw one speaker's blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakerPalette {
    pub hue: f64,
    pub bg: Hsl,
    pub block_hover: Hsl,
    pub word_hover: Hsl,
    pub text_light: Hsl,
    pub text_dark: Hsl,
    pub edge_line: Hsl,
}

impl SpeakerPalette {
    pub fn for_index(index: usize) -> Self {
        let hue = hue_for_index(index);
        Self {
            hue,
            bg: Hsl::new(hue, SATURATION, 60.0).with_alpha(0.0),
            block_hover: Hsl::new(hue, SATURATION, 45.0),
            word_hover: Hsl::new(hue, SATURATION, 55.0),
            text_light: Hsl::new(hue, SATURATION, 95.0),
            text_dark: Hsl::new(hue, SATURATION, 15.0),
            edge_line: Hsl::new(hue, SATURATION, 45.0),
        }
    }
}

pub fn hue_for_index(index: usize) -> f64 {
    (index as f64 * GOLDEN_ANGLE) % 360.0
}

/// Append-only speaker to index assignment for one editor session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakerColors {
    indices: HashMap<String, usize>,
}

impl SpeakerColors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `speaker`, assigning the next one on first sight.
    pub fn index_for(&mut self, speaker: &str) -> usize {
        if let Some(&idx) = self.indices.get(speaker) {
            return idx;
        }
        let idx = self.indices.len();
        self.indices.insert(speaker.to_string(), idx);
        idx
    }

    pub fn get(&self, speaker: &str) -> Option<usize> {
        self.indices.get(speaker).copied()
    }

    pub fn palette_for(&mut self, speaker: &str) -> SpeakerPalette {
        SpeakerPalette::for_index(self.index_for(speaker))
    }

    pub fn indices(&self) -> &HashMap<String, usize> {
        &self.indices
    }

    /// Adds entries from `other` that this map has not seen. Existing
    /// assignments never change.
    pub fn absorb(&mut self, other: &HashMap<String, usize>) {
        let mut missing: Vec<(&String, &usize)> = other
            .iter()
            .filter(|(speaker, _)| !self.indices.contains_key(*speaker))
            .collect();
        missing.sort_by_key(|(_, idx)| **idx);
        for (speaker, _) in missing {
            self.index_for(speaker);
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
