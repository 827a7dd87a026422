//! Display preferences that survive restarts: text scale, line spacing and
//! theme. Adjustments always clamp, so a stuck key or a runaway pinch can never
//! push the layout into an unreadable state.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FONT_SIZE: f64 = 18.0;
pub const MIN_FONT_SIZE: f64 = 10.0;
pub const MAX_FONT_SIZE: f64 = 40.0;
pub const FONT_STEP: f64 = 2.0;

pub const DEFAULT_LINE_HEIGHT: f64 = 1.6;
pub const MIN_LINE_HEIGHT: f64 = 0.8;
pub const MAX_LINE_HEIGHT: f64 = 3.0;
pub const LINE_HEIGHT_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            other => Err(format!("unknown theme mode '{other}'")),
        }
    }
}

/// Accent colors offered for chords and section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accent {
    #[default]
    Amber,
    Cyan,
    Green,
    Magenta,
    Red,
    Blue,
}

impl Accent {
    pub const ALL: [Accent; 6] = [
        Accent::Amber,
        Accent::Cyan,
        Accent::Green,
        Accent::Magenta,
        Accent::Red,
        Accent::Blue,
    ];

    /// The next accent in the palette, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|a| *a == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Accent::Amber => "amber",
            Accent::Cyan => "cyan",
            Accent::Green => "green",
            Accent::Magenta => "magenta",
            Accent::Red => "red",
            Accent::Blue => "blue",
        }
    }
}

impl FromStr for Accent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|accent| accent.as_str() == wanted)
            .ok_or_else(|| format!("unknown accent color '{wanted}'"))
    }
}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPreferences {
    /// Text scale in nominal points. The terminal cannot change its font, so
    /// the layout narrows the text column as this grows.
    pub font_size: f64,
    /// Average rows per lyric line.
    pub line_height: f64,
    pub theme: ThemeMode,
    pub accent: Accent,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            line_height: DEFAULT_LINE_HEIGHT,
            theme: ThemeMode::default(),
            accent: Accent::default(),
        }
    }
}

impl DisplayPreferences {
    /// Change the text scale by `delta` points. Returns whether it moved.
    pub fn adjust_font(&mut self, delta: f64) -> bool {
        let next = (self.font_size + delta).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let changed = (next - self.font_size).abs() > f64::EPSILON;
        self.font_size = next;
        changed
    }

    /// Change the line spacing by `delta`. Returns whether it moved.
    pub fn adjust_line_height(&mut self, delta: f64) -> bool {
        let next = round_tenths(self.line_height + delta).clamp(MIN_LINE_HEIGHT, MAX_LINE_HEIGHT);
        let changed = (next - self.line_height).abs() > f64::EPSILON;
        self.line_height = next;
        changed
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    pub fn cycle_accent(&mut self) {
        self.accent = self.accent.next();
    }

    /// Restore clamping invariants on values that came from storage.
    pub fn sanitized(mut self) -> Self {
        if !self.font_size.is_finite() {
            self.font_size = DEFAULT_FONT_SIZE;
        }
        if !self.line_height.is_finite() {
            self.line_height = DEFAULT_LINE_HEIGHT;
        }
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.line_height = self.line_height.clamp(MIN_LINE_HEIGHT, MAX_LINE_HEIGHT);
        self
    }
}

/// Keep repeated 0.1 steps from drifting into 1.7000000000000002.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_is_clamped() {
        let mut prefs = DisplayPreferences::default();
        for _ in 0..50 {
            prefs.adjust_font(FONT_STEP);
        }
        assert_eq!(prefs.font_size, MAX_FONT_SIZE);
        assert!(!prefs.adjust_font(FONT_STEP));
        for _ in 0..50 {
            prefs.adjust_font(-FONT_STEP);
        }
        assert_eq!(prefs.font_size, MIN_FONT_SIZE);
    }

    #[test]
    fn line_height_steps_stay_on_tenths() {
        let mut prefs = DisplayPreferences::default();
        prefs.adjust_line_height(LINE_HEIGHT_STEP);
        assert_eq!(prefs.line_height, 1.7);
        for _ in 0..40 {
            prefs.adjust_line_height(-LINE_HEIGHT_STEP);
        }
        assert_eq!(prefs.line_height, MIN_LINE_HEIGHT);
    }

    #[test]
    fn theme_and_accent_round_trip_through_strings() {
        for accent in Accent::ALL {
            assert_eq!(accent.as_str().parse::<Accent>().unwrap(), accent);
        }
        assert_eq!(" Light ".parse::<ThemeMode>().unwrap(), ThemeMode::Light);
        assert!("sepia".parse::<ThemeMode>().is_err());
        assert_eq!(Accent::Blue.next(), Accent::Amber);
    }

    #[test]
    fn sanitized_clamps_stored_values() {
        let prefs = DisplayPreferences {
            font_size: 300.0,
            line_height: f64::NAN,
            ..DisplayPreferences::default()
        }
        .sanitized();
        assert_eq!(prefs.font_size, MAX_FONT_SIZE);
        assert_eq!(prefs.line_height, DEFAULT_LINE_HEIGHT);
    }
}
