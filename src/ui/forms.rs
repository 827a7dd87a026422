use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Single-field prompt for the path of a playlist CSV.
#[derive(Default, Clone)]
pub(crate) struct PathForm {
    pub(crate) value: String,
    pub(crate) error: Option<String>,
}

impl PathForm {
    pub(crate) fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        self.error = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
        self.error = None;
    }

    /// Validate the input and expand a leading `~/`.
    pub(crate) fn parse_path(&self) -> Result<PathBuf> {
        let raw = self.value.trim();
        if raw.is_empty() {
            return Err(anyhow!("A file path is required."));
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            if let Some(dirs) = BaseDirs::new() {
                return Ok(dirs.home_dir().join(rest));
            }
        }
        Ok(PathBuf::from(raw))
    }

    /// Render the input line for the prompt widget.
    pub(crate) fn build_line(&self, field_name: &str) -> Line<'static> {
        let (display, style) = if self.value.is_empty() {
            (
                "<path to .csv>".to_string(),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            (self.value.clone(), Style::default().fg(Color::Yellow))
        };
        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.value.chars().count()
    }
}
