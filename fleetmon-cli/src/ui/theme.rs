//! UI Theme Module - color palette and style helpers
//!
//! Palette tokens rather than hard-coded colors, plus StyleKit helpers for
//! instance states and check results.

use ratatui::style::{Color, Modifier, Style};

use fleetmon_core::model::{CheckStatus, InstanceState};

/// Color palette tokens for the theme
#[derive(Clone, Debug)]
pub struct Palette {
    /// Panel border color
    pub panel_border: Color,
    /// Primary text color
    pub text: Color,
    /// Dimmed text (secondary info)
    pub text_dim: Color,
    /// Muted text (tertiary info, disabled)
    pub text_muted: Color,
    /// Accent color (highlights, focus)
    pub accent: Color,
    /// Success state (running, checks ok)
    pub success: Color,
    /// Warning state (pending, stopping)
    pub warn: Color,
    /// Error state (terminated, failed checks)
    pub error: Color,
    /// Selection background
    pub selection_bg: Color,
    /// Selection foreground
    pub selection_fg: Color,
    /// Key hint text
    pub key_hint: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}

impl Palette {
    /// VS Code-esque dark theme
    pub fn dark() -> Self {
        Self {
            panel_border: Color::Rgb(60, 60, 60),
            text: Color::Rgb(212, 212, 212),
            text_dim: Color::Rgb(150, 150, 150),
            text_muted: Color::Rgb(100, 100, 100),
            accent: Color::Rgb(79, 193, 255),      // Light blue
            success: Color::Rgb(78, 201, 176),     // Teal green
            warn: Color::Rgb(220, 180, 100),       // Amber
            error: Color::Rgb(244, 135, 113),      // Coral red
            selection_bg: Color::Rgb(38, 79, 120), // Dark blue
            selection_fg: Color::White,
            key_hint: Color::Rgb(206, 145, 120), // Soft orange
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    pub fn state_style(&self, state: &InstanceState) -> Style {
        let color = match state {
            InstanceState::Running => self.palette.success,
            InstanceState::Pending | InstanceState::Stopping | InstanceState::ShuttingDown => {
                self.palette.warn
            }
            InstanceState::Stopped => self.palette.text_muted,
            InstanceState::Terminated => self.palette.error,
            InstanceState::Other(_) => self.palette.text_dim,
        };
        Style::default().fg(color)
    }

    pub fn state_icon(&self, state: &InstanceState) -> &'static str {
        match state {
            InstanceState::Running => "●",
            InstanceState::Pending => "◐",
            InstanceState::Stopping | InstanceState::ShuttingDown => "◑",
            InstanceState::Stopped => "○",
            InstanceState::Terminated => "✗",
            InstanceState::Other(_) => "?",
        }
    }

    pub fn check_style(&self, check: &CheckStatus) -> Style {
        let color = if check.is_ok() {
            self.palette.success
        } else {
            self.palette.error
        };
        Style::default().fg(color)
    }

    pub fn check_icon(&self, check: &CheckStatus) -> &'static str {
        if check.is_ok() { "✓" } else { "✗" }
    }

    pub fn key_hint_style(&self) -> Style {
        Style::default()
            .fg(self.palette.key_hint)
            .add_modifier(Modifier::BOLD)
    }

    pub fn subtle_border_style(&self) -> Style {
        Style::default().fg(self.palette.panel_border)
    }

    pub fn focused_border_style(&self) -> Style {
        Style::default().fg(self.palette.accent)
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.palette.selection_bg)
            .fg(self.palette.selection_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.palette.text)
    }

    pub fn text_dim_style(&self) -> Style {
        Style::default().fg(self.palette.text_dim)
    }

    pub fn text_muted_style(&self) -> Style {
        Style::default().fg(self.palette.text_muted)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.palette.accent)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.palette.success)
    }

    pub fn warn_style(&self) -> Style {
        Style::default().fg(self.palette.warn)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.palette.error)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.palette.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn section_header_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }
}

static DEFAULT_THEME: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();

pub fn theme() -> &'static Theme {
    DEFAULT_THEME.get_or_init(Theme::default)
}

/// Convenience re-exports for common use cases
pub mod styles {
    use super::*;

    pub fn state(state: &InstanceState) -> Style {
        theme().state_style(state)
    }

    pub fn state_icon(state: &InstanceState) -> &'static str {
        theme().state_icon(state)
    }

    pub fn check(check: &CheckStatus) -> Style {
        theme().check_style(check)
    }

    pub fn check_icon(check: &CheckStatus) -> &'static str {
        theme().check_icon(check)
    }

    pub fn key_hint() -> Style {
        theme().key_hint_style()
    }

    pub fn border_subtle() -> Style {
        theme().subtle_border_style()
    }

    pub fn border_focused() -> Style {
        theme().focused_border_style()
    }

    pub fn selection() -> Style {
        theme().selection_style()
    }

    pub fn text() -> Style {
        theme().text_style()
    }

    pub fn text_dim() -> Style {
        theme().text_dim_style()
    }

    pub fn text_muted() -> Style {
        theme().text_muted_style()
    }

    pub fn accent() -> Style {
        theme().accent_style()
    }

    pub fn success() -> Style {
        theme().success_style()
    }

    pub fn warn() -> Style {
        theme().warn_style()
    }

    pub fn error() -> Style {
        theme().error_style()
    }

    pub fn title() -> Style {
        theme().title_style()
    }

    pub fn section_header() -> Style {
        theme().section_header_style()
    }
}
