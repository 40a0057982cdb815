//! Output styles using owo-colors stylesheet pattern

use nodefleet_common::NodeState;
use owo_colors::Style;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages (yellow)
    pub warning: Style,
    /// Error messages (red)
    pub error: Style,
    /// Step arrows and info (cyan)
    pub info: Style,
    pub dim: Style,
    pub bold: Style,
    /// Table headers and section titles
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().cyan();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
    }

    /// Style for a node lifecycle state.
    #[must_use]
    pub fn node_state(&self, state: NodeState) -> Style {
        match state {
            NodeState::Provisioned => self.success,
            NodeState::Installed => self.info,
            NodeState::Launching => self.warning,
        }
    }
}
