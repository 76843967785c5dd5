//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Border of the focused column and the status bar background.
pub const ACCENT: Color = Color::Rgb(0, 95, 135);
/// Background of unselected cards.
pub const CARD_BG: Color = Color::DarkGray;
/// Tint for cards sitting in the done column.
pub const DONE_GREEN: Color = Color::Rgb(0, 80, 0);
