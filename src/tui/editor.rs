//! Marker-aware description editor.
//!
//! The editor owns a plain string buffer plus a caret and an optional
//! selection anchor; every formatting shortcut routes through the pure
//! helpers in `crate::edit`, and the buffer is drawn each frame through
//! the overlay renderer, which reproduces the string character for
//! character so the terminal cursor we place on top stays aligned.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::edit::{
    active_formats, handle_marker_deletion, insert_code_block, toggle_bullet, wrap_selection,
};
use crate::render::overlay_lines;
use crate::richtext::parse;

/// What the host view should do after a key was handled.
#[derive(Debug, PartialEq, Eq)]
pub enum EditorAction {
    Continue,
    Save,
    Cancel,
}

/// Multiline editor state for one card description.
pub struct DescriptionEditor {
    text: String,
    caret: usize,
    anchor: Option<usize>,
    scroll: u16,
}

impl DescriptionEditor {
    pub fn new(text: &str) -> Self {
        DescriptionEditor {
            text: text.to_string(),
            caret: text.len(),
            anchor: None,
            scroll: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current selection as an ordered byte range, if any.
    fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.caret {
            return None;
        }
        Some((anchor.min(self.caret), anchor.max(self.caret)))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Esc => return EditorAction::Cancel,
            KeyCode::Char('s') if ctrl => return EditorAction::Save,

            // Formatting shortcuts. Ctrl+I is Tab on most terminals, so
            // italic sits on Ctrl+E instead.
            KeyCode::Char('b') if ctrl => self.wrap("*", "*"),
            KeyCode::Char('e') if ctrl => self.wrap("_", "_"),
            KeyCode::Char('u') if ctrl => self.wrap("~", "~"),
            KeyCode::Char('x') if ctrl => self.wrap("~~", "~~"),
            KeyCode::Char('k') if ctrl => self.wrap("`", "`"),
            KeyCode::Char('g') if ctrl => {
                let (start, end) = self.selection().unwrap_or((self.caret, self.caret));
                let (text, caret) = insert_code_block(&self.text, start, end);
                self.apply(text, caret);
            }
            KeyCode::Char('l') if ctrl => {
                let (text, caret) = toggle_bullet(&self.text, self.caret);
                self.apply(text, caret);
            }

            KeyCode::Left => self.move_caret(shift, Self::prev_offset),
            KeyCode::Right => self.move_caret(shift, Self::next_offset),
            KeyCode::Home => self.move_caret(shift, Self::line_start_offset),
            KeyCode::End => self.move_caret(shift, Self::line_end_offset),
            KeyCode::Up => self.move_vertical(-1),
            KeyCode::Down => self.move_vertical(1),

            KeyCode::Enter => self.insert("\n"),
            KeyCode::Char(c) if !ctrl => self.insert(&c.to_string()),

            KeyCode::Backspace => self.delete(true),
            KeyCode::Delete => self.delete(false),
            _ => {}
        }
        EditorAction::Continue
    }

    /// Wrap the selection (or an empty caret) in an inline marker pair.
    fn wrap(&mut self, prefix: &str, suffix: &str) {
        let (start, end) = self.selection().unwrap_or((self.caret, self.caret));
        let (text, caret) = wrap_selection(&self.text, start, end, prefix, suffix);
        self.apply(text, caret);
    }

    fn apply(&mut self, text: String, caret: usize) {
        self.text = text;
        self.caret = caret;
        self.anchor = None;
    }

    fn insert(&mut self, s: &str) {
        if let Some((start, end)) = self.selection() {
            self.text.replace_range(start..end, "");
            self.caret = start;
            self.anchor = None;
        }
        self.text.insert_str(self.caret, s);
        self.caret += s.len();
    }

    /// Backspace/Delete with marker-pair protection: a collapsed caret
    /// adjacent to a marker removes both halves of the pair at once.
    fn delete(&mut self, backspace: bool) {
        if let Some((start, end)) = self.selection() {
            // A selection bypasses marker protection entirely.
            self.text.replace_range(start..end, "");
            self.caret = start;
            self.anchor = None;
            return;
        }
        if let Some((text, caret)) = handle_marker_deletion(&self.text, self.caret, backspace) {
            self.apply(text, caret);
            return;
        }
        if backspace {
            let prev = self.prev_offset();
            if prev < self.caret {
                self.text.replace_range(prev..self.caret, "");
                self.caret = prev;
            }
        } else {
            let next = self.next_offset();
            if next > self.caret {
                self.text.replace_range(self.caret..next, "");
            }
        }
    }

    fn move_caret(&mut self, extend: bool, target: fn(&Self) -> usize) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.caret);
            }
        } else {
            self.anchor = None;
        }
        self.caret = target(self);
    }

    fn prev_offset(&self) -> usize {
        self.text[..self.caret]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_offset(&self) -> usize {
        match self.text[self.caret..].chars().next() {
            Some(c) => self.caret + c.len_utf8(),
            None => self.caret,
        }
    }

    fn line_start_offset(&self) -> usize {
        self.text[..self.caret]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn line_end_offset(&self) -> usize {
        self.text[self.caret..]
            .find('\n')
            .map(|i| self.caret + i)
            .unwrap_or(self.text.len())
    }

    /// Move up or down one line, keeping the column where possible.
    fn move_vertical(&mut self, delta: i32) {
        self.anchor = None;
        let lines: Vec<&str> = self.text.split('\n').collect();
        let (row, col) = self.caret_line_col();
        let target_row = row as i32 + delta;
        if target_row < 0 || target_row as usize >= lines.len() {
            return;
        }
        let target_row = target_row as usize;
        let mut offset = 0;
        for line in lines.iter().take(target_row) {
            offset += line.len() + 1;
        }
        let line = lines[target_row];
        let col_bytes: usize = line.chars().take(col).map(|c| c.len_utf8()).sum();
        self.caret = offset + col_bytes.min(line.len());
    }

    /// Caret position as (line index, column in chars).
    fn caret_line_col(&self) -> (usize, usize) {
        let before = &self.text[..self.caret];
        let row = before.matches('\n').count();
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let col = before[line_start..].chars().count();
        (row, col)
    }

    /// Footer text: active formats at the caret plus the key help.
    pub fn status_line(&self) -> String {
        let formats = active_formats(&self.text, self.caret);
        let active = if formats.is_empty() {
            "-".to_string()
        } else {
            formats
                .iter()
                .map(|f| f.label())
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!(
            "[{active}] ^B bold ^E italic ^U under ^X strike ^K code ^G block ^L bullet | ^S save Esc cancel"
        )
    }

    /// Draw the editor popup and place the terminal cursor on the caret.
    pub fn render(&mut self, f: &mut Frame, area: Rect, title: &str) {
        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let (row, col) = self.caret_line_col();
        let row = row as u16;
        if row < self.scroll {
            self.scroll = row;
        } else if inner.height > 0 && row >= self.scroll + inner.height {
            self.scroll = row - inner.height + 1;
        }

        let lines = overlay_lines(&parse(&self.text));
        let paragraph = Paragraph::new(lines).scroll((self.scroll, 0));
        f.render_widget(paragraph, inner);

        let x = inner.x + (col as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + row.saturating_sub(self.scroll);
        f.set_cursor_position(Position::new(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_typing_and_newlines() {
        let mut ed = DescriptionEditor::new("");
        for c in "ab".chars() {
            ed.handle_key(key(KeyCode::Char(c)));
        }
        ed.handle_key(key(KeyCode::Enter));
        ed.handle_key(key(KeyCode::Char('c')));
        assert_eq!(ed.text(), "ab\nc");
    }

    #[test]
    fn test_ctrl_b_wraps_selection() {
        let mut ed = DescriptionEditor::new("word");
        // Select the whole word from the end.
        for _ in 0..4 {
            ed.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT));
        }
        ed.handle_key(ctrl('b'));
        assert_eq!(ed.text(), "*word*");
    }

    #[test]
    fn test_collapsed_wrap_places_caret_inside() {
        let mut ed = DescriptionEditor::new("");
        ed.handle_key(ctrl('b'));
        ed.handle_key(key(KeyCode::Char('x')));
        assert_eq!(ed.text(), "*x*");
    }

    #[test]
    fn test_backspace_protects_marker_pairs() {
        let mut ed = DescriptionEditor::new("a*bold*b");
        // Place the caret right after the opening marker.
        for _ in 0..6 {
            ed.handle_key(key(KeyCode::Left));
        }
        ed.handle_key(key(KeyCode::Backspace));
        assert_eq!(ed.text(), "aboldb");
    }

    #[test]
    fn test_selection_delete_bypasses_marker_protection() {
        let mut ed = DescriptionEditor::new("a*b");
        ed.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT));
        ed.handle_key(key(KeyCode::Backspace));
        assert_eq!(ed.text(), "a*");
    }

    #[test]
    fn test_bullet_toggle_on_current_line() {
        let mut ed = DescriptionEditor::new("task");
        ed.handle_key(ctrl('l'));
        assert_eq!(ed.text(), "- task");
        ed.handle_key(ctrl('l'));
        assert_eq!(ed.text(), "task");
    }

    #[test]
    fn test_vertical_movement_keeps_column() {
        let mut ed = DescriptionEditor::new("abcd\nxy");
        // Caret ends at the end of "xy" (col 2).
        ed.handle_key(key(KeyCode::Up));
        ed.handle_key(key(KeyCode::Char('!')));
        assert_eq!(ed.text(), "ab!cd\nxy");
    }

    #[test]
    fn test_save_and_cancel_actions() {
        let mut ed = DescriptionEditor::new("x");
        assert_eq!(ed.handle_key(ctrl('s')), EditorAction::Save);
        assert_eq!(ed.handle_key(key(KeyCode::Esc)), EditorAction::Cancel);
    }
}
