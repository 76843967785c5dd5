//! Kanban board interface.
//!
//! One ratatui column per board column, cards stacked inside. Moving a
//! card between columns goes through `Board::move_card`, so every move
//! lands in the card's movement history and the time reports stay
//! truthful. The detail popup renders descriptions in read mode; the
//! editor popup renders the live buffer in overlay mode.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::board::Board;
use crate::render::read_lines;
use crate::richtext::{collect_links, parse};
use crate::store::{load_board, save_board};
use crate::timetrack::{
    current_column_percentage, format_duration, time_breakdown, time_in_column,
    total_time_to_completion, DONE_COLUMN_ID,
};
use crate::tui::colors::{ACCENT, CARD_BG, DONE_GREEN};
use crate::tui::editor::{DescriptionEditor, EditorAction};
use crate::tui::input::InputField;

/// Which view currently has the keyboard.
enum Mode {
    Board,
    Detail,
    Edit(DescriptionEditor),
    AddCard(InputField),
    ConfirmDelete,
}

/// Main board application state.
pub struct BoardApp {
    board: Board,
    path: PathBuf,
    selected_column: usize,
    selected_card: usize,
    scroll_offsets: Vec<usize>,
    status_message: String,
    filter_active: bool,
    filter_text: String,
    mode: Mode,
    open_external: Box<dyn Fn(&str)>,
}

impl BoardApp {
    /// Load the board for a date and start on its first column.
    pub fn new(board_path: &Path, date: NaiveDate, open_external: Box<dyn Fn(&str)>) -> Self {
        let board = load_board(board_path, date);
        let column_count = board.columns.len();
        BoardApp {
            board,
            path: board_path.to_path_buf(),
            selected_column: 0,
            selected_card: 0,
            scroll_offsets: vec![0; column_count],
            status_message: String::new(),
            filter_active: false,
            filter_text: String::new(),
            mode: Mode::Board,
            open_external,
        }
    }

    /// Column IDs in display order.
    fn column_ids(&self) -> Vec<String> {
        self.board
            .columns_ordered()
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }

    /// Card IDs visible in a column after the text filter.
    fn visible_cards(&self, column_id: &str) -> Vec<u64> {
        self.board
            .cards_in_column(column_id)
            .into_iter()
            .filter(|&id| {
                if self.filter_text.is_empty() {
                    return true;
                }
                let filter = self.filter_text.to_lowercase();
                self.board.get(id).is_some_and(|card| {
                    card.title.to_lowercase().contains(&filter)
                        || card.tags.iter().any(|t| t.to_lowercase().contains(&filter))
                })
            })
            .collect()
    }

    /// The card currently under the cursor.
    fn selected_card_id(&self) -> Option<u64> {
        let ids = self.column_ids();
        let column_id = ids.get(self.selected_column)?;
        self.visible_cards(column_id)
            .get(self.selected_card)
            .copied()
    }

    /// Keep the selection inside the visible card range.
    fn clamp_selection(&mut self) {
        let ids = self.column_ids();
        if self.selected_column >= ids.len() {
            self.selected_column = 0;
        }
        self.scroll_offsets.resize(ids.len(), 0);
        let count = ids
            .get(self.selected_column)
            .map(|id| self.visible_cards(id).len())
            .unwrap_or(0);
        if count == 0 {
            self.selected_card = 0;
            self.scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= count {
            self.selected_card = count - 1;
        }
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn save(&mut self) {
        if let Err(e) = save_board(&self.board, &self.path) {
            self.set_status_message(format!("Error saving: {e}"));
        }
    }

    /// Move the selected card one column left or right.
    fn move_selected_card(&mut self, right: bool) {
        let ids = self.column_ids();
        let Some(card_id) = self.selected_card_id() else {
            return;
        };
        let target = if right {
            self.selected_column + 1
        } else if self.selected_column == 0 {
            return;
        } else {
            self.selected_column - 1
        };
        let Some(target_id) = ids.get(target) else {
            return;
        };
        match self.board.move_card(card_id, target_id, Utc::now()) {
            Ok(()) => {
                self.save();
                self.set_status_message(format!(
                    "Moved card to {}",
                    self.board.column_name(target_id)
                ));
                self.selected_column = target;
                // Follow the card into its new column.
                if let Some(pos) = self
                    .visible_cards(target_id)
                    .iter()
                    .position(|&id| id == card_id)
                {
                    self.selected_card = pos;
                } else {
                    self.clamp_selection();
                }
            }
            Err(e) => self.set_status_message(format!("{e}")),
        }
    }

    /// Toggle the first unchecked checklist item on the selected card.
    fn toggle_checklist(&mut self) {
        let Some(card_id) = self.selected_card_id() else {
            return;
        };
        let next = self.board.get(card_id).and_then(|card| {
            card.checklist
                .iter()
                .find(|i| !i.done)
                .map(|i| (i.id, i.text.clone()))
        });
        match next {
            Some((item_id, text)) => {
                let _ = self.board.toggle_checklist_item(card_id, item_id);
                self.save();
                self.set_status_message(format!("Checked off: {text}"));
            }
            None => self.set_status_message("No open checklist items".to_string()),
        }
    }

    /// Handle keyboard input. Returns true when the app should exit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if !event::poll(Duration::from_millis(50))? {
            return Ok(false);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(false);
        };

        match &mut self.mode {
            Mode::Edit(editor) => {
                match editor.handle_key(key) {
                    EditorAction::Continue => {}
                    EditorAction::Cancel => {
                        self.mode = Mode::Board;
                        self.set_status_message("Edit cancelled".to_string());
                    }
                    EditorAction::Save => {
                        let text = editor.text().to_string();
                        if let Some(card_id) = self.selected_card_id() {
                            if let Some(card) = self.board.get_mut(card_id) {
                                card.description = text;
                            }
                            self.save();
                        }
                        self.mode = Mode::Board;
                        self.set_status_message("Description saved".to_string());
                    }
                }
                return Ok(false);
            }
            Mode::AddCard(field) => {
                match key.code {
                    KeyCode::Esc => self.mode = Mode::Board,
                    KeyCode::Enter => {
                        let title = field.value.trim().to_string();
                        if !title.is_empty() {
                            let ids = self.column_ids();
                            let column_id = ids
                                .get(self.selected_column)
                                .cloned()
                                .unwrap_or_else(|| "todo".to_string());
                            match self.board.add_card(&title, "", &column_id, vec![], Utc::now())
                            {
                                Ok(id) => {
                                    self.save();
                                    self.set_status_message(format!("Added card {id}"));
                                }
                                Err(e) => self.set_status_message(format!("{e}")),
                            }
                        }
                        self.mode = Mode::Board;
                    }
                    KeyCode::Backspace => field.handle_backspace(),
                    KeyCode::Delete => field.handle_delete(),
                    KeyCode::Left => field.move_cursor_left(),
                    KeyCode::Right => field.move_cursor_right(),
                    KeyCode::Char(c) => field.handle_char(c),
                    _ => {}
                }
                return Ok(false);
            }
            Mode::ConfirmDelete => {
                if let KeyCode::Char('y') = key.code {
                    if let Some(card_id) = self.selected_card_id() {
                        if let Ok(card) = self.board.remove_card(card_id) {
                            self.save();
                            self.set_status_message(format!("Deleted: {}", card.title));
                        }
                        self.clamp_selection();
                    }
                }
                self.mode = Mode::Board;
                return Ok(false);
            }
            Mode::Detail => {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Board,
                    KeyCode::Char(c @ '1'..='9') => self.open_link(c as usize - '1' as usize),
                    _ => {}
                }
                return Ok(false);
            }
            Mode::Board => {}
        }

        // Filter mode: typed chars narrow the board live until Enter
        // applies or Esc clears.
        if self.filter_active {
            match key.code {
                KeyCode::Esc => {
                    self.filter_active = false;
                    self.filter_text.clear();
                    self.clamp_selection();
                    self.clear_status_message();
                }
                KeyCode::Enter => {
                    self.filter_active = false;
                    if self.filter_text.is_empty() {
                        self.set_status_message("Filter cleared".to_string());
                    }
                }
                KeyCode::Backspace => {
                    self.filter_text.pop();
                    self.clamp_selection();
                }
                KeyCode::Char(c) => {
                    self.filter_text.push(c);
                    self.clamp_selection();
                }
                _ => {}
            }
            return Ok(false);
        }

        self.clear_status_message();

        match key.code {
            KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Esc => return Ok(true),

            KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selected_card(false);
            }
            KeyCode::Right if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selected_card(true);
            }

            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column + 1 < self.column_ids().len() {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => {
                if self.selected_card > 0 {
                    self.selected_card -= 1;
                }
            }
            KeyCode::Down => {
                let ids = self.column_ids();
                let count = ids
                    .get(self.selected_column)
                    .map(|id| self.visible_cards(id).len())
                    .unwrap_or(0);
                if count > 0 && self.selected_card + 1 < count {
                    self.selected_card += 1;
                }
            }

            KeyCode::Enter => {
                if self.selected_card_id().is_some() {
                    self.mode = Mode::Detail;
                }
            }
            KeyCode::Char('e') => {
                if let Some(card_id) = self.selected_card_id() {
                    if let Some(card) = self.board.get(card_id) {
                        self.mode = Mode::Edit(DescriptionEditor::new(&card.description));
                    }
                }
            }
            KeyCode::Char('a') => self.mode = Mode::AddCard(InputField::new()),
            KeyCode::Char('x') => {
                if self.selected_card_id().is_some() {
                    self.mode = Mode::ConfirmDelete;
                    self.set_status_message("Delete selected card? y/n".to_string());
                }
            }
            KeyCode::Char('c') => self.toggle_checklist(),
            KeyCode::Char('/') => {
                self.filter_active = true;
                self.set_status_message(
                    "Filter: type to search title/tags, Enter to apply, Esc to cancel".to_string(),
                );
            }
            KeyCode::Char('h') => {
                self.set_status_message(
                    "Enter: Details | e: Edit | a: Add | x: Delete | c: Check | ^←/→: Move card | /: Filter | Esc: Exit"
                        .to_string(),
                );
            }
            _ => {}
        }
        Ok(false)
    }

    /// Open the nth link of the selected card's description.
    fn open_link(&mut self, index: usize) {
        let Some(card_id) = self.selected_card_id() else {
            return;
        };
        let Some(card) = self.board.get(card_id) else {
            return;
        };
        let links = collect_links(&parse(&card.description));
        match links.get(index) {
            Some(url) => {
                (self.open_external)(url);
                self.set_status_message(format!("Opened {url}"));
            }
            None => self.set_status_message("No such link".to_string()),
        }
    }

    /// Render the whole frame.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        match &mut self.mode {
            Mode::Detail => self.render_detail_popup(f),
            Mode::Edit(_) => self.render_editor_popup(f),
            Mode::AddCard(_) => self.render_add_popup(f),
            _ => {}
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let card_count = self.board.cards.len();
        let header_text = vec![Line::from(vec![
            Span::styled(
                format!("DAYBOARD {}", self.board.date),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{card_count} cards"),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            ),
        ])];
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let ids = self.column_ids();
        if ids.is_empty() {
            return;
        }
        let constraints: Vec<Constraint> = (0..ids.len())
            .map(|_| Constraint::Percentage(100 / ids.len() as u16))
            .collect();
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (i, column_id) in ids.iter().enumerate() {
            self.render_column(f, columns_layout[i], i, column_id);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, column_index: usize, column_id: &str) {
        let is_selected = column_index == self.selected_column;
        let border_style = if is_selected {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let title = self.board.column_name(column_id);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let cards = self.visible_cards(column_id);
        if cards.is_empty() {
            return;
        }

        let card_height = 4usize;
        let available_height = inner.height as usize;
        let visible_count = (available_height / card_height).max(1);

        // Keep the selected card inside the viewport. The stored offset
        // can point past the end after the filter shrinks a column, so
        // clamp before use.
        if is_selected {
            let start = self.scroll_offsets[column_index];
            let end = start + visible_count;
            if self.selected_card < start {
                self.scroll_offsets[column_index] = self.selected_card;
            } else if self.selected_card >= end {
                self.scroll_offsets[column_index] = self.selected_card - visible_count + 1;
            }
        }
        let scroll_offset = self.scroll_offsets[column_index].min(cards.len() - 1);

        let now = Utc::now();
        let mut current_y = 0;
        let mut rendered = 0;
        for (card_index, &card_id) in cards.iter().enumerate().skip(scroll_offset) {
            let Some(card) = self.board.get(card_id) else {
                continue;
            };
            if current_y + card_height > available_height {
                break;
            }
            let card_area = Rect {
                x: inner.x,
                y: inner.y + current_y as u16,
                width: inner.width,
                height: card_height as u16,
            };
            let card_selected = is_selected && card_index == self.selected_card;

            let style = if card_selected {
                Style::default()
                    .bg(ACCENT)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else if card.column_id == DONE_COLUMN_ID {
                Style::default().bg(DONE_GREEN)
            } else {
                Style::default().bg(CARD_BG)
            };

            let checks_done = card.checklist.iter().filter(|i| i.done).count();
            let mut meta = format_duration(time_in_column(card, &card.column_id, now));
            if !card.checklist.is_empty() {
                meta.push_str(&format!("  {}/{}", checks_done, card.checklist.len()));
            }
            if !card.tags.is_empty() {
                meta.push_str(&format!("  #{}", card.tags.len()));
            }

            let card_text = vec![
                Line::from(format!("#{} {}", card.id, card.title)),
                Line::from(meta),
            ];
            let card_block = Paragraph::new(card_text)
                .block(Block::default().borders(Borders::ALL))
                .style(style)
                .wrap(Wrap { trim: true });
            f.render_widget(card_block, card_area);

            current_y += card_height;
            rendered += 1;
        }

        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{scroll_offset} above"))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y,
                    width: inner.width,
                    height: 1,
                },
            );
        }
        let remaining = cards.len() - scroll_offset - rendered;
        if remaining > 0 && inner.height > 0 {
            let indicator = Paragraph::new(format!("▼ +{remaining} below"))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y + inner.height - 1,
                    width: inner.width,
                    height: 1,
                },
            );
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if self.filter_active {
            format!(
                "Filter: {} | Type to search, Enter to apply, Esc to cancel",
                self.filter_text
            )
        } else if let Mode::Edit(editor) = &self.mode {
            editor.status_line()
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let filter_indicator = if self.filter_text.is_empty() {
                String::new()
            } else {
                format!(" [Filter: {}]", self.filter_text)
            };
            format!(
                "{} cards{} | Enter: Details | e: Edit | a: Add | /: Filter | h: Help",
                self.board.cards.len(),
                filter_indicator
            )
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(ACCENT).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Centered popup rect covering a share of the screen.
    fn popup_area(f: &Frame, percent: u16) -> Rect {
        let area = f.area();
        let width = (area.width * percent) / 100;
        let height = (area.height * percent) / 100;
        let x = (area.width - width) / 2;
        let y = (area.height - height) / 2;
        Rect::new(x, y, width, height)
    }

    fn render_detail_popup(&self, f: &mut Frame) {
        let Some(card_id) = self.selected_card_id() else {
            return;
        };
        let Some(card) = self.board.get(card_id) else {
            return;
        };
        let popup_area = Self::popup_area(f, 80);
        f.render_widget(Clear, popup_area);

        let now = Utc::now();
        let mut lines = vec![
            Line::from(vec![Span::styled(
                format!("Card #{}: {}", card.id, card.title),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(format!(
                "Column:   {}",
                self.board.column_name(&card.column_id)
            )),
            Line::from(format!(
                "Created:  {}",
                card.created_date.format("%Y-%m-%d %H:%M")
            )),
            Line::from(format!(
                "Tags:     {}",
                if card.tags.is_empty() {
                    "-".to_string()
                } else {
                    card.tags.join(", ")
                }
            )),
        ];

        if !card.checklist.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("Checklist:"));
            for item in &card.checklist {
                lines.push(Line::from(format!(
                    "  [{}] {}",
                    if item.done { "x" } else { " " },
                    item.text
                )));
            }
        }

        let nodes = parse(&card.description);
        if !card.description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("Description:"));
            lines.extend(read_lines(&nodes));
        }

        let columns: Vec<_> = self.board.columns_ordered().into_iter().cloned().collect();
        lines.push(Line::from(""));
        lines.push(Line::from("Time:"));
        for row in time_breakdown(card, &columns, now) {
            lines.push(Line::from(format!(
                "  {:<14} {:<10} {:>6.2}%",
                row.name,
                format_duration(row.millis),
                row.percent
            )));
        }
        lines.push(Line::from(format!(
            "  Total {} | {}% of lifetime in current column",
            format_duration(total_time_to_completion(card, now)),
            current_column_percentage(card, now)
        )));

        let links = collect_links(&nodes);
        if !links.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("Links (press number to open):"));
            for (i, url) in links.iter().enumerate().take(9) {
                lines.push(Line::from(vec![
                    Span::raw(format!("  {}. ", i + 1)),
                    Span::styled(
                        url.clone(),
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                ]));
            }
        }

        let popup_block = Block::default()
            .borders(Borders::ALL)
            .title("Card Details (Enter to close)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
        let popup = Paragraph::new(lines)
            .block(popup_block)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    fn render_editor_popup(&mut self, f: &mut Frame) {
        let area = Self::popup_area(f, 80);
        let title = match self.selected_card_id().and_then(|id| self.board.get(id)) {
            Some(card) => format!("Edit description - #{} {}", card.id, card.title),
            None => "Edit description".to_string(),
        };
        if let Mode::Edit(editor) = &mut self.mode {
            editor.render(f, area, &title);
        }
    }

    fn render_add_popup(&self, f: &mut Frame) {
        let Mode::AddCard(field) = &self.mode else {
            return;
        };
        let area = f.area();
        let width = (area.width * 60) / 100;
        let popup_area = Rect::new(
            (area.width.saturating_sub(width)) / 2,
            (area.height / 2).saturating_sub(1),
            width,
            3,
        );
        f.render_widget(Clear, popup_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("New card title (Enter to add, Esc to cancel)");
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);
        f.render_widget(Paragraph::new(field.value.clone()), inner);
        let cursor_x = inner.x + field.value[..field.cursor].chars().count() as u16;
        f.set_cursor_position(ratatui::layout::Position::new(cursor_x, inner.y));
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
