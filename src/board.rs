//! Board, column and card data structures.
//!
//! A board holds the cards for a single calendar date, organised into
//! columns. Every change of a card's location is recorded in its
//! movement history, which is the authoritative log the time tracking
//! functions compute from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A kanban board for one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub date: NaiveDate,
    pub columns: Vec<Column>,
    pub cards: Vec<Card>,
}

/// A single column on the board.
///
/// Static columns are the built-in To Do / Doing / Done set; they cannot
/// be removed. User-created columns are appended after them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub position: u32,
    pub is_static: bool,
}

/// A work item living in exactly one column of its board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    pub title: String,
    /// Marked-up text fed to the rich text parser on every render.
    #[serde(default)]
    pub description: String,
    pub column_id: String,
    pub created_date: DateTime<Utc>,
    /// Append-only log of location changes. The first entry has an empty
    /// `from_column_id` (card creation) and the last entry's
    /// `to_column_id` matches `column_id`. A card whose `column_id` has
    /// no open entry in this log is outside the model's contract.
    #[serde(default)]
    pub movement_history: Vec<CardMovement>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}

/// One atomic column transition. An empty `from_column_id` denotes card
/// creation rather than a real source column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardMovement {
    pub id: u64,
    pub from_column_id: String,
    pub to_column_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A checklist entry on a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: u64,
    pub text: String,
    pub done: bool,
}

/// Errors raised by board mutations.
#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error("card not found: {0}")]
    CardNotFound(u64),
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("column {0} still holds cards")]
    ColumnNotEmpty(String),
    #[error("column {0} is built-in and cannot be removed")]
    StaticColumn(String),
}

impl Board {
    /// Create an empty board for a date with the default column set.
    pub fn new(date: NaiveDate) -> Self {
        Board {
            date,
            columns: default_columns(),
            cards: Vec::new(),
        }
    }

    /// Generate the next available card ID.
    pub fn next_card_id(&self) -> u64 {
        self.cards.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    /// Get a card by ID.
    pub fn get(&self, id: u64) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Get a mutable reference to a card by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    /// Get a column by ID.
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Resolve a column ID to its display name, falling back to the raw ID
    /// for columns that no longer exist.
    pub fn column_name(&self, id: &str) -> String {
        self.column(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Columns in display order.
    pub fn columns_ordered(&self) -> Vec<&Column> {
        let mut cols: Vec<&Column> = self.columns.iter().collect();
        cols.sort_by_key(|c| c.position);
        cols
    }

    /// Card IDs in a column, in insertion order.
    pub fn cards_in_column(&self, column_id: &str) -> Vec<u64> {
        self.cards
            .iter()
            .filter(|c| c.column_id == column_id)
            .map(|c| c.id)
            .collect()
    }

    /// Create a card in the given column and seed its movement history
    /// with the creation entry. Returns the new card's ID.
    pub fn add_card(
        &mut self,
        title: &str,
        description: &str,
        column_id: &str,
        tags: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<u64, BoardError> {
        if self.column(column_id).is_none() {
            return Err(BoardError::ColumnNotFound(column_id.to_string()));
        }
        let id = self.next_card_id();
        let card = Card {
            id,
            title: title.to_string(),
            description: description.to_string(),
            column_id: column_id.to_string(),
            created_date: now,
            movement_history: vec![CardMovement {
                id: 1,
                from_column_id: String::new(),
                to_column_id: column_id.to_string(),
                timestamp: now,
            }],
            tags,
            checklist: Vec::new(),
        };
        self.cards.push(card);
        Ok(id)
    }

    /// Move a card to another column, appending the transition to its
    /// movement history. Moving a card onto its current column is
    /// accepted and recorded like any other transition.
    pub fn move_card(
        &mut self,
        card_id: u64,
        to_column_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        if self.column(to_column_id).is_none() {
            return Err(BoardError::ColumnNotFound(to_column_id.to_string()));
        }
        let card = self
            .get_mut(card_id)
            .ok_or(BoardError::CardNotFound(card_id))?;
        let movement_id = card
            .movement_history
            .iter()
            .map(|m| m.id)
            .max()
            .unwrap_or(0)
            + 1;
        card.movement_history.push(CardMovement {
            id: movement_id,
            from_column_id: card.column_id.clone(),
            to_column_id: to_column_id.to_string(),
            timestamp: now,
        });
        card.column_id = to_column_id.to_string();
        Ok(())
    }

    /// Remove a card entirely.
    pub fn remove_card(&mut self, card_id: u64) -> Result<Card, BoardError> {
        let idx = self
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(BoardError::CardNotFound(card_id))?;
        Ok(self.cards.remove(idx))
    }

    /// Append a user column after the existing ones. Returns the new
    /// column's ID, derived from the name.
    pub fn add_column(&mut self, name: &str) -> String {
        let mut id = slugify(name);
        // Disambiguate against existing IDs.
        let mut n = 1;
        while self.column(&id).is_some() {
            n += 1;
            id = format!("{}-{}", slugify(name), n);
        }
        let position = self
            .columns
            .iter()
            .map(|c| c.position)
            .max()
            .map(|p| p + 1)
            .unwrap_or(0);
        self.columns.push(Column {
            id: id.clone(),
            name: name.to_string(),
            position,
            is_static: false,
        });
        id
    }

    /// Rename a column. The ID is stable so historical movement records
    /// keep resolving to the new name.
    pub fn rename_column(&mut self, id: &str, name: &str) -> Result<(), BoardError> {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| BoardError::ColumnNotFound(id.to_string()))?;
        col.name = name.to_string();
        Ok(())
    }

    /// Remove a user column. Built-in columns and columns that still hold
    /// cards are refused.
    pub fn remove_column(&mut self, id: &str) -> Result<(), BoardError> {
        let col = self
            .column(id)
            .ok_or_else(|| BoardError::ColumnNotFound(id.to_string()))?;
        if col.is_static {
            return Err(BoardError::StaticColumn(id.to_string()));
        }
        if !self.cards_in_column(id).is_empty() {
            return Err(BoardError::ColumnNotEmpty(id.to_string()));
        }
        self.columns.retain(|c| c.id != id);
        Ok(())
    }

    /// Toggle a checklist item on a card.
    pub fn toggle_checklist_item(&mut self, card_id: u64, item_id: u64) -> Result<(), BoardError> {
        let card = self
            .get_mut(card_id)
            .ok_or(BoardError::CardNotFound(card_id))?;
        if let Some(item) = card.checklist.iter_mut().find(|i| i.id == item_id) {
            item.done = !item.done;
        }
        Ok(())
    }

    /// Add a checklist item to a card.
    pub fn add_checklist_item(&mut self, card_id: u64, text: &str) -> Result<(), BoardError> {
        let card = self
            .get_mut(card_id)
            .ok_or(BoardError::CardNotFound(card_id))?;
        let id = card.checklist.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        card.checklist.push(ChecklistItem {
            id,
            text: text.to_string(),
            done: false,
        });
        Ok(())
    }
}

/// The built-in column set every new board starts with.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column {
            id: "todo".into(),
            name: "To Do".into(),
            position: 0,
            is_static: true,
        },
        Column {
            id: "doing".into(),
            name: "Doing".into(),
            position: 1,
            is_static: true,
        },
        Column {
            id: "done".into(),
            name: "Done".into(),
            position: 2,
            is_static: true,
        },
    ]
}

/// Derive a column ID from a display name: lowercase, alphanumeric runs
/// joined by hyphens.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn board() -> Board {
        Board::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_add_card_seeds_creation_movement() {
        let mut b = board();
        let id = b.add_card("write report", "", "todo", vec![], at(10)).unwrap();
        let card = b.get(id).unwrap();
        assert_eq!(card.movement_history.len(), 1);
        assert_eq!(card.movement_history[0].from_column_id, "");
        assert_eq!(card.movement_history[0].to_column_id, "todo");
        assert_eq!(card.column_id, "todo");
    }

    #[test]
    fn test_move_card_appends_and_updates_location() {
        let mut b = board();
        let id = b.add_card("write report", "", "todo", vec![], at(10)).unwrap();
        b.move_card(id, "doing", at(20)).unwrap();
        b.move_card(id, "done", at(30)).unwrap();
        let card = b.get(id).unwrap();
        assert_eq!(card.movement_history.len(), 3);
        assert_eq!(card.column_id, "done");
        let last = card.movement_history.last().unwrap();
        assert_eq!(last.from_column_id, "doing");
        assert_eq!(last.to_column_id, card.column_id);
    }

    #[test]
    fn test_move_to_unknown_column_is_rejected() {
        let mut b = board();
        let id = b.add_card("t", "", "todo", vec![], at(0)).unwrap();
        assert!(matches!(
            b.move_card(id, "archive", at(1)),
            Err(BoardError::ColumnNotFound(_))
        ));
        assert_eq!(b.get(id).unwrap().movement_history.len(), 1);
    }

    #[test]
    fn test_static_columns_refuse_removal() {
        let mut b = board();
        assert!(matches!(
            b.remove_column("done"),
            Err(BoardError::StaticColumn(_))
        ));
    }

    #[test]
    fn test_user_column_lifecycle() {
        let mut b = board();
        let id = b.add_column("On Hold");
        assert_eq!(id, "on-hold");
        b.rename_column(&id, "Waiting").unwrap();
        assert_eq!(b.column_name(&id), "Waiting");
        b.remove_column(&id).unwrap();
        assert!(b.column(&id).is_none());
    }

    #[test]
    fn test_nonempty_column_refuses_removal() {
        let mut b = board();
        let col = b.add_column("Extra");
        b.add_card("t", "", &col, vec![], at(0)).unwrap();
        assert!(matches!(
            b.remove_column(&col),
            Err(BoardError::ColumnNotEmpty(_))
        ));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("On Hold"), "on-hold");
        assert_eq!(slugify("Q&A / Review"), "q-a-review");
        assert_eq!(slugify("  "), "");
    }
}
