//! Command implementations for the CLI interface.
//!
//! Command handlers operate on one board (the board for the selected
//! date), print plain tables, and save the board back when they mutate
//! it. The time figures all come from the `timetrack` functions with a
//! single `Utc::now()` read per command.

use std::path::Path;

use chrono::{Duration, Local, NaiveDate, Utc};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::board::Board;
use crate::cli::Cli;
use crate::richtext::{collect_links, parse};
use crate::store::{discover_dates, save_board};
use crate::timetrack::{
    current_column_percentage, format_duration, sorted_movements, time_breakdown, time_in_column,
    total_time_to_completion,
};
use crate::tui::run::run_board_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive board interface.
    Ui,

    /// Add a new card.
    Add {
        /// Short title for the card.
        title: String,
        /// Description, may contain inline markup.
        #[arg(long)]
        desc: Option<String>,
        /// Column to create the card in.
        #[arg(long, default_value = "todo")]
        column: String,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Checklist entry. May be repeated.
        #[arg(long = "check")]
        checks: Vec<String>,
    },

    /// List cards with optional filters.
    List {
        /// Filter by column ID.
        #[arg(long)]
        column: Option<String>,
        /// Filter by tag.
        #[arg(long)]
        tag: Option<String>,
    },

    /// View a single card.
    View {
        /// Card ID to view.
        id: u64,
    },

    /// Move a card to another column.
    Move {
        /// Card ID to move.
        id: u64,
        /// Destination column ID.
        column: String,
    },

    /// Show the per-column time report for a card.
    Report {
        /// Card ID to report on.
        id: u64,
    },

    /// Show the chronological movement log for a card.
    History {
        /// Card ID to inspect.
        id: u64,
    },

    /// List or manage board columns.
    Columns {
        #[command(subcommand)]
        action: Option<ColumnAction>,
    },

    /// List dates that have a board file.
    Dates,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ColumnAction {
    /// Add a column after the existing ones.
    Add { name: String },
    /// Rename a column; its ID and history stay intact.
    Rename { id: String, name: String },
    /// Remove an empty, non-built-in column.
    Remove { id: String },
}

/// Parse the --date argument. Accepts ISO dates and a few relative words.
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();
    match s.as_str() {
        "today" => return Some(today),
        "yesterday" => return Some(today - Duration::days(1)),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Normalize a tag string by trimming, lowercasing, and replacing spaces
/// with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalize each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

fn save_or_exit(board: &Board, path: &Path) {
    if let Err(e) = save_board(board, path) {
        eprintln!("Failed to save board: {e}");
        std::process::exit(1);
    }
}

/// Launch the board terminal user interface.
pub fn cmd_ui(board_path: &Path, date: NaiveDate) {
    if let Err(e) = run_board_tui(board_path, date) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Add a new card to the board.
pub fn cmd_add(
    board: &mut Board,
    board_path: &Path,
    title: String,
    desc: Option<String>,
    column: String,
    tags: Vec<String>,
    checks: Vec<String>,
) {
    let tags = split_and_normalise_tags(&tags);
    let now = Utc::now();
    let id = match board.add_card(&title, desc.as_deref().unwrap_or(""), &column, tags, now) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    for check in checks {
        // The card was just created, so this cannot fail.
        let _ = board.add_checklist_item(id, &check);
    }
    save_or_exit(board, board_path);
    println!("Added card {id}");
}

/// List cards with optional filtering.
pub fn cmd_list(board: &Board, column: Option<String>, tag: Option<String>) {
    let now = Utc::now();
    let tag = tag.map(|t| normalise_tag(&t));
    println!(
        "{:<5} {:<12} {:<10} {}",
        "ID", "Column", "In column", "Title [tags]"
    );
    for col in board.columns_ordered() {
        if let Some(ref wanted) = column {
            if &col.id != wanted {
                continue;
            }
        }
        for id in board.cards_in_column(&col.id) {
            let Some(card) = board.get(id) else { continue };
            if let Some(ref t) = tag {
                if !card.tags.contains(t) {
                    continue;
                }
            }
            let tags = if card.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", card.tags.join(","))
            };
            println!(
                "{:<5} {:<12} {:<10} {}{}",
                card.id,
                truncate(&col.name, 12),
                format_duration(time_in_column(card, &card.column_id, now)),
                card.title,
                tags
            );
        }
    }
}

/// View a single card in full.
pub fn cmd_view(board: &Board, id: u64) {
    let Some(card) = board.get(id) else {
        eprintln!("Card {id} not found");
        std::process::exit(1);
    };
    println!("Card {}: {}", card.id, card.title);
    println!("Column:   {}", board.column_name(&card.column_id));
    println!("Created:  {}", card.created_date.format("%Y-%m-%d %H:%M"));
    println!(
        "Tags:     {}",
        if card.tags.is_empty() {
            "-".to_string()
        } else {
            card.tags.join(", ")
        }
    );
    if !card.checklist.is_empty() {
        println!("Checklist:");
        for item in &card.checklist {
            println!("  [{}] {}", if item.done { "x" } else { " " }, item.text);
        }
    }
    if !card.description.is_empty() {
        println!("Description:");
        for line in card.description.lines() {
            println!("  {line}");
        }
        let links = collect_links(&parse(&card.description));
        if !links.is_empty() {
            println!("Links:");
            for (i, url) in links.iter().enumerate() {
                println!("  {}. {url}", i + 1);
            }
        }
    }
}

/// Move a card to another column, recording the transition.
pub fn cmd_move(board: &mut Board, board_path: &Path, id: u64, column: String) {
    match board.move_card(id, &column, Utc::now()) {
        Ok(()) => {
            save_or_exit(board, board_path);
            println!("Moved card {id} to {}", board.column_name(&column));
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Print the per-column time report for a card.
pub fn cmd_report(board: &Board, id: u64) {
    let Some(card) = board.get(id) else {
        eprintln!("Card {id} not found");
        std::process::exit(1);
    };
    let now = Utc::now();
    let columns: Vec<_> = board.columns_ordered().into_iter().cloned().collect();
    println!("Time report for card {}: {}", card.id, card.title);
    println!("{:<16} {:<10} {:>8}", "Column", "Time", "Share");
    for row in time_breakdown(card, &columns, now) {
        println!(
            "{:<16} {:<10} {:>7.2}%",
            truncate(&row.name, 16),
            format_duration(row.millis),
            row.percent
        );
    }
    println!(
        "Total:           {}",
        format_duration(total_time_to_completion(card, now))
    );
    println!(
        "Current column:  {}% of lifetime",
        current_column_percentage(card, now)
    );
}

/// Print the chronological movement log for a card.
pub fn cmd_history(board: &Board, id: u64) {
    let Some(card) = board.get(id) else {
        eprintln!("Card {id} not found");
        std::process::exit(1);
    };
    println!("Movement history for card {}: {}", card.id, card.title);
    for movement in sorted_movements(card) {
        let from = if movement.from_column_id.is_empty() {
            "(created)".to_string()
        } else {
            board.column_name(&movement.from_column_id)
        };
        println!(
            "{}  {} → {}",
            movement.timestamp.format("%Y-%m-%d %H:%M:%S"),
            from,
            board.column_name(&movement.to_column_id)
        );
    }
}

/// List or manage the board's columns.
pub fn cmd_columns(board: &mut Board, board_path: &Path, action: Option<ColumnAction>) {
    match action {
        None => {
            println!("{:<4} {:<12} {:<16} {:<7} {}", "Pos", "ID", "Name", "Cards", "");
            for col in board.columns_ordered() {
                println!(
                    "{:<4} {:<12} {:<16} {:<7} {}",
                    col.position,
                    col.id,
                    truncate(&col.name, 16),
                    board.cards_in_column(&col.id).len(),
                    if col.is_static { "built-in" } else { "" }
                );
            }
        }
        Some(ColumnAction::Add { name }) => {
            let id = board.add_column(&name);
            save_or_exit(board, board_path);
            println!("Added column {id}");
        }
        Some(ColumnAction::Rename { id, name }) => match board.rename_column(&id, &name) {
            Ok(()) => {
                save_or_exit(board, board_path);
                println!("Renamed column {id} to {name}");
            }
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        Some(ColumnAction::Remove { id }) => match board.remove_column(&id) {
            Ok(()) => {
                save_or_exit(board, board_path);
                println!("Removed column {id}");
            }
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}

/// List all dates that have a board file.
pub fn cmd_dates(dir: &Path) {
    match discover_dates(dir) {
        Ok(dates) => {
            let today = Local::now().date_naive();
            for date in dates {
                if date == today {
                    println!("{date}  (today)");
                } else {
                    println!("{date}");
                }
            }
        }
        Err(e) => {
            eprintln!("Failed to read board directory: {e}");
            std::process::exit(1);
        }
    }
}

/// Generate shell completion scripts on stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "dayboard", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_input() {
        assert_eq!(
            parse_date_input("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(parse_date_input("today").is_some());
        assert!(parse_date_input("not a date").is_none());
    }

    #[test]
    fn test_split_and_normalise_tags() {
        assert_eq!(
            split_and_normalise_tags(&["Work, Home".to_string(), "deep work".to_string()]),
            vec!["deep-work".to_string(), "home".to_string(), "work".to_string()]
        );
    }
}
