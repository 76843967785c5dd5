//! # dayboard - daily kanban board for the terminal
//!
//! A personal kanban board organised by calendar date: every day gets its
//! own board of columns and cards, stored as plain JSON files.
//!
//! ## Key Features
//!
//! - **One board per day**: boards are keyed by date; `--date` selects
//!   which one to open (defaults to today)
//! - **Inline rich text**: card descriptions support a small marker
//!   dialect (`*bold*`, `_italic_`, `~underline~`, `~~strike~~`,
//!   `` `code` ``, fenced code blocks, `- ` bullets, bare URLs) parsed
//!   fresh on every render
//! - **Time in column**: each card carries an append-only movement log,
//!   and the time reports are computed from it on demand
//! - **Multiple Interfaces**: full CLI for scripting + interactive TUI
//!   with a marker-aware description editor
//! - **Local File Storage**: one JSON file per date under `~/.dayboard`
//!
//! ## Quick Start
//!
//! ```bash
//! # Open today's board in the TUI
//! dayboard ui
//!
//! # Add a card via CLI
//! dayboard add "Write the report" --desc "See *notes* first" --tag work
//!
//! # Where has card 3 been spending its time?
//! dayboard report 3
//! dayboard history 3
//! ```
//!
//! Data is stored locally in `~/.dayboard/` with each date as a separate
//! JSON file. Source control or back up that folder as you see fit.

use std::path::PathBuf;

use chrono::Local;
use clap::Parser;

pub mod board;
pub mod cli;
pub mod cmd;
pub mod edit;
pub mod render;
pub mod richtext;
pub mod store;
pub mod timetrack;
pub mod tui {
    pub mod board;
    pub mod colors;
    pub mod editor;
    pub mod input;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use store::{board_path, load_board};

fn main() {
    let cli = Cli::parse();

    // Completions don't need a board directory at all.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    // Determine the board directory.
    let dir = cli.dir.clone().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".dayboard")
    });
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Failed to create board directory {}: {}", dir.display(), e);
        std::process::exit(1);
    }

    if let Commands::Dates = &cli.command {
        cmd_dates(&dir);
        return;
    }

    // Resolve the board date, defaulting to today.
    let date = match cli.date.as_deref() {
        None => Local::now().date_naive(),
        Some(s) => match parse_date_input(s) {
            Some(d) => d,
            None => {
                eprintln!("Unrecognised date: {s}");
                std::process::exit(1);
            }
        },
    };

    let path = board_path(&dir, date);
    let mut board = load_board(&path, date);

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),
        Commands::Dates => unreachable!("dates handled above"),

        Commands::Ui => cmd_ui(&path, date),

        Commands::Add {
            title,
            desc,
            column,
            tags,
            checks,
        } => cmd_add(&mut board, &path, title, desc, column, tags, checks),

        Commands::List { column, tag } => cmd_list(&board, column, tag),

        Commands::View { id } => cmd_view(&board, id),

        Commands::Move { id, column } => cmd_move(&mut board, &path, id, column),

        Commands::Report { id } => cmd_report(&board, id),

        Commands::History { id } => cmd_history(&board, id),

        Commands::Columns { action } => cmd_columns(&mut board, &path, action),
    }
}
