//! Board file storage.
//!
//! Each calendar date gets its own JSON file, `<YYYY-MM-DD>.json`, inside
//! the dayboard directory. Loads that fail to parse degrade to a fresh
//! board with a warning so a damaged file never blocks the tool.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::board::Board;

/// Path of the board file for a date.
pub fn board_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{date}.json"))
}

/// Load the board stored at `path`, or a fresh board for `date` if the
/// file is missing or unreadable.
pub fn load_board(path: &Path, date: NaiveDate) -> Board {
    if !path.exists() {
        return Board::new(date);
    }
    let mut buf = String::new();
    match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
        Ok(_) => match serde_json::from_str(&buf) {
            Ok(board) => board,
            Err(e) => {
                eprintln!("Error parsing board file, starting fresh: {e}");
                Board::new(date)
            }
        },
        Err(e) => {
            eprintln!("Error reading board file, starting fresh: {e}");
            Board::new(date)
        }
    }
}

/// Save a board using an atomic write (temp file + rename).
pub fn save_board(board: &Board, path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    let data = serde_json::to_string_pretty(board).unwrap();
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Dates that have a board file in the dayboard directory, ascending.
pub fn discover_dates(dir: &Path) -> std::io::Result<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    if !dir.exists() {
        return Ok(dates);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
            dates.push(date);
        }
    }
    dates.sort();
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dayboard-test-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = temp_dir("roundtrip");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut board = Board::new(date);
        board
            .add_card("write report", "with *markup*", "todo", vec!["work".into()], Utc::now())
            .unwrap();
        let path = board_path(&dir, date);
        save_board(&board, &path).unwrap();
        let loaded = load_board(&path, date);
        assert_eq!(loaded.date, date);
        assert_eq!(loaded.cards.len(), 1);
        assert_eq!(loaded.cards[0].description, "with *markup*");
        assert_eq!(loaded.cards[0].movement_history.len(), 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_yields_fresh_board() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let board = load_board(Path::new("/nonexistent/board.json"), date);
        assert_eq!(board.date, date);
        assert!(board.cards.is_empty());
        assert_eq!(board.columns.len(), 3);
    }

    #[test]
    fn test_discover_dates_ignores_foreign_files() {
        let dir = temp_dir("discover");
        let date = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        save_board(&Board::new(date), &board_path(&dir, date)).unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();
        fs::write(dir.join("not-a-date.json"), "{}").unwrap();
        let dates = discover_dates(&dir).unwrap();
        assert_eq!(dates, vec![date]);
        fs::remove_dir_all(&dir).ok();
    }
}
