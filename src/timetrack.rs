//! Time-in-column computation over card movement logs.
//!
//! Every function is a pure computation over a [`Card`] value; the wall
//! clock is passed in as `now` so callers read it once per report and
//! tests stay deterministic. Durations are milliseconds.
//!
//! The movement log is re-sorted defensively before accumulation.
//! Malformed histories (unmatched entries, duplicated entries into the
//! same column) degrade to under- or over-counted totals rather than
//! errors; in particular a second consecutive entry into a column
//! overwrites the still-open interval. That is deliberate, documented
//! behavior.

use chrono::{DateTime, Utc};

use crate::board::{Card, CardMovement, Column};

/// Identifier of the terminal column; reaching it completes a card.
pub const DONE_COLUMN_ID: &str = "done";

/// One row of a per-column time breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTime {
    pub column_id: String,
    pub name: String,
    pub millis: i64,
    /// Share of the card's total lifetime, rounded to 2 decimals.
    pub percent: f64,
}

/// The movement log sorted ascending by timestamp, for chronological
/// display. Does not mutate the card.
pub fn sorted_movements(card: &Card) -> Vec<CardMovement> {
    let mut movements = card.movement_history.clone();
    movements.sort_by_key(|m| m.timestamp);
    movements
}

/// Total milliseconds the card has spent in `column_id`.
///
/// Sums the closed intervals between entering and leaving the column;
/// if the card sits there right now, the open interval is extended to
/// `now`. Zero if the column was never visited.
pub fn time_in_column(card: &Card, column_id: &str, now: DateTime<Utc>) -> i64 {
    let mut total = 0i64;
    let mut entry_time: Option<DateTime<Utc>> = None;
    for movement in sorted_movements(card) {
        if movement.to_column_id == column_id {
            // Re-entry without an exit overwrites the open interval.
            entry_time = Some(movement.timestamp);
        } else if movement.from_column_id == column_id {
            if let Some(entered) = entry_time.take() {
                total += (movement.timestamp - entered).num_milliseconds();
            }
        }
    }
    if card.column_id == column_id {
        if let Some(entered) = entry_time {
            total += (now - entered).num_milliseconds();
        }
    }
    total.max(0)
}

/// Milliseconds from creation to the first arrival in the done column,
/// or elapsed-so-far for cards that have not reached it.
pub fn total_time_to_completion(card: &Card, now: DateTime<Utc>) -> i64 {
    let completed = sorted_movements(card)
        .into_iter()
        .find(|m| m.to_column_id == DONE_COLUMN_ID);
    let end = completed.map(|m| m.timestamp).unwrap_or(now);
    (end - card.created_date).num_milliseconds().max(0)
}

/// Time and lifetime share per column, in the order of the supplied
/// column list. Columns missing from the list are dropped from the
/// breakdown even if the movement history references them.
pub fn time_breakdown(card: &Card, columns: &[Column], now: DateTime<Utc>) -> Vec<ColumnTime> {
    let total = total_time_to_completion(card, now);
    let denominator = if total == 0 { 1 } else { total };
    columns
        .iter()
        .map(|column| {
            let millis = time_in_column(card, &column.id, now);
            let percent = (millis as f64 * 100.0 / denominator as f64 * 100.0).round() / 100.0;
            ColumnTime {
                column_id: column.id.clone(),
                name: column.name.clone(),
                millis,
                percent,
            }
        })
        .collect()
}

/// Whole-number percentage of the card's lifetime spent in its current
/// column.
pub fn current_column_percentage(card: &Card, now: DateTime<Utc>) -> i64 {
    let total = total_time_to_completion(card, now).max(1);
    let in_current = time_in_column(card, &card.column_id, now);
    (in_current as f64 * 100.0 / total as f64).round() as i64
}

/// Human duration: largest unit with at most one sub-unit, trailing zero
/// sub-units omitted.
pub fn format_duration(ms: i64) -> String {
    if ms < 0 {
        return "0m".to_string();
    }
    if ms == 0 {
        return "0s".to_string();
    }
    let secs = ms / 1000;
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    if days > 0 {
        if hours > 0 {
            format!("{days}d {hours}h")
        } else {
            format!("{days}d")
        }
    } else if hours > 0 {
        if minutes > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h")
        }
    } else if minutes > 0 {
        if seconds > 0 {
            format!("{minutes}m {seconds}s")
        } else {
            format!("{minutes}m")
        }
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use chrono::{NaiveDate, TimeZone};

    const HOUR: i64 = 3_600_000;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    /// todo at t=0, doing at t=1h, done at t=3h.
    fn finished_card() -> Card {
        let mut board = Board::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let id = board.add_card("t", "", "todo", vec![], at(0)).unwrap();
        board.move_card(id, "doing", at(HOUR)).unwrap();
        board.move_card(id, "done", at(3 * HOUR)).unwrap();
        board.get(id).unwrap().clone()
    }

    #[test]
    fn test_time_in_column_sums_closed_intervals() {
        let card = finished_card();
        let now = at(10 * HOUR);
        assert_eq!(time_in_column(&card, "todo", now), HOUR);
        assert_eq!(time_in_column(&card, "doing", now), 2 * HOUR);
        assert_eq!(time_in_column(&card, "never", now), 0);
    }

    #[test]
    fn test_time_in_current_column_extends_to_now() {
        let card = finished_card();
        assert_eq!(time_in_column(&card, "done", at(5 * HOUR)), 2 * HOUR);
    }

    #[test]
    fn test_open_interval_ignored_for_non_current_column() {
        let mut card = finished_card();
        // Pretend the card left "done" without a record of where it went.
        card.column_id = "todo".to_string();
        assert_eq!(time_in_column(&card, "done", at(5 * HOUR)), 0);
    }

    #[test]
    fn test_unsorted_history_is_resorted_before_accumulation() {
        let mut card = finished_card();
        card.movement_history.reverse();
        assert_eq!(time_in_column(&card, "doing", at(10 * HOUR)), 2 * HOUR);
    }

    #[test]
    fn test_reentry_overwrites_open_interval() {
        let mut card = finished_card();
        card.column_id = "doing".to_string();
        card.movement_history = vec![
            CardMovement {
                id: 1,
                from_column_id: String::new(),
                to_column_id: "doing".into(),
                timestamp: at(0),
            },
            // Second entry with no intervening exit: earlier open
            // interval is discarded.
            CardMovement {
                id: 2,
                from_column_id: "todo".into(),
                to_column_id: "doing".into(),
                timestamp: at(3 * HOUR),
            },
        ];
        assert_eq!(time_in_column(&card, "doing", at(4 * HOUR)), HOUR);
    }

    #[test]
    fn test_completion_uses_first_arrival_in_done() {
        let card = finished_card();
        assert_eq!(total_time_to_completion(&card, at(50 * HOUR)), 3 * HOUR);
    }

    #[test]
    fn test_completion_falls_back_to_elapsed_for_open_cards() {
        let mut board = Board::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let id = board.add_card("t", "", "todo", vec![], at(0)).unwrap();
        let card = board.get(id).unwrap().clone();
        assert_eq!(total_time_to_completion(&card, at(2 * HOUR)), 2 * HOUR);
    }

    #[test]
    fn test_breakdown_follows_column_order_and_sums_to_100() {
        let mut board = Board::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let id = board.add_card("t", "", "todo", vec![], at(0)).unwrap();
        board.move_card(id, "doing", at(HOUR)).unwrap();
        let card = board.get(id).unwrap().clone();
        let rows = time_breakdown(&card, &board.columns, at(4 * HOUR));
        let ids: Vec<&str> = rows.iter().map(|r| r.column_id.as_str()).collect();
        assert_eq!(ids, vec!["todo", "doing", "done"]);
        let sum: f64 = rows.iter().map(|r| r.percent).sum();
        assert!((sum - 100.0).abs() < 0.5, "percentages sum to {sum}");
    }

    #[test]
    fn test_breakdown_silently_drops_unknown_columns() {
        let card = finished_card();
        let columns = vec![Column {
            id: "doing".into(),
            name: "Doing".into(),
            position: 0,
            is_static: true,
        }];
        let rows = time_breakdown(&card, &columns, at(10 * HOUR));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].millis, 2 * HOUR);
    }

    #[test]
    fn test_breakdown_zero_total_does_not_divide_by_zero() {
        let mut board = Board::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let id = board.add_card("t", "", "done", vec![], at(0)).unwrap();
        let card = board.get(id).unwrap().clone();
        let rows = time_breakdown(&card, &board.columns, at(0));
        assert!(rows.iter().all(|r| r.percent.is_finite()));
    }

    #[test]
    fn test_current_column_percentage() {
        let mut board = Board::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let id = board.add_card("t", "", "todo", vec![], at(0)).unwrap();
        board.move_card(id, "doing", at(HOUR)).unwrap();
        let card = board.get(id).unwrap().clone();
        // 3h of a 4h lifetime spent in "doing".
        assert_eq!(current_column_percentage(&card, at(4 * HOUR)), 75);
    }

    #[test]
    fn test_sorted_movements_is_non_destructive() {
        let mut card = finished_card();
        card.movement_history.reverse();
        let sorted = sorted_movements(&card);
        assert!(sorted.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        // Original order untouched.
        assert_eq!(card.movement_history[0].to_column_id, "done");
    }

    #[test]
    fn test_empty_history_yields_zero() {
        let mut card = finished_card();
        card.movement_history.clear();
        assert_eq!(time_in_column(&card, "todo", at(HOUR)), 0);
    }

    #[test]
    fn test_format_duration_table() {
        assert_eq!(format_duration(-1), "0m");
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(5_000), "5s");
        assert_eq!(format_duration(60_000), "1m");
        assert_eq!(format_duration(90_000), "1m 30s");
        assert_eq!(format_duration(3 * HOUR), "3h");
        assert_eq!(format_duration(5_400_000), "1h 30m");
        assert_eq!(format_duration(2 * 86_400_000), "2d");
        assert_eq!(format_duration(2 * 86_400_000 + 5 * HOUR), "2d 5h");
    }
}
