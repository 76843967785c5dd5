use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Date-organised personal kanban board for the terminal.
/// Boards live as one JSON file per date under ~/.dayboard,
/// or a directory passed via --dir.
#[derive(Parser)]
#[command(name = "dayboard", version, about = "Daily kanban board CLI")]
pub struct Cli {
    /// Directory holding the board files.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Board date: YYYY-MM-DD, "today", "yesterday" or "tomorrow".
    #[arg(long, global = true)]
    pub date: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
