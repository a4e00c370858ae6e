use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::model::view::ViewMode;

#[derive(Parser)]
#[command(name = "sv", about = concat!("schedview v", env!("CARGO_PKG_VERSION"), " - project schedules as a timeline"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./schedview.toml if present)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Draw the schedule as a text timeline
    Gantt(GanttArgs),
    /// Print the flattened render records
    List(ListArgs),
    /// Print the assembled hierarchy
    Tree(SnapshotArgs),
    /// Report entities whose parent never arrived
    Check(CheckArgs),
    /// Print the descendant query for a container
    Query(QueryArgs),
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// Snapshot file (JSON with project, direct_children and records)
    pub snapshot: PathBuf,
}

#[derive(Args)]
pub struct ListArgs {
    /// Snapshot file (JSON with project, direct_children and records)
    pub snapshot: PathBuf,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct GanttArgs {
    /// Snapshot file (JSON with project, direct_children and records)
    pub snapshot: PathBuf,
    /// Zoom: hour, day, week, month, quarter, year
    #[arg(long)]
    pub view: Option<ViewMode>,
    /// Maximum bar width in columns
    #[arg(long, default_value = "100")]
    pub width: usize,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Snapshot file (JSON with project, direct_children and records)
    pub snapshot: PathBuf,
    /// Exit with an error if anything is left pending
    #[arg(long)]
    pub strict: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Id of the container (project) whose descendants are queried
    pub container: String,
    /// Rows per page (default: from config)
    #[arg(long)]
    pub page_size: Option<usize>,
}
