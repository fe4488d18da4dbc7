//! CLI definition for the cultivation board.

use clap::{Args, Parser, Subcommand};

/// Cultivation board - inspect and rearrange cultivation areas by stage
#[derive(Parser, Debug)]
#[command(name = "cultivation-board")]
#[command(version)]
#[command(about = "Inspect and rearrange the cultivation board from the terminal")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Tenant scope header value sent with every request
    #[arg(long, global = true)]
    pub tenant: Option<String>,

    /// Only show areas of this facility
    #[arg(long, global = true)]
    pub facility: Option<u64>,

    /// Act as a facility-scoped operator (structure changes are refused)
    #[arg(long, global = true)]
    pub operator: bool,

    /// Override the configured API root
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the board: every stage with its areas in order
    Board,
    /// Move an area onto a stage (append) or in front of another area
    Move(MoveArgs),
    /// List stages in board order
    Stages,
    /// List facilities visible to the caller
    Facilities,
    /// List the batches held in one area
    Batches {
        /// Cultivation area id
        area: u64,
    },
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Id of the area to move
    pub area: u64,

    /// Append to the end of this stage
    #[arg(long, conflicts_with = "onto_area", required_unless_present = "onto_area")]
    pub to_stage: Option<u64>,

    /// Take the position of this area
    #[arg(long)]
    pub onto_area: Option<u64>,
}
