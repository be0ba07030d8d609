use std::path::PathBuf;

use clap::Parser;

/// Host process serving window-scoped IPC to presentation surfaces.
#[derive(Parser, Debug, Default)]
#[command(name = "ipc-host", version, about)]
pub struct Args {
    /// Directory holding ipc.json and the connection file.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Directory for ipc-host.log.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Write the window contract manifest to this path and exit.
    #[arg(long, value_name = "PATH")]
    pub emit_contract: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
