//! Freddy Terminal Demo - a walking character in ASCII
//!
//! Controls:
//!   - WASD / Arrow Keys: Orbit the camera
//!   - +/-: Zoom
//!   - Space: Pause the walk cycle
//!   - Q/ESC: Quit

use anyhow::{Context, Result};
use clap::Parser;
use freddy_core::Pose;
use freddy_terminal::{snapshot, AppConfig, TerminalApp};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Freddy, an articulated character rendered in the terminal")]
struct Args {
    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Animation speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
    /// Joint angles in radians pinned over the walk cycle, e.g. "knee=-0.8, fingers=0.4"
    #[arg(long)]
    pose: Option<String>,
    /// Print a single frame to stdout and exit
    #[arg(long)]
    snapshot: bool,
    /// Snapshot width in columns
    #[arg(long, default_value_t = 80)]
    width: u16,
    /// Snapshot height in rows
    #[arg(long, default_value_t = 40)]
    height: u16,
    /// Animation time of the snapshot, in seconds
    #[arg(long, default_value_t = 0.0)]
    time: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never land in the alternate screen buffer.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let pose = args
        .pose
        .as_deref()
        .map(Pose::parse)
        .transpose()
        .context("parsing --pose")?;

    if args.snapshot {
        print!("{}", snapshot(args.width, args.height, args.time, pose.as_ref())?);
        return Ok(());
    }

    let config = AppConfig {
        fps: args.fps,
        pose,
        speed: args.speed,
    };
    let mut app = TerminalApp::new(config)?;
    app.run()
}
