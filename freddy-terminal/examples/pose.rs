//! Example: print Freddy in a fixed pose
//!
//! Usage: cargo run --example pose -- "shoulder=1.2, elbow=-1.0, knee=-0.6"

use anyhow::{Context, Result};
use freddy_core::Pose;
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let pose = match args.get(1) {
        Some(text) => Some(Pose::parse(text).context("parsing pose")?),
        None => {
            eprintln!("Usage: {} <pose>", args[0]);
            eprintln!("\nNo pose provided, showing the walk cycle at t=0...");
            None
        }
    };

    print!("{}", freddy_terminal::snapshot(80, 40, 0.0, pose.as_ref())?);
    Ok(())
}
