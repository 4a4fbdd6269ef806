use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use calc_waypoints::{LatLon, Projector, DEFAULT_WORLD};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;

#[derive(Parser)]
#[command(name = "calc-waypoints")]
#[command(about = "Print GPS coordinates for the models placed in a Gazebo world", long_about = None)]
#[command(version)]
struct Cli {
    /// Location of world 0,0 as LAT,LON; use the same value given to sim_vehicle.py -l
    #[arg(short = 'l', long = "location", value_name = "LAT,LON", allow_hyphen_values = true)]
    location: LatLon,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", hide = true)]
    debug: bool,
}

fn main() {
    // Usage errors exit with status 2 from here
    let cli = Cli::parse();

    init_color();

    if let Err(e) = run(cli) {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Initialize logger with default level depending on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    let projector = Projector::new(cli.location);
    let mut out = io::stdout().lock();
    calc_waypoints::write_origin(&projector, &mut out)?;
    out.flush()?;

    let world = Path::new(DEFAULT_WORLD);
    log::info!("Reading world {}", world.display());
    let poses = sdf_world::open(world)
        .with_context(|| format!("Failed to open world {}", world.display()))?;

    let count = calc_waypoints::write_waypoints(&projector, poses, &mut out)
        .with_context(|| format!("Failed to convert world {}", world.display()))?;
    out.flush()?;

    log::info!("Converted {count} models");
    Ok(())
}

/// Respect NO_COLOR for the error prefix
fn init_color() {
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }
}
