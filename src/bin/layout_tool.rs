//! layout_tool - author a parking slot layout
//!
//! Reads drawing commands from a script file or stdin, one per line:
//!
//! ```text
//! add X Y    add a vertex to the polygon in progress
//! close      finish the polygon (slot, or monitored area in area mode)
//! mode       toggle between slot and monitored-area mode
//! reset      discard everything drawn so far
//! quit       stop reading and write the layout
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. The layout is written
//! on `quit` or end of input.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader, IsTerminal};
use std::path::PathBuf;

use parking_occupancy::{AuthoringEvent, AuthoringOutcome, AuthoringState, LayoutAuthoring};

#[path = "../ui.rs"]
#[allow(dead_code)]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "layout_tool", about = "Draw slot and monitored-area polygons into a layout file")]
struct Args {
    /// Command script; stdin when omitted
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Layout file to write (.json or .toml)
    #[arg(long, short, default_value = "layout.json", value_name = "PATH")]
    output: PathBuf,

    /// Continue past lines that fail to parse instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = ui::Ui::from_args(&args.ui, std::io::stderr().is_terminal());

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut authoring = LayoutAuthoring::new();
    {
        let _stage = ui.stage("Read drawing commands");
        for (number, line) in input.lines().enumerate() {
            let line = line.context("failed to read command")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event: AuthoringEvent = match line.parse() {
                Ok(event) => event,
                Err(e) if args.keep_going => {
                    log::warn!("line {}: {}", number + 1, e);
                    continue;
                }
                Err(e) => return Err(anyhow!("line {}: {}", number + 1, e)),
            };
            let outcome = authoring.handle(event)?;
            describe(&authoring, &outcome);
            if authoring.state() == AuthoringState::Finished {
                break;
            }
        }
    }

    let pending = authoring.current_points().len();
    if pending > 0 {
        log::warn!("{} unclosed point(s) discarded", pending);
    }
    let layout = authoring.into_layout();
    if layout.monitored_area.is_none() {
        log::warn!("no monitored area defined; parkingd will refuse this layout");
    }
    {
        let _stage = ui.stage("Write layout");
        layout.save(&args.output)?;
    }
    println!(
        "Layout with {} slot(s) saved to {}",
        layout.slots.len(),
        args.output.display()
    );
    Ok(())
}

fn describe(authoring: &LayoutAuthoring, outcome: &AuthoringOutcome) {
    match outcome {
        AuthoringOutcome::PointAdded { points } => {
            log::debug!("{} point(s) in progress", points)
        }
        AuthoringOutcome::SlotAdded { index, polygon } => {
            println!("New slot #{} added: {:?}", index, polygon.points())
        }
        AuthoringOutcome::AreaDefined { polygon } => {
            println!("Monitored area defined: {:?}", polygon.points())
        }
        AuthoringOutcome::Discarded { points } => {
            println!("Polygon discarded: {} point(s), at least 3 required", points)
        }
        AuthoringOutcome::ModeChanged { drawing_area } => println!(
            "Mode: {}",
            if *drawing_area { "monitored area" } else { "slots" }
        ),
        AuthoringOutcome::Reset => println!("All polygons cleared"),
        AuthoringOutcome::Finished => {
            println!("Done: {} slot(s) drawn", authoring.slot_count())
        }
    }
}
