//! parkingd - parking slot occupancy monitor
//!
//! Loads a slot layout, pulls frames from a local source, masks each frame
//! to the monitored area, runs the configured detector and reports per-slot
//! occupancy. Vacancy transitions are logged; every frame can be appended to
//! a JSON-lines report.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_occupancy::config::{MonitorConfig, BACKEND_REPLAY, BACKEND_SIMULATED, BACKEND_TRACT};
use parking_occupancy::summary::empty_notice;
use parking_occupancy::{
    BackendRegistry, FileConfig, FileSource, FrameSummary, Monitor, OccupancyError, ReplayBackend,
    ReportWriter, SimulatedBackend, ZoneLayout, ZoneModel,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "parkingd", about = "Monitor parking slot occupancy from a frame source")]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension)
    #[arg(long, env = "PARKING_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Layout file, overriding the config
    #[arg(long, value_name = "PATH")]
    layout: Option<PathBuf>,

    /// Stop after this many frames, overriding the config
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = ui::Ui::from_args(&args.ui, std::io::stderr().is_terminal());

    let mut cfg = match &args.config {
        Some(path) => MonitorConfig::load_from(path)?,
        None => MonitorConfig::load()?,
    };
    if let Some(layout) = args.layout {
        cfg.layout_path = layout;
    }
    if let Some(frames) = args.frames {
        cfg.frame_limit = Some(frames);
    }

    let zone = {
        let _stage = ui.stage("Load layout");
        ZoneLayout::load_zone_model(&cfg.layout_path)?
    };
    let mut registry = {
        let _stage = ui.stage("Prepare detector");
        let registry = build_registry(&cfg, &zone)?;
        registry.warm_up_all()?;
        registry
    };
    let mut source = FileSource::new(FileConfig {
        path: cfg.source.path.clone(),
        width: cfg.source.width,
        height: cfg.source.height,
    })?;
    source.connect()?;
    let mut monitor = Monitor::new(zone, cfg.vehicle_classes.clone())?;
    let mut report = match &cfg.report_path {
        Some(path) => Some(ReportWriter::create(path)?),
        None => None,
    };

    log::info!(
        "parkingd running: layout={} source={} backend={} classes={:?}",
        cfg.layout_path.display(),
        cfg.source.path,
        registry.default_name().unwrap_or("none"),
        cfg.vehicle_classes
    );
    if let Some(path) = &cfg.report_path {
        log::info!("writing frame reports to {}", path.display());
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .expect("error setting Ctrl-C handler");
    }

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(cfg.source.target_fps));
    let progress = ui.frames(cfg.frame_limit);
    let mut last_health_log = Instant::now();
    let mut last_summary = FrameSummary::default();
    let mut rejected = 0u64;

    while !stop.load(Ordering::SeqCst) {
        if cfg
            .frame_limit
            .is_some_and(|limit| monitor.frames_processed() >= limit)
        {
            log::info!("frame limit reached");
            break;
        }
        let started = Instant::now();
        let Some(frame) = source.next_frame()? else {
            log::info!("end of stream");
            break;
        };

        let outcome = match monitor.process_frame(&frame, &mut registry) {
            Ok(outcome) => outcome,
            Err(e) => match e.downcast_ref::<OccupancyError>() {
                Some(OccupancyError::DimensionMismatch { .. }) => {
                    rejected += 1;
                    log::warn!("frame {} rejected: {}", frame.index, e);
                    continue;
                }
                _ => return Err(e),
            },
        };

        for &slot in &outcome.vacated {
            log::info!("{}", empty_notice(slot));
        }
        if let Some(writer) = report.as_mut() {
            writer.write(&outcome)?;
        }
        let summary = &outcome.report.summary;
        progress.update(summary.occupied, summary.total);
        last_summary = outcome.report.summary;

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} skipped={} rejected={} path={}",
                source.is_healthy(),
                stats.frames_captured,
                stats.frames_skipped,
                rejected,
                stats.path
            );
            log::info!(
                "occupancy: {}/{} occupied, empty slots {:?}",
                last_summary.occupied,
                last_summary.total,
                last_summary.empty_slots
            );
            last_health_log = Instant::now();
        }

        if let Some(remaining) = frame_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
    progress.finish();

    if let Some(writer) = report.as_mut() {
        writer.flush()?;
        log::info!("{} frame report(s) written", writer.frames_written());
    }
    log::info!(
        "parkingd stopped after {} frame(s)",
        monitor.frames_processed()
    );
    println!("{}", last_summary);
    Ok(())
}

/// Register every backend the config can build; the configured one is default.
fn build_registry(cfg: &MonitorConfig, zone: &ZoneModel) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    let spots = zone
        .iter_slots()
        .filter_map(|(_, polygon)| polygon.reference_point())
        .collect();
    registry.register(SimulatedBackend::new(
        spots,
        cfg.detector.occupancy_probability,
        cfg.detector.seed,
    )?);
    if let Some(path) = &cfg.detector.replay_path {
        let replay = ReplayBackend::from_path(path)?;
        log::info!(
            "replay recording {}: {} frame(s)",
            path.display(),
            replay.frame_count()
        );
        registry.register(replay);
    }
    if cfg.detector.backend == BACKEND_TRACT {
        register_tract(&mut registry, cfg)?;
    }

    match cfg.detector.backend.as_str() {
        BACKEND_SIMULATED | BACKEND_REPLAY | BACKEND_TRACT => {
            registry.set_default(&cfg.detector.backend)?
        }
        other => return Err(anyhow!("unknown detector backend {:?}", other)),
    }
    log::info!("detector backends: {}", registry.list().join(", "));
    Ok(registry)
}

#[cfg(feature = "backend-tract")]
fn register_tract(registry: &mut BackendRegistry, cfg: &MonitorConfig) -> Result<()> {
    let path = cfg
        .detector
        .model_path
        .as_ref()
        .ok_or_else(|| anyhow!("tract backend requires detector.model_path"))?;
    let backend = parking_occupancy::detect::TractBackend::new(path, cfg.detector.model_size)?
        .with_thresholds(cfg.detector.confidence_threshold, cfg.detector.iou_threshold);
    registry.register(backend);
    Ok(())
}

#[cfg(not(feature = "backend-tract"))]
fn register_tract(_registry: &mut BackendRegistry, _cfg: &MonitorConfig) -> Result<()> {
    Err(anyhow!(
        "the tract backend requires building with the backend-tract feature"
    ))
}
