use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::ObjectClass;

const DEFAULT_LAYOUT_PATH: &str = "layout.json";
const DEFAULT_SOURCE_PATH: &str = "stub://parking_lot";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_BACKEND: &str = "simulated";
const DEFAULT_MODEL_SIZE: u32 = 640;
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.45;
const DEFAULT_OCCUPANCY_PROBABILITY: f64 = 0.5;

pub const BACKEND_REPLAY: &str = "replay";
pub const BACKEND_SIMULATED: &str = "simulated";
pub const BACKEND_TRACT: &str = "tract";

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    layout_path: Option<PathBuf>,
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    vehicle_classes: Option<Vec<ObjectClass>>,
    report_path: Option<PathBuf>,
    frame_limit: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    path: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    replay_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    model_size: Option<u32>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    occupancy_probability: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub layout_path: PathBuf,
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    pub vehicle_classes: Vec<ObjectClass>,
    pub report_path: Option<PathBuf>,
    pub frame_limit: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub replay_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub model_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub occupancy_probability: f64,
    pub seed: u64,
}

impl MonitorConfig {
    /// Load from `PARKING_CONFIG` (if set), then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PARKING_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty());
        Self::load_with(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file, then env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with(Some(path))
    }

    fn load_with(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_structured_file::<MonitorConfigFile>(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            path: source_file
                .path
                .unwrap_or_else(|| DEFAULT_SOURCE_PATH.to_string()),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
        };
        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            replay_path: detector_file.replay_path,
            model_path: detector_file.model_path,
            model_size: detector_file.model_size.unwrap_or(DEFAULT_MODEL_SIZE),
            confidence_threshold: detector_file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE),
            iou_threshold: detector_file.iou_threshold.unwrap_or(DEFAULT_IOU),
            occupancy_probability: detector_file
                .occupancy_probability
                .unwrap_or(DEFAULT_OCCUPANCY_PROBABILITY),
            seed: detector_file.seed.unwrap_or(0),
        };
        Self {
            layout_path: file
                .layout_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LAYOUT_PATH)),
            source,
            detector,
            vehicle_classes: file
                .vehicle_classes
                .unwrap_or_else(|| vec![ObjectClass::Car]),
            report_path: file.report_path,
            frame_limit: file.frame_limit,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(path) = non_empty_env("PARKING_LAYOUT") {
            self.layout_path = PathBuf::from(path);
        }
        if let Some(source) = non_empty_env("PARKING_SOURCE") {
            self.source.path = source;
        }
        if let Some(backend) = non_empty_env("PARKING_BACKEND") {
            self.detector.backend = backend.to_lowercase();
        }
        if let Some(path) = non_empty_env("PARKING_REPORT_PATH") {
            self.report_path = Some(PathBuf::from(path));
        }
        if let Some(limit) = non_empty_env("PARKING_FRAME_LIMIT") {
            let frames: u64 = limit
                .parse()
                .map_err(|_| anyhow!("PARKING_FRAME_LIMIT must be an integer number of frames"))?;
            self.frame_limit = Some(frames);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source frame size must be non-zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        for (name, value) in [
            ("confidence_threshold", self.detector.confidence_threshold),
            ("iou_threshold", self.detector.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("detector {} must be within 0..=1", name));
            }
        }
        if !(0.0..=1.0).contains(&self.detector.occupancy_probability) {
            return Err(anyhow!("detector occupancy_probability must be within 0..=1"));
        }
        if self.vehicle_classes.is_empty() {
            return Err(anyhow!("vehicle_classes must name at least one class"));
        }

        self.detector.backend = self.detector.backend.to_lowercase();
        match self.detector.backend.as_str() {
            BACKEND_SIMULATED => {}
            BACKEND_REPLAY => {
                if self.detector.replay_path.is_none() {
                    return Err(anyhow!("replay backend requires detector.replay_path"));
                }
            }
            BACKEND_TRACT => {
                if self.detector.model_path.is_none() {
                    return Err(anyhow!("tract backend requires detector.model_path"));
                }
                if self.detector.model_size == 0 {
                    return Err(anyhow!("detector model_size must be greater than zero"));
                }
            }
            other => return Err(anyhow!("unknown detector backend {:?}", other)),
        }
        Ok(())
    }
}

/// File encodings understood by [`read_structured_file`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StructuredFormat {
    Json,
    Toml,
}

impl StructuredFormat {
    pub(crate) fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

pub(crate) fn read_structured_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {}", path.display(), e))?;
    let parsed = match StructuredFormat::for_path(path) {
        StructuredFormat::Toml => {
            toml::from_str(&raw).map_err(|e| anyhow!("invalid TOML in {}: {}", path.display(), e))?
        }
        StructuredFormat::Json => serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid JSON in {}: {}", path.display(), e))?,
    };
    Ok(parsed)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
