use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult, ObjectClass, VehicleBox};
use crate::frame::MaskedFrame;

/// One recorded detection in a replay file.
///
/// `class` defaults to `car` and `confidence` to `1.0`, so a bare
/// `{"box": [x1, y1, x2, y2]}` is enough.
#[derive(Clone, Debug, Deserialize)]
struct RecordedDetection {
    #[serde(rename = "box")]
    bbox: VehicleBox,
    #[serde(default = "default_class")]
    class: ObjectClass,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_class() -> ObjectClass {
    ObjectClass::Car
}

fn default_confidence() -> f32 {
    1.0
}

/// Replays recorded detections, one list per frame index.
///
/// Frames past the end of the recording have no detections. Boxes whose
/// center falls outside the frame's monitored area are dropped, as a real
/// detector would not see a vehicle in zeroed pixels.
pub struct ReplayBackend {
    frames: Vec<Vec<Detection>>,
}

impl ReplayBackend {
    pub fn new(frames: Vec<Vec<Detection>>) -> Self {
        Self { frames }
    }

    /// Load a JSON file holding an array of per-frame detection arrays.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid replay file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let recorded: Vec<Vec<RecordedDetection>> = serde_json::from_str(json)?;
        let frames = recorded
            .into_iter()
            .map(|frame| {
                frame
                    .into_iter()
                    .map(|r| Detection {
                        bbox: r.bbox,
                        confidence: r.confidence,
                        class: r.class,
                    })
                    .collect()
            })
            .collect();
        Ok(Self::new(frames))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, frame: &MaskedFrame<'_>) -> Result<DetectionResult> {
        let Some(recorded) = usize::try_from(frame.index())
            .ok()
            .and_then(|i| self.frames.get(i))
        else {
            return Ok(DetectionResult::default());
        };

        let detections: Vec<Detection> = recorded
            .iter()
            .filter(|d| frame.covers(d.bbox.center()))
            .cloned()
            .collect();
        if detections.len() < recorded.len() {
            log::debug!(
                "replay: frame {} dropped {} detection(s) outside monitored area",
                frame.index(),
                recorded.len() - detections.len()
            );
        }
        Ok(DetectionResult { detections })
    }
}
