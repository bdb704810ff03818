//! Slot layout files.
//!
//! A layout is what the authoring tool produces and what the monitor loads at
//! startup: an ordered list of slot polygons plus one monitored-area polygon,
//! each polygon a list of `[x, y]` pixel pairs. JSON and TOML are both
//! accepted, chosen by file extension:
//!
//! ```json
//! {
//!   "version": 1,
//!   "slots": [[[101, 326], [30, 325], [78, 263], [140, 266]]],
//!   "monitored_area": [[4, 357], [76, 198], [564, 210], [637, 296]]
//! }
//! ```

mod authoring;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{read_structured_file, StructuredFormat};
use crate::geometry::Polygon;
use crate::zone::ZoneModel;
use crate::OccupancyError;

pub use authoring::{AuthoringEvent, AuthoringOutcome, AuthoringState, LayoutAuthoring};

/// Current layout file version.
pub const LAYOUT_VERSION: u32 = 1;

fn default_version() -> u32 {
    LAYOUT_VERSION
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLayout {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub slots: Vec<Polygon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitored_area: Option<Polygon>,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            version: LAYOUT_VERSION,
            slots: Vec::new(),
            monitored_area: None,
        }
    }
}

impl ZoneLayout {
    pub fn new(slots: Vec<Polygon>, monitored_area: Option<Polygon>) -> Self {
        Self {
            version: LAYOUT_VERSION,
            slots,
            monitored_area,
        }
    }

    /// Read a layout file (`.toml` as TOML, anything else as JSON).
    pub fn load(path: &Path) -> Result<Self> {
        let layout: ZoneLayout = read_structured_file(path)?;
        layout
            .check_version()
            .with_context(|| format!("unsupported layout file {}", path.display()))?;
        Ok(layout)
    }

    /// Read a layout file and turn it into a validated zone model.
    pub fn load_zone_model(path: &Path) -> Result<ZoneModel> {
        let model = Self::load(path)?
            .into_zone_model()
            .with_context(|| format!("invalid layout file {}", path.display()))?;
        log::info!(
            "layout {}: {} slot(s), monitored area {}",
            path.display(),
            model.slot_count(),
            if model.monitored_area_polygon().is_ok() {
                "configured"
            } else {
                "missing"
            }
        );
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = match StructuredFormat::for_path(path) {
            StructuredFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| anyhow!("failed to encode layout as TOML: {}", e))?,
            StructuredFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| anyhow!("failed to encode layout as JSON: {}", e))?,
        };
        std::fs::write(path, text)
            .with_context(|| format!("failed to write layout file {}", path.display()))
    }

    /// Validate every polygon (at least 3 points) and build the zone model.
    pub fn into_zone_model(self) -> Result<ZoneModel, OccupancyError> {
        ZoneModel::validated(self.slots, self.monitored_area)
    }

    fn check_version(&self) -> Result<()> {
        if self.version != LAYOUT_VERSION {
            return Err(anyhow!(
                "layout version {} (expected {})",
                self.version,
                LAYOUT_VERSION
            ));
        }
        Ok(())
    }
}
