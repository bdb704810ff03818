//! Parking slot occupancy engine.
//!
//! This crate classifies user-defined parking slots as occupied or empty, frame
//! by frame, from the vehicle boxes an external detector reports.
//!
//! # Architecture
//!
//! The engine keeps three rules by construction:
//!
//! 1. **Immutable zones**: the slot layout is loaded once into a [`ZoneModel`] and
//!    never reshaped while frames are processed.
//! 2. **Masked detection**: detectors only ever receive a [`MaskedFrame`], so a
//!    vehicle outside the monitored area cannot be reported at all.
//! 3. **Stateless classification**: [`classify`] is a pure function of the zone
//!    model and the current frame's vehicles. Nothing is carried between frames.
//!
//! # Module Structure
//!
//! - `geometry`: points, polygons, containment and centroids
//! - `zone`: the immutable zone model
//! - `layout`: serialized layout files and the authoring state machine
//! - `frame`: frames, the monitored-area mask and masked frames
//! - `occupancy` / `summary`: per-slot states and the frame summary
//! - `detect`: detector boundary and backends
//! - `ingest`: frame sources
//! - `pipeline`: the per-frame monitor wiring everything together
//! - `report` / `config`: output sink and runtime configuration

use thiserror::Error;

pub mod config;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod layout;
pub mod occupancy;
pub mod pipeline;
pub mod report;
pub mod summary;
pub mod zone;

pub use detect::{
    BackendRegistry, Detection, DetectionResult, DetectorBackend, ObjectClass, ReplayBackend,
    SimulatedBackend, VehicleBox,
};
pub use frame::{Frame, Mask, MaskedFrame};
pub use geometry::{Point, Polygon, PolygonRole};
pub use ingest::{file::FileConfig, FileSource};
pub use layout::{AuthoringEvent, AuthoringOutcome, AuthoringState, LayoutAuthoring, ZoneLayout};
pub use occupancy::{classify, classify_slots, FrameReport, SlotState};
pub use pipeline::{FrameOutcome, Monitor};
pub use report::ReportWriter;
pub use summary::FrameSummary;
pub use zone::ZoneModel;

// -------------------- Errors --------------------

/// Errors raised by the zone model, the masking filter and the classifier.
///
/// These all indicate a configuration defect rather than a transient
/// condition; callers surface them instead of retrying.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OccupancyError {
    #[error("invalid polygon for {role}: {points} point(s), at least 3 required")]
    InvalidPolygon { role: PolygonRole, points: usize },

    #[error("slot index {index} out of range (1..={count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("monitored area is not configured")]
    NotConfigured,

    #[error(
        "frame size {frame_width}x{frame_height} does not match mask {mask_width}x{mask_height}"
    )]
    DimensionMismatch {
        mask_width: u32,
        mask_height: u32,
        frame_width: u32,
        frame_height: u32,
    },
}
