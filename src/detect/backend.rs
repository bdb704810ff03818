use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::MaskedFrame;

/// Detector backend trait.
///
/// Backends receive a [`MaskedFrame`]: pixels outside the monitored area are
/// already zeroed, and [`MaskedFrame::covers`] reports which points are visible.
/// A backend must report boxes for the given frame only; it may keep internal
/// state (a model, an RNG) but no per-frame results.
pub trait DetectorBackend: Send {
    /// Backend identifier used by the registry and in configuration.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &MaskedFrame<'_>) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
