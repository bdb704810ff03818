//! Per-frame monitoring loop body.
//!
//! `Monitor` owns the zone model and the monitored-area mask and turns one
//! frame into one [`FrameOutcome`]: mask, detect, keep vehicles of interest,
//! classify, aggregate. The mask is built lazily from the first frame's size
//! and every later frame must match it.

use anyhow::Result;

use crate::detect::{Detection, DetectorBackend, ObjectClass, VehicleBox};
use crate::frame::{Frame, Mask};
use crate::occupancy::{classify, FrameReport};
use crate::summary::FrameSummary;
use crate::zone::ZoneModel;
use crate::OccupancyError;

/// Everything derived from one processed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutcome {
    pub frame_index: u64,
    /// Detections of the configured vehicle classes, as fed to the classifier.
    pub detections: Vec<Detection>,
    pub report: FrameReport,
    /// Slots empty now that were occupied in the previous processed frame.
    pub vacated: Vec<usize>,
}

pub struct Monitor {
    zone: ZoneModel,
    vehicle_classes: Vec<ObjectClass>,
    mask: Option<Mask>,
    previous: Option<FrameSummary>,
    frames_processed: u64,
}

impl Monitor {
    /// Fails if any polygon is invalid or no monitored area is configured.
    pub fn new(zone: ZoneModel, vehicle_classes: Vec<ObjectClass>) -> Result<Self, OccupancyError> {
        zone.validate()?;
        zone.monitored_area_polygon()?;
        Ok(Self {
            zone,
            vehicle_classes,
            mask: None,
            previous: None,
            frames_processed: 0,
        })
    }

    pub fn zone(&self) -> &ZoneModel {
        &self.zone
    }

    /// The mask, once the first frame has been seen.
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn process_frame(
        &mut self,
        frame: &Frame,
        backend: &mut dyn DetectorBackend,
    ) -> Result<FrameOutcome> {
        let mask = match self.mask.take() {
            Some(mask) => mask,
            None => {
                let area = self.zone.monitored_area_polygon()?;
                let mask = Mask::build(frame.width, frame.height, area)?;
                log::info!(
                    "monitored area mask built: {}x{}, {} pixel(s) covered",
                    mask.width(),
                    mask.height(),
                    mask.coverage()
                );
                mask
            }
        };
        let result = Self::detect(frame, &mask, &self.vehicle_classes, backend);
        self.mask = Some(mask);
        let detections = result?;

        let vehicles: Vec<VehicleBox> = detections.iter().map(|d| d.bbox).collect();
        let report = classify(&self.zone, &vehicles)?;
        let vacated = match &self.previous {
            Some(previous) => report.summary.vacated_since(previous),
            None => Vec::new(),
        };
        self.previous = Some(report.summary.clone());
        self.frames_processed += 1;

        log::debug!(
            "frame {}: {} vehicle(s), {} occupied / {} empty",
            frame.index,
            detections.len(),
            report.summary.occupied,
            report.summary.empty
        );
        Ok(FrameOutcome {
            frame_index: frame.index,
            detections,
            report,
            vacated,
        })
    }

    fn detect(
        frame: &Frame,
        mask: &Mask,
        classes: &[ObjectClass],
        backend: &mut dyn DetectorBackend,
    ) -> Result<Vec<Detection>> {
        let masked = frame.apply_mask(mask)?;
        Ok(backend.detect(&masked)?.retain_classes(classes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ReplayBackend;
    use crate::geometry::Polygon;

    const W: u32 = 60;
    const H: u32 = 20;

    fn frame(index: u64) -> Frame {
        Frame::new(vec![200; (W * H) as usize * 3], W, H, index).unwrap()
    }

    fn slots() -> Vec<Polygon> {
        vec![
            Polygon::from_pairs(&[(0, 0), (19, 0), (19, 19), (0, 19)]),
            Polygon::from_pairs(&[(20, 0), (39, 0), (39, 19), (20, 19)]),
        ]
    }

    fn area() -> Option<Polygon> {
        Some(Polygon::from_pairs(&[(0, 0), (39, 0), (39, 19), (0, 19)]))
    }

    /// Two slots side by side inside an area that covers x 0..=39.
    fn zone() -> ZoneModel {
        ZoneModel::new(slots(), area())
    }

    fn replay(json: &str) -> ReplayBackend {
        ReplayBackend::from_json(json).unwrap()
    }

    #[test]
    fn missing_area_is_not_configured() {
        let model = ZoneModel::new(slots(), None);
        assert!(matches!(
            Monitor::new(model, vec![ObjectClass::Car]),
            Err(OccupancyError::NotConfigured)
        ));
    }

    #[test]
    fn mask_is_built_on_first_frame() {
        let mut monitor = Monitor::new(zone(), vec![ObjectClass::Car]).unwrap();
        assert!(monitor.mask().is_none());
        monitor.process_frame(&frame(0), &mut replay("[]")).unwrap();
        let mask = monitor.mask().unwrap();
        assert_eq!((mask.width(), mask.height()), (W, H));
        assert_eq!(mask.coverage(), 40 * 20);
    }

    #[test]
    fn vehicles_outside_area_never_occupy() {
        // Second box is centered at x=50, outside the area; a slot drawn
        // there would still stay empty.
        let mut all = slots();
        all.push(Polygon::from_pairs(&[(45, 0), (59, 0), (59, 19), (45, 19)]));
        let model = ZoneModel::new(all, area());
        let mut monitor = Monitor::new(model, vec![ObjectClass::Car]).unwrap();
        let mut backend = replay(r#"[[{"box": [2, 2, 10, 10]}, {"box": [46, 2, 54, 10]}]]"#);
        let outcome = monitor.process_frame(&frame(0), &mut backend).unwrap();
        assert_eq!(outcome.detections.len(), 1);
        assert_eq!(outcome.report.summary.empty_slots, vec![2, 3]);
    }

    #[test]
    fn other_classes_are_filtered() {
        let mut monitor = Monitor::new(zone(), vec![ObjectClass::Car]).unwrap();
        let mut backend = replay(r#"[[{"box": [2, 2, 10, 10], "class": "person"}]]"#);
        let outcome = monitor.process_frame(&frame(0), &mut backend).unwrap();
        assert!(outcome.detections.is_empty());
        assert_eq!(outcome.report.summary.occupied, 0);
    }

    #[test]
    fn only_configured_classes_occupy_slots() {
        let mut monitor = Monitor::new(zone(), vec![ObjectClass::Truck]).unwrap();
        let mut backend = replay(
            r#"[[{"box": [2, 2, 10, 10], "class": "car"}, {"box": [22, 2, 30, 10], "class": "truck"}]]"#,
        );
        let outcome = monitor.process_frame(&frame(0), &mut backend).unwrap();
        assert_eq!(outcome.detections.len(), 1);
        assert_eq!(outcome.detections[0].class, ObjectClass::Truck);
        assert_eq!(outcome.report.summary.empty_slots, vec![1]);
    }

    #[test]
    fn vacated_tracks_transitions() {
        let mut monitor = Monitor::new(zone(), vec![ObjectClass::Car]).unwrap();
        let mut backend = replay(
            r#"[
                [{"box": [2, 2, 10, 10]}, {"box": [22, 2, 30, 10]}],
                [{"box": [22, 2, 30, 10]}],
                [{"box": [22, 2, 30, 10]}]
            ]"#,
        );
        let first = monitor.process_frame(&frame(0), &mut backend).unwrap();
        assert!(first.vacated.is_empty());
        let second = monitor.process_frame(&frame(1), &mut backend).unwrap();
        assert_eq!(second.vacated, vec![1]);
        assert_eq!(second.report.summary.empty_slots, vec![1]);
        let third = monitor.process_frame(&frame(2), &mut backend).unwrap();
        assert!(third.vacated.is_empty());
        assert_eq!(third.report.summary.empty_slots, vec![1]);
        assert_eq!(monitor.frames_processed(), 3);
    }

    #[test]
    fn frame_size_change_is_rejected() {
        let mut monitor = Monitor::new(zone(), vec![ObjectClass::Car]).unwrap();
        let mut backend = replay("[]");
        monitor.process_frame(&frame(0), &mut backend).unwrap();
        let small = Frame::new(vec![0; 10 * 10 * 3], 10, 10, 1).unwrap();
        let err = monitor.process_frame(&small, &mut backend).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OccupancyError>(),
            Some(OccupancyError::DimensionMismatch { .. })
        ));
        // The mask survives the rejected frame.
        assert!(monitor.mask().is_some());
        assert_eq!(monitor.frames_processed(), 1);
    }
}
